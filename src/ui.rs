//! Terminal output helpers

use anyhow::Result;
use colored::Colorize;
use declarative::ConfirmCallback;
use dialoguer::Confirm;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.len()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Asks on the terminal before a pass changes anything
pub struct Prompt;

impl ConfirmCallback for Prompt {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        let confirmed = Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()?;
        Ok(confirmed)
    }
}

/// Truncate a string for display, keeping the end
pub fn truncate_left(text: &str, max_len: usize) -> String {
    let len = text.chars().count();
    if len <= max_len {
        text.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let tail: String = text.chars().skip(len - max_len + 3).collect();
        format!("...{tail}")
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_left_short() {
        assert_eq!(truncate_left("short.txt", 20), "short.txt");
        assert_eq!(truncate_left("exact", 5), "exact");
    }

    #[test]
    fn test_truncate_left_long() {
        // "/very/long/path/to/file.txt" is 27 chars
        // max_len=15, so we take last 12 chars + "..." = ".../to/file.txt"
        assert_eq!(
            truncate_left("/very/long/path/to/file.txt", 15),
            ".../to/file.txt"
        );
    }

    #[test]
    fn test_truncate_left_edge_cases() {
        assert_eq!(truncate_left("test", 3), "...");
        assert_eq!(truncate_left("test", 2), "...");
        assert_eq!(truncate_left("", 10), "");
    }

    #[test]
    fn test_truncate_left_counts_chars() {
        assert_eq!(truncate_left("Lecteur_réseau_Boot", 10), "...au_Boot");
    }
}
