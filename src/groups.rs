//! Group membership of the logged-on user
//!
//! Resolution is best-effort: a resolver failure is logged and yields no
//! groups, so group-gated drives are skipped rather than failing the pass.

use anyhow::{Context, Result, bail};
use regex::Regex;
use std::process::Command;
use std::sync::LazyLock;

/// Source of group names for a user
pub trait GroupResolver {
    fn resolve_groups(&self, username: &str) -> Result<Vec<String>>;
}

/// Groups the operating system reports for the current session
///
/// On Windows this asks `whoami /groups`, which reports the groups of the
/// current logon token (so `username` is only used for logging). Elsewhere
/// `id -Gn <username>` is used.
#[derive(Debug, Default)]
pub struct SystemGroups;

impl GroupResolver for SystemGroups {
    fn resolve_groups(&self, username: &str) -> Result<Vec<String>> {
        let mut cmd = if cfg!(windows) {
            let mut cmd = Command::new("whoami");
            cmd.args(["/groups", "/fo", "csv", "/nh"]);
            cmd
        } else {
            let mut cmd = Command::new("id");
            cmd.args(["-Gn", username]);
            cmd
        };

        let output = cmd.output().context("Failed to run group lookup")?;
        if !output.status.success() {
            bail!(
                "Group lookup for {username} failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(if cfg!(windows) {
            parse_whoami_csv(&stdout)
        } else {
            stdout.split_whitespace().map(str::to_string).collect()
        })
    }
}

/// Fixed group list (`--groups`, tests)
#[derive(Debug, Clone, Default)]
pub struct StaticGroups(pub Vec<String>);

impl StaticGroups {
    /// Parse a comma-separated list
    pub fn parse(list: &str) -> Self {
        Self(
            list.split(',')
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }
}

impl GroupResolver for StaticGroups {
    fn resolve_groups(&self, _username: &str) -> Result<Vec<String>> {
        Ok(self.0.clone())
    }
}

static WHOAMI_GROUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^"([^"]+)""#).expect("valid regex"));

/// First column of `whoami /groups /fo csv /nh`, without the domain prefix
fn parse_whoami_csv(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| WHOAMI_GROUP_RE.captures(line.trim()))
        .map(|caps| strip_domain(&caps[1]).to_string())
        .collect()
}

fn strip_domain(name: &str) -> &str {
    name.rsplit_once('\\').map_or(name, |(_, n)| n)
}

/// Name of the logged-on user, without a domain prefix
pub fn current_username() -> Option<String> {
    std::env::var("USERNAME")
        .or_else(|_| std::env::var("USER"))
        .ok()
        .map(|u| strip_domain(u.trim()).to_string())
        .filter(|u| !u.is_empty())
}

/// Resolved group set with case-insensitive membership
#[derive(Debug, Clone, Default)]
pub struct UserGroups {
    names: Vec<String>,
}

impl UserGroups {
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            names: names.into_iter().collect(),
        }
    }

    /// Resolve with `resolver`; failures are logged and yield no groups
    pub fn resolve(resolver: &dyn GroupResolver, username: Option<&str>) -> Self {
        let Some(username) = username else {
            log::warn!("Could not determine the current user; no group-gated drives apply");
            return Self::default();
        };

        match resolver.resolve_groups(username) {
            Ok(names) => {
                log::debug!("{username} is in {} group(s)", names.len());
                Self::new(names)
            }
            Err(e) => {
                log::warn!("Could not resolve groups for {username}: {e:#}");
                Self::default()
            }
        }
    }

    /// Exact match, ignoring case
    pub fn contains(&self, group: &str) -> bool {
        let wanted = group.to_lowercase();
        self.names.iter().any(|g| g.to_lowercase() == wanted)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}
