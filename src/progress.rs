//! Progress bar for reconciliation passes

use crate::ui;
use colored::Colorize;
use declarative::{ApplyResult, Mode, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};

/// Shows one tick per resource; failures are printed above the bar
pub struct PassProgress {
    bar: ProgressBar,
    hidden: bool,
}

impl PassProgress {
    pub fn new(hidden: bool) -> Self {
        Self {
            bar: ProgressBar::hidden(),
            hidden,
        }
    }
}

impl ProgressCallback for PassProgress {
    fn on_pass_start(&mut self, count: usize, mode: Mode) {
        if self.hidden {
            return;
        }

        self.bar = ProgressBar::new(count as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .map_or_else(|_| ProgressStyle::default_bar(), |s| s.progress_chars("=>-"));
        self.bar.set_style(style);
        self.bar.set_prefix(mode.to_string());
    }

    fn on_resource_start(&mut self, id: &str, _description: &str) {
        self.bar.set_message(ui::truncate_left(id, 30));
    }

    fn on_resource_complete(&mut self, id: &str, result: &ApplyResult) {
        if let ApplyResult::Failed { error, .. } = result {
            self.bar.suspend(|| {
                eprintln!("  {} {} ({})", "✗".red(), id, error);
            });
        }
        self.bar.inc(1);
    }

    fn on_pass_complete(&mut self) {
        self.bar.finish_and_clear();
    }
}
