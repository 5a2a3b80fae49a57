//! Diff and pass report display

use colored::Colorize;
use declarative::{
    ApplyResult, DiffSummary, ExecutionPlan, Mode, PassResult, ResourceDiff, ResourceState,
    compute_diffs, group_by_type,
};

use crate::resource::{DRIVE_MAPPING, SCHEDULED_TASK};

/// Diffs of a plan for the given direction
pub fn plan_diffs(plan: &ExecutionPlan, mode: Mode) -> Vec<ResourceDiff> {
    compute_diffs(&plan.resources, mode)
}

fn type_title(resource_type: &str) -> &str {
    match resource_type {
        SCHEDULED_TASK => "Scheduled triggers",
        DRIVE_MAPPING => "Drive mappings",
        other => other,
    }
}

/// Display a list of diffs in a user-friendly format
pub fn display_diff(diffs: &[ResourceDiff]) {
    if diffs.is_empty() {
        println!();
        println!("  {} No changes needed", "✓".green());
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Configuration Diff".bold()
    );
    println!("│");

    for (resource_type, type_diffs) in group_by_type(diffs) {
        println!("│ {}", type_title(&resource_type).bold());

        for diff in type_diffs {
            let symbol = if diff.is_addition() {
                "+".green()
            } else if diff.is_removal() {
                "-".red()
            } else if matches!(diff.current, ResourceState::Modified { .. }) {
                "~".yellow()
            } else {
                "?".dimmed()
            };

            let state_desc = match (&diff.current, &diff.desired) {
                (ResourceState::Absent, ResourceState::Present { details }) => format!(
                    "(missing){}",
                    details
                        .as_ref()
                        .map(|d| format!(" → {d}"))
                        .unwrap_or_default()
                ),
                (ResourceState::Modified { from, to }, _) => format!("{from} → {to}"),
                (_, ResourceState::Absent) => "(will remove)".to_string(),
                (ResourceState::Unknown, _) => diff.description.clone(),
                _ => String::new(),
            };

            println!(
                "│   {} {:<30} {}",
                symbol,
                diff.resource_id,
                state_desc.dimmed()
            );
        }
        println!("│");
    }

    let summary = DiffSummary::from_diffs(diffs);
    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Summary: {} changes ({} to add, {} to change, {} to remove)",
        summary.total().to_string().bold(),
        summary.additions.to_string().green(),
        summary.modifications.to_string().yellow(),
        summary.removals.to_string().red()
    );
    println!("└─────────────────────────────────────────────────────┘");
}

fn result_line(result: &ApplyResult) -> String {
    match result {
        ApplyResult::NoChange => "up to date".dimmed().to_string(),
        ApplyResult::Created => "created".green().to_string(),
        ApplyResult::Modified => "updated".yellow().to_string(),
        ApplyResult::Removed => "removed".red().to_string(),
        ApplyResult::Failed { kind, error } => format!("{} {}", kind.label().red().bold(), error),
        ApplyResult::Skipped { reason } => format!("skipped ({reason})").dimmed().to_string(),
    }
}

/// Print one line per resource, then the totals
pub fn display_pass(pass: &PassResult) {
    println!();
    for outcome in &pass.outcomes {
        let symbol = match &outcome.result {
            ApplyResult::Failed { .. } => outcome.result.symbol().red(),
            ApplyResult::NoChange | ApplyResult::Skipped { .. } => {
                outcome.result.symbol().dimmed()
            }
            _ => outcome.result.symbol().green(),
        };
        println!(
            "  {} {:<32} {}",
            symbol,
            outcome.id,
            result_line(&outcome.result)
        );
    }

    let summary = pass.summary();
    let elapsed = pass.finished_at - pass.started_at;
    println!();
    println!(
        "  {} {} created, {} updated, {} removed, {} unchanged, {} skipped, {} failed {}",
        if pass.is_success() {
            "✓".green()
        } else {
            "✗".red()
        },
        summary.created,
        summary.modified,
        summary.removed,
        summary.no_change,
        summary.skipped,
        summary.failed,
        format!("({} ms)", elapsed.num_milliseconds()).dimmed()
    );
    if let Some(reason) = &pass.interrupted {
        println!("  {} Pass stopped early: {}", "⚠".yellow(), reason);
    }
}
