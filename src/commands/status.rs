//! `status` and `diff`

use anyhow::Result;
use colored::Colorize;
use declarative::Mode;

use super::Session;
use crate::Context;
use crate::cli::{DiffArgs, StatusArgs};
use crate::engine::differ;
use crate::inspector::{self, EntryState, MachineSnapshot};
use crate::ui;

pub fn status(ctx: &Context, args: &StatusArgs) -> Result<()> {
    let session = Session::open(&args.source, None)?;
    let state = session.validated()?;
    let reconciler = &session.reconciler;
    let snapshot = inspector::inspect(&state, reconciler.groups(), reconciler.backends());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    ui::header("Status");
    ui::kv("Config", &session.config_path.display().to_string());
    ui::kv("Executable", &state.executable_path);
    if ctx.verbose > 0 {
        ui::kv("Groups", &reconciler.groups().names().join(", "));
    }

    show_snapshot(&snapshot);

    println!();
    if snapshot.is_in_sync() {
        ui::success("Everything is in sync");
    } else {
        ui::warn("Run `drivemap install` to converge");
    }
    Ok(())
}

fn symbol(state: &EntryState) -> colored::ColoredString {
    match state {
        EntryState::InSync => "✓".green(),
        EntryState::NotApplicable(_) => "·".dimmed(),
        EntryState::Unreadable(_) => "✗".red(),
        _ => "⚠".yellow(),
    }
}

fn detail(state: &EntryState) -> String {
    match state {
        EntryState::Drifted(changes) => format!(" ({})", changes.join(", ")),
        EntryState::NotApplicable(reason) | EntryState::Unreadable(reason) => {
            format!(" ({reason})")
        }
        _ => String::new(),
    }
}

fn show_snapshot(snapshot: &MachineSnapshot) {
    ui::section("Scheduled triggers");
    if snapshot.triggers.is_empty() {
        ui::dim("none configured");
    }
    for trigger in &snapshot.triggers {
        println!(
            "  {} {:<36} {:<14} {}{}",
            symbol(&trigger.state),
            trigger.name,
            trigger.kind.to_string().dimmed(),
            inspector::state_label(&trigger.state),
            detail(&trigger.state).dimmed()
        );
    }

    ui::section("Drive mappings");
    if snapshot.drives.is_empty() {
        ui::dim("none configured");
    }
    for drive in &snapshot.drives {
        println!(
            "  {} {} {:<28} {:<16} {}{}",
            symbol(&drive.state),
            drive.letter.bold(),
            drive.remote_path,
            drive.group.dimmed(),
            inspector::state_label(&drive.state),
            detail(&drive.state).dimmed()
        );
    }

    if !snapshot.orphans.is_empty() {
        ui::section("Unmanaged triggers");
        for orphan in &snapshot.orphans {
            println!("  {} {}", "?".yellow(), orphan);
        }
    }
}

pub fn diff(_ctx: &Context, args: &DiffArgs) -> Result<()> {
    let session = Session::open(&args.source, args.only.as_deref())?;
    session.validated()?;

    let mode = if args.uninstall {
        Mode::Uninstall
    } else {
        Mode::Install
    };
    let (_, plan) = session.reconciler.plan(&session.desired)?;
    let diffs = differ::plan_diffs(&plan, mode);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&diffs)?);
    } else {
        differ::display_diff(&diffs);
    }
    Ok(())
}
