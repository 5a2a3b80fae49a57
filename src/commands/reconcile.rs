//! `install`, `uninstall` and `map`

use anyhow::{Result, bail};
use declarative::{AutoConfirm, ConfirmCallback, ExecuteOptions, Mode, PassResult};
use std::path::Path;

use super::{Session, pass_options};
use crate::Context;
use crate::cli::{InstallArgs, MapArgs, UninstallArgs};
use crate::engine::differ;
use crate::progress::PassProgress;
use crate::staging;
use crate::ui;

pub fn install(ctx: &Context, args: &InstallArgs) -> Result<()> {
    let session = Session::open(&args.source, args.pass.only.as_deref())?;
    let state = session.validated()?;
    let quiet = ctx.quiet || args.pass.json;

    if !quiet {
        ui::header("Install");
        ui::kv("Config", &session.config_path.display().to_string());
        ui::kv("Target", &state.target_directory.display().to_string());
        if session.simulated {
            ui::info("Simulated run: nothing on this machine is changed");
        }
    }

    if args.no_stage || args.pass.dry_run || session.simulated {
        log::debug!("Skipping file staging");
    } else {
        let report = staging::stage(Path::new(&session.origin.directory), &state.target_directory)?;
        if !quiet && report.total() > 0 {
            ui::success(&format!(
                "Staged {} file(s) ({} unchanged)",
                report.copied.len(),
                report.unchanged.len()
            ));
        }
    }

    let opts = pass_options(Mode::Install, &args.pass, ctx.verbose > 0);
    let pass = run_pass(&session, &opts, quiet, &mut AutoConfirm)?;

    finish(&pass, args.pass.json, quiet)
}

pub fn uninstall(ctx: &Context, args: &UninstallArgs) -> Result<()> {
    let session = Session::open(&args.source, args.pass.only.as_deref())?;
    let state = session.validated()?;
    let quiet = ctx.quiet || args.pass.json;

    if !quiet {
        ui::header("Uninstall");
        ui::kv("Config", &session.config_path.display().to_string());
    }

    let opts = pass_options(Mode::Uninstall, &args.pass, ctx.verbose > 0);
    let pass = if args.yes || args.pass.dry_run {
        run_pass(&session, &opts, quiet, &mut AutoConfirm)?
    } else {
        run_pass(&session, &opts, quiet, &mut ui::Prompt)?
    };

    let removes_files = !args.keep_files
        && !args.pass.dry_run
        && !session.simulated
        && args.pass.only.is_none()
        && pass.is_success();
    if removes_files {
        match staging::unstage(&state.target_directory) {
            Ok(true) if !quiet => ui::success(&format!(
                "Removed {}",
                state.target_directory.display()
            )),
            Ok(_) => {}
            // the running copy may live in the target directory
            Err(e) => ui::warn(&format!("{e:#}")),
        }
    }

    finish(&pass, args.pass.json, quiet)
}

/// Drive mappings only; this is what the installed triggers run
pub fn map(ctx: &Context, args: &MapArgs) -> Result<()> {
    let session = Session::open(&args.source, Some("drives"))?;
    session.validated()?;
    let quiet = ctx.quiet || args.json;

    let opts = ExecuteOptions {
        dry_run: args.dry_run,
        verbose: ctx.verbose > 0,
        ..ExecuteOptions::new(Mode::Install)
    };
    let pass = run_pass(&session, &opts, quiet, &mut AutoConfirm)?;

    finish(&pass, args.json, quiet)
}

fn run_pass<C: ConfirmCallback>(
    session: &Session,
    opts: &ExecuteOptions,
    hidden: bool,
    confirm: &mut C,
) -> Result<PassResult> {
    Ok(session.reconciler.run(
        &session.desired,
        opts,
        &mut PassProgress::new(hidden),
        confirm,
    )?)
}

fn finish(pass: &PassResult, json: bool, quiet: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(pass)?);
    } else if !quiet {
        differ::display_pass(pass);
        if pass.dry_run {
            ui::dim("Dry run: nothing was changed");
        }
    }

    if let Some(reason) = &pass.interrupted {
        bail!("Pass did not complete: {reason}");
    }
    if !pass.is_success() {
        bail!(
            "{} of {} resource(s) failed",
            pass.failures().count(),
            pass.outcomes.len()
        );
    }
    Ok(())
}
