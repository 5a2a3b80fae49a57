mod cli;
mod commands;
mod config;
mod engine;
mod groups;
mod inspector;
mod naming;
mod progress;
mod resource;
mod staging;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    match cli.into_command() {
        Command::Install(args) => commands::reconcile::install(&ctx, &args),
        Command::Uninstall(args) => commands::reconcile::uninstall(&ctx, &args),
        Command::Map(args) => commands::reconcile::map(&ctx, &args),
        Command::Status(args) => commands::status::status(&ctx, &args),
        Command::Diff(args) => commands::status::diff(&ctx, &args),
        Command::Completions { shell } => {
            generate(shell, &mut Cli::command(), "drivemap", &mut io::stdout());
            Ok(())
        }
    }
}
