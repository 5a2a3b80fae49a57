use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

const CONFIG_ENV: &str = "DRIVEMAP_CONFIG";

#[derive(Parser)]
#[command(name = "drivemap")]
#[command(version)]
#[command(
    about = "Provision logon, boot and network-change triggers and group-based drive mappings",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// The subcommand to run; a bare `drivemap` maps drives
    pub fn into_command(self) -> Command {
        self.command.unwrap_or_else(|| {
            Command::Map(MapArgs {
                source: SourceArgs {
                    config: std::env::var_os(CONFIG_ENV).map(PathBuf::from),
                    ..SourceArgs::default()
                },
                ..MapArgs::default()
            })
        })
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Stage files, then create or update triggers and map drives
    Install(InstallArgs),

    /// Remove every configured trigger and the staged files
    Uninstall(UninstallArgs),

    /// Map the drives the current user's groups call for (run by the triggers)
    Map(MapArgs),

    /// Show configured triggers and mappings against what is on the machine
    Status(StatusArgs),

    /// Preview what install (or uninstall) would change
    Diff(DiffArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Where the desired state comes from and which machine it is applied to
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Config file (JSON or TOML); defaults to config.json next to the executable
    #[arg(short, long, env = CONFIG_ENV)]
    pub config: Option<PathBuf>,

    /// Use these groups instead of asking the system (comma-separated)
    #[arg(long, value_name = "LIST")]
    pub groups: Option<String>,

    /// Run against empty in-memory stores instead of the real machine
    #[arg(long)]
    pub simulate: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct PassArgs {
    /// Only reconcile resources matching `type` or `type.name` (e.g. `triggers`, `drives.F:`)
    #[arg(long)]
    pub only: Option<String>,

    /// Show what would change without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Do not start another resource after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Print the pass result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct InstallArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub pass: PassArgs,

    /// Do not copy files into the target directory
    #[arg(long)]
    pub no_stage: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct UninstallArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub pass: PassArgs,

    /// Leave the target directory in place
    #[arg(long)]
    pub keep_files: bool,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct MapArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Show what would change without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Print the pass result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct StatusArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Print the snapshot as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct DiffArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Only show resources matching `type` or `type.name`
    #[arg(long)]
    pub only: Option<String>,

    /// Preview an uninstall instead of an install
    #[arg(long)]
    pub uninstall: bool,

    /// Print the diffs as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_install() {
        let cli = Cli::try_parse_from([
            "drivemap",
            "install",
            "--config",
            "cfg.toml",
            "--only",
            "triggers",
            "--timeout",
            "30",
            "--groups",
            "Finance,IT",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Some(Command::Install(args)) => {
                assert_eq!(args.source.config, Some(PathBuf::from("cfg.toml")));
                assert_eq!(args.source.groups.as_deref(), Some("Finance,IT"));
                assert_eq!(args.pass.only.as_deref(), Some("triggers"));
                assert_eq!(args.pass.timeout, Some(30));
                assert!(!args.no_stage);
            }
            _ => panic!("expected install"),
        }
    }

    #[test]
    fn test_parse_uninstall_flags() {
        let cli =
            Cli::try_parse_from(["drivemap", "uninstall", "--yes", "--keep-files"]).unwrap();
        match cli.command {
            Some(Command::Uninstall(args)) => {
                assert!(args.yes);
                assert!(args.keep_files);
            }
            _ => panic!("expected uninstall"),
        }
    }

    #[test]
    fn test_bare_invocation_maps_drives() {
        let cli = Cli::try_parse_from(["drivemap"]).unwrap();
        assert!(cli.command.is_none());
        match cli.into_command() {
            Command::Map(args) => {
                assert!(!args.dry_run);
                assert!(!args.json);
                assert!(!args.source.simulate);
                assert!(args.source.groups.is_none());
            }
            _ => panic!("expected map"),
        }

        let cli = Cli::try_parse_from(["drivemap", "-q"]).unwrap();
        assert!(cli.quiet);
        assert!(matches!(cli.into_command(), Command::Map(_)));
    }
}
