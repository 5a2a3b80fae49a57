//! Command implementations

pub mod reconcile;
pub mod status;

use anyhow::{Result, bail};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::cli::{PassArgs, SourceArgs};
use crate::config::{self, DesiredState, Origin};
use crate::engine::{Backends, ReconcileError, Reconciler, ValidatedState};
use crate::groups::{self, StaticGroups, SystemGroups, UserGroups};
use crate::ui;
use declarative::{ExecuteOptions, Mode};

/// Everything a command needs: the loaded config and a reconciler for this machine
pub struct Session {
    pub origin: Origin,
    pub config_path: PathBuf,
    pub desired: DesiredState,
    pub reconciler: Reconciler,
    pub simulated: bool,
}

impl Session {
    pub fn open(source: &SourceArgs, only: Option<&str>) -> Result<Self> {
        let origin = Origin::current()?;
        let config_path = config::resolve_path(source.config.as_deref(), &origin)?;
        let desired = config::load(&config_path, &origin)?;
        log::debug!(
            "Loaded {} trigger spec(s) and {} drive mapping(s) from {}",
            desired.trigger_specs.len(),
            desired.drive_mappings.len(),
            config_path.display()
        );

        let backends = if source.simulate {
            log::info!("Using in-memory stores; the machine is not touched");
            Backends::simulated()
        } else {
            Backends::system()
        };

        let reconciler = Reconciler::new(backends, resolve_groups(source)).only(only);

        Ok(Self {
            origin,
            config_path,
            desired,
            reconciler,
            simulated: source.simulate,
        })
    }

    /// Validate, printing every violation on failure
    pub fn validated(&self) -> Result<ValidatedState> {
        match self.reconciler.validate(&self.desired) {
            Ok(state) => Ok(state),
            Err(ReconcileError::Invalid(errors)) => {
                ui::error(&format!("{} is invalid:", self.config_path.display()));
                for error in &errors {
                    println!("    - {error}");
                }
                bail!("{} configuration error(s); nothing was changed", errors.len())
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn resolve_groups(source: &SourceArgs) -> UserGroups {
    let username = groups::current_username();
    match &source.groups {
        Some(list) => UserGroups::resolve(
            &StaticGroups::parse(list),
            Some(username.as_deref().unwrap_or("unknown")),
        ),
        None => UserGroups::resolve(&SystemGroups, username.as_deref()),
    }
}

/// Execution options from the shared pass flags
pub fn pass_options(mode: Mode, pass: &PassArgs, verbose: bool) -> ExecuteOptions {
    ExecuteOptions {
        dry_run: pass.dry_run,
        verbose,
        deadline: pass
            .timeout
            .map(|secs| Instant::now() + Duration::from_secs(secs)),
        ..ExecuteOptions::new(mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_options() {
        let pass = PassArgs {
            dry_run: true,
            timeout: Some(60),
            ..PassArgs::default()
        };
        let opts = pass_options(Mode::Uninstall, &pass, false);
        assert_eq!(opts.mode, Mode::Uninstall);
        assert!(opts.dry_run);
        assert!(opts.deadline.is_some());
        assert!(opts.interruption().is_none());

        let opts = pass_options(Mode::Install, &PassArgs::default(), true);
        assert!(opts.deadline.is_none());
        assert!(opts.verbose);
    }

    #[test]
    fn test_group_override() {
        let source = SourceArgs {
            groups: Some("Finance, IT".to_string()),
            ..SourceArgs::default()
        };
        let groups = resolve_groups(&source);
        assert!(groups.contains("finance"));
        assert!(groups.contains("it"));
        assert!(!groups.contains("HR"));
    }
}
