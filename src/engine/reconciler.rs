//! Reconciler - the `reconcile(desired, mode)` entry point

use crate::config::DesiredState;
use crate::engine::Backends;
use crate::engine::planner::build_plan;
use crate::engine::validate::{ConfigError, ValidatedState, validate};
use crate::groups::UserGroups;
use declarative::{
    AutoConfirm, ConfirmCallback, ExecuteOptions, ExecutionPlan, Mode, NoProgress, PassResult,
    ProgressCallback, execute,
};
use thiserror::Error;

/// Why a pass could not run at all
///
/// Per-resource failures are not errors here: they are reported inside
/// the [`PassResult`].
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("invalid configuration: {}", summarize(.0))]
    Invalid(Vec<ConfigError>),

    #[error(transparent)]
    Engine(#[from] anyhow::Error),
}

fn summarize(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Runs passes against one set of backends for one user
pub struct Reconciler {
    backends: Backends,
    groups: UserGroups,
    target: Option<String>,
}

impl Reconciler {
    pub fn new(backends: Backends, groups: UserGroups) -> Self {
        Self {
            backends,
            groups,
            target: None,
        }
    }

    /// Restrict passes to `type` or `type.name`
    pub fn only(mut self, target: Option<&str>) -> Self {
        self.target = target.map(str::to_string);
        self
    }

    pub fn backends(&self) -> &Backends {
        &self.backends
    }

    pub fn groups(&self) -> &UserGroups {
        &self.groups
    }

    /// Validate without touching any backend
    pub fn validate(&self, desired: &DesiredState) -> Result<ValidatedState, ReconcileError> {
        validate(desired).map_err(ReconcileError::Invalid)
    }

    /// Validate and build the (filtered) plan
    pub fn plan(
        &self,
        desired: &DesiredState,
    ) -> Result<(ValidatedState, ExecutionPlan), ReconcileError> {
        let state = self.validate(desired)?;
        let plan = build_plan(&state, &self.groups, &self.backends)
            .filter_by_target(self.target.as_deref());
        Ok((state, plan))
    }

    /// One pass with no prompts and no progress output
    pub fn reconcile(&self, desired: &DesiredState, mode: Mode) -> Result<PassResult, ReconcileError> {
        self.run(
            desired,
            &ExecuteOptions::new(mode),
            &mut NoProgress,
            &mut AutoConfirm,
        )
    }

    /// One pass with caller-supplied options and callbacks
    pub fn run<P, C>(
        &self,
        desired: &DesiredState,
        opts: &ExecuteOptions,
        progress: &mut P,
        confirm: &mut C,
    ) -> Result<PassResult, ReconcileError>
    where
        P: ProgressCallback,
        C: ConfirmCallback,
    {
        let (_, plan) = self.plan(desired)?;
        log::info!(
            "{} pass over {} resource(s){}",
            opts.mode,
            plan.total_resources(),
            if opts.dry_run { " (dry run)" } else { "" }
        );

        let pass = execute(plan, opts, progress, confirm)?;
        for (outcome, kind, error) in pass.failures() {
            log::error!("{} failed ({kind}): {error}", outcome.id);
        }
        Ok(pass)
    }
}
