//! Execution engine - applies a plan one resource at a time
//!
//! Resources mutate process-external state (task store, drive table), so
//! they run strictly in order on the calling thread. One failure never stops
//! its siblings; it is recorded and the pass continues.

use crate::context::{ApplyContext, ConfirmCallback, ProgressCallback};
use crate::diff::compute_diffs;
use crate::error::classify;
use crate::planner::ExecutionPlan;
use crate::resource::Resource;
use crate::types::{ApplyResult, ExecuteOptions, ExecuteSummary, FailureKind, Mode};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of one declared resource within a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourcePhase {
    Pending,
    Applying,
    Applied,
    Failed,
}

/// Outcome of one resource in a pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceOutcome {
    pub id: String,
    pub resource_type: String,
    pub description: String,
    pub result: ApplyResult,
}

/// Skip reasons that leave the resource's change still owed
const OUTSTANDING: [&str; 4] = ["cancelled", "deadline exceeded", "declined", "dry run"];

impl ResourceOutcome {
    /// Terminal phase reached by this resource
    ///
    /// A deliberate skip (not a group member, not reversed on uninstall)
    /// counts as applied: nothing more is owed for it.
    pub fn phase(&self) -> ResourcePhase {
        match &self.result {
            ApplyResult::Failed { .. } => ResourcePhase::Failed,
            ApplyResult::Skipped { reason } if OUTSTANDING.contains(&reason.as_str()) => {
                ResourcePhase::Pending
            }
            _ => ResourcePhase::Applied,
        }
    }
}

/// Report of a whole reconciliation pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassResult {
    pub mode: Mode,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<ResourceOutcome>,
    /// Set when the pass stopped early (cancellation, deadline, declined)
    pub interrupted: Option<String>,
}

impl PassResult {
    fn begin(mode: Mode, dry_run: bool) -> Self {
        let now = Utc::now();
        Self {
            mode,
            dry_run,
            started_at: now,
            finished_at: now,
            outcomes: Vec::new(),
            interrupted: None,
        }
    }

    /// The pass failed if any resource failed or it did not run to the end
    pub fn is_success(&self) -> bool {
        self.interrupted.is_none() && self.outcomes.iter().all(|o| o.result.is_success())
    }

    /// Per-resource failures
    pub fn failures(&self) -> impl Iterator<Item = (&ResourceOutcome, FailureKind, &str)> {
        self.outcomes.iter().filter_map(|o| match &o.result {
            ApplyResult::Failed { kind, error } => Some((o, *kind, error.as_str())),
            _ => None,
        })
    }

    /// Find the outcome for a resource id
    pub fn outcome(&self, id: &str) -> Option<&ResourceOutcome> {
        self.outcomes.iter().find(|o| o.id == id)
    }

    /// Tally of results
    pub fn summary(&self) -> ExecuteSummary {
        let mut summary = ExecuteSummary::default();
        for outcome in &self.outcomes {
            summary.add_result(&outcome.result);
        }
        summary
    }

    fn record(&mut self, resource: &dyn Resource, result: ApplyResult) {
        self.outcomes.push(ResourceOutcome {
            id: resource.id(),
            resource_type: resource.resource_type().to_string(),
            description: resource.description(),
            result,
        });
    }
}

/// Execute a plan with the given options and callbacks
///
/// # Arguments
/// * `plan` - The execution plan to run
/// * `opts` - Execution options (mode, dry_run, cancellation)
/// * `progress` - Progress callback
/// * `confirm` - Confirmation callback, asked once when there are changes
///
/// # Returns
/// Per-resource outcomes. `Err` is reserved for failures of the engine
/// itself (e.g. the confirmation prompt could not be shown).
pub fn execute<P, C>(
    plan: ExecutionPlan,
    opts: &ExecuteOptions,
    progress: &mut P,
    confirm: &mut C,
) -> Result<PassResult>
where
    P: ProgressCallback,
    C: ConfirmCallback,
{
    let mut pass = PassResult::begin(opts.mode, opts.dry_run);

    if opts.dry_run {
        let diffs = compute_diffs(&plan.resources, opts.mode);
        for resource in &plan.resources {
            let result = match diffs.iter().find(|d| d.resource_id == resource.id()) {
                Some(_) => ApplyResult::Skipped {
                    reason: "dry run".to_string(),
                },
                None => ApplyResult::NoChange,
            };
            pass.record(resource.as_ref(), result);
        }
        pass.finished_at = Utc::now();
        return Ok(pass);
    }

    let pending = compute_diffs(&plan.resources, opts.mode);
    if !pending.is_empty() {
        let prompt = format!("Apply {} change(s) ({})?", pending.len(), opts.mode);
        if !confirm.confirm(&prompt)? {
            for resource in &plan.resources {
                pass.record(
                    resource.as_ref(),
                    ApplyResult::Skipped {
                        reason: "declined".to_string(),
                    },
                );
            }
            pass.interrupted = Some("declined".to_string());
            pass.finished_at = Utc::now();
            return Ok(pass);
        }
    }

    progress.on_pass_start(plan.resources.len(), opts.mode);

    for resource in &plan.resources {
        if let Some(reason) = opts.interruption() {
            log::warn!("Not starting {}: {}", resource.id(), reason);
            pass.record(
                resource.as_ref(),
                ApplyResult::Skipped {
                    reason: reason.to_string(),
                },
            );
            pass.interrupted = Some(reason.to_string());
            continue;
        }

        progress.on_resource_start(&resource.id(), &resource.description());
        let result = run_resource(resource.as_ref(), opts);
        progress.on_resource_complete(&resource.id(), &result);
        pass.record(resource.as_ref(), result);
    }

    progress.on_pass_complete();
    pass.finished_at = Utc::now();
    Ok(pass)
}

/// Apply or remove a single resource, catching its error at the boundary
fn run_resource(resource: &dyn Resource, opts: &ExecuteOptions) -> ApplyResult {
    let mut ctx = ApplyContext::new(false, opts.verbose);

    let outcome = match opts.mode {
        Mode::Install => resource.apply(&mut ctx),
        Mode::Uninstall if !resource.reversible() => {
            return ApplyResult::Skipped {
                reason: "not reversed on uninstall".to_string(),
            };
        }
        Mode::Uninstall => resource.remove(&mut ctx),
    };

    match outcome {
        Ok(result) => {
            log::debug!("{} {}: {:?}", opts.mode, resource.id(), result);
            result
        }
        Err(e) => {
            let (kind, error) = classify(&e);
            log::warn!("{} {} failed ({}): {}", opts.mode, resource.id(), kind, error);
            ApplyResult::Failed { kind, error }
        }
    }
}

/// Simple execution without callbacks
///
/// For basic use cases where you don't need progress or confirmation.
pub fn execute_simple(plan: ExecutionPlan, opts: &ExecuteOptions) -> Result<PassResult> {
    use crate::context::{AutoConfirm, NoProgress};

    execute(plan, opts, &mut NoProgress, &mut AutoConfirm)
}
