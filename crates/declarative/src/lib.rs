//! # Declarative
//!
//! A small engine for declarative, idempotent reconciliation.
//!
//! ## Core Concepts
//!
//! - **Resource**: Something with state that can be managed (a scheduled
//!   trigger, a drive mapping)
//! - **ResourceState**: The current or desired state of a resource
//! - **ExecutionPlan**: An ordered list of resources for one pass
//! - **Executor**: Applies (install) or removes (uninstall) every resource,
//!   one at a time, and reports a [`PassResult`]
//!
//! Failures are caught per resource: a [`ResourceError`] carried inside an
//! `anyhow::Error` keeps its [`FailureKind`] in the report, and sibling
//! resources still run.
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{ExecuteOptions, ExecutionPlan, Mode, execute_simple};
//!
//! let mut plan = ExecutionPlan::new();
//! plan.add_resource(Box::new(my_resource));
//!
//! let pass = execute_simple(plan, &ExecuteOptions::new(Mode::Install))?;
//! for (outcome, kind, error) in pass.failures() {
//!     eprintln!("{}: {kind}: {error}", outcome.id);
//! }
//! ```

pub mod context;
pub mod diff;
pub mod error;
pub mod executor;
pub mod planner;
pub mod resource;
pub mod types;

// Re-export main types at crate root
pub use context::{
    ApplyContext, AutoConfirm, AutoDecline, CancelToken, ConfirmCallback, NoProgress,
    ProgressCallback,
};
pub use diff::{DiffSummary, ResourceDiff, compute_diffs, group_by_type};
pub use error::{ResourceError, classify};
pub use executor::{PassResult, ResourceOutcome, ResourcePhase, execute, execute_simple};
pub use planner::ExecutionPlan;
pub use resource::{BoxedResource, Resource};
pub use types::{
    ApplyResult, ExecuteOptions, ExecuteSummary, FailureKind, Mode, ResourceState,
};
