//! Resource trait for declarative state management
//!
//! A Resource represents something that can be in a certain state,
//! and can be changed to reach a desired state or removed again.

use crate::context::ApplyContext;
use crate::types::{ApplyResult, Mode, ResourceState};
use anyhow::Result;
use std::fmt;

/// Core trait for declarative resources
///
/// Every resource in the system implements this trait, which provides:
/// - Identity (id, description, type)
/// - State detection (current vs desired)
/// - State convergence (apply) and removal (remove)
///
/// Resources must not cache what `current_state` returned across a write:
/// `apply` and `remove` re-read the machine before acting.
pub trait Resource: Send + Sync + fmt::Debug {
    /// Unique identifier for this resource
    ///
    /// Stable across runs, since it is the only handle used to find what an
    /// earlier pass created. Examples:
    /// - "DriveMapper.exe_Boot" for a scheduled trigger
    /// - "Z:" for a drive mapping
    fn id(&self) -> String;

    /// Human-readable description of what this resource does
    fn description(&self) -> String;

    /// Resource type category, used for grouping and filtering
    fn resource_type(&self) -> &'static str;

    /// Detect the current state of this resource
    fn current_state(&self) -> Result<ResourceState>;

    /// Get the desired state for this resource in install mode
    fn desired_state(&self) -> ResourceState;

    /// Desired state for a given pass direction
    fn desired_state_for(&self, mode: Mode) -> ResourceState {
        match mode {
            Mode::Install => self.desired_state(),
            Mode::Uninstall if self.reversible() => ResourceState::Absent,
            Mode::Uninstall => ResourceState::Unknown,
        }
    }

    /// Apply changes to reach the desired state
    ///
    /// This method should:
    /// 1. Check if already in desired state (return NoChange)
    /// 2. Respect ctx.dry_run (return Skipped if true)
    /// 3. Make the necessary changes
    /// 4. Return the appropriate ApplyResult
    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult>;

    /// Remove the resource. Absence is not an error and yields NoChange.
    fn remove(&self, ctx: &mut ApplyContext) -> Result<ApplyResult>;

    /// Whether an uninstall pass should remove this resource
    fn reversible(&self) -> bool {
        true
    }
}

/// A boxed resource for type-erased storage
pub type BoxedResource = Box<dyn Resource>;
