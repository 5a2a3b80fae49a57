//! Reconciliation engine for drivemap
//!
//! A pass is `validate -> plan -> apply -> report`:
//! 1. Validation - every config violation, before any backend call
//! 2. Planning - one resource per trigger spec and drive mapping
//! 3. Applying - sequential, one failure never stops the others
//! 4. Reporting - a [`declarative::PassResult`] with one outcome per resource

pub mod differ;
pub mod planner;
pub mod reconciler;
pub mod validate;

pub use reconciler::{ReconcileError, Reconciler};
pub use validate::{ConfigError, ValidatedState, validate};

use drivekit::{DriveBackend, MemoryDrives};
use std::sync::Arc;
use taskkit::{MemoryScheduler, Scheduler};

/// The machine-global stores a pass reads and writes
#[derive(Clone)]
pub struct Backends {
    pub scheduler: Arc<dyn Scheduler>,
    pub drives: Arc<dyn DriveBackend>,
}

impl Backends {
    /// `schtasks.exe` and `net use`
    pub fn system() -> Self {
        Self {
            scheduler: Arc::new(taskkit::default_backend()),
            drives: Arc::new(drivekit::default_backend()),
        }
    }

    /// Empty in-memory stores, for `--simulate`
    pub fn simulated() -> Self {
        Self {
            scheduler: Arc::new(MemoryScheduler::new()),
            drives: Arc::new(MemoryDrives::new()),
        }
    }
}
