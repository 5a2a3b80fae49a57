//! Backend abstraction for the Task Scheduler.
//!
//! The [`Scheduler`] trait is the whole surface the provisioner needs:
//! look a task up by name, register (create or replace) it, delete it.

pub mod memory;
pub mod schtasks;

use crate::error::Result;
use crate::types::{InstalledTask, TaskDefinition};

/// Backend trait for scheduled task operations.
pub trait Scheduler: Send + Sync {
    /// Read a task by name; `Ok(None)` when it does not exist.
    fn query(&self, name: &str) -> Result<Option<InstalledTask>>;

    /// Create the task, or replace an existing task of the same name in a
    /// single scheduler call.
    fn register(&self, definition: &TaskDefinition) -> Result<()>;

    /// Delete a task. Returns `Error::NotFound` when it does not exist.
    fn delete(&self, name: &str) -> Result<()>;

    /// Names of all tasks in the root folder.
    fn list(&self) -> Result<Vec<String>>;
}

/// Get the default backend (`schtasks.exe`).
pub fn default_backend() -> schtasks::SchtasksBackend {
    schtasks::SchtasksBackend::new()
}
