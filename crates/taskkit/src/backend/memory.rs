//! In-process scheduler for tests and simulated runs.
//!
//! Every call is appended to a log so callers can check exactly which
//! operations a pass performed, and in which order.

use crate::backend::Scheduler;
use crate::error::{Error, ErrorCategory, Result};
use crate::types::{InstalledTask, TaskDefinition};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

/// A recorded scheduler call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerCall {
    Query(String),
    Register(String),
    Delete(String),
    List,
}

impl SchedulerCall {
    /// Whether the call changes scheduler state.
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::Register(_) | Self::Delete(_))
    }
}

#[derive(Default)]
struct Inner {
    tasks: BTreeMap<String, InstalledTask>,
    calls: Vec<SchedulerCall>,
    register_failures: HashMap<String, ErrorCategory>,
}

/// Scheduler that keeps tasks in memory.
///
/// Task names compare case-insensitively, like the real store.
#[derive(Default)]
pub struct MemoryScheduler {
    inner: Mutex<Inner>,
}

impl MemoryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Seed a task as if an earlier run (or someone else) created it.
    pub fn insert(&self, task: InstalledTask) {
        self.lock().tasks.insert(task.name.to_lowercase(), task);
    }

    /// Make every `register` of `name` fail with `category`.
    pub fn fail_register(&self, name: &str, category: ErrorCategory) {
        self.lock()
            .register_failures
            .insert(name.to_lowercase(), category);
    }

    /// Current contents of the store.
    pub fn tasks(&self) -> Vec<InstalledTask> {
        self.lock().tasks.values().cloned().collect()
    }

    /// Look a task up without recording a call.
    pub fn get(&self, name: &str) -> Option<InstalledTask> {
        self.lock().tasks.get(&name.to_lowercase()).cloned()
    }

    /// Calls made so far.
    pub fn calls(&self) -> Vec<SchedulerCall> {
        self.lock().calls.clone()
    }

    /// Forget recorded calls, keeping the tasks.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }
}

impl Scheduler for MemoryScheduler {
    fn query(&self, name: &str) -> Result<Option<InstalledTask>> {
        let mut inner = self.lock();
        inner.calls.push(SchedulerCall::Query(name.to_string()));
        Ok(inner.tasks.get(&name.to_lowercase()).cloned())
    }

    fn register(&self, definition: &TaskDefinition) -> Result<()> {
        let mut inner = self.lock();
        inner
            .calls
            .push(SchedulerCall::Register(definition.name.clone()));

        let key = definition.name.to_lowercase();
        if let Some(category) = inner.register_failures.get(&key) {
            return Err(Error::from_category(
                *category,
                &definition.name,
                "simulated failure",
            ));
        }

        inner.tasks.insert(key, InstalledTask::from(definition));
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(SchedulerCall::Delete(name.to_string()));
        match inner.tasks.remove(&name.to_lowercase()) {
            Some(_) => Ok(()),
            None => Err(Error::NotFound {
                name: name.to_string(),
            }),
        }
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut inner = self.lock();
        inner.calls.push(SchedulerCall::List);
        Ok(inner.tasks.values().map(|t| t.name.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TriggerKind;

    #[test]
    fn test_register_replaces_and_delete_reports_absence() {
        let scheduler = MemoryScheduler::new();
        let def = TaskDefinition::new("Task", r"C:\a.exe", "", TriggerKind::Logon);
        scheduler.register(&def).unwrap();
        scheduler
            .register(&TaskDefinition {
                arguments: "x".to_string(),
                ..def
            })
            .unwrap();

        let stored = scheduler.query("TASK").unwrap().unwrap();
        assert_eq!(stored.arguments, "x");
        assert_eq!(scheduler.tasks().len(), 1);

        scheduler.delete("task").unwrap();
        let err = scheduler.delete("task").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_injected_register_failure() {
        let scheduler = MemoryScheduler::new();
        scheduler.fail_register("t", ErrorCategory::PermissionDenied);
        let def = TaskDefinition::new("t", r"C:\a.exe", "", TriggerKind::Boot);

        let err = scheduler.register(&def).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::PermissionDenied);
        assert!(scheduler.get("t").is_none());
    }
}
