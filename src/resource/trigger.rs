//! Scheduled trigger resource

use anyhow::{Context, Result};
use std::fmt;
use std::sync::Arc;
use taskkit::{ErrorCategory, Scheduler, TaskDefinition};

use super::{ApplyContext, ApplyResult, Resource, ResourceState, SCHEDULED_TASK, task_error};

/// One named task that runs the program on a trigger
///
/// A disabled trigger is one that must not exist: installing it removes any
/// task left under its name.
pub struct ScheduledTrigger {
    definition: TaskDefinition,
    enabled: bool,
    scheduler: Arc<dyn Scheduler>,
}

impl ScheduledTrigger {
    pub fn new(definition: TaskDefinition, enabled: bool, scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            definition,
            enabled,
            scheduler,
        }
    }

    pub fn definition(&self) -> &TaskDefinition {
        &self.definition
    }

    fn delete_if_present(&self) -> Result<ApplyResult> {
        let name = &self.definition.name;
        if self.scheduler.query(name).map_err(task_error)?.is_none() {
            return Ok(ApplyResult::NoChange);
        }

        match self.scheduler.delete(name) {
            Ok(()) => Ok(ApplyResult::Removed),
            // gone between the query and the delete
            Err(e) if e.category() == ErrorCategory::NotFound => Ok(ApplyResult::NoChange),
            Err(e) => Err(task_error(e)).with_context(|| format!("Failed to delete task {name}")),
        }
    }
}

impl fmt::Debug for ScheduledTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledTrigger")
            .field("definition", &self.definition)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl Resource for ScheduledTrigger {
    fn id(&self) -> String {
        self.definition.name.clone()
    }

    fn description(&self) -> String {
        self.definition.description()
    }

    fn resource_type(&self) -> &'static str {
        SCHEDULED_TASK
    }

    fn current_state(&self) -> Result<ResourceState> {
        let installed = self
            .scheduler
            .query(&self.definition.name)
            .map_err(task_error)?;

        Ok(match installed {
            None => ResourceState::Absent,
            Some(task) => {
                let drift = self.definition.drift(&task);
                if drift.is_empty() {
                    ResourceState::Present {
                        details: Some(self.definition.description()),
                    }
                } else {
                    ResourceState::Modified {
                        from: drift.join("; "),
                        to: self.definition.description(),
                    }
                }
            }
        })
    }

    fn desired_state(&self) -> ResourceState {
        if self.enabled {
            ResourceState::Present {
                details: Some(self.definition.description()),
            }
        } else {
            ResourceState::Absent
        }
    }

    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult> {
        if !self.enabled {
            if ctx.dry_run {
                return Ok(ApplyResult::Skipped {
                    reason: "dry run".to_string(),
                });
            }
            return self.delete_if_present();
        }

        let name = &self.definition.name;
        let result = match self.scheduler.query(name).map_err(task_error)? {
            None => ApplyResult::Created,
            Some(installed) => {
                let drift = self.definition.drift(&installed);
                if drift.is_empty() {
                    return Ok(ApplyResult::NoChange);
                }
                log::info!("Task {name} differs: {}", drift.join("; "));
                ApplyResult::Modified
            }
        };

        if ctx.dry_run {
            return Ok(ApplyResult::Skipped {
                reason: "dry run".to_string(),
            });
        }

        // create-or-replace in one scheduler call
        self.scheduler
            .register(&self.definition)
            .map_err(task_error)
            .with_context(|| format!("Failed to register task {name}"))?;

        Ok(result)
    }

    fn remove(&self, ctx: &mut ApplyContext) -> Result<ApplyResult> {
        if ctx.dry_run {
            return Ok(ApplyResult::Skipped {
                reason: "dry run".to_string(),
            });
        }
        self.delete_if_present()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{FailureKind, classify};
    use taskkit::{InstalledTask, MemoryScheduler, SchedulerCall, TriggerKind};

    fn definition(kind: TriggerKind) -> TaskDefinition {
        TaskDefinition::new(
            format!("DriveMapper.exe{}", kind.name_suffix()),
            r"C:\Program Files\DriveMapper\DriveMapper.exe",
            "map",
            kind,
        )
    }

    fn mutations(scheduler: &MemoryScheduler) -> Vec<SchedulerCall> {
        scheduler
            .calls()
            .into_iter()
            .filter(SchedulerCall::is_mutation)
            .collect()
    }

    #[test]
    fn test_apply_creates_then_no_change() {
        let scheduler = Arc::new(MemoryScheduler::new());
        let trigger = ScheduledTrigger::new(definition(TriggerKind::Logon), true, scheduler.clone());
        let mut ctx = ApplyContext::new(false, false);

        assert_eq!(trigger.current_state().unwrap(), ResourceState::Absent);
        assert!(matches!(trigger.apply(&mut ctx).unwrap(), ApplyResult::Created));
        assert_eq!(trigger.current_state().unwrap(), trigger.desired_state());

        scheduler.clear_calls();
        assert!(matches!(trigger.apply(&mut ctx).unwrap(), ApplyResult::NoChange));
        assert!(mutations(&scheduler).is_empty());
    }

    #[test]
    fn test_apply_replaces_drifted_task() {
        let scheduler = Arc::new(MemoryScheduler::new());
        let def = definition(TriggerKind::Boot);
        let mut stale = InstalledTask::from(&def);
        stale.arguments = "--old".to_string();
        scheduler.insert(stale);

        let trigger = ScheduledTrigger::new(def.clone(), true, scheduler.clone());
        assert!(matches!(
            trigger.current_state().unwrap(),
            ResourceState::Modified { .. }
        ));

        let result = trigger.apply(&mut ApplyContext::new(false, false)).unwrap();
        assert!(matches!(result, ApplyResult::Modified));
        assert_eq!(
            mutations(&scheduler),
            vec![SchedulerCall::Register(def.name.clone())]
        );
        assert_eq!(scheduler.get(&def.name).unwrap().arguments, "map");
    }

    #[test]
    fn test_apply_replaces_task_without_exec_action() {
        let scheduler = Arc::new(MemoryScheduler::new());
        let def = definition(TriggerKind::Logon);
        let mut foreign = InstalledTask::from(&def);
        foreign.command = None;
        scheduler.insert(foreign);

        let trigger = ScheduledTrigger::new(def.clone(), true, scheduler.clone());
        let ResourceState::Modified { from, .. } = trigger.current_state().unwrap() else {
            panic!("a task without an exec action should be drift");
        };
        assert!(from.starts_with("unmanaged action"));

        let result = trigger.apply(&mut ApplyContext::new(false, false)).unwrap();
        assert!(matches!(result, ApplyResult::Modified));
        assert_eq!(
            mutations(&scheduler),
            vec![SchedulerCall::Register(def.name.clone())]
        );
        assert_eq!(
            scheduler.get(&def.name).unwrap().command.as_deref(),
            Some(def.command.as_str())
        );
    }

    #[test]
    fn test_disabled_trigger_is_removed_on_install() {
        let scheduler = Arc::new(MemoryScheduler::new());
        let def = definition(TriggerKind::NetworkChange);
        scheduler.insert(InstalledTask::from(&def));

        let trigger = ScheduledTrigger::new(def.clone(), false, scheduler.clone());
        let mut ctx = ApplyContext::new(false, false);
        assert!(matches!(trigger.apply(&mut ctx).unwrap(), ApplyResult::Removed));
        assert!(scheduler.get(&def.name).is_none());

        scheduler.clear_calls();
        assert!(matches!(trigger.apply(&mut ctx).unwrap(), ApplyResult::NoChange));
        assert!(mutations(&scheduler).is_empty());
    }

    #[test]
    fn test_remove_absent_is_no_change() {
        let scheduler = Arc::new(MemoryScheduler::new());
        let trigger = ScheduledTrigger::new(definition(TriggerKind::Logon), true, scheduler);
        let result = trigger.remove(&mut ApplyContext::new(false, false)).unwrap();
        assert!(matches!(result, ApplyResult::NoChange));
    }

    #[test]
    fn test_register_failure_keeps_kind() {
        let scheduler = Arc::new(MemoryScheduler::new());
        let def = definition(TriggerKind::Logon);
        scheduler.fail_register(&def.name, ErrorCategory::PermissionDenied);

        let trigger = ScheduledTrigger::new(def, true, scheduler);
        let err = trigger.apply(&mut ApplyContext::new(false, false)).unwrap_err();
        let (kind, message) = classify(&err);
        assert_eq!(kind, FailureKind::PermissionDenied);
        assert!(message.contains("Failed to register task DriveMapper.exe"));
    }
}
