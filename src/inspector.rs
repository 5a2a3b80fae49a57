//! State inspector: what is on the machine versus what the config names
//!
//! Machine state is never stored; every report reads the scheduler and the
//! drive table afresh, looking things up by the names a pass would use.

use crate::engine::{Backends, ValidatedState};
use crate::groups::UserGroups;
use crate::naming::is_default_name;
use chrono::{DateTime, Utc};
use serde::Serialize;
use taskkit::TriggerKind;

/// Observed state of one expected entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "camelCase")]
pub enum EntryState {
    /// Present and matching
    InSync,
    /// Not present
    Absent,
    /// Present but different
    Drifted(Vec<String>),
    /// Present though the config disables it
    Unwanted,
    /// Not evaluated for this user
    NotApplicable(String),
    /// Could not be read
    Unreadable(String),
}

impl EntryState {
    pub fn is_in_sync(&self) -> bool {
        matches!(self, Self::InSync | Self::NotApplicable(_))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerStatus {
    pub name: String,
    pub kind: TriggerKind,
    pub enabled: bool,
    #[serde(flatten)]
    pub state: EntryState,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveStatus {
    pub letter: String,
    pub label: String,
    pub group: String,
    pub remote_path: String,
    #[serde(flatten)]
    pub state: EntryState,
}

/// Everything the inspector found
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineSnapshot {
    pub taken_at: DateTime<Utc>,
    pub triggers: Vec<TriggerStatus>,
    pub drives: Vec<DriveStatus>,
    /// Tasks following the default naming scheme that no spec names
    pub orphans: Vec<String>,
}

impl MachineSnapshot {
    pub fn is_in_sync(&self) -> bool {
        self.triggers.iter().all(|t| t.state.is_in_sync())
            && self.drives.iter().all(|d| d.state.is_in_sync())
    }
}

/// Read the current state of every declared trigger and mapping
pub fn inspect(state: &ValidatedState, groups: &UserGroups, backends: &Backends) -> MachineSnapshot {
    let triggers = state
        .triggers
        .iter()
        .map(|trigger| {
            let definition = trigger.definition(&state.executable_path);

            let observed = match backends.scheduler.query(&trigger.name) {
                Err(e) => EntryState::Unreadable(e.to_string()),
                Ok(None) if trigger.spec.enabled => EntryState::Absent,
                Ok(None) => EntryState::InSync,
                Ok(Some(_)) if !trigger.spec.enabled => EntryState::Unwanted,
                Ok(Some(installed)) => {
                    let drift = definition.drift(&installed);
                    if drift.is_empty() {
                        EntryState::InSync
                    } else {
                        EntryState::Drifted(drift)
                    }
                }
            };

            TriggerStatus {
                name: trigger.name.clone(),
                kind: trigger.spec.kind,
                enabled: trigger.spec.enabled,
                state: observed,
            }
        })
        .collect();

    let drives = state
        .drives
        .iter()
        .map(|drive| {
            let observed = if !groups.contains(&drive.group) {
                EntryState::NotApplicable(format!("not a member of {}", drive.group))
            } else {
                match backends.drives.query(drive.letter) {
                    Err(e) => EntryState::Unreadable(e.to_string()),
                    Ok(None) => EntryState::Absent,
                    Ok(Some(mapped)) if mapped.satisfies(&drive.remote) => EntryState::InSync,
                    Ok(Some(mapped)) => {
                        EntryState::Drifted(vec![format!("{} ({})", mapped.remote, mapped.status)])
                    }
                }
            };

            DriveStatus {
                letter: drive.letter.to_string(),
                label: drive.label.clone(),
                group: drive.group.clone(),
                remote_path: drive.remote.to_string(),
                state: observed,
            }
        })
        .collect();

    MachineSnapshot {
        taken_at: Utc::now(),
        triggers,
        drives,
        orphans: find_orphans(state, backends),
    }
}

fn find_orphans(state: &ValidatedState, backends: &Backends) -> Vec<String> {
    let names = match backends.scheduler.list() {
        Ok(names) => names,
        Err(e) => {
            log::warn!("Could not list scheduled tasks: {e}");
            return Vec::new();
        }
    };

    names
        .into_iter()
        .filter(|name| is_default_name(name, &state.executable_name))
        .filter(|name| {
            !state
                .triggers
                .iter()
                .any(|t| t.name.eq_ignore_ascii_case(name))
        })
        .collect()
}

/// Short label for an entry state
pub fn state_label(state: &EntryState) -> &'static str {
    match state {
        EntryState::InSync => "in sync",
        EntryState::Absent => "missing",
        EntryState::Drifted(_) => "drifted",
        EntryState::Unwanted => "present but disabled",
        EntryState::NotApplicable(_) => "not applicable",
        EntryState::Unreadable(_) => "unreadable",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DesiredState, DriveMapping, TriggerSpec};
    use crate::engine::validate;
    use drivekit::{ConnectionStatus, DriveLetter, MemoryDrives};
    use std::sync::Arc;
    use taskkit::{InstalledTask, MemoryScheduler, TaskDefinition};

    #[test]
    fn test_inspect_reports_each_entry() {
        let logon = TriggerSpec::new(TriggerKind::Logon, "map");
        let mut boot = TriggerSpec::new(TriggerKind::Boot, "map");
        boot.enabled = false;

        let desired = DesiredState {
            target_directory: r"C:\Apps\DriveMapper".to_string(),
            executable_name: "DriveMapper.exe".to_string(),
            trigger_specs: vec![logon, TriggerSpec::new(TriggerKind::NetworkChange, "map"), boot],
            drive_mappings: vec![
                DriveMapping::new("Finance", "Finance", "F", r"\\fs01\finance"),
                DriveMapping::new("Tools", "IT", "T", r"\\fs01\tools"),
            ],
        };
        let state = validate(&desired).unwrap();

        let scheduler = Arc::new(MemoryScheduler::new());
        let logon_def = TaskDefinition::new(
            "DriveMapper.exe",
            &state.executable_path,
            "map",
            TriggerKind::Logon,
        );
        scheduler.insert(InstalledTask::from(&logon_def));
        let mut stale_boot = InstalledTask::from(&logon_def);
        stale_boot.name = "DriveMapper.exe_Boot".to_string();
        scheduler.insert(stale_boot);

        let drives = Arc::new(MemoryDrives::new());
        drives.insert(
            DriveLetter::new('F').unwrap(),
            r"\\fs09\finance",
            ConnectionStatus::Ok,
        );

        let backends = Backends {
            scheduler,
            drives,
        };
        let groups = UserGroups::new(["finance".to_string()]);
        let snapshot = inspect(&state, &groups, &backends);

        let states: Vec<_> = snapshot.triggers.iter().map(|t| t.state.clone()).collect();
        assert_eq!(states[0], EntryState::InSync);
        assert_eq!(states[1], EntryState::Absent);
        assert_eq!(states[2], EntryState::Unwanted);

        assert!(matches!(snapshot.drives[0].state, EntryState::Drifted(_)));
        assert!(matches!(snapshot.drives[1].state, EntryState::NotApplicable(_)));
        assert!(!snapshot.is_in_sync());
        assert!(snapshot.orphans.is_empty());
    }

    #[test]
    fn test_orphans_follow_the_naming_scheme() {
        let desired = DesiredState {
            target_directory: r"C:\Apps\DriveMapper".to_string(),
            executable_name: "DriveMapper.exe".to_string(),
            trigger_specs: vec![TriggerSpec::new(TriggerKind::Logon, "map")],
            drive_mappings: Vec::new(),
        };
        let state = validate(&desired).unwrap();

        let scheduler = Arc::new(MemoryScheduler::new());
        for (name, kind) in [
            ("DriveMapper.exe_NetworkChange", TriggerKind::NetworkChange),
            ("SomethingElse", TriggerKind::Logon),
        ] {
            scheduler.insert(InstalledTask::from(&TaskDefinition::new(
                name, r"C:\x.exe", "", kind,
            )));
        }

        let backends = Backends {
            scheduler,
            drives: Arc::new(MemoryDrives::new()),
        };
        let snapshot = inspect(&state, &UserGroups::default(), &backends);
        assert_eq!(snapshot.orphans, vec!["DriveMapper.exe_NetworkChange"]);
    }
}
