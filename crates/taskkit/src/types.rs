//! Core types for scheduled triggers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Delay applied to logon and boot triggers so dependent services
/// (network stack, directory client) are up before the action runs.
pub const SETTLE_DELAY: Duration = Duration::from_secs(10);

/// Event channel that reports network connectivity changes.
pub const NETWORK_PROFILE_CHANNEL: &str = "Microsoft-Windows-NetworkProfile/Operational";

/// Provider emitting the network connectivity events.
pub const NETWORK_PROFILE_PROVIDER: &str = "Microsoft-Windows-NetworkProfile";

/// Network connected (10000) and disconnected (10001).
pub const NETWORK_PROFILE_EVENTS: [u32; 2] = [10000, 10001];

/// The activation condition of a trigger, as configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TriggerKind {
    /// Interactive session start
    Logon,
    /// System startup
    Boot,
    /// Network connectivity change
    NetworkChange,
}

impl TriggerKind {
    /// All kinds, in naming order.
    pub const ALL: [TriggerKind; 3] = [Self::Logon, Self::NetworkChange, Self::Boot];

    /// Name suffix used when a trigger has no explicit name.
    pub fn name_suffix(&self) -> &'static str {
        match self {
            Self::Logon => "",
            Self::NetworkChange => "_NetworkChange",
            Self::Boot => "_Boot",
        }
    }

    /// The full activation condition for this kind.
    pub fn trigger(&self) -> Trigger {
        match self {
            Self::Logon => Trigger::Logon {
                delay: SETTLE_DELAY,
            },
            Self::Boot => Trigger::Boot {
                delay: SETTLE_DELAY,
            },
            Self::NetworkChange => Trigger::NetworkChange {
                channel: NETWORK_PROFILE_CHANNEL.to_string(),
                event_ids: NETWORK_PROFILE_EVENTS.to_vec(),
            },
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Logon => write!(f, "logon"),
            Self::Boot => write!(f, "boot"),
            Self::NetworkChange => write!(f, "network change"),
        }
    }
}

/// An activation condition with its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Fires on interactive logon after `delay`
    Logon { delay: Duration },
    /// Fires at system startup after `delay`
    Boot { delay: Duration },
    /// Fires on any of `event_ids` in `channel`
    NetworkChange { channel: String, event_ids: Vec<u32> },
}

impl Trigger {
    pub fn kind(&self) -> TriggerKind {
        match self {
            Self::Logon { .. } => TriggerKind::Logon,
            Self::Boot { .. } => TriggerKind::Boot,
            Self::NetworkChange { .. } => TriggerKind::NetworkChange,
        }
    }

    /// Compare ignoring event id order.
    pub fn same_condition(&self, other: &Trigger) -> bool {
        match (self, other) {
            (
                Self::NetworkChange {
                    channel: a,
                    event_ids: ids_a,
                },
                Self::NetworkChange {
                    channel: b,
                    event_ids: ids_b,
                },
            ) => {
                let mut ids_a = ids_a.clone();
                let mut ids_b = ids_b.clone();
                ids_a.sort_unstable();
                ids_b.sort_unstable();
                a.eq_ignore_ascii_case(b) && ids_a == ids_b
            }
            _ => self == other,
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Logon { delay } => write!(f, "logon +{}s", delay.as_secs()),
            Self::Boot { delay } => write!(f, "boot +{}s", delay.as_secs()),
            Self::NetworkChange { event_ids, .. } => {
                let ids: Vec<String> = event_ids.iter().map(u32::to_string).collect();
                write!(f, "network events {}", ids.join("/"))
            }
        }
    }
}

/// Identity a task runs as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Principal {
    /// Whoever is logged on interactively
    InteractiveUser,
    /// The machine-wide service account (LocalSystem)
    System,
    /// Members of a group, e.g. "Authenticated Users"
    Group(String),
}

/// Well-known groups that Task Scheduler stores by SID.
const WELL_KNOWN_GROUPS: [(&str, &str); 3] = [
    ("Authenticated Users", "S-1-5-11"),
    ("Users", "S-1-5-32-545"),
    ("Administrators", "S-1-5-32-544"),
];

/// SID of the LocalSystem account.
pub const SYSTEM_SID: &str = "S-1-5-18";

impl Principal {
    /// Value for `<GroupId>`: the SID for well-known groups, the name otherwise.
    pub fn group_id(name: &str) -> String {
        WELL_KNOWN_GROUPS
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map_or_else(|| name.to_string(), |(_, sid)| (*sid).to_string())
    }

    /// Inverse of [`Principal::group_id`].
    pub fn group_name(id: &str) -> String {
        WELL_KNOWN_GROUPS
            .iter()
            .find(|(_, sid)| sid.eq_ignore_ascii_case(id))
            .map_or_else(|| id.to_string(), |(n, _)| (*n).to_string())
    }

    pub fn same_identity(&self, other: &Principal) -> bool {
        match (self, other) {
            (Self::Group(a), Self::Group(b)) => {
                Self::group_id(a).eq_ignore_ascii_case(&Self::group_id(b))
            }
            _ => self == other,
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InteractiveUser => write!(f, "interactive user"),
            Self::System => write!(f, "SYSTEM"),
            Self::Group(name) => write!(f, "group {name}"),
        }
    }
}

/// Privilege level of the running task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunLevel {
    /// Standard user token
    #[default]
    Limited,
    /// Elevated token when available
    Highest,
}

impl RunLevel {
    pub fn xml_value(&self) -> &'static str {
        match self {
            Self::Limited => "LeastPrivilege",
            Self::Highest => "HighestAvailable",
        }
    }
}

/// Everything needed to register one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDefinition {
    /// Task name in the scheduler root folder
    pub name: String,
    /// Absolute path of the program to run
    pub command: String,
    /// Arguments passed to the program
    pub arguments: String,
    /// Activation condition
    pub trigger: Trigger,
    /// Run-as identity
    pub principal: Principal,
    /// Privilege level
    pub run_level: RunLevel,
}

impl TaskDefinition {
    pub fn new(
        name: impl Into<String>,
        command: impl Into<String>,
        arguments: impl Into<String>,
        kind: TriggerKind,
    ) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            arguments: arguments.into(),
            trigger: kind.trigger(),
            principal: Principal::Group("Authenticated Users".to_string()),
            run_level: RunLevel::Limited,
        }
    }

    pub fn with_principal(mut self, principal: Principal, run_level: RunLevel) -> Self {
        self.principal = principal;
        self.run_level = run_level;
        self
    }

    /// Registration description shown in the Task Scheduler UI.
    pub fn description(&self) -> String {
        let program = self
            .command
            .rsplit(['\\', '/'])
            .next()
            .unwrap_or(&self.command);
        format!("Run {program} on {}", self.trigger.kind())
    }

    /// Differences between this definition and an installed task.
    ///
    /// Empty when the installed task already does what this one describes.
    pub fn drift(&self, installed: &InstalledTask) -> Vec<String> {
        let mut drift = Vec::new();

        match &installed.trigger {
            Some(t) if t.same_condition(&self.trigger) => {}
            Some(t) => drift.push(format!("trigger {t} -> {}", self.trigger)),
            None => drift.push(format!("unmanaged trigger -> {}", self.trigger)),
        }
        match &installed.command {
            Some(c) if c.eq_ignore_ascii_case(&self.command) => {}
            Some(c) => drift.push(format!("command {c} -> {}", self.command)),
            None => drift.push(format!("unmanaged action -> {}", self.command)),
        }
        if installed.arguments != self.arguments {
            drift.push(format!(
                "arguments '{}' -> '{}'",
                installed.arguments, self.arguments
            ));
        }
        match &installed.principal {
            Some(p) if p.same_identity(&self.principal) => {}
            Some(p) => drift.push(format!("run as {p} -> {}", self.principal)),
            None => drift.push(format!("unknown identity -> {}", self.principal)),
        }
        if installed.run_level != self.run_level {
            drift.push(format!(
                "run level {} -> {}",
                installed.run_level.xml_value(),
                self.run_level.xml_value()
            ));
        }

        drift
    }
}

/// A task as read back from the scheduler.
///
/// `trigger`, `command` and `principal` are `None` when the installed task
/// uses something this crate does not create: another trigger type or
/// several triggers, a non-`Exec` action, a stored-password logon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledTask {
    pub name: String,
    pub trigger: Option<Trigger>,
    pub command: Option<String>,
    pub arguments: String,
    pub principal: Option<Principal>,
    pub run_level: RunLevel,
}

impl From<&TaskDefinition> for InstalledTask {
    fn from(def: &TaskDefinition) -> Self {
        Self {
            name: def.name.clone(),
            trigger: Some(def.trigger.clone()),
            command: Some(def.command.clone()),
            arguments: def.arguments.clone(),
            principal: Some(def.principal.clone()),
            run_level: def.run_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_activation_parameters() {
        assert_eq!(
            TriggerKind::Logon.trigger(),
            Trigger::Logon {
                delay: Duration::from_secs(10)
            }
        );
        match TriggerKind::NetworkChange.trigger() {
            Trigger::NetworkChange { channel, event_ids } => {
                assert_eq!(channel, NETWORK_PROFILE_CHANNEL);
                assert_eq!(event_ids, vec![10000, 10001]);
            }
            other => panic!("unexpected trigger {other:?}"),
        }
    }

    #[test]
    fn test_drift_empty_for_same_definition() {
        let def = TaskDefinition::new("m", r"C:\Tools\m.exe", "--quiet", TriggerKind::Boot);
        assert!(def.drift(&InstalledTask::from(&def)).is_empty());
    }

    #[test]
    fn test_drift_ignores_case_of_command_and_group_sid() {
        let def = TaskDefinition::new("m", r"C:\Tools\m.exe", "", TriggerKind::Logon);
        let mut installed = InstalledTask::from(&def);
        installed.command = Some(r"c:\tools\M.EXE".to_string());
        installed.principal = Some(Principal::Group("S-1-5-11".to_string()));
        assert!(def.drift(&installed).is_empty());
    }

    #[test]
    fn test_drift_reports_changed_fields() {
        let def = TaskDefinition::new("m", r"C:\Tools\m.exe", "a", TriggerKind::Logon);
        let mut installed = InstalledTask::from(&def);
        installed.arguments = "b".to_string();
        installed.trigger = Some(TriggerKind::Boot.trigger());

        let drift = def.drift(&installed);
        assert_eq!(drift.len(), 2);
        assert!(drift.iter().any(|d| d.starts_with("trigger")));
        assert!(drift.iter().any(|d| d.starts_with("arguments")));
    }

    #[test]
    fn test_description_uses_program_file_name() {
        let def = TaskDefinition::new("m", r"C:\Tools\m.exe", "", TriggerKind::NetworkChange);
        assert_eq!(def.description(), "Run m.exe on network change");
    }
}
