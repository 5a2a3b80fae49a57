//! Validation pass
//!
//! Runs before any backend call and reports every violation it finds, so a
//! bad config never leaves the machine half-applied.

use crate::config::{DesiredState, TriggerSpec};
use crate::naming::derive_trigger_name;
use drivekit::{DriveLetter, RemotePath};
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use taskkit::TaskDefinition;
use thiserror::Error;

/// A single configuration violation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("executable name is empty")]
    EmptyExecutableName,

    #[error("executable name '{0}' must be a file name, not a path")]
    ExecutableNameIsPath(String),

    #[error("target directory is empty")]
    EmptyTargetDirectory,

    #[error("target directory '{0}' is not an absolute path")]
    RelativeTargetDirectory(String),

    #[error("target directory '{path}' cannot be expanded: {message}")]
    UnexpandableTargetDirectory { path: String, message: String },

    #[error("trigger name '{name}' is produced by more than one spec (#{first} and #{second})")]
    DuplicateTriggerName {
        name: String,
        first: usize,
        second: usize,
    },

    #[error("drive letter {letter} is used by more than one mapping ('{first}' and '{second}')")]
    DuplicateDriveLetter {
        letter: DriveLetter,
        first: String,
        second: String,
    },

    #[error("drive mapping '{mapping}' has no group")]
    EmptyGroup { mapping: String },

    #[error("drive mapping '{mapping}': {message}")]
    InvalidDriveLetter { mapping: String, message: String },

    #[error("drive mapping '{mapping}': {message}")]
    InvalidRemotePath { mapping: String, message: String },
}

/// A trigger spec with its resolved name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedTrigger {
    pub name: String,
    pub spec: TriggerSpec,
}

impl PlannedTrigger {
    /// The task this trigger registers, running `executable_path`
    pub fn definition(&self, executable_path: &str) -> TaskDefinition {
        TaskDefinition::new(
            &self.name,
            executable_path,
            &self.spec.arguments,
            self.spec.kind,
        )
        .with_principal(self.spec.run_as.clone(), self.spec.run_level)
    }
}

/// A drive mapping with parsed letter and path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedDrive {
    pub label: String,
    pub group: String,
    pub letter: DriveLetter,
    pub remote: RemotePath,
}

/// A desired state that passed validation
#[derive(Debug, Clone)]
pub struct ValidatedState {
    pub target_directory: PathBuf,
    pub executable_name: String,
    /// Full path the triggers run
    pub executable_path: String,
    pub triggers: Vec<PlannedTrigger>,
    pub drives: Vec<PlannedDrive>,
}

static WINDOWS_ABSOLUTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z]:[\\/]|\\\\)").expect("valid regex"));

/// Check the whole desired state, collecting every violation
pub fn validate(desired: &DesiredState) -> Result<ValidatedState, Vec<ConfigError>> {
    let mut errors = Vec::new();

    let executable_name = desired.executable_name.trim();
    if executable_name.is_empty() {
        errors.push(ConfigError::EmptyExecutableName);
    } else if executable_name.contains(['\\', '/']) {
        errors.push(ConfigError::ExecutableNameIsPath(executable_name.to_string()));
    }

    let target_directory = match expand_target(&desired.target_directory) {
        Ok(dir) => Some(dir),
        Err(e) => {
            errors.push(e);
            None
        }
    };

    let triggers = plan_triggers(desired, executable_name, &mut errors);
    let drives = plan_drives(desired, &mut errors);

    match target_directory {
        Some(target) if errors.is_empty() => {
            let executable_path = join_executable(&target, executable_name);
            Ok(ValidatedState {
                target_directory: PathBuf::from(target),
                executable_name: executable_name.to_string(),
                executable_path,
                triggers,
                drives,
            })
        }
        _ => Err(errors),
    }
}

fn expand_target(raw: &str) -> Result<String, ConfigError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ConfigError::EmptyTargetDirectory);
    }

    let expanded = shellexpand::full(raw)
        .map_err(|e| ConfigError::UnexpandableTargetDirectory {
            path: raw.to_string(),
            message: e.to_string(),
        })?
        .into_owned();

    if !is_absolute(&expanded) {
        return Err(ConfigError::RelativeTargetDirectory(expanded));
    }
    Ok(expanded)
}

/// Absolute on this host, or a Windows drive/UNC path on any host
fn is_absolute(path: &str) -> bool {
    Path::new(path).is_absolute() || WINDOWS_ABSOLUTE_RE.is_match(path)
}

/// Join with the separator the directory already uses
fn join_executable(dir: &str, executable_name: &str) -> String {
    if dir.ends_with(['\\', '/']) {
        return format!("{dir}{executable_name}");
    }
    let separator = if dir.contains('\\') {
        '\\'
    } else {
        std::path::MAIN_SEPARATOR
    };
    format!("{dir}{separator}{executable_name}")
}

fn plan_triggers(
    desired: &DesiredState,
    executable_name: &str,
    errors: &mut Vec<ConfigError>,
) -> Vec<PlannedTrigger> {
    // task names are case-insensitive in the scheduler
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut planned = Vec::with_capacity(desired.trigger_specs.len());

    for (index, spec) in desired.trigger_specs.iter().enumerate() {
        let name = derive_trigger_name(spec, executable_name);
        if let Some(first) = seen.get(&name.to_lowercase()) {
            errors.push(ConfigError::DuplicateTriggerName {
                name,
                first: first + 1,
                second: index + 1,
            });
            continue;
        }
        seen.insert(name.to_lowercase(), index);
        planned.push(PlannedTrigger {
            name,
            spec: spec.clone(),
        });
    }

    planned
}

fn plan_drives(desired: &DesiredState, errors: &mut Vec<ConfigError>) -> Vec<PlannedDrive> {
    let mut seen: HashMap<DriveLetter, String> = HashMap::new();
    let mut planned = Vec::with_capacity(desired.drive_mappings.len());

    for mapping in &desired.drive_mappings {
        let label = mapping.label().to_string();
        let mut valid = true;

        if mapping.group.trim().is_empty() {
            errors.push(ConfigError::EmptyGroup {
                mapping: label.clone(),
            });
            valid = false;
        }

        let remote = match mapping.remote_path.parse::<RemotePath>() {
            Ok(remote) => Some(remote),
            Err(e) => {
                errors.push(ConfigError::InvalidRemotePath {
                    mapping: label.clone(),
                    message: e.to_string(),
                });
                None
            }
        };

        let letter = match mapping.drive_letter.parse::<DriveLetter>() {
            Ok(letter) => {
                if let Some(first) = seen.get(&letter) {
                    errors.push(ConfigError::DuplicateDriveLetter {
                        letter,
                        first: first.clone(),
                        second: label.clone(),
                    });
                    valid = false;
                } else {
                    seen.insert(letter, label.clone());
                }
                Some(letter)
            }
            Err(e) => {
                errors.push(ConfigError::InvalidDriveLetter {
                    mapping: label.clone(),
                    message: e.to_string(),
                });
                None
            }
        };

        if let (true, Some(letter), Some(remote)) = (valid, letter, remote) {
            planned.push(PlannedDrive {
                label,
                group: mapping.group.trim().to_string(),
                letter,
                remote,
            });
        }
    }

    planned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DriveMapping;
    use taskkit::{Principal, RunLevel, TriggerKind};

    fn desired() -> DesiredState {
        DesiredState {
            target_directory: r"C:\Program Files\DriveMapper".to_string(),
            executable_name: "DriveMapper.exe".to_string(),
            trigger_specs: vec![
                TriggerSpec::new(TriggerKind::Logon, "map"),
                TriggerSpec::new(TriggerKind::Boot, "map"),
            ],
            drive_mappings: vec![DriveMapping::new(
                "Finance",
                "Finance",
                "F:",
                r"\\fs01\finance",
            )],
        }
    }

    #[test]
    fn test_valid_state() {
        let state = validate(&desired()).unwrap();
        assert_eq!(
            state.executable_path,
            r"C:\Program Files\DriveMapper\DriveMapper.exe"
        );
        let names: Vec<_> = state.triggers.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["DriveMapper.exe", "DriveMapper.exe_Boot"]);
        assert_eq!(state.drives[0].letter.as_char(), 'F');
    }

    #[test]
    fn test_trigger_definition() {
        let mut d = desired();
        d.trigger_specs[1].run_as = Principal::System;
        d.trigger_specs[1].run_level = RunLevel::Highest;
        let state = validate(&d).unwrap();

        let boot = state.triggers[1].definition(&state.executable_path);
        assert_eq!(boot.name, "DriveMapper.exe_Boot");
        assert_eq!(boot.command, r"C:\Program Files\DriveMapper\DriveMapper.exe");
        assert_eq!(boot.arguments, "map");
        assert_eq!(boot.trigger.kind(), TriggerKind::Boot);
        assert_eq!(boot.principal, Principal::System);
        assert_eq!(boot.run_level, RunLevel::Highest);
    }

    #[test]
    fn test_duplicate_trigger_names() {
        let mut d = desired();
        // explicit name colliding with a derived one, differing only in case
        d.trigger_specs
            .push(TriggerSpec::new(TriggerKind::NetworkChange, "").named("drivemapper.exe"));

        let errors = validate(&d).unwrap_err();
        assert_eq!(
            errors,
            vec![ConfigError::DuplicateTriggerName {
                name: "drivemapper.exe".to_string(),
                first: 1,
                second: 3,
            }]
        );
    }

    #[test]
    fn test_collects_every_violation() {
        let mut d = desired();
        d.target_directory = "relative\\dir".to_string();
        d.drive_mappings.push(DriveMapping::new("Dup", "IT", "f", r"\\fs02\it"));
        d.drive_mappings.push(DriveMapping::new("Bad", "", "FF", "fs03/share"));

        let errors = validate(&d).unwrap_err();
        assert!(errors.contains(&ConfigError::RelativeTargetDirectory("relative\\dir".into())));
        assert!(errors.iter().any(|e| matches!(
            e,
            ConfigError::DuplicateDriveLetter { first, second, .. }
                if first == "Finance" && second == "Dup"
        )));
        assert!(errors.contains(&ConfigError::EmptyGroup {
            mapping: "Bad".into()
        }));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidDriveLetter { mapping, .. } if mapping == "Bad")));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidRemotePath { mapping, .. } if mapping == "Bad")));
    }

    #[test]
    fn test_executable_name_rules() {
        let mut d = desired();
        d.executable_name = "  ".to_string();
        assert_eq!(validate(&d).unwrap_err(), vec![ConfigError::EmptyExecutableName]);

        d.executable_name = r"bin\DriveMapper.exe".to_string();
        assert!(matches!(
            validate(&d).unwrap_err()[0],
            ConfigError::ExecutableNameIsPath(_)
        ));
    }

    #[test]
    fn test_absolute_paths() {
        assert!(is_absolute(r"C:\Program Files"));
        assert!(is_absolute("D:/tools"));
        assert!(is_absolute(r"\\fs01\apps"));
        assert!(!is_absolute(r"Program Files\DriveMapper"));
        assert!(!is_absolute("C:relative"));
    }

    #[test]
    fn test_join_executable() {
        assert_eq!(join_executable(r"C:\Apps\", "x.exe"), r"C:\Apps\x.exe");
        assert_eq!(join_executable(r"C:\Apps", "x.exe"), r"C:\Apps\x.exe");
        assert_eq!(join_executable("/opt/app/", "x"), "/opt/app/x");
    }
}
