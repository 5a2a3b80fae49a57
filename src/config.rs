//! Desired-state configuration
//!
//! A config file is JSON or TOML (picked by extension). Three shapes are
//! accepted:
//! - the current shape (`triggerSpecs`, `driveMappings`)
//! - the installer shape, whose `scheduledTasks` entries carry one flag per
//!   trigger kind
//! - a bare array of drive mappings, as read by the logon-time mapper
//!
//! Every shape becomes the same [`DesiredState`]. Defaults for run-as
//! identity and privilege level are filled in here, so the resource layer
//! only ever sees explicit values.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use taskkit::{Principal, RunLevel, TriggerKind};

/// File name looked up next to the running executable
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Run-as group used when a trigger spec does not name one
pub const DEFAULT_RUN_AS_GROUP: &str = "Authenticated Users";

/// The root configuration: what should exist on this machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesiredState {
    /// Where the program's files live after install
    pub target_directory: String,
    /// File name of the program the triggers run
    pub executable_name: String,
    #[serde(default)]
    pub trigger_specs: Vec<TriggerSpec>,
    #[serde(default)]
    pub drive_mappings: Vec<DriveMapping>,
}

/// One trigger to create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerSpec {
    /// Explicit task name; derived from the executable name when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub kind: TriggerKind,
    #[serde(default)]
    pub arguments: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_run_as")]
    pub run_as: Principal,
    #[serde(default)]
    pub run_level: RunLevel,
}

impl TriggerSpec {
    pub fn new(kind: TriggerKind, arguments: impl Into<String>) -> Self {
        Self {
            name: None,
            kind,
            arguments: arguments.into(),
            enabled: true,
            run_as: default_run_as(),
            run_level: RunLevel::default(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// One group-gated drive binding
///
/// Letter and path stay raw strings here so that validation can report
/// every malformed entry at once instead of failing on the first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveMapping {
    /// Label for humans; not used for matching
    #[serde(default, alias = "Name")]
    pub name: String,
    /// Group the user must belong to
    #[serde(default, alias = "Group")]
    pub group: String,
    /// "Z" or "Z:"
    #[serde(alias = "DriveLetter")]
    pub drive_letter: String,
    /// UNC path, e.g. `\\fs01\finance`
    #[serde(alias = "path", alias = "Path")]
    pub remote_path: String,
}

impl DriveMapping {
    pub fn new(
        name: impl Into<String>,
        group: impl Into<String>,
        drive_letter: impl Into<String>,
        remote_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
            drive_letter: drive_letter.into(),
            remote_path: remote_path.into(),
        }
    }

    /// Name shown in reports; falls back to the letter
    pub fn label(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.drive_letter
        } else {
            &self.name
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_run_as() -> Principal {
    Principal::Group(DEFAULT_RUN_AS_GROUP.to_string())
}

// ============================================================================
// File shapes
// ============================================================================

/// Installer-style task entry: one entry, up to three triggers
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyTask {
    #[serde(default, alias = "TaskName")]
    task_name: Option<String>,
    #[serde(default, alias = "Arguments")]
    arguments: Option<String>,
    #[serde(default, alias = "CreateLogonTask")]
    create_logon_task: bool,
    #[serde(default, alias = "CreateNetworkTask")]
    create_network_task: bool,
    #[serde(default, alias = "CreateBootTask")]
    create_boot_task: bool,
}

impl LegacyTask {
    /// One spec per enabled flag, named `(taskName ?? exe) + suffix`
    fn expand(&self, executable_name: &str) -> Vec<TriggerSpec> {
        let base = self
            .task_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(executable_name);
        let arguments = self.arguments.clone().unwrap_or_default();

        [
            (TriggerKind::Logon, self.create_logon_task),
            (TriggerKind::NetworkChange, self.create_network_task),
            (TriggerKind::Boot, self.create_boot_task),
        ]
        .into_iter()
        .filter(|(_, wanted)| *wanted)
        .map(|(kind, _)| {
            TriggerSpec::new(kind, arguments.clone()).named(format!("{base}{}", kind.name_suffix()))
        })
        .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    #[serde(default, alias = "TargetDirectory")]
    target_directory: Option<String>,
    #[serde(default, alias = "ExeName", alias = "exeName")]
    executable_name: Option<String>,
    #[serde(default)]
    trigger_specs: Vec<TriggerSpec>,
    #[serde(default)]
    drive_mappings: Vec<DriveMapping>,
    #[serde(default, alias = "ScheduledTasks")]
    scheduled_tasks: Vec<LegacyTask>,
    #[serde(default, alias = "ShortcutName")]
    shortcut_name: Option<String>,
}

/// Where the running program lives; used for bare mapping lists
#[derive(Debug, Clone)]
pub struct Origin {
    pub directory: String,
    pub executable_name: String,
}

impl Origin {
    /// Origin of the current process
    pub fn current() -> Result<Self> {
        let exe = std::env::current_exe().context("Could not locate the running executable")?;
        let executable_name = exe
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .context("Running executable has no file name")?;
        let directory = exe
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .context("Running executable has no parent directory")?;
        Ok(Self {
            directory,
            executable_name,
        })
    }
}

impl ConfigFile {
    fn into_desired(self, origin: &Origin) -> DesiredState {
        if let Some(shortcut) = &self.shortcut_name {
            log::info!("Ignoring shortcutName '{shortcut}': shortcuts are not managed");
        }

        let executable_name = self
            .executable_name
            .unwrap_or_else(|| origin.executable_name.clone());
        let mut trigger_specs = self.trigger_specs;
        for task in &self.scheduled_tasks {
            trigger_specs.extend(task.expand(&executable_name));
        }

        DesiredState {
            target_directory: self.target_directory.unwrap_or_default(),
            executable_name,
            trigger_specs,
            drive_mappings: self.drive_mappings,
        }
    }
}

/// Config file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Toml,
}

impl Format {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Json,
        }
    }
}

/// Parse a config document
pub fn parse(content: &str, format: Format, origin: &Origin) -> Result<DesiredState> {
    let file: ConfigFile = match format {
        Format::Toml => toml::from_str(content).context("Invalid TOML config")?,
        Format::Json => {
            let value: serde_json::Value =
                serde_json::from_str(content).context("Invalid JSON config")?;
            if value.is_array() {
                let drive_mappings: Vec<DriveMapping> =
                    serde_json::from_value(value).context("Invalid drive mapping list")?;
                return Ok(DesiredState {
                    target_directory: origin.directory.clone(),
                    executable_name: origin.executable_name.clone(),
                    trigger_specs: Vec::new(),
                    drive_mappings,
                });
            }
            serde_json::from_value(value).context("Invalid JSON config")?
        }
    };

    Ok(file.into_desired(origin))
}

/// Load a config file from disk
pub fn load(path: &Path, origin: &Origin) -> Result<DesiredState> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Could not read {}", path.display()))?;
    parse(&content, Format::from_path(path), origin)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Candidate config locations, most specific first
pub fn default_paths(origin: &Origin) -> Vec<PathBuf> {
    let mut paths = vec![Path::new(&origin.directory).join(CONFIG_FILE_NAME)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("drivemap").join(CONFIG_FILE_NAME));
    }
    paths
}

/// Resolve the config path: the explicit one, or the first default that exists
pub fn resolve_path(explicit: Option<&Path>, origin: &Origin) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    let candidates = default_paths(origin);
    if let Some(found) = candidates.iter().find(|p| p.is_file()) {
        log::debug!("Using config {}", found.display());
        return Ok(found.clone());
    }

    let tried: Vec<String> = candidates.iter().map(|p| p.display().to_string()).collect();
    bail!("Configuration file not found (tried {})", tried.join(", "))
}
