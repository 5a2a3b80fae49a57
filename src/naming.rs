//! Trigger names
//!
//! A trigger's name is the only handle later runs have on it: nothing is
//! recorded between runs, so the name must come out the same every time
//! from the same config.

use crate::config::TriggerSpec;
use taskkit::TriggerKind;

/// Name of the trigger a spec provisions
///
/// An explicit `name` wins; otherwise the executable name plus the kind's
/// suffix (none for logon, `_NetworkChange`, `_Boot`). A blank explicit name
/// counts as absent.
pub fn derive_trigger_name(spec: &TriggerSpec, executable_name: &str) -> String {
    match spec.name.as_deref() {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => default_trigger_name(executable_name, spec.kind),
    }
}

/// Name used for a kind when no explicit name is given
pub fn default_trigger_name(executable_name: &str, kind: TriggerKind) -> String {
    format!("{executable_name}{}", kind.name_suffix())
}

/// Whether a task name follows the default naming scheme for this executable
pub fn is_default_name(task_name: &str, executable_name: &str) -> bool {
    TriggerKind::ALL
        .iter()
        .any(|kind| task_name.eq_ignore_ascii_case(&default_trigger_name(executable_name, *kind)))
}
