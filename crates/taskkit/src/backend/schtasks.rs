//! Real Task Scheduler backend using `schtasks.exe`.

use crate::backend::Scheduler;
use crate::error::{Error, ErrorCategory, Result};
use crate::types::{InstalledTask, TaskDefinition};
use crate::xml;
use std::collections::BTreeSet;
use std::io::Write;
use std::process::Command;

/// Backend that executes real `schtasks` commands.
pub struct SchtasksBackend {
    /// Path to the schtasks executable
    program: String,
}

impl SchtasksBackend {
    pub fn new() -> Self {
        Self {
            program: "schtasks".to_string(),
        }
    }

    /// Run schtasks and return its output.
    fn run(&self, args: &[&str]) -> Result<std::process::Output> {
        log::trace!("{} {}", self.program, args.join(" "));
        Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|e| Error::CommandFailed {
                message: format!("failed to execute {}: {e}", self.program),
                stderr: String::new(),
            })
    }

    /// Run schtasks and check for success.
    fn run_checked(&self, args: &[&str], name: &str) -> Result<String> {
        let output = self.run(args)?;

        if !output.status.success() {
            let mut message = String::from_utf8_lossy(&output.stderr).to_string();
            if message.trim().is_empty() {
                message = String::from_utf8_lossy(&output.stdout).to_string();
            }
            return Err(Error::from_schtasks_output(&message, name));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl Default for SchtasksBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for SchtasksBackend {
    fn query(&self, name: &str) -> Result<Option<InstalledTask>> {
        match self.run_checked(&["/Query", "/TN", name, "/XML"], name) {
            Ok(xml) => xml::parse(name, &xml).map(Some),
            Err(e) if e.category() == ErrorCategory::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn register(&self, definition: &TaskDefinition) -> Result<()> {
        // schtasks only accepts UTF-16 task files
        let mut file = tempfile::Builder::new()
            .prefix("drivemap-task-")
            .suffix(".xml")
            .tempfile()?;
        let mut bytes = vec![0xFF, 0xFE];
        for unit in xml::render(definition).encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        file.write_all(&bytes)?;
        file.flush()?;

        let path = file.path().to_string_lossy().to_string();
        // /F replaces an existing task with the same name in one call
        self.run_checked(
            &["/Create", "/TN", &definition.name, "/XML", &path, "/F"],
            &definition.name,
        )?;
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<()> {
        self.run_checked(&["/Delete", "/TN", name, "/F"], name)?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>> {
        let out = self.run_checked(&["/Query", "/FO", "CSV", "/NH"], "\\")?;
        Ok(parse_task_list(&out))
    }
}

/// Root-folder task names from `schtasks /Query /FO CSV /NH`.
fn parse_task_list(csv: &str) -> Vec<String> {
    let names: BTreeSet<String> = csv
        .lines()
        .filter_map(|line| {
            let first = line.trim().strip_prefix('"')?;
            let name = &first[..first.find('"')?];
            let name = name.strip_prefix('\\')?;
            (!name.is_empty() && !name.contains('\\')).then(|| name.to_string())
        })
        .collect();
    names.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_task_list_keeps_root_tasks_once() {
        let csv = "\"\\DriveMapper.exe\",\"N/A\",\"Ready\"\r\n\
                   \"\\DriveMapper.exe_Boot\",\"N/A\",\"Ready\"\r\n\
                   \"\\DriveMapper.exe\",\"N/A\",\"Ready\"\r\n\
                   \"\\Microsoft\\Windows\\Defrag\\ScheduledDefrag\",\"N/A\",\"Ready\"\r\n\
                   \r\n\
                   INFO: There are no scheduled tasks presently available at your access level.\r\n";
        assert_eq!(
            parse_task_list(csv),
            vec!["DriveMapper.exe".to_string(), "DriveMapper.exe_Boot".to_string()]
        );
    }
}
