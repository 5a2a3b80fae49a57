//! In-process drive table for tests and simulated runs.

use crate::backend::DriveBackend;
use crate::error::{Error, Result};
use crate::types::{ConnectionStatus, DriveLetter, MappedDrive, RemotePath};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

/// A recorded drive table call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriveCall {
    List,
    Map(DriveLetter, String),
    Unmap(DriveLetter),
}

impl DriveCall {
    /// Whether the call changes the drive table.
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::Map(..) | Self::Unmap(_))
    }
}

#[derive(Default)]
struct Inner {
    drives: BTreeMap<DriveLetter, MappedDrive>,
    local: BTreeSet<DriveLetter>,
    calls: Vec<DriveCall>,
    map_failures: HashMap<DriveLetter, u32>,
}

/// Drive table kept in memory.
#[derive(Default)]
pub struct MemoryDrives {
    inner: Mutex<Inner>,
}

impl MemoryDrives {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Seed a network mapping.
    pub fn insert(&self, letter: DriveLetter, remote: &str, status: ConnectionStatus) {
        self.lock().drives.insert(
            letter,
            MappedDrive {
                letter,
                remote: remote.to_string(),
                status,
            },
        );
    }

    /// Occupy a letter with a local disk; mapping it fails with error 85.
    pub fn occupy_local(&self, letter: DriveLetter) {
        self.lock().local.insert(letter);
    }

    /// Make every `map` of `letter` fail with a system error code.
    pub fn fail_map(&self, letter: DriveLetter, code: u32) {
        self.lock().map_failures.insert(letter, code);
    }

    /// Current mapping at a letter, without recording a call.
    pub fn get(&self, letter: DriveLetter) -> Option<MappedDrive> {
        self.lock().drives.get(&letter).cloned()
    }

    /// Calls made so far.
    pub fn calls(&self) -> Vec<DriveCall> {
        self.lock().calls.clone()
    }

    /// Forget recorded calls, keeping the mappings.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }
}

impl DriveBackend for MemoryDrives {
    fn list(&self) -> Result<Vec<MappedDrive>> {
        let mut inner = self.lock();
        inner.calls.push(DriveCall::List);
        Ok(inner.drives.values().cloned().collect())
    }

    fn map(&self, letter: DriveLetter, remote: &RemotePath) -> Result<()> {
        let mut inner = self.lock();
        inner
            .calls
            .push(DriveCall::Map(letter, remote.as_str().to_string()));

        let code = if inner.local.contains(&letter) || inner.drives.contains_key(&letter) {
            Some(85)
        } else {
            inner.map_failures.get(&letter).copied()
        };
        if let Some(code) = code {
            return Err(Error::System {
                letter: letter.device(),
                remote: remote.as_str().to_string(),
                code,
            });
        }

        inner.drives.insert(
            letter,
            MappedDrive {
                letter,
                remote: remote.as_str().to_string(),
                status: ConnectionStatus::Ok,
            },
        );
        Ok(())
    }

    fn unmap(&self, letter: DriveLetter) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(DriveCall::Unmap(letter));
        match inner.drives.remove(&letter) {
            Some(_) => Ok(()),
            None => Err(Error::System {
                letter: letter.device(),
                remote: String::new(),
                code: 2250,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    fn letter(c: char) -> DriveLetter {
        DriveLetter::new(c).unwrap()
    }

    #[test]
    fn test_map_over_existing_mapping_is_refused() {
        let drives = MemoryDrives::new();
        drives.insert(letter('F'), r"\\old\share", ConnectionStatus::Ok);

        let err = drives
            .map(letter('F'), &r"\\new\share".parse().unwrap())
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::LetterInUse);

        drives.unmap(letter('F')).unwrap();
        drives
            .map(letter('F'), &r"\\new\share".parse().unwrap())
            .unwrap();
        assert_eq!(drives.get(letter('F')).unwrap().remote, r"\\new\share");
    }

    #[test]
    fn test_unmap_free_letter_is_not_found() {
        let drives = MemoryDrives::new();
        let err = drives.unmap(letter('Q')).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }
}
