//! Backend abstraction for the drive table.

pub mod memory;
pub mod net_use;

use crate::error::Result;
use crate::types::{DriveLetter, MappedDrive, RemotePath};

/// Backend trait for drive mapping operations.
pub trait DriveBackend: Send + Sync {
    /// All network mappings visible to the current session.
    fn list(&self) -> Result<Vec<MappedDrive>>;

    /// The mapping at one letter, if any.
    fn query(&self, letter: DriveLetter) -> Result<Option<MappedDrive>> {
        Ok(self.list()?.into_iter().find(|m| m.letter == letter))
    }

    /// Bind `letter` to `remote` for this session.
    fn map(&self, letter: DriveLetter, remote: &RemotePath) -> Result<()>;

    /// Forcibly disconnect `letter`. Returns a `NotFound` category error
    /// when nothing is mapped there.
    fn unmap(&self, letter: DriveLetter) -> Result<()>;
}

/// Get the default backend (`net use`).
pub fn default_backend() -> net_use::NetUseBackend {
    net_use::NetUseBackend::new()
}
