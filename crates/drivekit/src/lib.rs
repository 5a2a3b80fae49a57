//! # drivekit
//!
//! Map and unmap network drive letters.
//!
//! [`DriveLetter`] and [`RemotePath`] validate their input on parse, so a
//! malformed letter or UNC path is rejected before any system call. The
//! [`DriveBackend`] trait abstracts the drive table; [`NetUseBackend`] drives
//! `net use`, and [`MemoryDrives`] keeps an in-memory table with a call log.
//!
//! ```no_run
//! use drivekit::{DriveBackend, DriveLetter, RemotePath};
//!
//! let drives = drivekit::default_backend();
//! let letter: DriveLetter = "F".parse().unwrap();
//! let remote: RemotePath = r"\\fs01\finance".parse().unwrap();
//!
//! // unmap first so a stale mapping never blocks the new one
//! let _ = drives.unmap(letter);
//! drives.map(letter, &remote).unwrap();
//! ```

pub mod backend;
pub mod error;
pub mod types;

pub use backend::memory::{DriveCall, MemoryDrives};
pub use backend::net_use::NetUseBackend;
pub use backend::{DriveBackend, default_backend};
pub use error::{Error, ErrorCategory, Result};
pub use types::{ConnectionStatus, DriveLetter, MappedDrive, RemotePath};
