//! # taskkit
//!
//! Named Task Scheduler triggers: render, register, read back and delete.
//!
//! Each [`TaskDefinition`] pairs one [`Trigger`] (logon, boot or network
//! change, each with its own activation parameters) with a program, its
//! arguments and a run-as [`Principal`]. Tasks are addressed only by name,
//! so a caller that derives names deterministically can find what it
//! registered on an earlier run without keeping any record of it.
//!
//! ## Example
//!
//! ```no_run
//! use taskkit::{Scheduler, TaskDefinition, TriggerKind};
//!
//! let scheduler = taskkit::default_backend();
//! let def = TaskDefinition::new(
//!     "DriveMapper.exe",
//!     r"C:\Program Files\DriveMapper\DriveMapper.exe",
//!     "map",
//!     TriggerKind::Logon,
//! );
//!
//! match scheduler.query(&def.name).unwrap() {
//!     Some(installed) if def.drift(&installed).is_empty() => {}
//!     _ => scheduler.register(&def).unwrap(),
//! }
//! ```

pub mod backend;
pub mod error;
pub mod types;
pub mod xml;

pub use backend::memory::{MemoryScheduler, SchedulerCall};
pub use backend::schtasks::SchtasksBackend;
pub use backend::{Scheduler, default_backend};
pub use error::{Error, ErrorCategory, Result};
pub use types::{
    InstalledTask, NETWORK_PROFILE_CHANNEL, NETWORK_PROFILE_EVENTS, Principal, RunLevel,
    SETTLE_DELAY, TaskDefinition, Trigger, TriggerKind,
};
