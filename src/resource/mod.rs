//! Resources managed by drivemap
//!
//! Two kinds, each adapting a platform kit to the engine's [`Resource`]
//! trait:
//! - [`ScheduledTrigger`]: a named Task Scheduler task (`scheduled_task`)
//! - [`DriveMappingResource`]: one group-gated drive letter (`drive_mapping`)
//!
//! Kit errors are turned into [`ResourceError`]s here so the pass report
//! keeps their failure kind.

mod drive_mapping;
mod trigger;

pub use declarative::{ApplyContext, ApplyResult, Resource, ResourceError, ResourceState};
pub use drive_mapping::DriveMappingResource;
pub use trigger::ScheduledTrigger;

use declarative::FailureKind;

/// Resource type of scheduled triggers
pub const SCHEDULED_TASK: &str = "scheduled_task";

/// Resource type of drive mappings
pub const DRIVE_MAPPING: &str = "drive_mapping";

/// Wrap a scheduler error, keeping its category
pub(crate) fn task_error(error: taskkit::Error) -> anyhow::Error {
    use taskkit::ErrorCategory;

    let kind = match error.category() {
        ErrorCategory::PermissionDenied => FailureKind::PermissionDenied,
        ErrorCategory::Conflict => FailureKind::ResourceConflict,
        ErrorCategory::Transient => FailureKind::TransientOs,
        ErrorCategory::NotFound | ErrorCategory::InvalidDefinition | ErrorCategory::Other => {
            FailureKind::Other
        }
    };
    ResourceError::new(kind, error.to_string()).into()
}

/// Wrap a drive table error, keeping its category
pub(crate) fn drive_error(error: drivekit::Error) -> anyhow::Error {
    use drivekit::ErrorCategory;

    let kind = match error.category() {
        ErrorCategory::AccessDenied => FailureKind::PermissionDenied,
        ErrorCategory::LetterInUse => FailureKind::ResourceConflict,
        ErrorCategory::Unreachable => FailureKind::Unreachable,
        ErrorCategory::InvalidPath => FailureKind::InvalidPath,
        ErrorCategory::Transient => FailureKind::TransientOs,
        ErrorCategory::NotFound | ErrorCategory::Other => FailureKind::Other,
    };
    ResourceError::new(kind, error.to_string()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::classify;

    #[test]
    fn test_kit_errors_keep_their_kind() {
        let denied = task_error(taskkit::Error::PermissionDenied {
            name: "DriveMapper.exe".into(),
            message: "Access is denied.".into(),
        });
        assert_eq!(classify(&denied).0, FailureKind::PermissionDenied);

        let unreachable = drive_error(drivekit::Error::System {
            letter: "F:".into(),
            remote: r"\\fs01\finance".into(),
            code: 53,
        });
        let (kind, message) = classify(&unreachable);
        assert_eq!(kind, FailureKind::Unreachable);
        assert!(message.contains("system error 53"));

        let in_use = drive_error(drivekit::Error::System {
            letter: "C:".into(),
            remote: r"\\fs01\finance".into(),
            code: 85,
        });
        assert_eq!(classify(&in_use).0, FailureKind::ResourceConflict);
    }
}
