//! Error types for Task Scheduler operations.
//!
//! Errors are categorised from `schtasks` output so callers can tell an
//! absent task (ignorable on delete) from a permission problem.

use thiserror::Error;

/// Categories of scheduler errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The named task does not exist
    NotFound,
    /// The current identity may not create or delete the task
    PermissionDenied,
    /// A task or folder with that name exists and cannot be replaced
    Conflict,
    /// The task definition was rejected
    InvalidDefinition,
    /// The scheduler call failed for a reason worth retrying later
    Transient,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::NotFound => "Task not found",
            Self::PermissionDenied => "Permission denied",
            Self::Conflict => "Task name conflict",
            Self::InvalidDefinition => "Task definition rejected",
            Self::Transient => "Task Scheduler call failed",
            Self::Other => "Unexpected error",
        }
    }
}

/// Errors that can occur during scheduler operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The named task does not exist
    #[error("task not found: {name}")]
    NotFound {
        /// Task name that was looked up
        name: String,
    },

    /// Access denied by the scheduler
    #[error("permission denied for task {name}: {message}")]
    PermissionDenied {
        /// Task name
        name: String,
        /// Scheduler message
        message: String,
    },

    /// Name collision that /F could not resolve
    #[error("task {name} conflicts with an existing object: {message}")]
    Conflict {
        /// Task name
        name: String,
        /// Scheduler message
        message: String,
    },

    /// The scheduler rejected the XML definition
    #[error("task definition for {name} rejected: {message}")]
    InvalidDefinition {
        /// Task name
        name: String,
        /// Scheduler message
        message: String,
    },

    /// Installed task XML could not be read
    #[error("could not read definition of task {name}: {message}")]
    Parse {
        /// Task name
        name: String,
        /// What was missing
        message: String,
    },

    /// Command execution failed
    #[error("command failed: {message}")]
    CommandFailed {
        /// Description of what command failed
        message: String,
        /// Standard error output from the failed command
        stderr: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::PermissionDenied { .. } => ErrorCategory::PermissionDenied,
            Error::Conflict { .. } => ErrorCategory::Conflict,
            Error::InvalidDefinition { .. } => ErrorCategory::InvalidDefinition,
            Error::CommandFailed { .. } | Error::Io(_) => ErrorCategory::Transient,
            Error::Parse { .. } => ErrorCategory::Other,
        }
    }

    /// Build an error of the given category, mostly for fake backends.
    pub fn from_category(category: ErrorCategory, name: &str, message: &str) -> Self {
        let name = name.to_string();
        let message = message.to_string();
        match category {
            ErrorCategory::NotFound => Error::NotFound { name },
            ErrorCategory::PermissionDenied => Error::PermissionDenied { name, message },
            ErrorCategory::Conflict => Error::Conflict { name, message },
            ErrorCategory::InvalidDefinition => Error::InvalidDefinition { name, message },
            ErrorCategory::Transient => Error::CommandFailed {
                message: format!("schtasks failed for {name}"),
                stderr: message,
            },
            ErrorCategory::Other => Error::Parse { name, message },
        }
    }

    /// Create an error from `schtasks` output.
    ///
    /// Only the English messages are recognised; anything else is treated
    /// as a transient command failure.
    pub fn from_schtasks_output(stderr: &str, name: &str) -> Self {
        let lower = stderr.to_lowercase();
        let message = stderr.trim().to_string();
        let name = name.to_string();

        if lower.contains("cannot find the file specified")
            || lower.contains("the specified task name")
            || lower.contains("does not exist")
        {
            return Error::NotFound { name };
        }

        if lower.contains("access is denied") || lower.contains("permission") {
            return Error::PermissionDenied { name, message };
        }

        if lower.contains("already exists") {
            return Error::Conflict { name, message };
        }

        if lower.contains("task xml") || lower.contains("malformed") || lower.contains("(xml)")
        {
            return Error::InvalidDefinition { name, message };
        }

        Error::CommandFailed {
            message: format!("schtasks failed for {name}"),
            stderr: message,
        }
    }
}

/// Result type for scheduler operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_schtasks_output_not_found() {
        let err = Error::from_schtasks_output(
            "ERROR: The system cannot find the file specified.\r\n",
            "Mapper.exe",
        );
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_from_schtasks_output_access_denied() {
        let err = Error::from_schtasks_output("ERROR: Access is denied.", "Mapper.exe_Boot");
        assert_eq!(err.category(), ErrorCategory::PermissionDenied);
        assert!(err.to_string().contains("Mapper.exe_Boot"));
    }

    #[test]
    fn test_from_schtasks_output_conflict() {
        let err = Error::from_schtasks_output(
            "ERROR: Cannot create a file when that file already exists.",
            "x",
        );
        assert_eq!(err.category(), ErrorCategory::Conflict);
    }

    #[test]
    fn test_from_schtasks_output_unknown_is_transient() {
        let err = Error::from_schtasks_output("ERROR: The RPC server is unavailable.", "x");
        assert_eq!(err.category(), ErrorCategory::Transient);
    }
}
