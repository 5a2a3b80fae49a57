//! Error types for drive mapping.
//!
//! `net use` reports failures as "System error N has occurred."; the code is
//! mapped onto a small set of categories callers can act on.

use thiserror::Error;

/// Categories of drive mapping errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// No mapping exists at that letter
    NotFound,
    /// The server or share could not be reached
    Unreachable,
    /// Credentials were rejected
    AccessDenied,
    /// The letter is held by a local disk or another device
    LetterInUse,
    /// The remote path or letter is malformed
    InvalidPath,
    /// The call failed for a reason worth retrying later
    Transient,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::NotFound => "No mapping at this letter",
            Self::Unreachable => "Remote path unreachable",
            Self::AccessDenied => "Access denied",
            Self::LetterInUse => "Drive letter already in use",
            Self::InvalidPath => "Invalid remote path",
            Self::Transient => "Network call failed",
            Self::Other => "Unexpected error",
        }
    }

    /// Category for a Win32 / `net use` system error code.
    pub fn from_system_error(code: u32) -> Self {
        match code {
            2250 => Self::NotFound,
            53 | 67 | 1203 | 1222 => Self::Unreachable,
            5 | 86 | 1326 | 1327 | 1330 | 1331 => Self::AccessDenied,
            85 | 1202 => Self::LetterInUse,
            123 | 161 | 1200 => Self::InvalidPath,
            59 | 64 | 121 | 1231 => Self::Transient,
            _ => Self::Other,
        }
    }
}

fn describe(code: &u32) -> &'static str {
    ErrorCategory::from_system_error(*code).description()
}

/// Errors that can occur during drive mapping.
#[derive(Debug, Error)]
pub enum Error {
    /// Drive letter outside A-Z
    #[error("invalid drive letter: {0:?}")]
    InvalidLetter(String),

    /// Remote path is not `\\server\share[\path]`
    #[error("invalid remote path: {0:?}")]
    InvalidPath(String),

    /// The mapping call failed with a system error code
    #[error("{letter} -> {remote}: {} (system error {code})", describe(.code))]
    System {
        /// Letter being mapped or unmapped
        letter: String,
        /// Remote path, empty for unmap
        remote: String,
        /// Win32 error code reported by `net use`
        code: u32,
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
            Error::InvalidLetter(_) | Error::InvalidPath(_) => ErrorCategory::InvalidPath,
            Error::System { code, .. } => ErrorCategory::from_system_error(*code),
            Error::CommandFailed { .. } | Error::Io(_) => ErrorCategory::Transient,
        }
    }
}

/// Result type for drive mapping.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_error_categories() {
        assert_eq!(ErrorCategory::from_system_error(53), ErrorCategory::Unreachable);
        assert_eq!(ErrorCategory::from_system_error(5), ErrorCategory::AccessDenied);
        assert_eq!(ErrorCategory::from_system_error(85), ErrorCategory::LetterInUse);
        assert_eq!(ErrorCategory::from_system_error(1200), ErrorCategory::InvalidPath);
        assert_eq!(ErrorCategory::from_system_error(2250), ErrorCategory::NotFound);
        assert_eq!(ErrorCategory::from_system_error(9999), ErrorCategory::Other);
    }

    #[test]
    fn test_system_error_message() {
        let err = Error::System {
            letter: "Z:".to_string(),
            remote: r"\\fs01\finance".to_string(),
            code: 53,
        };
        assert_eq!(
            err.to_string(),
            r"Z: -> \\fs01\finance: Remote path unreachable (system error 53)"
        );
    }
}
