//! Categorised resource errors
//!
//! Resources return `anyhow::Result`. When the failure category matters to
//! the report, they wrap it in a [`ResourceError`], which the executor pulls
//! back out with [`classify`].

use crate::types::FailureKind;
use thiserror::Error;

/// An operational error raised while applying or removing one resource
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct ResourceError {
    pub kind: FailureKind,
    pub message: String,
}

impl ResourceError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(FailureKind::PermissionDenied, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(FailureKind::ResourceConflict, message)
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(FailureKind::TransientOs, message)
    }
}

/// Find the failure category of an error chain.
///
/// The outermost [`ResourceError`] wins; anything without one is `Other`.
pub fn classify(error: &anyhow::Error) -> (FailureKind, String) {
    for cause in error.chain() {
        if let Some(resource_error) = cause.downcast_ref::<ResourceError>() {
            return (resource_error.kind, format!("{error:#}"));
        }
    }
    (FailureKind::Other, format!("{error:#}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn classify_finds_wrapped_resource_error() {
        let result: anyhow::Result<()> =
            Err(ResourceError::permission_denied("Access is denied.").into());
        let error = result.context("registering task").unwrap_err();

        let (kind, message) = classify(&error);
        assert_eq!(kind, FailureKind::PermissionDenied);
        assert!(message.contains("registering task"));
        assert!(message.contains("Access is denied."));
    }

    #[test]
    fn classify_defaults_to_other() {
        let error = anyhow::anyhow!("boom");
        assert_eq!(classify(&error).0, FailureKind::Other);
    }
}
