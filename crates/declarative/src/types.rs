//! Core types for declarative resource reconciliation

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a reconciliation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Converge every resource to its declared state
    Install,
    /// Remove every reversible resource
    Uninstall,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Install => write!(f, "install"),
            Self::Uninstall => write!(f, "uninstall"),
        }
    }
}

/// Current or desired state of a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceState {
    /// Resource exists/is configured
    Present { details: Option<String> },
    /// Resource does not exist/is not configured
    Absent,
    /// Resource exists but differs from desired
    Modified { from: String, to: String },
    /// State cannot be determined
    Unknown,
}

/// Category of a per-resource failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The platform refused the operation for the current identity
    PermissionDenied,
    /// The name or letter is held by an incompatible resource
    ResourceConflict,
    /// The remote end could not be reached
    Unreachable,
    /// The resource definition was rejected by the platform
    InvalidPath,
    /// The underlying platform call failed, retrying the pass may help
    TransientOs,
    /// Anything else
    Other,
}

impl FailureKind {
    /// Short label for reports
    pub fn label(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission denied",
            Self::ResourceConflict => "resource conflict",
            Self::Unreachable => "unreachable",
            Self::InvalidPath => "invalid path",
            Self::TransientOs => "transient OS error",
            Self::Other => "error",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of applying or removing a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyResult {
    /// Already in the desired state
    NoChange,
    /// Resource was created
    Created,
    /// Resource was replaced or updated
    Modified,
    /// Resource was removed
    Removed,
    /// Apply failed
    Failed { kind: FailureKind, error: String },
    /// Apply was skipped
    Skipped { reason: String },
}

impl ApplyResult {
    /// Check if the result represents success (no failure)
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    /// Check if the result represents a change
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Created | Self::Modified | Self::Removed)
    }

    /// One-character status symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::NoChange => "○",
            Self::Created | Self::Modified | Self::Removed => "✓",
            Self::Failed { .. } => "✗",
            Self::Skipped { .. } => "⊘",
        }
    }
}

/// Summary of execution results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteSummary {
    pub created: usize,
    pub modified: usize,
    pub removed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub no_change: usize,
}

impl ExecuteSummary {
    /// Total number of actual changes made
    pub fn total_changes(&self) -> usize {
        self.created + self.modified + self.removed
    }

    /// Check if execution was fully successful (no failures)
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Total number of resources processed
    pub fn total(&self) -> usize {
        self.created + self.modified + self.removed + self.skipped + self.failed + self.no_change
    }

    /// Add a result to the summary
    pub fn add_result(&mut self, result: &ApplyResult) {
        match result {
            ApplyResult::NoChange => self.no_change += 1,
            ApplyResult::Created => self.created += 1,
            ApplyResult::Modified => self.modified += 1,
            ApplyResult::Removed => self.removed += 1,
            ApplyResult::Failed { .. } => self.failed += 1,
            ApplyResult::Skipped { .. } => self.skipped += 1,
        }
    }
}

/// Options for execution
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Direction of the pass
    pub mode: Mode,
    /// Don't make changes, just show what would happen
    pub dry_run: bool,
    /// Verbose output
    pub verbose: bool,
    /// Checked between resources; set from another thread to stop early
    pub cancel: Option<crate::context::CancelToken>,
    /// No resource is started after this instant
    pub deadline: Option<std::time::Instant>,
}

impl ExecuteOptions {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Reason the pass must stop before the next resource, if any
    pub fn interruption(&self) -> Option<&'static str> {
        if self.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
            return Some("cancelled");
        }
        if self
            .deadline
            .is_some_and(|d| std::time::Instant::now() >= d)
        {
            return Some("deadline exceeded");
        }
        None
    }
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            mode: Mode::Install,
            dry_run: false,
            verbose: false,
            cancel: None,
            deadline: None,
        }
    }
}
