//! Diff computation for resources

use crate::resource::Resource;
use crate::types::{Mode, ResourceState};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A diff between current and desired state of a resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDiff {
    /// Unique identifier of the resource
    pub resource_id: String,
    /// Type of the resource
    pub resource_type: String,
    /// Human-readable description
    pub description: String,
    /// Current state
    pub current: ResourceState,
    /// Desired state
    pub desired: ResourceState,
}

impl ResourceDiff {
    /// Create a diff from a resource, returning None if no changes needed
    pub fn from_resource(resource: &dyn Resource, mode: Mode) -> Result<Option<Self>> {
        if mode == Mode::Uninstall && !resource.reversible() {
            return Ok(None);
        }

        let current = resource.current_state()?;
        let desired = resource.desired_state_for(mode);

        if current == desired {
            return Ok(None);
        }

        Ok(Some(Self {
            resource_id: resource.id(),
            resource_type: resource.resource_type().to_string(),
            description: resource.description(),
            current,
            desired,
        }))
    }

    /// Check if this diff represents an addition
    pub fn is_addition(&self) -> bool {
        matches!(
            (&self.current, &self.desired),
            (ResourceState::Absent, ResourceState::Present { .. })
        )
    }

    /// Check if this diff represents a removal
    pub fn is_removal(&self) -> bool {
        matches!(
            (&self.current, &self.desired),
            (
                ResourceState::Present { .. } | ResourceState::Modified { .. },
                ResourceState::Absent
            )
        )
    }
}

/// Compute diffs for a list of resources
///
/// Returns only resources that have differences between current and desired
/// state. Resources whose state cannot be read are reported as `Unknown`.
pub fn compute_diffs(resources: &[Box<dyn Resource>], mode: Mode) -> Vec<ResourceDiff> {
    resources
        .iter()
        .filter_map(|r| match ResourceDiff::from_resource(r.as_ref(), mode) {
            Ok(diff) => diff,
            Err(e) => Some(ResourceDiff {
                resource_id: r.id(),
                resource_type: r.resource_type().to_string(),
                description: format!("{} ({e:#})", r.description()),
                current: ResourceState::Unknown,
                desired: r.desired_state_for(mode),
            }),
        })
        .collect()
}

/// Diff summary statistics
#[derive(Debug, Clone, Default)]
pub struct DiffSummary {
    /// Number of resources to add
    pub additions: usize,
    /// Number of resources to remove
    pub removals: usize,
    /// Number of resources to modify
    pub modifications: usize,
}

impl DiffSummary {
    /// Create a summary from a list of diffs
    pub fn from_diffs(diffs: &[ResourceDiff]) -> Self {
        let mut summary = Self::default();
        for diff in diffs {
            if diff.is_addition() {
                summary.additions += 1;
            } else if diff.is_removal() {
                summary.removals += 1;
            } else {
                summary.modifications += 1;
            }
        }
        summary
    }

    /// Total number of changes
    pub fn total(&self) -> usize {
        self.additions + self.removals + self.modifications
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}

/// Group diffs by resource type, keeping first-seen order
pub fn group_by_type(diffs: &[ResourceDiff]) -> Vec<(String, Vec<&ResourceDiff>)> {
    let mut groups: Vec<(String, Vec<&ResourceDiff>)> = Vec::new();
    for diff in diffs {
        match groups.iter_mut().find(|(t, _)| *t == diff.resource_type) {
            Some((_, group)) => group.push(diff),
            None => groups.push((diff.resource_type.clone(), vec![diff])),
        }
    }
    groups
}
