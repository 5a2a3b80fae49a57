//! Execution planner - ordered resource plans

use crate::resource::{BoxedResource, Resource};

/// An ordered list of resources for one reconciliation pass
pub struct ExecutionPlan {
    /// Resources, applied in insertion order
    pub resources: Vec<BoxedResource>,
}

impl ExecutionPlan {
    /// Create a new empty plan
    pub fn new() -> Self {
        Self {
            resources: Vec::new(),
        }
    }

    /// Append a resource to the plan
    pub fn add_resource(&mut self, resource: BoxedResource) {
        self.resources.push(resource);
    }

    /// Filter plan to only include resources matching a predicate
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&dyn Resource) -> bool,
    {
        Self {
            resources: self
                .resources
                .into_iter()
                .filter(|r| predicate(r.as_ref()))
                .collect(),
        }
    }

    /// Filter plan to only include resources matching a target pattern
    ///
    /// Target format: "type" or "type.name"
    pub fn filter_by_target(self, target: Option<&str>) -> Self {
        match target {
            None => self,
            Some(t) => {
                let (resource_type, name) = parse_target(t);
                self.filter(|r| matches_filter(r, resource_type.as_deref(), name.as_deref()))
            }
        }
    }

    /// Total number of resources in the plan
    pub fn total_resources(&self) -> usize {
        self.resources.len()
    }

    /// Check if plan is empty
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl Default for ExecutionPlan {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a target string like "type.name" into (type, name)
///
/// Only the first dot splits, so names such as "DriveMapper.exe" survive.
fn parse_target(target: &str) -> (Option<String>, Option<String>) {
    match target.split_once('.') {
        None => (Some(target.to_string()), None),
        Some((rt, name)) if !rt.is_empty() => (Some(rt.to_string()), Some(name.to_string())),
        Some(_) => (None, Some(target.to_string())),
    }
}

/// Check if a resource matches the filter criteria
fn matches_filter(
    resource: &dyn Resource,
    resource_type: Option<&str>,
    name: Option<&str>,
) -> bool {
    if let Some(rt) = resource_type {
        // Allow common aliases
        let matches_type = match rt {
            "triggers" | "tasks" => resource.resource_type() == "scheduled_task",
            "drives" | "mappings" => resource.resource_type() == "drive_mapping",
            _ => resource.resource_type() == rt,
        };
        if !matches_type {
            return false;
        }
    }

    if let Some(n) = name
        && !resource.id().eq_ignore_ascii_case(n)
    {
        return false;
    }

    true
}
