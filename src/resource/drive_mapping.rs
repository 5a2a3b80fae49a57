//! Drive mapping resource

use anyhow::{Context, Result};
use drivekit::{DriveBackend, DriveLetter, ErrorCategory, RemotePath};
use std::fmt;
use std::sync::Arc;

use super::{ApplyContext, ApplyResult, DRIVE_MAPPING, Resource, ResourceState, drive_error};

/// One drive letter bound to a remote path for members of a group
///
/// Mappings are session state, re-established at every logon, so an
/// uninstall pass leaves them alone.
pub struct DriveMappingResource {
    label: String,
    group: String,
    letter: DriveLetter,
    remote: RemotePath,
    /// Whether the current user is in `group`
    member: bool,
    drives: Arc<dyn DriveBackend>,
}

impl DriveMappingResource {
    pub fn new(
        label: impl Into<String>,
        group: impl Into<String>,
        letter: DriveLetter,
        remote: RemotePath,
        member: bool,
        drives: Arc<dyn DriveBackend>,
    ) -> Self {
        Self {
            label: label.into(),
            group: group.into(),
            letter,
            remote,
            member,
            drives,
        }
    }

    fn target(&self) -> ResourceState {
        ResourceState::Present {
            details: Some(self.remote.to_string()),
        }
    }

    /// Drop whatever is at the letter. Nothing mapped is fine.
    fn unmap(&self) -> Result<()> {
        match self.drives.unmap(self.letter) {
            Ok(()) => Ok(()),
            Err(e) if e.category() == ErrorCategory::NotFound => Ok(()),
            Err(e) => Err(drive_error(e))
                .with_context(|| format!("Failed to disconnect {}", self.letter)),
        }
    }
}

impl fmt::Debug for DriveMappingResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriveMappingResource")
            .field("label", &self.label)
            .field("group", &self.group)
            .field("letter", &self.letter)
            .field("remote", &self.remote)
            .field("member", &self.member)
            .finish_non_exhaustive()
    }
}

impl Resource for DriveMappingResource {
    fn id(&self) -> String {
        self.letter.to_string()
    }

    fn description(&self) -> String {
        format!("{} {} -> {} ({})", self.label, self.letter, self.remote, self.group)
    }

    fn resource_type(&self) -> &'static str {
        DRIVE_MAPPING
    }

    fn current_state(&self) -> Result<ResourceState> {
        if !self.member {
            return Ok(ResourceState::Unknown);
        }

        let mapped = self.drives.query(self.letter).map_err(drive_error)?;
        Ok(match mapped {
            None => ResourceState::Absent,
            Some(drive) if drive.satisfies(&self.remote) => self.target(),
            Some(drive) => ResourceState::Modified {
                from: format!("{} ({})", drive.remote, drive.status),
                to: self.remote.to_string(),
            },
        })
    }

    fn desired_state(&self) -> ResourceState {
        // not ours to touch when the user is outside the group
        if self.member {
            self.target()
        } else {
            ResourceState::Unknown
        }
    }

    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult> {
        if !self.member {
            return Ok(ApplyResult::Skipped {
                reason: format!("not a member of {}", self.group),
            });
        }

        let result = match self.drives.query(self.letter).map_err(drive_error)? {
            Some(drive) if drive.satisfies(&self.remote) => return Ok(ApplyResult::NoChange),
            Some(drive) => {
                log::info!(
                    "{} is {} ({}), remapping to {}",
                    self.letter,
                    drive.remote,
                    drive.status,
                    self.remote
                );
                ApplyResult::Modified
            }
            None => ApplyResult::Created,
        };

        if ctx.dry_run {
            return Ok(ApplyResult::Skipped {
                reason: "dry run".to_string(),
            });
        }

        // always clear the letter first, even when nothing is listed there
        self.unmap()?;
        self.drives
            .map(self.letter, &self.remote)
            .map_err(drive_error)
            .with_context(|| format!("Failed to map {} to {}", self.letter, self.remote))?;

        Ok(result)
    }

    fn remove(&self, ctx: &mut ApplyContext) -> Result<ApplyResult> {
        if ctx.dry_run {
            return Ok(ApplyResult::Skipped {
                reason: "dry run".to_string(),
            });
        }
        match self.drives.query(self.letter).map_err(drive_error)? {
            Some(drive) if drive.satisfies(&self.remote) => {
                self.unmap()?;
                Ok(ApplyResult::Removed)
            }
            _ => Ok(ApplyResult::NoChange),
        }
    }

    fn reversible(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{FailureKind, classify};
    use drivekit::{ConnectionStatus, DriveCall, MemoryDrives};

    fn letter(c: char) -> DriveLetter {
        DriveLetter::new(c).unwrap()
    }

    fn finance(drives: &Arc<MemoryDrives>, member: bool) -> DriveMappingResource {
        DriveMappingResource::new(
            "Finance",
            "Finance",
            letter('F'),
            r"\\fs01\finance".parse().unwrap(),
            member,
            drives.clone(),
        )
    }

    fn mutations(drives: &MemoryDrives) -> Vec<DriveCall> {
        drives
            .calls()
            .into_iter()
            .filter(DriveCall::is_mutation)
            .collect()
    }

    #[test]
    fn test_unmap_precedes_map_for_a_free_letter() {
        let drives = Arc::new(MemoryDrives::new());
        let result = finance(&drives, true)
            .apply(&mut ApplyContext::new(false, false))
            .unwrap();

        assert!(matches!(result, ApplyResult::Created));
        assert_eq!(
            mutations(&drives),
            vec![
                DriveCall::Unmap(letter('F')),
                DriveCall::Map(letter('F'), r"\\fs01\finance".to_string()),
            ]
        );
    }

    #[test]
    fn test_letter_pointing_elsewhere_is_remapped_once() {
        let drives = Arc::new(MemoryDrives::new());
        drives.insert(letter('F'), r"\\old\finance", ConnectionStatus::Ok);

        let resource = finance(&drives, true);
        assert!(matches!(
            resource.current_state().unwrap(),
            ResourceState::Modified { .. }
        ));

        let result = resource.apply(&mut ApplyContext::new(false, false)).unwrap();
        assert!(matches!(result, ApplyResult::Modified));
        assert_eq!(
            mutations(&drives),
            vec![
                DriveCall::Unmap(letter('F')),
                DriveCall::Map(letter('F'), r"\\fs01\finance".to_string()),
            ]
        );
    }

    #[test]
    fn test_satisfied_mapping_is_left_alone() {
        let drives = Arc::new(MemoryDrives::new());
        drives.insert(letter('F'), r"\\FS01\Finance", ConnectionStatus::Ok);

        let resource = finance(&drives, true);
        assert_eq!(resource.current_state().unwrap(), resource.desired_state());
        let result = resource.apply(&mut ApplyContext::new(false, false)).unwrap();
        assert!(matches!(result, ApplyResult::NoChange));
        assert!(mutations(&drives).is_empty());
    }

    #[test]
    fn test_disconnected_mapping_is_reestablished() {
        let drives = Arc::new(MemoryDrives::new());
        drives.insert(letter('F'), r"\\fs01\finance", ConnectionStatus::Unavailable);

        let result = finance(&drives, true)
            .apply(&mut ApplyContext::new(false, false))
            .unwrap();
        assert!(matches!(result, ApplyResult::Modified));
        assert_eq!(drives.get(letter('F')).unwrap().status, ConnectionStatus::Ok);
    }

    #[test]
    fn test_non_member_never_touches_the_drive_table() {
        let drives = Arc::new(MemoryDrives::new());
        let resource = finance(&drives, false);

        assert_eq!(resource.current_state().unwrap(), resource.desired_state());
        let result = resource.apply(&mut ApplyContext::new(false, false)).unwrap();
        assert!(matches!(result, ApplyResult::Skipped { .. }));
        assert!(drives.calls().is_empty());
    }

    #[test]
    fn test_map_failure_is_categorised() {
        let drives = Arc::new(MemoryDrives::new());
        drives.fail_map(letter('F'), 53);

        let err = finance(&drives, true)
            .apply(&mut ApplyContext::new(false, false))
            .unwrap_err();
        let (kind, message) = classify(&err);
        assert_eq!(kind, FailureKind::Unreachable);
        assert!(message.contains(r"Failed to map F: to \\fs01\finance"));
    }
}
