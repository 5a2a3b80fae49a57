//! Execution planner - builds resources from a validated desired state

use crate::engine::Backends;
use crate::engine::validate::ValidatedState;
use crate::groups::UserGroups;
use crate::resource::{DriveMappingResource, ScheduledTrigger};
use declarative::ExecutionPlan;

/// Build the plan: triggers first, then drive mappings, each in config order
pub fn build_plan(state: &ValidatedState, groups: &UserGroups, backends: &Backends) -> ExecutionPlan {
    let mut plan = ExecutionPlan::new();

    for trigger in &state.triggers {
        plan.add_resource(Box::new(ScheduledTrigger::new(
            trigger.definition(&state.executable_path),
            trigger.spec.enabled,
            backends.scheduler.clone(),
        )));
    }

    for drive in &state.drives {
        let member = groups.contains(&drive.group);
        if !member {
            log::info!(
                "Skipping {} ({}): not a member of {}",
                drive.label,
                drive.letter,
                drive.group
            );
        }

        plan.add_resource(Box::new(DriveMappingResource::new(
            drive.label.clone(),
            drive.group.clone(),
            drive.letter,
            drive.remote.clone(),
            member,
            backends.drives.clone(),
        )));
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DesiredState, DriveMapping, TriggerSpec};
    use crate::engine::validate;
    use crate::resource::{DRIVE_MAPPING, SCHEDULED_TASK};
    use taskkit::TriggerKind;

    #[test]
    fn test_plan_order_and_filtering() {
        let desired = DesiredState {
            target_directory: r"C:\Apps\DriveMapper".to_string(),
            executable_name: "DriveMapper.exe".to_string(),
            trigger_specs: vec![
                TriggerSpec::new(TriggerKind::Logon, "map"),
                TriggerSpec::new(TriggerKind::NetworkChange, "map"),
            ],
            drive_mappings: vec![DriveMapping::new("Tools", "IT", "T", r"\\fs01\tools")],
        };
        let state = validate(&desired).unwrap();
        let plan = build_plan(&state, &UserGroups::default(), &Backends::simulated());

        let ids: Vec<_> = plan
            .resources
            .iter()
            .map(|r| (r.resource_type(), r.id()))
            .collect();
        assert_eq!(
            ids,
            vec![
                (SCHEDULED_TASK, "DriveMapper.exe".to_string()),
                (SCHEDULED_TASK, "DriveMapper.exe_NetworkChange".to_string()),
                (DRIVE_MAPPING, "T:".to_string()),
            ]
        );

        let drives_only = build_plan(&state, &UserGroups::default(), &Backends::simulated())
            .filter_by_target(Some("drives"));
        assert_eq!(drives_only.total_resources(), 1);

        let one = build_plan(&state, &UserGroups::default(), &Backends::simulated())
            .filter_by_target(Some("triggers.drivemapper.exe_networkchange"));
        assert_eq!(one.total_resources(), 1);
    }
}
