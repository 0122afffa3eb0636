//! EventBridge Scheduler group shared by `eventbridge` and `triggers`.
//!
//! Both capabilities need the same schedule group and invoker role. Whichever
//! runs first provisions them; the other reuses the recorded group.

use serde_json::Value;

use platform_capability_api::{Context, Phase, Registry};
use platform_resources::{PolicyDocument, ResourceKind, ResourceRequest, Statement};
use platform_utils::error::EngineError;

use crate::iam::{self, attach_policy, create_role};
use crate::names::{EVENTBRIDGE, TRIGGERS};
use crate::section::Section;

pub const SCHEDULE_GROUP_KEY: &str = "eventbridge.schedule_group";
pub const TRIGGERS_SCHEDULE_GROUP_KEY: &str = "triggers.eventbridge.schedule_group";
const SHARED_GROUP_KEY: &str = "scheduler.schedule_group";

pub fn register(registry: &mut Registry) {
    registry.register(EVENTBRIDGE, Phase::Compute, &[], handle_eventbridge);
    registry.register(TRIGGERS, Phase::Compute, &[], handle_triggers);
}

fn handle_eventbridge(section: &Value, ctx: &mut Context<'_>) -> Result<(), EngineError> {
    let section = Section::new(EVENTBRIDGE, section)?;
    let group = ensure_schedule_group(ctx, section.opt_str("scheduleGroup")?)?;
    ctx.set(SCHEDULE_GROUP_KEY, group.clone());
    ctx.export("eventbridge_schedule_group", group);
    Ok(())
}

fn handle_triggers(section: &Value, ctx: &mut Context<'_>) -> Result<(), EngineError> {
    let section = Section::new(TRIGGERS, section)?;
    let requested = section.child("eventbridge")?.opt_str("scheduleGroup")?;
    let group = ensure_schedule_group(ctx, requested)?;
    ctx.set(TRIGGERS_SCHEDULE_GROUP_KEY, group.clone());
    ctx.export("eventbridge_schedule_group", group);
    Ok(())
}

fn ensure_schedule_group(
    ctx: &mut Context<'_>,
    requested: Option<&str>,
) -> Result<String, EngineError> {
    if let Some(existing) = ctx.get::<String>(SHARED_GROUP_KEY) {
        tracing::debug!(group = %existing, "reusing schedule group");
        return Ok(existing.clone());
    }

    let service = ctx.service_name().to_string();
    let name = match requested {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("{service}-schedules"),
    };
    let group = ctx.provision(
        ResourceRequest::new(ResourceKind::ScheduleGroup, format!("{service}_schedule_group"))
            .property("name", name),
    )?;

    let role = create_role(
        ctx,
        format!("{service}_eventbridge_role"),
        format!("{service}-eventbridge-scheduler"),
        iam::SCHEDULER_PRINCIPAL,
        &[],
    )?;
    let invoke = PolicyDocument::new(vec![Statement::allow(["lambda:InvokeFunction"], ["*"])]);
    attach_policy(ctx, &role, format!("{service}_eventbridge_policy"), invoke)?;

    ctx.set(SHARED_GROUP_KEY, group.name.clone());
    Ok(group.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{info, provider};
    use serde_json::json;

    #[test]
    fn test_eventbridge_default_group() {
        let mut p = provider();
        {
            let mut ctx = Context::new(info(), &mut p);
            handle_eventbridge(&json!({}), &mut ctx).unwrap();
            assert_eq!(
                ctx.get::<String>(SCHEDULE_GROUP_KEY).map(String::as_str),
                Some("orders-schedules")
            );
            assert_eq!(ctx.exports()["eventbridge_schedule_group"], "orders-schedules");
        }
        assert_eq!(p.of_kind(ResourceKind::ScheduleGroup).count(), 1);
        let role = p.find("orders_eventbridge_role").unwrap();
        assert_eq!(role.name, "orders-eventbridge-scheduler");
    }

    #[test]
    fn test_triggers_reuses_group_either_order() {
        for first_is_triggers in [false, true] {
            let mut p = provider();
            {
                let mut ctx = Context::new(info(), &mut p);
                if first_is_triggers {
                    handle_triggers(&json!({}), &mut ctx).unwrap();
                    handle_eventbridge(&json!({}), &mut ctx).unwrap();
                } else {
                    handle_eventbridge(&json!({}), &mut ctx).unwrap();
                    handle_triggers(&json!({}), &mut ctx).unwrap();
                }
                assert_eq!(
                    ctx.get::<String>(TRIGGERS_SCHEDULE_GROUP_KEY),
                    ctx.get::<String>(SCHEDULE_GROUP_KEY)
                );
            }
            assert_eq!(p.of_kind(ResourceKind::ScheduleGroup).count(), 1);
            assert_eq!(p.of_kind(ResourceKind::IamRole).count(), 1);
        }
    }

    #[test]
    fn test_custom_group_name() {
        let mut p = provider();
        {
            let mut ctx = Context::new(info(), &mut p);
            handle_eventbridge(&json!({"scheduleGroup": "nightly"}), &mut ctx).unwrap();
        }
        assert_eq!(p.find("orders_schedule_group").unwrap().name, "nightly");
    }
}
