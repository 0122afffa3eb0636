//! ECS service behind the shared load balancer
//!
//! Provisions the full container path: ECR repository, cluster, target
//! group, listener rule on the shared 443 listener, DNS record, access
//! application, task definition and service. Network and IAM come from the
//! foundation step.

use serde_json::Value;
use std::collections::BTreeMap;

use platform_capability_api::{Context, Phase, Registry};
use platform_resources::{Resource, ResourceKind, ResourceRequest, attrs};
use platform_utils::error::EngineError;

use crate::keys;
use crate::names::COMPUTE;
use crate::section::Section;

pub fn register(registry: &mut Registry) {
    registry.register(COMPUTE, Phase::Compute, &[], handle);
}

/// Values of the declared secrets that are set in the environment.
///
/// Missing secrets are skipped with a warning.
pub(crate) fn present_secrets(names: &[String]) -> BTreeMap<String, String> {
    let mut found = BTreeMap::new();
    for name in names {
        match std::env::var(name) {
            Ok(value) if !value.is_empty() => {
                tracing::info!(secret = %name, "secret will be passed to the container");
                found.insert(name.clone(), value);
            }
            _ => tracing::warn!(
                secret = %name,
                "secret declared in platform.yaml but not found in environment"
            ),
        }
    }
    found
}

/// ECR repository and the `:latest` image URI inside it.
///
/// Repositories are recorded under `ecr.repositories.<name>` so handlers
/// building from the same image share one.
pub(crate) fn ecr_repository(
    ctx: &mut Context<'_>,
    logical_name: String,
    name: &str,
) -> Result<(Resource, String), EngineError> {
    let key = format!("ecr.repositories.{name}");
    let repo = match ctx.get::<Resource>(&key) {
        Some(existing) => existing.clone(),
        None => {
            let created = ctx.provision(
                ResourceRequest::new(ResourceKind::EcrRepository, logical_name)
                    .property("name", name)
                    .property("image_tag_mutability", "MUTABLE")
                    .property("scan_on_push", true),
            )?;
            ctx.set(key, created.clone());
            created
        }
    };
    let image_uri = format!("{}:latest", repo.require_attribute(attrs::REPOSITORY_URL)?);
    Ok((repo, image_uri))
}

fn handle(section: &Value, ctx: &mut Context<'_>) -> Result<(), EngineError> {
    Section::new(COMPUTE, section)?;
    let security_group = ctx.require::<Resource>(keys::COMPUTE_SG)?.clone();
    let task_role = ctx.require::<Resource>(keys::TASK_ROLE)?.clone();
    let exec_role = ctx.require::<Resource>(keys::EXEC_ROLE)?.clone();

    let service_info = ctx.service().clone();
    let service = service_info.service_name.as_str();
    let settings = &service_info.compute;
    let infra = &service_info.infrastructure;
    let host = format!("{service}.{}", infra.zone_name);

    let (repo, image_uri) = ecr_repository(ctx, format!("{service}_ecr"), service)?;
    let cluster = ctx.provision(
        ResourceRequest::new(ResourceKind::EcsCluster, format!("{service}_cluster"))
            .property("name", format!("{service}-cluster")),
    )?;
    let target_group = ctx.provision(
        ResourceRequest::new(ResourceKind::TargetGroup, format!("{service}_tg"))
            .property("name", format!("{service}-tg"))
            .property("vpc_id", infra.vpc_id.clone())
            .property("port", settings.port)
            .property("protocol", "HTTP")
            .property("target_type", "ip")
            .property("health_check_path", settings.health_path.clone()),
    )?;
    let listener_rule = ctx.provision(
        ResourceRequest::new(ResourceKind::ListenerRule, format!("{service}_listener_rule"))
            .property("listener_arn", infra.listener_443_arn.clone())
            .property("host_header", host.clone())
            .property("target_group_arn", target_group.arn.clone()),
    )?;
    ctx.provision(
        ResourceRequest::new(ResourceKind::DnsRecord, format!("{service}_dns"))
            .property("name", service)
            .property("fqdn", host.clone())
            .property("zone_id", infra.zone_id.clone())
            .property("target", infra.alb_dns_name.clone())
            .property("type", "CNAME"),
    )?;
    ctx.provision(
        ResourceRequest::new(ResourceKind::AccessApplication, format!("{service}_access"))
            .property("name", service)
            .property("domain", host.clone())
            .property("zone_id", infra.zone_id.clone())
            .property("account_id", infra.account_id.clone()),
    )?;

    let secrets = present_secrets(&service_info.secrets);
    let mut task =
        ResourceRequest::new(ResourceKind::EcsTaskDefinition, format!("{service}_task"))
            .property("name", service)
            .property("image", image_uri)
            .property("cpu", settings.cpu)
            .property("memory", settings.memory)
            .property("container_port", settings.port)
            .property("task_role_arn", task_role.arn.clone())
            .property("execution_role_arn", exec_role.arn.clone())
            .property("secrets", secrets.keys().cloned().collect::<Vec<_>>());
    for (name, value) in &secrets {
        task = task.secret(&format!("secret.{name}"), value.clone());
    }
    let task_def = ctx.provision(task)?;

    let ecs_service = ctx.provision(
        ResourceRequest::new(ResourceKind::EcsService, format!("{service}_service"))
            .property("name", service)
            .property("cluster_arn", cluster.arn.clone())
            .property("task_definition_arn", task_def.arn)
            .property("desired_count", settings.min_capacity)
            .property("subnet_ids", infra.private_subnet_ids.clone())
            .property("security_group_ids", vec![security_group.id])
            .property("target_group_arn", target_group.arn)
            .property("container_port", settings.port)
            .property("depends_on", vec![listener_rule.arn]),
    )?;

    ctx.export("service_url", format!("https://{host}"));
    ctx.export(
        "ecr_repository_uri",
        repo.require_attribute(attrs::REPOSITORY_URL)?,
    );
    ctx.export("ecs_cluster_name", cluster.name);
    ctx.export("ecs_service_name", ecs_service.name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::provision_foundation;
    use crate::test_support::{info, provider};
    use serde_json::json;
    use serial_test::serial;
    use std::collections::BTreeSet;

    #[test]
    #[serial]
    fn test_full_container_path() {
        let declared: BTreeSet<String> = ["compute".to_string()].into();
        let mut p = provider();
        let exports = {
            let mut ctx = Context::new(info(), &mut p);
            provision_foundation(&declared, &mut ctx).unwrap();
            handle(&json!({"port": 80}), &mut ctx).unwrap();
            ctx.into_exports()
        };

        assert_eq!(exports["service_url"], "https://orders.example.internal");
        assert_eq!(
            exports["ecr_repository_uri"],
            "123456789012.dkr.ecr.us-east-1.amazonaws.com/orders"
        );
        assert_eq!(exports["ecs_cluster_name"], "orders-cluster");
        assert_eq!(exports["ecs_service_name"], "orders");

        for kind in [
            ResourceKind::EcrRepository,
            ResourceKind::EcsCluster,
            ResourceKind::TargetGroup,
            ResourceKind::ListenerRule,
            ResourceKind::DnsRecord,
            ResourceKind::AccessApplication,
            ResourceKind::EcsTaskDefinition,
            ResourceKind::EcsService,
        ] {
            assert_eq!(p.of_kind(kind).count(), 1, "{kind}");
        }
        let rule = p.find("orders_listener_rule").unwrap();
        assert_eq!(rule.properties["host_header"], "orders.example.internal");
        let svc = p.find("orders_service").unwrap();
        let sg = p.find("orders_ecs_sg").unwrap();
        assert_eq!(svc.properties["security_group_ids"], json!([sg.id]));
        assert_eq!(svc.properties["desired_count"], 1);
    }

    #[test]
    #[serial]
    fn test_secrets_from_environment() {
        unsafe {
            std::env::set_var("ORDERS_API_TOKEN", "tok-123");
            std::env::remove_var("ORDERS_MISSING_SECRET");
        }
        let declared: BTreeSet<String> = ["compute".to_string()].into();
        let mut service = info();
        service.secrets = vec![
            "ORDERS_API_TOKEN".to_string(),
            "ORDERS_MISSING_SECRET".to_string(),
        ];
        let mut p = provider();
        {
            let mut ctx = Context::new(service, &mut p);
            provision_foundation(&declared, &mut ctx).unwrap();
            handle(&json!({}), &mut ctx).unwrap();
        }
        unsafe { std::env::remove_var("ORDERS_API_TOKEN") };

        let task = p.find("orders_task").unwrap();
        assert_eq!(task.properties["secrets"], json!(["ORDERS_API_TOKEN"]));
        assert_eq!(task.properties["secret.ORDERS_API_TOKEN"], "<redacted>");
        assert!(!serde_json::to_string(p.planned()).unwrap().contains("tok-123"));
    }

    #[test]
    fn test_requires_foundation_outputs() {
        let mut p = provider();
        let mut ctx = Context::new(info(), &mut p);
        let err = handle(&json!({}), &mut ctx).unwrap_err();
        let message = err.to_string();
        assert!(message.contains(keys::COMPUTE_SG));
        assert!(message.contains("(none)"));
        assert!(p.planned().is_empty());
    }
}
