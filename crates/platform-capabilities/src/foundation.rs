//! Shared security groups and IAM roles
//!
//! The foundation step looks only at *which* capabilities are declared, never
//! at their sections. Rows are evaluated top to bottom exactly once, and later
//! rows read ids written by earlier ones:
//!
//! | Declared | Creates | Context keys |
//! |---|---|---|
//! | compute or lambda | compute security group | `security_groups.compute`, `security_groups.compute.id` |
//! | database, cache or storage | agent security group | `security_groups.agent.id` |
//! | database or cache | database security group | `security_groups.database.id` |
//! | storage | EFS security group | `security_groups.efs.id` |
//! | compute | task and execution roles | `iam.task_role`, `iam.exec_role` |
//! | lambda | lambda execution role | `iam.lambda_execution_role` |
//! | agentcoreRuntime | runtime and memory roles | `iam.agentcore_runtime_role`, `iam.agentcore_memory_role` |

use serde_json::{Value, json};
use std::collections::BTreeSet;

use platform_capability_api::Context;
use platform_resources::{Resource, ResourceKind, ResourceRequest};
use platform_utils::error::EngineError;

use crate::iam::{self, create_role};
use crate::keys;
use crate::names;

const POSTGRES_PORT: u16 = 5432;
const REDIS_PORT: u16 = 6379;
const NFS_PORT: u16 = 2049;

/// Create the resources shared across the declared capabilities.
///
/// # Errors
///
/// Provider failures are returned unchanged.
pub fn provision_foundation(
    declared: &BTreeSet<String>,
    ctx: &mut Context<'_>,
) -> Result<(), EngineError> {
    let has = |name: &str| declared.contains(name);
    let service = ctx.service_name().to_string();
    let vpc_id = ctx.infrastructure().vpc_id.clone();

    if has(names::COMPUTE) || has(names::LAMBDA) {
        tracing::info!(service = %service, "foundation: compute security group");
        let vpc_cidr = ctx.infrastructure().vpc_cidr.clone();
        let request = security_group(&service, "ecs", &vpc_id, "ECS tasks")
            .property("ingress", vec![cidr_rule(80, &vpc_cidr, "HTTP from VPC")]);
        let sg = ctx.provision(request)?;
        ctx.set(keys::COMPUTE_SG_ID, sg.id.clone());
        ctx.set(keys::COMPUTE_SG, sg);
    }

    if has(names::DATABASE) || has(names::CACHE) || has(names::STORAGE) {
        tracing::info!(service = %service, "foundation: agent security group");
        let sg = ctx.provision(security_group(&service, "agent", &vpc_id, "Agents"))?;
        ctx.set(keys::AGENT_SG_ID, sg.id);
    }

    if has(names::DATABASE) || has(names::CACHE) {
        tracing::info!(service = %service, "foundation: database security group");
        let request = scoped_group(
            ctx,
            &service,
            "db",
            &vpc_id,
            "Databases",
            &[POSTGRES_PORT, REDIS_PORT],
        );
        let sg = ctx.provision(request)?;
        ctx.set(keys::DATABASE_SG_ID, sg.id);
    }

    if has(names::STORAGE) {
        tracing::info!(service = %service, "foundation: efs security group");
        let request = scoped_group(
            ctx,
            &service,
            "efs",
            &vpc_id,
            "EFS mount targets",
            &[NFS_PORT],
        );
        let sg = ctx.provision(request)?;
        ctx.set(keys::EFS_SG_ID, sg.id);
    }

    if has(names::COMPUTE) {
        tracing::info!(service = %service, "foundation: ecs task roles");
        let managed = [iam::ECR_READ_ONLY, iam::CLOUDWATCH_LOGS];
        let task_role = create_role(
            ctx,
            format!("{service}_task_role"),
            format!("{service}-ecs-task"),
            iam::ECS_TASKS_PRINCIPAL,
            &managed,
        )?;
        let exec_role = create_role(
            ctx,
            format!("{service}_exec_role"),
            format!("{service}-ecs-exec"),
            iam::ECS_TASKS_PRINCIPAL,
            &managed,
        )?;
        ctx.set(keys::TASK_ROLE, task_role);
        ctx.set(keys::EXEC_ROLE, exec_role);
    }

    if has(names::LAMBDA) {
        tracing::info!(service = %service, "foundation: lambda execution role");
        let role = create_role(
            ctx,
            format!("{service}_lambda_role"),
            format!("{service}-lambda-exec"),
            iam::LAMBDA_PRINCIPAL,
            &[iam::LAMBDA_VPC_ACCESS, iam::ECR_READ_ONLY],
        )?;
        ctx.set(keys::LAMBDA_EXECUTION_ROLE, role);
    }

    if has(names::AGENTCORE_RUNTIME) {
        tracing::info!(service = %service, "foundation: agentcore roles");
        let runtime_role = create_role(
            ctx,
            format!("{service}_agentcore_runtime_role"),
            format!("{service}-agentcore-runtime"),
            iam::AGENTCORE_PRINCIPAL,
            &[iam::ECR_READ_ONLY, iam::CLOUDWATCH_LOGS],
        )?;
        ctx.set(keys::AGENTCORE_RUNTIME_ROLE, runtime_role);

        let memory_role = create_role(
            ctx,
            format!("{service}_agentcore_memory_role"),
            format!("{service}-agentcore-memory"),
            iam::AGENTCORE_PRINCIPAL,
            &[],
        )?;
        ctx.set(keys::AGENTCORE_MEMORY_ROLE, memory_role);
    }

    Ok(())
}

fn security_group(service: &str, suffix: &str, vpc_id: &str, purpose: &str) -> ResourceRequest {
    ResourceRequest::new(ResourceKind::SecurityGroup, format!("{service}_{suffix}_sg"))
        .property("name", format!("{service}-{suffix}"))
        .property("vpc_id", vpc_id)
        .property("description", format!("{purpose} for {service}"))
        .property(
            "egress",
            vec![json!({
                "protocol": "-1",
                "from_port": 0,
                "to_port": 0,
                "cidr_blocks": ["0.0.0.0/0"],
            })],
        )
}

fn cidr_rule(port: u16, cidr: &str, description: &str) -> Value {
    json!({
        "protocol": "tcp",
        "from_port": port,
        "to_port": port,
        "cidr_blocks": [cidr],
        "description": description,
    })
}

/// Group admitting `ports` from whichever of the compute and agent groups exist.
fn scoped_group(
    ctx: &Context<'_>,
    service: &str,
    suffix: &str,
    vpc_id: &str,
    purpose: &str,
    ports: &[u16],
) -> ResourceRequest {
    let control_plane = ctx.get::<String>(keys::COMPUTE_SG_ID).cloned();
    let agent = ctx.get::<String>(keys::AGENT_SG_ID).cloned();

    let ingress: Vec<Value> = ports
        .iter()
        .flat_map(|port| {
            control_plane
                .iter()
                .chain(agent.iter())
                .map(move |source| {
                    json!({
                        "protocol": "tcp",
                        "from_port": port,
                        "to_port": port,
                        "security_groups": [source],
                    })
                })
        })
        .collect();

    security_group(service, suffix, vpc_id, purpose)
        .property("control_plane_sg_id", control_plane)
        .property("agent_sg_id", agent)
        .property("ingress", ingress)
}

/// Role stored under `key`, if the foundation created it.
pub(crate) fn role<'c>(ctx: &'c Context<'_>, key: &str) -> Option<&'c Resource> {
    ctx.get::<Resource>(key)
}
