//! Managed agent runtimes with bundled memory
//!
//! Cross-capability wiring done here:
//! - the runtime role gets `bedrock-agentcore:*` on the memory
//! - the runtime role gets `s3:*` on buckets the s3 capability created
//! - bucket env vars from s3 are merged into every runtime's environment
//! - the ECS task role, when present, may invoke the runtimes and pass the
//!   runtime role

use serde_json::{Value, json};
use std::collections::BTreeMap;

use platform_capability_api::{Context, Phase, Registry};
use platform_resources::{
    PolicyDocument, Resource, ResourceKind, ResourceRequest, Statement, attrs,
};
use platform_utils::error::{CapabilityError, EngineError};

use crate::compute::{ecr_repository, present_secrets};
use crate::foundation::role;
use crate::iam::{attach_policy, scoped_to_arns};
use crate::keys;
use crate::names::AGENTCORE_RUNTIME;
use crate::section::Section;

pub const MEMORY_ID_KEY: &str = "agentcore.memory.id";
pub const ENV_MEMORY_ID: &str = "AGENTCORE_MEMORY_ID";

pub fn register(registry: &mut Registry) {
    registry.register(AGENTCORE_RUNTIME, Phase::Compute, &[], handle);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NetworkMode {
    Public,
    Vpc,
}

impl NetworkMode {
    fn parse(value: &str) -> Result<Self, CapabilityError> {
        match value {
            "PUBLIC" => Ok(Self::Public),
            "VPC" => Ok(Self::Vpc),
            other => Err(CapabilityError::InvalidSection {
                capability: AGENTCORE_RUNTIME.to_string(),
                reason: format!("networkMode must be PUBLIC or VPC, found '{other}'"),
            }),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Public => "PUBLIC",
            Self::Vpc => "VPC",
        }
    }
}

fn authorizer(section: &Section<'_>) -> Result<Option<Value>, CapabilityError> {
    let auth = section.child("authorizer")?;
    let discovery_url = auth.str_or("discoveryUrl", "")?;
    if discovery_url.is_empty() {
        return Ok(None);
    }
    Ok(Some(json!({
        "custom_jwt_authorizer": {
            "discovery_url": discovery_url,
            "allowed_audiences": auth.string_list("allowedAudiences")?,
            "allowed_clients": auth.string_list("allowedClients")?,
        }
    })))
}

fn handle(section: &Value, ctx: &mut Context<'_>) -> Result<(), EngineError> {
    let section = Section::new(AGENTCORE_RUNTIME, section)?;
    let runtime_role = ctx.require::<Resource>(keys::AGENTCORE_RUNTIME_ROLE)?.clone();
    let memory_role = ctx.require::<Resource>(keys::AGENTCORE_MEMORY_ROLE)?.clone();
    let service_info = ctx.service().clone();
    let service = service_info.service_name.as_str();

    let memory_section = section.child("memory")?;
    let memory = ctx.provision(
        ResourceRequest::new(
            ResourceKind::AgentCoreMemory,
            format!("{service}_agentcore_memory"),
        )
        .property("name", format!("{}_memory", service_info.snake_name()))
        .property("role_arn", memory_role.arn.clone())
        .property("event_expiry_days", memory_section.u64_or("eventExpiryDays", 30)?)
        .property("region", service_info.region.clone()),
    )?;
    ctx.set(MEMORY_ID_KEY, memory.id.clone());
    ctx.export("agentcore_memory_id", memory.id.clone());

    let memory_access = PolicyDocument::new(vec![Statement::allow(
        ["bedrock-agentcore:*"],
        [memory.arn.clone()],
    )]);
    attach_policy(
        ctx,
        &runtime_role,
        format!("{service}_agentcore_memory_policy"),
        memory_access,
    )?;

    let bucket_arns = ctx
        .get::<Vec<String>>(keys::S3_BUCKET_ARNS)
        .cloned()
        .unwrap_or_default();
    if !bucket_arns.is_empty() {
        let document = scoped_to_arns(&["s3:*"], &bucket_arns);
        attach_policy(
            ctx,
            &runtime_role,
            format!("{service}_s3_agentcore_policy"),
            document,
        )?;
    }

    let secrets = present_secrets(&service_info.secrets);
    let bucket_env = ctx
        .get::<BTreeMap<String, String>>(keys::S3_BUCKET_ENV_VARS)
        .cloned()
        .unwrap_or_default();
    let section_authorizer = authorizer(&section)?;

    let mut runtime_arns = Vec::new();
    for runtime in section.entries("runtimes")? {
        let name = runtime.required_str("name")?;
        let image = runtime.required_str("image")?;
        let mode = NetworkMode::parse(&runtime.str_or("networkMode", "PUBLIC")?)?;

        let (repo, image_uri) = ecr_repository(
            ctx,
            format!("{service}_{image}_ecr"),
            &format!("{service}-{image}"),
        )?;
        let repo_url = repo.require_attribute(attrs::REPOSITORY_URL)?;
        ctx.export(format!("ecr_{}_uri", image.replace('-', "_")), repo_url);

        // Declared variables first; bucket names and the memory id win over them.
        let mut environment = runtime.string_map("environmentVariables")?;
        environment.extend(bucket_env.clone());
        environment.insert(ENV_MEMORY_ID.to_string(), memory.id.clone());

        let mut request = ResourceRequest::new(
            ResourceKind::AgentCoreRuntime,
            format!("{service}_{name}_runtime"),
        )
        .property("name", name)
        .property("image_uri", image_uri)
        .property("role_arn", runtime_role.arn.clone())
        .property("network_mode", mode.as_str())
        .property("description", runtime.str_or("description", "")?)
        .property("environment_variables", json!(environment))
        .property("secret_names", secrets.keys().cloned().collect::<Vec<_>>());
        for (secret, value) in &secrets {
            request = request.secret(&format!("env.{secret}"), value.clone());
        }
        if let Some(auth) = authorizer(&runtime)?.or_else(|| section_authorizer.clone()) {
            request = request.property("authorizer", auth);
        }
        if mode == NetworkMode::Vpc {
            let sg_id = match ctx.get::<String>(keys::AGENTCORE_SG_ID) {
                Some(id) => id.clone(),
                None => ctx.require::<String>(keys::COMPUTE_SG_ID)?.clone(),
            };
            request = request
                .property("subnet_ids", service_info.infrastructure.private_subnet_ids.clone())
                .property("security_group_ids", vec![sg_id]);
        }

        let created = ctx.provision(request)?;
        ctx.set(format!("agentcore.runtimes.{name}.arn"), created.arn.clone());
        ctx.export(
            format!("agentcore_runtime_{}_arn", name.replace('-', "_")),
            created.arn.clone(),
        );
        runtime_arns.push(created.arn);
    }

    if !runtime_arns.is_empty()
        && let Some(task_role) = role(ctx, keys::TASK_ROLE).cloned()
    {
        let document = PolicyDocument::new(vec![
            Statement::allow(["bedrock-agentcore:InvokeAgentRuntime"], runtime_arns),
            Statement::allow(["iam:PassRole"], [runtime_role.arn.clone()]),
        ]);
        attach_policy(
            ctx,
            &task_role,
            format!("{service}_agentcore_invoke_policy"),
            document,
        )?;
    }
    Ok(())
}
