//! Container-image Lambda functions with VPC access, EFS and function URLs.

use serde_json::{Value, json};

use platform_capability_api::{Context, Phase, Registry};
use platform_resources::{Resource, ResourceKind, ResourceRequest, attrs};
use platform_utils::error::EngineError;

use crate::compute::ecr_repository;
use crate::keys;
use crate::names::{LAMBDA, STORAGE};
use crate::section::Section;

pub const EFS_MOUNT_PATH: &str = "/mnt/efs";

pub fn register(registry: &mut Registry) {
    registry.register(LAMBDA, Phase::Compute, &[STORAGE], handle);
}

fn handle(section: &Value, ctx: &mut Context<'_>) -> Result<(), EngineError> {
    let section = Section::new(LAMBDA, section)?;
    let functions = section.entries("functions")?;
    if functions.is_empty() {
        return Ok(());
    }

    let security_group_id = ctx.require::<String>(keys::COMPUTE_SG_ID)?.clone();
    let role = ctx.require::<Resource>(keys::LAMBDA_EXECUTION_ROLE)?.clone();
    let access_point_arn = ctx.require::<String>(keys::EFS_ACCESS_POINT_ARN)?.clone();
    let service = ctx.service_name().to_string();
    let subnet_ids = ctx.infrastructure().private_subnet_ids.clone();

    for function in &functions {
        let name = function.required_str("name")?;
        let image = function.required_str("image")?;
        let environment = function.string_map("environment")?;
        let memory = function.u64_or("memory", 2048)?;
        let timeout = function.u64_or("timeout", 120)?;

        let repo_name = format!("{service}-{image}");
        let (_, image_uri) = ecr_repository(ctx, format!("{service}_{image}_ecr"), &repo_name)?;

        let created = ctx.provision(
            ResourceRequest::new(ResourceKind::LambdaFunction, format!("{service}_{name}_fn"))
                .property("name", format!("{service}-{name}"))
                .property("package_type", "Image")
                .property("image_uri", image_uri)
                .property("role_arn", role.arn.clone())
                .property("memory_size", memory)
                .property("timeout", timeout)
                .property("environment", json!(environment))
                .property(
                    "vpc_config",
                    json!({
                        "subnet_ids": subnet_ids,
                        "security_group_ids": [security_group_id],
                    }),
                )
                .property(
                    "file_system_config",
                    json!({"arn": access_point_arn, "local_mount_path": EFS_MOUNT_PATH}),
                )
                .property("function_url_auth_type", "NONE"),
        )?;
        let url = created.require_attribute(attrs::FUNCTION_URL)?.to_string();

        ctx.set(format!("lambda.{name}.url"), url.clone());
        ctx.export(format!("lambda_{}_url", name.replace('-', "_")), url);
    }
    Ok(())
}
