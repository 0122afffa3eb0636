//! S3 buckets with automatic IAM wiring.
//!
//! Bucket names are prefixed with the account id for global uniqueness:
//! `uploads` becomes `123456789012-uploads`. When the foundation created an
//! ECS task role, one inline policy grants it `s3:*` on exactly the buckets
//! created here.

use serde_json::{Value, json};
use std::collections::BTreeMap;

use platform_capability_api::{Context, Phase, Registry};
use platform_resources::{ResourceKind, ResourceRequest};
use platform_utils::error::EngineError;

use crate::foundation::role;
use crate::iam::{attach_policy, scoped_to_arns};
use crate::keys;
use crate::names::S3;
use crate::section::Section;

pub fn register(registry: &mut Registry) {
    registry.register(S3, Phase::Infrastructure, &[], handle);
}

/// `S3_BUCKET_<NAME>` environment variable for a bucket.
#[must_use]
pub fn bucket_env_var(name: &str) -> String {
    format!("S3_BUCKET_{}", name.to_uppercase().replace('-', "_"))
}

fn handle(section: &Value, ctx: &mut Context<'_>) -> Result<(), EngineError> {
    let section = Section::new(S3, section)?;
    let buckets = section.entries("buckets")?;
    if buckets.is_empty() {
        ctx.export("s3_bucket_names", Vec::<String>::new());
        return Ok(());
    }

    let service = ctx.service_name().to_string();
    let account_id = ctx.infrastructure().account_id.clone();
    let mut names = Vec::with_capacity(buckets.len());
    let mut arns = Vec::with_capacity(buckets.len());
    let mut env_vars = BTreeMap::new();

    for bucket in &buckets {
        let name = bucket.required_str("name")?;
        let physical = format!("{account_id}-{name}");

        let rules = bucket
            .entries("lifecycleRules")?
            .iter()
            .map(|rule| -> Result<Value, EngineError> {
                Ok(json!({
                    "prefix": rule.str_or("prefix", "")?,
                    "transition_to_ia": rule.opt_u64("transitionToIA")?,
                    "expiration_days": rule.opt_u64("expirationDays")?,
                }))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let created = ctx.provision(
            ResourceRequest::new(ResourceKind::S3Bucket, format!("{service}_{name}_bucket"))
                .property("name", physical)
                .property("versioning", bucket.bool_or("versioning", false)?)
                .property("encryption", bucket.str_or("encryption", "AES256")?)
                .property("lifecycle_rules", rules),
        )?;

        ctx.set(format!("s3.buckets.{name}.arn"), created.arn.clone());
        ctx.set(format!("s3.buckets.{name}.name"), created.name.clone());
        ctx.export(format!("s3_bucket_{}", name.replace('-', "_")), created.name.clone());
        env_vars.insert(bucket_env_var(name), created.name.clone());
        names.push(name.to_string());
        arns.push(created.arn);
    }

    ctx.export("s3_bucket_names", names);
    ctx.set(keys::S3_BUCKET_ENV_VARS, env_vars);

    if let Some(task_role) = role(ctx, keys::TASK_ROLE).cloned() {
        let document = scoped_to_arns(&["s3:*"], &arns);
        attach_policy(ctx, &task_role, format!("{service}_s3_task_policy"), document)?;
    }
    ctx.set(keys::S3_BUCKET_ARNS, arns);
    Ok(())
}
