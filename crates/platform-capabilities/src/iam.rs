//! IAM role creation and inline policy attachment.

use platform_capability_api::Context;
use platform_resources::{PolicyDocument, Resource, ResourceKind, ResourceRequest, Statement};
use platform_utils::error::EngineError;

pub const ECS_TASKS_PRINCIPAL: &str = "ecs-tasks.amazonaws.com";
pub const LAMBDA_PRINCIPAL: &str = "lambda.amazonaws.com";
pub const AGENTCORE_PRINCIPAL: &str = "bedrock-agentcore.amazonaws.com";
pub const SCHEDULER_PRINCIPAL: &str = "scheduler.amazonaws.com";

pub const ECR_READ_ONLY: &str = "arn:aws:iam::aws:policy/AmazonEC2ContainerRegistryReadOnly";
pub const CLOUDWATCH_LOGS: &str = "arn:aws:iam::aws:policy/CloudWatchLogsFullAccess";
pub const LAMBDA_VPC_ACCESS: &str =
    "arn:aws:iam::aws:policy/service-role/AWSLambdaVPCAccessExecutionRole";

/// Create a role assumable by `principal` with managed policies attached.
pub fn create_role(
    ctx: &mut Context<'_>,
    logical_name: String,
    name: String,
    principal: &str,
    managed_policies: &[&str],
) -> Result<Resource, EngineError> {
    let request = ResourceRequest::new(ResourceKind::IamRole, logical_name)
        .property("name", name)
        .property(
            "assume_role_policy",
            PolicyDocument::assume_role(principal).to_value(),
        )
        .property("managed_policy_arns", managed_policies.to_vec());
    ctx.provision(request)
}

/// Attach an inline policy to `role`.
pub fn attach_policy(
    ctx: &mut Context<'_>,
    role: &Resource,
    logical_name: String,
    document: PolicyDocument,
) -> Result<Resource, EngineError> {
    let name = logical_name.replace('_', "-");
    tracing::debug!(role = %role.name, policy = %name, "attaching inline policy");
    let request = ResourceRequest::new(ResourceKind::IamRolePolicy, logical_name)
        .property("name", name)
        .property("role", role.name.clone())
        .property("policy", document.to_value());
    ctx.provision(request)
}

/// `actions` on every ARN and everything beneath it.
#[must_use]
pub fn scoped_to_arns(actions: &[&str], arns: &[String]) -> PolicyDocument {
    let resources = arns
        .iter()
        .cloned()
        .chain(arns.iter().map(|arn| format!("{arn}/*")));
    PolicyDocument::new(vec![Statement::allow(actions.iter().copied(), resources)])
}
