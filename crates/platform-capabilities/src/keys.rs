//! Context keys written by the foundation step.
//!
//! Handlers read these with `require` when they cannot run without the
//! value and with `get` when it only adds optional wiring.

/// `Resource` of the compute security group.
pub const COMPUTE_SG: &str = "security_groups.compute";
pub const COMPUTE_SG_ID: &str = "security_groups.compute.id";
pub const AGENT_SG_ID: &str = "security_groups.agent.id";
pub const DATABASE_SG_ID: &str = "security_groups.database.id";
pub const EFS_SG_ID: &str = "security_groups.efs.id";
/// Dedicated agent runtime group. Nothing built in sets it; VPC runtimes
/// fall back to the compute group.
pub const AGENTCORE_SG_ID: &str = "security_groups.agentcore.id";

// IAM role keys hold `Resource` values.
pub const TASK_ROLE: &str = "iam.task_role";
pub const EXEC_ROLE: &str = "iam.exec_role";
pub const LAMBDA_EXECUTION_ROLE: &str = "iam.lambda_execution_role";
pub const AGENTCORE_RUNTIME_ROLE: &str = "iam.agentcore_runtime_role";
pub const AGENTCORE_MEMORY_ROLE: &str = "iam.agentcore_memory_role";

/// `Vec<String>` of bucket ARNs set by s3.
pub const S3_BUCKET_ARNS: &str = "s3.bucket_arns";
/// `BTreeMap<String, String>` of bucket env vars set by s3.
pub const S3_BUCKET_ENV_VARS: &str = "s3.bucket_env_vars";
pub const EFS_ACCESS_POINT_ARN: &str = "storage.efs.access_point_arn";
