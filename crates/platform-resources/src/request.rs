use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use strum::EnumIter;

use platform_utils::error::ProviderError;

/// Well-known attribute names returned on [`Resource::attributes`].
pub mod attrs {
    /// Host (and port) clients connect to: caches and databases.
    pub const ENDPOINT: &str = "endpoint";
    /// Registry URL for container repositories.
    pub const REPOSITORY_URL: &str = "repository_url";
    /// Public invocation URL for functions.
    pub const FUNCTION_URL: &str = "function_url";
    /// Fully qualified record name for DNS records.
    pub const FQDN: &str = "fqdn";
}

/// Kinds of resources the engine can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    SecurityGroup,
    IamRole,
    IamRolePolicy,
    EcrRepository,
    EcsCluster,
    EcsTaskDefinition,
    EcsService,
    TargetGroup,
    ListenerRule,
    DnsRecord,
    AccessApplication,
    #[serde(rename = "elasticache_cluster")]
    ElastiCacheCluster,
    RdsInstance,
    EfsFileSystem,
    EfsAccessPoint,
    S3Bucket,
    #[serde(rename = "dynamodb_table")]
    DynamoDbTable,
    LambdaFunction,
    #[serde(rename = "agentcore_memory")]
    AgentCoreMemory,
    #[serde(rename = "agentcore_runtime")]
    AgentCoreRuntime,
    ScheduleGroup,
    ServiceDiscoveryNamespace,
}

impl ResourceKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SecurityGroup => "security_group",
            Self::IamRole => "iam_role",
            Self::IamRolePolicy => "iam_role_policy",
            Self::EcrRepository => "ecr_repository",
            Self::EcsCluster => "ecs_cluster",
            Self::EcsTaskDefinition => "ecs_task_definition",
            Self::EcsService => "ecs_service",
            Self::TargetGroup => "target_group",
            Self::ListenerRule => "listener_rule",
            Self::DnsRecord => "dns_record",
            Self::AccessApplication => "access_application",
            Self::ElastiCacheCluster => "elasticache_cluster",
            Self::RdsInstance => "rds_instance",
            Self::EfsFileSystem => "efs_file_system",
            Self::EfsAccessPoint => "efs_access_point",
            Self::S3Bucket => "s3_bucket",
            Self::DynamoDbTable => "dynamodb_table",
            Self::LambdaFunction => "lambda_function",
            Self::AgentCoreMemory => "agentcore_memory",
            Self::AgentCoreRuntime => "agentcore_runtime",
            Self::ScheduleGroup => "schedule_group",
            Self::ServiceDiscoveryNamespace => "service_discovery_namespace",
        }
    }

    /// Prefix used for synthesized identifiers.
    #[must_use]
    pub const fn id_prefix(&self) -> &'static str {
        match self {
            Self::SecurityGroup => "sg",
            Self::IamRole => "role",
            Self::IamRolePolicy => "policy",
            Self::EcrRepository => "ecr",
            Self::EcsCluster => "cluster",
            Self::EcsTaskDefinition => "taskdef",
            Self::EcsService => "svc",
            Self::TargetGroup => "tg",
            Self::ListenerRule => "rule",
            Self::DnsRecord => "dns",
            Self::AccessApplication => "access",
            Self::ElastiCacheCluster => "redis",
            Self::RdsInstance => "db",
            Self::EfsFileSystem => "fs",
            Self::EfsAccessPoint => "fsap",
            Self::S3Bucket => "bucket",
            Self::DynamoDbTable => "table",
            Self::LambdaFunction => "fn",
            Self::AgentCoreMemory => "mem",
            Self::AgentCoreRuntime => "rt",
            Self::ScheduleGroup => "sched",
            Self::ServiceDiscoveryNamespace => "ns",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to provision one resource.
///
/// `logical_name` identifies the resource within a run and must be unique.
/// Secret properties are handed to the provider but never serialized.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceRequest {
    pub kind: ResourceKind,
    pub logical_name: String,
    pub properties: Map<String, Value>,
    #[serde(skip)]
    pub secret_properties: BTreeMap<String, String>,
}

impl ResourceRequest {
    #[must_use]
    pub fn new(kind: ResourceKind, logical_name: impl Into<String>) -> Self {
        Self {
            kind,
            logical_name: logical_name.into(),
            properties: Map::new(),
            secret_properties: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    #[must_use]
    pub fn secret(mut self, key: &str, value: impl Into<String>) -> Self {
        self.secret_properties.insert(key.to_string(), value.into());
        self
    }

    /// String property, if present.
    #[must_use]
    pub fn str_property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }
}

/// A provisioned resource as reported by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub kind: ResourceKind,
    pub logical_name: String,
    pub id: String,
    pub arn: String,
    pub name: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl Resource {
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Attribute the provider was expected to return.
    pub fn require_attribute(&self, key: &str) -> Result<&str, ProviderError> {
        self.attribute(key).ok_or_else(|| ProviderError::Rejected {
            kind: self.kind.to_string(),
            logical_name: self.logical_name.clone(),
            reason: format!("provider returned no '{key}' attribute"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use strum::IntoEnumIterator;

    #[test]
    fn test_kind_names_and_prefixes_are_unique() {
        let names: HashSet<_> = ResourceKind::iter().map(|k| k.as_str()).collect();
        let prefixes: HashSet<_> = ResourceKind::iter().map(|k| k.id_prefix()).collect();
        let count = ResourceKind::iter().count();
        assert_eq!(names.len(), count);
        assert_eq!(prefixes.len(), count);
    }

    #[test]
    fn test_kind_serializes_as_str() {
        for kind in ResourceKind::iter() {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_secret_properties_are_not_serialized() {
        let request = ResourceRequest::new(ResourceKind::RdsInstance, "orders_rds")
            .property("engine", "postgres")
            .secret("password", "hunter2");
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("postgres"));
        assert!(!json.contains("hunter2"));
        assert!(!json.contains("password"));
        assert_eq!(request.str_property("engine"), Some("postgres"));
    }

    #[test]
    fn test_require_attribute() {
        let resource = Resource {
            kind: ResourceKind::ElastiCacheCluster,
            logical_name: "orders_redis".to_string(),
            id: "redis-1".to_string(),
            arn: "arn".to_string(),
            name: "orders".to_string(),
            attributes: BTreeMap::from([(attrs::ENDPOINT.to_string(), "host:6379".to_string())]),
        };
        assert_eq!(resource.require_attribute(attrs::ENDPOINT).unwrap(), "host:6379");
        let err = resource.require_attribute(attrs::FQDN).unwrap_err();
        assert!(err.to_string().contains("orders_redis"));
    }
}
