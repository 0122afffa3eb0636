//! In-process provider that records requests instead of calling a cloud API.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

use platform_utils::canonicalization::short_hash;
use platform_utils::error::ProviderError;

use crate::provider::ResourceProvider;
use crate::request::{Resource, ResourceKind, ResourceRequest, attrs};

const REDACTED: &str = "<redacted>";

/// A request as recorded by [`PlanProvider`], with secrets redacted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedResource {
    pub kind: ResourceKind,
    pub logical_name: String,
    pub id: String,
    pub arn: String,
    pub name: String,
    pub properties: Map<String, Value>,
}

/// Records every request and synthesizes deterministic identifiers.
///
/// Identifiers depend only on the logical name, so two plans of the same
/// descriptor produce identical output.
#[derive(Debug, Clone)]
pub struct PlanProvider {
    account_id: String,
    region: String,
    planned: Vec<PlannedResource>,
    seen: BTreeSet<String>,
    failures: BTreeMap<String, String>,
}

impl PlanProvider {
    #[must_use]
    pub fn new(account_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            region: region.into(),
            planned: Vec::new(),
            seen: BTreeSet::new(),
            failures: BTreeMap::new(),
        }
    }

    /// Reject the request for `logical_name` with `reason`.
    #[must_use]
    pub fn fail_on(mut self, logical_name: &str, reason: &str) -> Self {
        self.failures
            .insert(logical_name.to_string(), reason.to_string());
        self
    }

    /// Every recorded request in provisioning order.
    #[must_use]
    pub fn planned(&self) -> &[PlannedResource] {
        &self.planned
    }

    #[must_use]
    pub fn into_planned(self) -> Vec<PlannedResource> {
        self.planned
    }

    #[must_use]
    pub fn find(&self, logical_name: &str) -> Option<&PlannedResource> {
        self.planned.iter().find(|p| p.logical_name == logical_name)
    }

    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &PlannedResource> {
        self.planned.iter().filter(move |p| p.kind == kind)
    }

    fn arn_for(&self, kind: ResourceKind, id: &str, name: &str) -> String {
        let (acct, region) = (&self.account_id, &self.region);
        match kind {
            ResourceKind::S3Bucket => format!("arn:aws:s3:::{name}"),
            ResourceKind::IamRole => format!("arn:aws:iam::{acct}:role/{name}"),
            ResourceKind::IamRolePolicy => format!("arn:aws:iam::{acct}:policy/{name}"),
            ResourceKind::DnsRecord => format!("arn:aws:route53:::record/{name}"),
            ResourceKind::SecurityGroup => {
                format!("arn:aws:ec2:{region}:{acct}:security-group/{id}")
            }
            ResourceKind::EcrRepository => {
                format!("arn:aws:ecr:{region}:{acct}:repository/{name}")
            }
            ResourceKind::EcsCluster => format!("arn:aws:ecs:{region}:{acct}:cluster/{name}"),
            ResourceKind::EcsTaskDefinition => {
                format!("arn:aws:ecs:{region}:{acct}:task-definition/{name}:1")
            }
            ResourceKind::EcsService => format!("arn:aws:ecs:{region}:{acct}:service/{name}"),
            ResourceKind::TargetGroup => {
                format!("arn:aws:elasticloadbalancing:{region}:{acct}:targetgroup/{name}/{id}")
            }
            ResourceKind::ListenerRule => {
                format!("arn:aws:elasticloadbalancing:{region}:{acct}:listener-rule/{name}/{id}")
            }
            ResourceKind::AccessApplication => {
                format!("arn:aws:access:{region}:{acct}:application/{id}")
            }
            ResourceKind::ElastiCacheCluster => {
                format!("arn:aws:elasticache:{region}:{acct}:cluster:{name}")
            }
            ResourceKind::RdsInstance => format!("arn:aws:rds:{region}:{acct}:db:{name}"),
            ResourceKind::EfsFileSystem => {
                format!("arn:aws:elasticfilesystem:{region}:{acct}:file-system/{id}")
            }
            ResourceKind::EfsAccessPoint => {
                format!("arn:aws:elasticfilesystem:{region}:{acct}:access-point/{id}")
            }
            ResourceKind::DynamoDbTable => {
                format!("arn:aws:dynamodb:{region}:{acct}:table/{name}")
            }
            ResourceKind::LambdaFunction => {
                format!("arn:aws:lambda:{region}:{acct}:function:{name}")
            }
            ResourceKind::AgentCoreMemory => {
                format!("arn:aws:bedrock-agentcore:{region}:{acct}:memory/{id}")
            }
            ResourceKind::AgentCoreRuntime => {
                format!("arn:aws:bedrock-agentcore:{region}:{acct}:runtime/{id}")
            }
            ResourceKind::ScheduleGroup => {
                format!("arn:aws:scheduler:{region}:{acct}:schedule-group/{name}")
            }
            ResourceKind::ServiceDiscoveryNamespace => {
                format!("arn:aws:servicediscovery:{region}:{acct}:namespace/{id}")
            }
        }
    }

    fn attributes_for(&self, request: &ResourceRequest, id: &str, name: &str) -> BTreeMap<String, String> {
        let region = &self.region;
        let mut attributes = BTreeMap::new();
        match request.kind {
            ResourceKind::EcrRepository => {
                attributes.insert(
                    attrs::REPOSITORY_URL.to_string(),
                    format!("{}.dkr.ecr.{region}.amazonaws.com/{name}", self.account_id),
                );
            }
            ResourceKind::ElastiCacheCluster => {
                attributes.insert(
                    attrs::ENDPOINT.to_string(),
                    format!("{name}.{id}.cache.amazonaws.com:6379"),
                );
            }
            ResourceKind::RdsInstance => {
                attributes.insert(
                    attrs::ENDPOINT.to_string(),
                    format!("{name}.{id}.{region}.rds.amazonaws.com:5432"),
                );
            }
            ResourceKind::LambdaFunction => {
                attributes.insert(
                    attrs::FUNCTION_URL.to_string(),
                    format!("https://{id}.lambda-url.{region}.on.aws/"),
                );
            }
            ResourceKind::DnsRecord => {
                let fqdn = request.str_property("fqdn").unwrap_or(name);
                attributes.insert(attrs::FQDN.to_string(), fqdn.to_string());
            }
            _ => {}
        }
        attributes
    }
}

impl ResourceProvider for PlanProvider {
    fn provision(&mut self, request: ResourceRequest) -> Result<Resource, ProviderError> {
        if let Some(reason) = self.failures.get(&request.logical_name) {
            return Err(ProviderError::Rejected {
                kind: request.kind.to_string(),
                logical_name: request.logical_name.clone(),
                reason: reason.clone(),
            });
        }
        if !self.seen.insert(request.logical_name.clone()) {
            return Err(ProviderError::DuplicateLogicalName {
                logical_name: request.logical_name,
            });
        }

        let id = format!(
            "{}-{}",
            request.kind.id_prefix(),
            short_hash(&request.logical_name, 8)
        );
        let name = request
            .str_property("name")
            .unwrap_or(&request.logical_name)
            .to_string();
        let arn = self.arn_for(request.kind, &id, &name);
        let attributes = self.attributes_for(&request, &id, &name);

        tracing::debug!(
            kind = %request.kind,
            logical_name = %request.logical_name,
            id = %id,
            "planned resource"
        );

        let mut properties = request.properties.clone();
        for key in request.secret_properties.keys() {
            properties.insert(key.clone(), Value::String(REDACTED.to_string()));
        }
        self.planned.push(PlannedResource {
            kind: request.kind,
            logical_name: request.logical_name.clone(),
            id: id.clone(),
            arn: arn.clone(),
            name: name.clone(),
            properties,
        });

        Ok(Resource {
            kind: request.kind,
            logical_name: request.logical_name,
            id,
            arn,
            name,
            attributes,
        })
    }
}
