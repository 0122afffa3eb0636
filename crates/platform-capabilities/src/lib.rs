//! Built-in capabilities for platform-engine
//!
//! Each module registers one capability (eventbridge registers two). The
//! [`foundation`] module is not a capability: the orchestrator runs it once,
//! before the phase loop, to create shared security groups and IAM roles.

pub mod agentcore;
pub mod cache;
pub mod compute;
pub mod database;
pub mod dynamodb;
pub mod eventbridge;
pub mod foundation;
pub mod iam;
pub mod keys;
pub mod lambda;
pub mod s3;
pub mod service_discovery;
pub mod storage;
pub mod webhook_gateway;

mod section;

use platform_capability_api::Registry;

pub use foundation::provision_foundation;

/// Capability names as they appear under `spec` in `platform.yaml`.
pub mod names {
    pub const COMPUTE: &str = "compute";
    pub const CACHE: &str = "cache";
    pub const DATABASE: &str = "database";
    pub const STORAGE: &str = "storage";
    pub const S3: &str = "s3";
    pub const DYNAMODB: &str = "dynamodb";
    pub const SERVICE_DISCOVERY: &str = "serviceDiscovery";
    pub const LAMBDA: &str = "lambda";
    pub const AGENTCORE_RUNTIME: &str = "agentcoreRuntime";
    pub const EVENTBRIDGE: &str = "eventbridge";
    pub const TRIGGERS: &str = "triggers";
    pub const WEBHOOK_GATEWAY: &str = "webhookGateway";
}

/// Registry holding every built-in capability.
#[must_use]
pub fn builtin_registry() -> Registry {
    let mut registry = Registry::new();
    cache::register(&mut registry);
    database::register(&mut registry);
    storage::register(&mut registry);
    s3::register(&mut registry);
    dynamodb::register(&mut registry);
    service_discovery::register(&mut registry);
    compute::register(&mut registry);
    lambda::register(&mut registry);
    agentcore::register(&mut registry);
    eventbridge::register(&mut registry);
    webhook_gateway::register(&mut registry);
    registry
}

/// Shared fixtures for handler tests.
#[cfg(test)]
pub(crate) mod test_support {
    use platform_capability_api::ServiceInfo;
    use platform_config::{ComputeSettings, SharedInfrastructure};
    use platform_resources::PlanProvider;

    pub fn info() -> ServiceInfo {
        let mut infrastructure = SharedInfrastructure::placeholder();
        infrastructure.account_id = "123456789012".to_string();
        ServiceInfo {
            service_name: "orders".to_string(),
            region: "us-east-1".to_string(),
            secrets: Vec::new(),
            compute: ComputeSettings::default(),
            infrastructure,
        }
    }

    pub fn provider() -> PlanProvider {
        PlanProvider::new("123456789012", "us-east-1")
    }
}
