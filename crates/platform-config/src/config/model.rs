use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use platform_utils::types::ConfigSource;

/// `[defaults]` section of `.platform-engine/config.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    pub region: Option<String>,
    pub stack_prefix: Option<String>,
    pub backend_url: Option<String>,
}

/// Read-only snapshot of the shared network, load balancer and DNS zone.
///
/// Resolved once before a run and never mutated while capabilities execute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SharedInfrastructure {
    pub vpc_id: String,
    pub vpc_cidr: String,
    #[serde(default)]
    pub private_subnet_ids: Vec<String>,
    pub alb_arn: String,
    pub alb_dns_name: String,
    pub listener_443_arn: String,
    pub zone_id: String,
    pub zone_name: String,
    pub account_id: String,
}

impl SharedInfrastructure {
    /// Stand-in identifiers used by `plan` when no snapshot is configured.
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            vpc_id: "vpc-plan".to_string(),
            vpc_cidr: "10.0.0.0/16".to_string(),
            private_subnet_ids: vec!["subnet-plan-a".to_string(), "subnet-plan-b".to_string()],
            alb_arn: "arn:aws:elasticloadbalancing:plan:000000000000:loadbalancer/app/shared/plan"
                .to_string(),
            alb_dns_name: "shared-alb.plan.internal".to_string(),
            listener_443_arn:
                "arn:aws:elasticloadbalancing:plan:000000000000:listener/app/shared/plan/443"
                    .to_string(),
            zone_id: "ZPLAN".to_string(),
            zone_name: "example.internal".to_string(),
            account_id: "000000000000".to_string(),
        }
    }
}

/// Effective engine settings with per-key source attribution
#[derive(Debug, Clone)]
pub struct Config {
    pub defaults: Defaults,
    pub infrastructure: Option<SharedInfrastructure>,
    /// File the settings were loaded from, if any.
    pub config_path: Option<PathBuf>,
    pub source_attribution: HashMap<String, ConfigSource>,
}

/// TOML file structure
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TomlConfig {
    pub(crate) defaults: Option<Defaults>,
    pub(crate) infrastructure: Option<SharedInfrastructure>,
}
