use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use platform_resources::{PlannedResource, ResourceKind};
use platform_utils::canonicalization::hash_jcs;
use platform_utils::error::EngineError;

use crate::plan::ActiveCapability;

/// Schema version stamped on every report
pub const REPORT_SCHEMA_VERSION: &str = "1";

/// One resource the provider recorded during the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceSummary {
    pub kind: ResourceKind,
    pub logical_name: String,
    pub id: String,
}

/// Outcome of a successful run.
///
/// `plan_digest` covers the capabilities and exports only, so two runs of the
/// same descriptor against the same settings produce the same digest
/// regardless of when they ran.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub schema_version: String,
    pub service: String,
    pub stack_name: String,
    pub region: String,
    pub emitted_at: DateTime<Utc>,
    pub capabilities: Vec<ActiveCapability>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unknown_sections: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<ResourceSummary>,
    pub exports: BTreeMap<String, Value>,
    pub plan_digest: String,
}

#[derive(Serialize)]
struct DigestInput<'a> {
    capabilities: &'a [ActiveCapability],
    exports: &'a BTreeMap<String, Value>,
}

impl RunReport {
    pub(crate) fn new(
        service: String,
        stack_name: String,
        region: String,
        capabilities: Vec<ActiveCapability>,
        unknown_sections: Vec<String>,
        exports: BTreeMap<String, Value>,
    ) -> Result<Self, EngineError> {
        let plan_digest = hash_jcs(&DigestInput {
            capabilities: &capabilities,
            exports: &exports,
        })
        .map_err(|e| EngineError::Io(std::io::Error::other(format!("plan digest: {e:#}"))))?;

        Ok(Self {
            schema_version: REPORT_SCHEMA_VERSION.to_string(),
            service,
            stack_name,
            region,
            emitted_at: Utc::now(),
            capabilities,
            unknown_sections,
            resources: Vec::new(),
            exports,
            plan_digest,
        })
    }

    /// Attach the resources a planning provider recorded.
    #[must_use]
    pub fn with_resources(mut self, planned: &[PlannedResource]) -> Self {
        self.resources = planned
            .iter()
            .map(|r| ResourceSummary {
                kind: r.kind,
                logical_name: r.logical_name.clone(),
                id: r.id.clone(),
            })
            .collect();
        self
    }

    #[must_use]
    pub fn export(&self, key: &str) -> Option<&Value> {
        self.exports.get(key)
    }

    /// Number of recorded resources of one kind.
    #[must_use]
    pub fn count_of(&self, kind: ResourceKind) -> usize {
        self.resources.iter().filter(|r| r.kind == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform_utils::types::Phase;
    use serde_json::json;

    fn report(exports: BTreeMap<String, Value>) -> RunReport {
        RunReport::new(
            "orders".to_string(),
            "dev.orders.us-east-1".to_string(),
            "us-east-1".to_string(),
            vec![ActiveCapability {
                name: "cache".to_string(),
                phase: Phase::Infrastructure,
                requires: Vec::new(),
            }],
            Vec::new(),
            exports,
        )
        .unwrap()
    }

    #[test]
    fn test_digest_ignores_timestamp() {
        let exports = BTreeMap::from([("redis_endpoint".to_string(), json!("r:6379"))]);
        let a = report(exports.clone());
        let b = report(exports);
        assert_eq!(a.plan_digest, b.plan_digest);
        assert_eq!(a.plan_digest.len(), 64);
    }

    #[test]
    fn test_digest_tracks_exports() {
        let a = report(BTreeMap::new());
        let b = report(BTreeMap::from([("k".to_string(), json!(1))]));
        assert_ne!(a.plan_digest, b.plan_digest);
    }

    #[test]
    fn test_serialized_shape() {
        let value = serde_json::to_value(report(BTreeMap::new())).unwrap();
        assert_eq!(value["schema_version"], "1");
        assert_eq!(value["capabilities"][0]["phase"], "infrastructure");
        assert!(value.get("resources").is_none());
        assert!(value.get("unknown_sections").is_none());
        assert!(value["emitted_at"].is_string());
    }
}
