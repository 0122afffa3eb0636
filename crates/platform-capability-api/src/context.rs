use serde_json::Value;
use std::any::Any;
use std::collections::BTreeMap;

use platform_config::{ComputeSettings, PlatformDescriptor, SharedInfrastructure};
use platform_resources::{Resource, ResourceProvider, ResourceRequest};
use platform_utils::error::{CapabilityError, EngineError};

/// Read-only facts about the service being provisioned
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    pub service_name: String,
    pub region: String,
    /// Environment variable names the service wants injected as secrets.
    pub secrets: Vec<String>,
    pub compute: ComputeSettings,
    pub infrastructure: SharedInfrastructure,
}

impl ServiceInfo {
    #[must_use]
    pub fn from_descriptor(
        descriptor: &PlatformDescriptor,
        region: &str,
        infrastructure: SharedInfrastructure,
    ) -> Self {
        Self {
            service_name: descriptor.service_name.clone(),
            region: descriptor
                .region
                .clone()
                .unwrap_or_else(|| region.to_string()),
            secrets: descriptor.secrets.clone(),
            compute: descriptor.compute.clone(),
            infrastructure,
        }
    }

    /// Service name in the form accepted by identifiers that disallow `-`.
    #[must_use]
    pub fn snake_name(&self) -> String {
        self.service_name.replace('-', "_")
    }
}

/// Run-scoped key/value store shared by the foundation step and every handler.
///
/// Two namespaces live here. Outputs are internal, keyed by dotted path and
/// type-erased so handlers can exchange resources, ids and lists alike.
/// Exports are JSON values published once the run completes.
///
/// ```rust
/// use platform_capability_api::{Context, ServiceInfo};
/// use platform_config::{ComputeSettings, SharedInfrastructure};
/// use platform_resources::PlanProvider;
///
/// let info = ServiceInfo {
///     service_name: "orders".to_string(),
///     region: "us-east-1".to_string(),
///     secrets: Vec::new(),
///     compute: ComputeSettings::default(),
///     infrastructure: SharedInfrastructure::placeholder(),
/// };
/// let mut provider = PlanProvider::new("000000000000", "us-east-1");
/// let mut ctx = Context::new(info, &mut provider);
///
/// ctx.set("security_groups.compute.id", "sg-1".to_string());
/// assert_eq!(ctx.require::<String>("security_groups.compute.id").unwrap(), "sg-1");
/// assert!(ctx.require::<String>("iam.task_role").is_err());
/// ```
pub struct Context<'a> {
    service: ServiceInfo,
    outputs: BTreeMap<String, Box<dyn Any + Send + Sync>>,
    exports: BTreeMap<String, Value>,
    provider: &'a mut dyn ResourceProvider,
}

impl<'a> Context<'a> {
    pub fn new(service: ServiceInfo, provider: &'a mut dyn ResourceProvider) -> Self {
        Self {
            service,
            outputs: BTreeMap::new(),
            exports: BTreeMap::new(),
            provider,
        }
    }

    #[must_use]
    pub fn service(&self) -> &ServiceInfo {
        &self.service
    }

    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service.service_name
    }

    #[must_use]
    pub fn infrastructure(&self) -> &SharedInfrastructure {
        &self.service.infrastructure
    }

    /// Store `value` under `key`, replacing whatever was there.
    pub fn set<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.outputs.insert(key.into(), Box::new(value));
    }

    /// Value under `key` if present and of type `T`.
    #[must_use]
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.outputs.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    /// Value under `key`, or `default` when absent or of another type.
    #[must_use]
    pub fn get_or<T: Any + Clone>(&self, key: &str, default: T) -> T {
        self.get::<T>(key).cloned().unwrap_or(default)
    }

    /// Value a handler cannot proceed without.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::MissingDependency`] listing every known key
    /// when `key` is absent or holds a value of another type.
    pub fn require<T: Any>(&self, key: &str) -> Result<&T, CapabilityError> {
        match self.outputs.get(key) {
            Some(value) => value.downcast_ref::<T>().ok_or_else(|| {
                tracing::debug!(
                    key,
                    expected = std::any::type_name::<T>(),
                    "context value has unexpected type"
                );
                self.missing(key)
            }),
            None => Err(self.missing(key)),
        }
    }

    fn missing(&self, key: &str) -> CapabilityError {
        CapabilityError::MissingDependency {
            key: key.to_string(),
            available: self.keys(),
        }
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.outputs.contains_key(key)
    }

    /// Known output keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.outputs.keys().cloned().collect()
    }

    /// Record `value` for publication under `key`. Last write wins.
    pub fn export(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.exports.insert(key.into(), value.into());
    }

    /// Snapshot of the exports recorded so far.
    #[must_use]
    pub fn exports(&self) -> BTreeMap<String, Value> {
        self.exports.clone()
    }

    #[must_use]
    pub fn into_exports(self) -> BTreeMap<String, Value> {
        self.exports
    }

    /// Hand a request to the run's resource provider.
    ///
    /// # Errors
    ///
    /// Provider failures are returned unchanged as [`EngineError::Provider`].
    pub fn provision(&mut self, request: ResourceRequest) -> Result<Resource, EngineError> {
        Ok(self.provider.provision(request)?)
    }
}

impl std::fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("service", &self.service.service_name)
            .field("outputs", &self.outputs.keys().collect::<Vec<_>>())
            .field("exports", &self.exports)
            .finish_non_exhaustive()
    }
}
