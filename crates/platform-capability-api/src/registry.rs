use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use platform_utils::error::EngineError;
use platform_utils::types::Phase;

use crate::context::Context;

/// Signature every capability handler implements.
///
/// The first argument is the capability's raw section from the descriptor.
pub type Handler = fn(&Value, &mut Context<'_>) -> Result<(), EngineError>;

/// A registered capability
#[derive(Debug, Clone, Serialize)]
pub struct CapabilityDefinition {
    pub name: String,
    pub phase: Phase,
    /// Capabilities that must also be declared for this one to run.
    pub requires: Vec<String>,
    #[serde(skip)]
    pub handler: Handler,
}

/// Name → definition table consulted by the orchestrator.
///
/// Registering a name twice replaces the earlier definition.
///
/// ```rust
/// use platform_capability_api::{Context, Phase, Registry};
/// use platform_utils::error::EngineError;
///
/// fn noop(_: &serde_json::Value, _: &mut Context<'_>) -> Result<(), EngineError> {
///     Ok(())
/// }
///
/// let mut registry = Registry::new();
/// registry.register("lambda", Phase::Compute, &["storage"], noop);
///
/// let def = registry.lookup("lambda").unwrap();
/// assert_eq!(def.phase, Phase::Compute);
/// assert_eq!(def.requires, vec!["storage".to_string()]);
/// assert!(registry.lookup("queue").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Registry {
    definitions: BTreeMap<String, CapabilityDefinition>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a capability. Only metadata is stored; `handler` is not called.
    pub fn register(&mut self, name: &str, phase: Phase, requires: &[&str], handler: Handler) {
        let definition = CapabilityDefinition {
            name: name.to_string(),
            phase,
            requires: requires.iter().map(|r| (*r).to_string()).collect(),
            handler,
        };
        if let Some(previous) = self.definitions.insert(name.to_string(), definition) {
            tracing::debug!(
                capability = name,
                previous_phase = %previous.phase,
                phase = %phase,
                "capability registration replaced an existing definition"
            );
        }
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&CapabilityDefinition> {
        self.definitions.get(name)
    }

    /// Drop a registration, returning it if it existed.
    pub fn unregister(&mut self, name: &str) -> Option<CapabilityDefinition> {
        self.definitions.remove(name)
    }

    /// Registered definitions sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &CapabilityDefinition> {
        self.definitions.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
