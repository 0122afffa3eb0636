use serde::Serialize;
use std::collections::BTreeSet;

use platform_capability_api::{Phase, Registry};
use platform_config::PlatformDescriptor;
use platform_utils::error::{CapabilityError, EngineError};

/// A declared capability the registry knows about
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveCapability {
    pub name: String,
    pub phase: Phase,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,
}

/// Validated set of capabilities for one run, in phase then name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivePlan {
    pub capabilities: Vec<ActiveCapability>,
    /// Declared sections with no registered capability.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unknown_sections: Vec<String>,
}

impl ActivePlan {
    /// Intersect the descriptor's sections with the registry and check requirements.
    ///
    /// # Errors
    ///
    /// - [`CapabilityError::UnmetRequirement`] when a `requires` entry is not active
    /// - [`CapabilityError::PhaseOrderViolation`] when a requirement runs in a later phase
    /// - [`CapabilityError::InvalidSection`] when a capability is registered in the
    ///   foundation phase, which the phase loop never runs
    pub fn resolve(
        descriptor: &PlatformDescriptor,
        registry: &Registry,
    ) -> Result<Self, EngineError> {
        let mut capabilities = Vec::new();
        let mut unknown_sections = Vec::new();
        for name in descriptor.sections.keys() {
            match registry.lookup(name) {
                Some(def) => capabilities.push(ActiveCapability {
                    name: def.name.clone(),
                    phase: def.phase,
                    requires: def.requires.clone(),
                }),
                None => {
                    tracing::warn!(section = %name, "no capability registered for section; ignoring");
                    unknown_sections.push(name.clone());
                }
            }
        }
        capabilities.sort_by(|a, b| a.phase.cmp(&b.phase).then_with(|| a.name.cmp(&b.name)));

        let plan = Self {
            capabilities,
            unknown_sections,
        };
        plan.validate()?;
        Ok(plan)
    }

    fn validate(&self) -> Result<(), CapabilityError> {
        for capability in &self.capabilities {
            if capability.phase == Phase::Foundation {
                return Err(CapabilityError::InvalidSection {
                    capability: capability.name.clone(),
                    reason: "registered in the foundation phase, which no handler runs in"
                        .to_string(),
                });
            }
            for required in &capability.requires {
                let Some(dependency) = self.get(required) else {
                    return Err(CapabilityError::UnmetRequirement {
                        capability: capability.name.clone(),
                        requires: required.clone(),
                    });
                };
                if dependency.phase > capability.phase {
                    return Err(CapabilityError::PhaseOrderViolation {
                        capability: capability.name.clone(),
                        phase: capability.phase,
                        requires: required.clone(),
                        requires_phase: dependency.phase,
                    });
                }
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ActiveCapability> {
        self.capabilities.iter().find(|c| c.name == name)
    }

    /// Names of the active capabilities, as handed to the foundation step.
    #[must_use]
    pub fn declared(&self) -> BTreeSet<String> {
        self.capabilities.iter().map(|c| c.name.clone()).collect()
    }

    pub fn in_phase(&self, phase: Phase) -> impl Iterator<Item = &ActiveCapability> {
        self.capabilities.iter().filter(move |c| c.phase == phase)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform_capability_api::Context;
    use serde_json::Value;

    fn noop(_: &Value, _: &mut Context<'_>) -> Result<(), EngineError> {
        Ok(())
    }

    fn descriptor(sections: &[&str]) -> PlatformDescriptor {
        let mut yaml = String::from("apiVersion: platform.althq.com/v1\nmetadata:\n  name: orders\n");
        if sections.is_empty() {
            yaml.push_str("spec: {}\n");
        } else {
            yaml.push_str("spec:\n");
        }
        for section in sections {
            yaml.push_str(&format!("  {section}: {{}}\n"));
        }
        PlatformDescriptor::parse(&yaml).unwrap()
    }

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry.register("storage", Phase::Infrastructure, &[], noop);
        registry.register("cache", Phase::Infrastructure, &[], noop);
        registry.register("lambda", Phase::Compute, &["storage"], noop);
        registry.register("compute", Phase::Compute, &[], noop);
        registry
    }

    #[test]
    fn test_orders_by_phase_then_name() {
        let plan = ActivePlan::resolve(&descriptor(&["lambda", "compute", "storage", "cache"]), &registry())
            .unwrap();
        let names: Vec<&str> = plan.capabilities.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["cache", "storage", "compute", "lambda"]);
        assert_eq!(plan.in_phase(Phase::Compute).count(), 2);
        assert_eq!(plan.in_phase(Phase::Networking).count(), 0);
    }

    #[test]
    fn test_unknown_sections_are_reported_not_run() {
        let plan = ActivePlan::resolve(&descriptor(&["compute", "queue"]), &registry()).unwrap();
        assert_eq!(plan.unknown_sections, vec!["queue".to_string()]);
        assert!(plan.get("queue").is_none());
        assert_eq!(plan.declared(), BTreeSet::from(["compute".to_string()]));
    }

    #[test]
    fn test_unmet_requirement() {
        let err = ActivePlan::resolve(&descriptor(&["lambda"]), &registry()).unwrap_err();
        match err {
            EngineError::Capability(CapabilityError::UnmetRequirement {
                capability,
                requires,
            }) => {
                assert_eq!(capability, "lambda");
                assert_eq!(requires, "storage");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_requirement_in_later_phase_is_rejected() {
        let mut registry = registry();
        registry.register("edge", Phase::Networking, &[], noop);
        registry.register("cache", Phase::Infrastructure, &["edge"], noop);
        let err = ActivePlan::resolve(&descriptor(&["cache", "edge"]), &registry).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Capability(CapabilityError::PhaseOrderViolation {
                phase: Phase::Infrastructure,
                requires_phase: Phase::Networking,
                ..
            })
        ));
    }

    #[test]
    fn test_same_phase_requirement_is_allowed() {
        let mut registry = registry();
        registry.register("compute", Phase::Compute, &["lambda"], noop);
        let plan =
            ActivePlan::resolve(&descriptor(&["compute", "lambda", "storage"]), &registry).unwrap();
        assert_eq!(plan.capabilities.len(), 3);
    }

    #[test]
    fn test_foundation_registration_rejected() {
        let mut registry = registry();
        registry.register("vpc", Phase::Foundation, &[], noop);
        let err = ActivePlan::resolve(&descriptor(&["vpc"]), &registry).unwrap_err();
        assert!(err.to_string().contains("foundation"));
    }

    #[test]
    fn test_empty_descriptor() {
        let plan = ActivePlan::resolve(&descriptor(&[]), &registry()).unwrap();
        assert!(plan.is_empty());
        assert!(plan.declared().is_empty());
    }

    mod props {
        use super::*;
        use platform_capabilities::builtin_registry;
        use proptest::prelude::*;

        const NAMES: &[&str] = &[
            "compute",
            "cache",
            "database",
            "storage",
            "s3",
            "dynamodb",
            "serviceDiscovery",
            "lambda",
            "agentcoreRuntime",
            "eventbridge",
            "triggers",
            "webhookGateway",
            "queue",
        ];

        proptest! {
            #[test]
            fn prop_resolved_plan_is_ordered_and_closed(
                picks in prop::collection::btree_set(0..NAMES.len(), 0..NAMES.len())
            ) {
                let sections: Vec<&str> = picks.iter().map(|i| NAMES[*i]).collect();
                let registry = builtin_registry();
                match ActivePlan::resolve(&descriptor(&sections), &registry) {
                    Ok(plan) => {
                        for pair in plan.capabilities.windows(2) {
                            prop_assert!((pair[0].phase, &pair[0].name) < (pair[1].phase, &pair[1].name));
                        }
                        for capability in &plan.capabilities {
                            for required in &capability.requires {
                                let dependency = plan.get(required);
                                prop_assert!(dependency.is_some());
                                prop_assert!(dependency.unwrap().phase <= capability.phase);
                            }
                        }
                        prop_assert_eq!(
                            plan.capabilities.len() + plan.unknown_sections.len(),
                            sections.len()
                        );
                    }
                    Err(err) => {
                        prop_assert!(sections.contains(&"lambda") && !sections.contains(&"storage"), "{err}");
                    }
                }
            }
        }
    }
}
