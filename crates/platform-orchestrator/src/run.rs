use std::time::Instant;

use platform_capabilities::provision_foundation;
use platform_capability_api::{Context, Phase, Registry, ServiceInfo};
use platform_config::{Config, PlatformDescriptor};
use platform_resources::{PlanProvider, ResourceProvider};
use platform_utils::error::{CapabilityError, EngineError};
use platform_utils::logging::{
    capability_span, log_capability_complete, log_capability_error, log_capability_start,
};
use serde_json::Value;

use crate::plan::{ActiveCapability, ActivePlan};
use crate::report::RunReport;

/// Drives one provisioning run against a registry.
pub struct Orchestrator<'r> {
    registry: &'r Registry,
}

impl<'r> Orchestrator<'r> {
    #[must_use]
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Intersect and validate without touching any resource.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Capability`] wrapping the failure from
    /// [`ActivePlan::resolve`]:
    ///
    /// - [`CapabilityError::UnmetRequirement`] when a `requires` entry is not declared
    /// - [`CapabilityError::PhaseOrderViolation`] when a requirement runs in a later phase
    /// - [`CapabilityError::InvalidSection`] when a capability is registered in the
    ///   foundation phase
    pub fn resolve(&self, descriptor: &PlatformDescriptor) -> Result<ActivePlan, EngineError> {
        ActivePlan::resolve(descriptor, self.registry)
    }

    /// Run every phase against `provider`.
    ///
    /// Nothing is returned on failure: the first error from validation, the
    /// foundation step or a handler aborts the run and the exports collected
    /// so far are dropped with the context.
    pub fn run(
        &self,
        descriptor: &PlatformDescriptor,
        config: &Config,
        provider: &mut dyn ResourceProvider,
    ) -> Result<RunReport, EngineError> {
        let plan = self.resolve(descriptor)?;

        let info = ServiceInfo::from_descriptor(
            descriptor,
            config.region(),
            config.infrastructure_or_placeholder(),
        );
        let service = info.service_name.clone();
        let region = info.region.clone();
        let stack_name = format!("{}.{}.{}", config.stack_prefix(), service, region);

        tracing::info!(
            service = %service,
            stack = %stack_name,
            capabilities = plan.capabilities.len(),
            "Starting provisioning run"
        );

        let mut ctx = Context::new(info, provider);
        provision_foundation(&plan.declared(), &mut ctx)?;

        for phase in Phase::execution_order() {
            for capability in plan.in_phase(phase) {
                self.invoke(capability, descriptor, &mut ctx)?;
            }
        }

        let exports = ctx.into_exports();
        tracing::info!(service = %service, exports = exports.len(), "Provisioning run complete");
        RunReport::new(
            service,
            stack_name,
            region,
            plan.capabilities,
            plan.unknown_sections,
            exports,
        )
    }

    /// Run against a fresh [`PlanProvider`] and attach what it recorded.
    pub fn plan(
        &self,
        descriptor: &PlatformDescriptor,
        config: &Config,
    ) -> Result<RunReport, EngineError> {
        let infrastructure = config.infrastructure_or_placeholder();
        let region = descriptor.region.as_deref().unwrap_or(config.region());
        let mut provider = PlanProvider::new(infrastructure.account_id, region);
        let report = self.run(descriptor, config, &mut provider)?;
        Ok(report.with_resources(provider.planned()))
    }

    fn invoke(
        &self,
        capability: &ActiveCapability,
        descriptor: &PlatformDescriptor,
        ctx: &mut Context<'_>,
    ) -> Result<(), EngineError> {
        let definition = self.registry.lookup(&capability.name).ok_or_else(|| {
            CapabilityError::InvalidSection {
                capability: capability.name.clone(),
                reason: "capability was unregistered during the run".to_string(),
            }
        })?;
        let section = descriptor
            .section(&capability.name)
            .cloned()
            .unwrap_or(Value::Null);

        let service = ctx.service_name().to_string();
        let phase = capability.phase.as_str();
        let span = capability_span(&service, &capability.name, phase);
        let _guard = span.enter();

        log_capability_start(&service, &capability.name, phase);
        let started = Instant::now();
        match (definition.handler)(&section, ctx) {
            Ok(()) => {
                log_capability_complete(&service, &capability.name, started.elapsed().as_millis());
                Ok(())
            }
            Err(err) => {
                log_capability_error(
                    &service,
                    &capability.name,
                    &err.to_string(),
                    started.elapsed().as_millis(),
                );
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform_capabilities::builtin_registry;
    use platform_resources::ResourceKind;
    use platform_utils::error::ProviderError;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn descriptor(spec: &str) -> PlatformDescriptor {
        let mut yaml =
            String::from("apiVersion: platform.althq.com/v1\nmetadata:\n  name: orders\nspec:\n");
        for line in spec.lines() {
            yaml.push_str("  ");
            yaml.push_str(line);
            yaml.push('\n');
        }
        PlatformDescriptor::parse(&yaml).unwrap()
    }

    fn config() -> Config {
        Config::builder().build().unwrap()
    }

    fn provider() -> PlanProvider {
        PlanProvider::new("123456789012", "us-east-1")
    }

    #[test]
    fn test_unmet_requirement_fails_before_any_provisioning() {
        let registry = builtin_registry();
        let mut provider = provider();
        let err = Orchestrator::new(&registry)
            .run(&descriptor("lambda: {}"), &config(), &mut provider)
            .unwrap_err();

        assert_eq!(err.to_exit_code().as_i32(), 4);
        assert!(provider.planned().is_empty());
    }

    #[test]
    fn test_phase_order_violation_fails_before_any_provisioning() {
        fn noop(_: &Value, _: &mut Context<'_>) -> Result<(), EngineError> {
            Ok(())
        }
        let mut registry = builtin_registry();
        registry.register("cdn", Phase::Networking, &[], noop);
        registry.register("cache", Phase::Infrastructure, &["cdn"], noop);

        let mut provider = provider();
        let err = Orchestrator::new(&registry)
            .run(&descriptor("cache: {}\ncdn: {}\ncompute: {}"), &config(), &mut provider)
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Capability(CapabilityError::PhaseOrderViolation { .. })
        ));
        assert!(provider.planned().is_empty());
    }

    #[test]
    fn test_resolve_reports_unmet_requirement_as_capability_error() {
        let registry = builtin_registry();
        let err = Orchestrator::new(&registry)
            .resolve(&descriptor("lambda: {}"))
            .unwrap_err();

        match err {
            EngineError::Capability(CapabilityError::UnmetRequirement { capability, requires }) => {
                assert_eq!(capability, "lambda");
                assert_eq!(requires, "storage");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_database_only_run() {
        let registry = builtin_registry();
        let mut provider = provider();
        let report = Orchestrator::new(&registry)
            .run(&descriptor("database: {}"), &config(), &mut provider)
            .unwrap();

        assert!(report.export("rds_endpoint").is_some());
        assert!(provider.find("orders_db_sg").is_some());
        assert!(provider.find("orders_ecs_sg").is_none());
        assert_eq!(provider.of_kind(ResourceKind::IamRole).count(), 0);

        let agent_sg = provider.find("orders_agent_sg").unwrap();
        let db_sg = provider.find("orders_db_sg").unwrap();
        assert_eq!(db_sg.properties["control_plane_sg_id"], Value::Null);
        assert_eq!(db_sg.properties["agent_sg_id"], json!(agent_sg.id));
    }

    #[test]
    fn test_s3_without_buckets_attaches_nothing() {
        let registry = builtin_registry();
        let mut provider = provider();
        let report = Orchestrator::new(&registry)
            .run(&descriptor("s3: {}"), &config(), &mut provider)
            .unwrap();

        assert_eq!(report.exports["s3_bucket_names"], json!([]));
        assert_eq!(provider.of_kind(ResourceKind::IamRolePolicy).count(), 0);
        assert_eq!(provider.of_kind(ResourceKind::S3Bucket).count(), 0);
    }

    #[test]
    fn test_s3_with_compute_attaches_one_scoped_policy() {
        let registry = builtin_registry();
        let mut provider = provider();
        let report = Orchestrator::new(&registry)
            .run(
                &descriptor("compute: {}\ns3:\n  buckets:\n    - name: uploads\n    - name: exports"),
                &config(),
                &mut provider,
            )
            .unwrap();

        assert_eq!(report.exports["s3_bucket_names"], json!(["uploads", "exports"]));
        let policies: Vec<_> = provider.of_kind(ResourceKind::IamRolePolicy).collect();
        assert_eq!(policies.len(), 1);
        assert_eq!(policies[0].logical_name, "orders_s3_task_policy");

        let bucket_arns: Vec<String> = provider
            .of_kind(ResourceKind::S3Bucket)
            .map(|b| b.arn.clone())
            .collect();
        let resources = &policies[0].properties["policy"]["Statement"][0]["Resource"];
        for resource in resources.as_array().unwrap() {
            let resource = resource.as_str().unwrap();
            assert!(
                bucket_arns
                    .iter()
                    .any(|arn| resource == arn || resource == format!("{arn}/*")),
                "{resource} is not one of the created buckets"
            );
        }
    }

    #[test]
    fn test_provider_failure_aborts_run() {
        let registry = builtin_registry();
        let mut provider = provider().fail_on("orders_redis", "quota exceeded");
        let err = Orchestrator::new(&registry)
            .run(&descriptor("cache: {}\nwebhookGateway: {}"), &config(), &mut provider)
            .unwrap_err();

        assert!(matches!(err, EngineError::Provider(ProviderError::Rejected { .. })));
        assert_eq!(err.to_exit_code().as_i32(), 70);
    }

    #[test]
    fn test_handlers_run_in_phase_order() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        fn infra(_: &Value, ctx: &mut Context<'_>) -> Result<(), EngineError> {
            let n = CALLS.fetch_add(1, Ordering::SeqCst);
            ctx.set("infra.order", n);
            Ok(())
        }
        fn edge(_: &Value, ctx: &mut Context<'_>) -> Result<(), EngineError> {
            let infra = *ctx.require::<usize>("infra.order")?;
            ctx.export("edge_after_infra", infra == 0);
            Ok(())
        }

        let mut registry = Registry::new();
        registry.register("edge", Phase::Networking, &["infra"], edge);
        registry.register("infra", Phase::Infrastructure, &[], infra);

        let mut provider = provider();
        let report = Orchestrator::new(&registry)
            .run(&descriptor("edge: {}\ninfra: {}"), &config(), &mut provider)
            .unwrap();
        assert_eq!(report.exports["edge_after_infra"], true);
        let names: Vec<&str> = report.capabilities.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["infra", "edge"]);
    }

    #[test]
    fn test_plan_attaches_resources_and_is_stable() {
        let registry = builtin_registry();
        let orchestrator = Orchestrator::new(&registry);
        let descriptor = descriptor("compute: {}\ncache: {}");

        let first = orchestrator.plan(&descriptor, &config()).unwrap();
        let second = orchestrator.plan(&descriptor, &config()).unwrap();

        assert_eq!(first.plan_digest, second.plan_digest);
        assert_eq!(first.stack_name, "dev.orders.us-east-1");
        assert_eq!(first.count_of(ResourceKind::ElastiCacheCluster), 1);
        assert_eq!(first.count_of(ResourceKind::EcsService), 1);
    }

    #[test]
    fn test_descriptor_region_wins() {
        let registry = builtin_registry();
        let descriptor = descriptor("region: eu-west-2\nwebhookGateway: {}");
        let report = Orchestrator::new(&registry)
            .plan(&descriptor, &config())
            .unwrap();
        assert_eq!(report.region, "eu-west-2");
        assert_eq!(report.stack_name, "dev.orders.eu-west-2");
    }
}
