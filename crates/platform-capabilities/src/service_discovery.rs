//! Cloud Map private DNS namespace.

use serde_json::Value;

use platform_capability_api::{Context, Phase, Registry};
use platform_resources::{ResourceKind, ResourceRequest};
use platform_utils::error::EngineError;

use crate::names::SERVICE_DISCOVERY;
use crate::section::Section;

pub const NAMESPACE_ID_KEY: &str = "serviceDiscovery.namespace_id";

pub fn register(registry: &mut Registry) {
    registry.register(SERVICE_DISCOVERY, Phase::Infrastructure, &[], handle);
}

fn handle(section: &Value, ctx: &mut Context<'_>) -> Result<(), EngineError> {
    let section = Section::new(SERVICE_DISCOVERY, section)?;
    let service = ctx.service_name().to_string();
    let namespace = match section.opt_str("namespace")? {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("{service}.local"),
    };

    let ns = ctx.provision(
        ResourceRequest::new(
            ResourceKind::ServiceDiscoveryNamespace,
            format!("{service}_cloudmap_ns"),
        )
        .property("name", namespace)
        .property("vpc_id", ctx.infrastructure().vpc_id.clone()),
    )?;

    ctx.set(NAMESPACE_ID_KEY, ns.id.clone());
    ctx.export("cloudmap_namespace_id", ns.id);
    Ok(())
}
