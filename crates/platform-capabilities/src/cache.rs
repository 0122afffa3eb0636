//! ElastiCache Redis cluster.

use serde_json::Value;

use platform_capability_api::{Context, Phase, Registry};
use platform_resources::{ResourceKind, ResourceRequest, attrs};
use platform_utils::error::EngineError;

use crate::keys;
use crate::names::CACHE;
use crate::section::Section;

pub const ENDPOINT_KEY: &str = "cache.redis.endpoint";

pub fn register(registry: &mut Registry) {
    registry.register(CACHE, Phase::Infrastructure, &[], handle);
}

fn handle(section: &Value, ctx: &mut Context<'_>) -> Result<(), EngineError> {
    let section = Section::new(CACHE, section)?;
    let sg_id = ctx.require::<String>(keys::DATABASE_SG_ID)?.clone();
    let service = ctx.service_name().to_string();

    let request =
        ResourceRequest::new(ResourceKind::ElastiCacheCluster, format!("{service}_redis"))
            .property("name", format!("{service}-redis"))
            .property("engine", "redis")
            .property("node_type", section.str_or("nodeType", "cache.t3.micro")?)
            .property("num_cache_clusters", section.u64_or("numNodes", 1)?)
            .property("subnet_ids", ctx.infrastructure().private_subnet_ids.clone())
            .property("security_group_ids", vec![sg_id]);
    let cluster = ctx.provision(request)?;
    let endpoint = cluster.require_attribute(attrs::ENDPOINT)?.to_string();

    ctx.set(ENDPOINT_KEY, endpoint.clone());
    ctx.export("redis_endpoint", endpoint);
    Ok(())
}
