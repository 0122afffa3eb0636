//! Inbound webhook endpoint flag.
//!
//! Routing is done by the compute layer when the flag is set. This
//! capability only records intent so other capabilities can depend on it.

use serde_json::Value;

use platform_capability_api::{Context, Phase, Registry};
use platform_utils::error::EngineError;

use crate::names::WEBHOOK_GATEWAY;
use crate::section::Section;

pub const ENABLED_KEY: &str = "webhookGateway.enabled";

pub fn register(registry: &mut Registry) {
    registry.register(WEBHOOK_GATEWAY, Phase::Compute, &[], handle);
}

fn handle(section: &Value, ctx: &mut Context<'_>) -> Result<(), EngineError> {
    Section::new(WEBHOOK_GATEWAY, section)?;
    ctx.set(ENABLED_KEY, true);
    ctx.export("webhook_gateway_enabled", true);
    Ok(())
}
