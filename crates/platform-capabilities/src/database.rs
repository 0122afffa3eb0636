//! PostgreSQL on RDS.

use serde_json::Value;

use platform_capability_api::{Context, Phase, Registry};
use platform_resources::{ResourceKind, ResourceRequest, attrs};
use platform_utils::error::EngineError;

use crate::keys;
use crate::names::DATABASE;
use crate::section::Section;

pub const ENDPOINT_KEY: &str = "database.rds.endpoint";
/// Environment variable holding the master password.
pub const ENV_DB_PASSWORD: &str = "DIFY_DB_PASSWORD";
const DEFAULT_PASSWORD: &str = "changeme";

pub fn register(registry: &mut Registry) {
    registry.register(DATABASE, Phase::Infrastructure, &[], handle);
}

fn handle(section: &Value, ctx: &mut Context<'_>) -> Result<(), EngineError> {
    let section = Section::new(DATABASE, section)?;
    let sg_id = ctx.require::<String>(keys::DATABASE_SG_ID)?.clone();
    let service = ctx.service_name().to_string();

    let password = std::env::var(ENV_DB_PASSWORD).unwrap_or_else(|_| {
        tracing::warn!("{ENV_DB_PASSWORD} is not set; using the default password");
        DEFAULT_PASSWORD.to_string()
    });
    let default_db_name = format!("{}_db", ctx.service().snake_name());

    let request = ResourceRequest::new(ResourceKind::RdsInstance, format!("{service}_rds"))
        .property("name", format!("{service}-db"))
        .property("engine", "postgres")
        .property("db_name", section.str_or("dbName", &default_db_name)?)
        .property("username", section.str_or("dbUsername", "admin")?)
        .property("instance_class", section.str_or("instanceClass", "db.t3.micro")?)
        .property("allocated_storage", section.u64_or("allocatedStorage", 20)?)
        .property("subnet_ids", ctx.infrastructure().private_subnet_ids.clone())
        .property("security_group_ids", vec![sg_id])
        .secret("password", password);
    let instance = ctx.provision(request)?;
    let endpoint = instance.require_attribute(attrs::ENDPOINT)?.to_string();

    ctx.set(ENDPOINT_KEY, endpoint.clone());
    ctx.export("rds_endpoint", endpoint);
    Ok(())
}
