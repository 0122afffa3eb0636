//! CLI command implementations

mod capabilities;
mod common;
mod config;
mod plan;
mod validate;

pub use capabilities::execute_capabilities_command;
pub use config::execute_config_command;
pub use plan::execute_plan_command;
pub use validate::execute_validate_command;
