//! Orchestration of a provisioning run
//!
//! A run walks these steps, and any failure aborts it before exports are
//! published:
//!
//! 1. intersect the declared sections with the registry
//! 2. check every `requires` entry is declared and runs no later than its
//!    dependent
//! 3. run the foundation step once
//! 4. invoke each active handler in ascending phase order
//! 5. return a [`RunReport`] with the accumulated exports
//!
//! ```rust
//! use platform_capabilities::builtin_registry;
//! use platform_config::{Config, PlatformDescriptor};
//! use platform_orchestrator::Orchestrator;
//! use platform_resources::PlanProvider;
//!
//! let descriptor = PlatformDescriptor::parse(
//!     "apiVersion: platform.althq.com/v1\nmetadata:\n  name: orders\nspec:\n  webhookGateway: {}\n",
//! )
//! .unwrap();
//! let config = Config::builder().build().unwrap();
//! let registry = builtin_registry();
//! let mut provider = PlanProvider::new("000000000000", "us-east-1");
//!
//! let report = Orchestrator::new(&registry)
//!     .run(&descriptor, &config, &mut provider)
//!     .unwrap();
//! assert_eq!(report.exports["webhook_gateway_enabled"], true);
//! ```

mod plan;
mod report;
mod run;

pub use plan::{ActiveCapability, ActivePlan};
pub use report::{REPORT_SCHEMA_VERSION, ResourceSummary, RunReport};
pub use run::Orchestrator;
