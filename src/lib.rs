//! platform-engine - capability orchestration for service infrastructure
//!
//! A service declares the capabilities it needs (a database, a cache, an ECS
//! service, agent runtimes...) in `platform.yaml`. The engine turns those
//! declarations into resource requests, in phase order, against a
//! [`ResourceProvider`].
//!
//! platform-engine can be used in two ways:
//! - **CLI**: the `platform` binary validates and plans descriptors
//! - **Library**: build a [`Registry`], add your own capabilities and drive an
//!   [`Orchestrator`] against your own provider
//!
//! # Quick Start (CLI)
//!
//! ```bash
//! # Check the descriptor and the requirement graph
//! platform validate platform.yaml
//!
//! # Plan every resource the run would create
//! platform plan platform.yaml --json
//!
//! # List registered capabilities
//! platform capabilities
//! ```
//!
//! # Quick Start (Library)
//!
//! ```rust
//! use platform_engine::{Config, Orchestrator, PlatformDescriptor, builtin_registry};
//!
//! let descriptor = PlatformDescriptor::parse(
//!     "apiVersion: platform.althq.com/v1\nmetadata:\n  name: orders\nspec:\n  database: {}\n",
//! )
//! .unwrap();
//! let config = Config::builder().region("eu-west-2").build().unwrap();
//!
//! let registry = builtin_registry();
//! let report = Orchestrator::new(&registry).plan(&descriptor, &config).unwrap();
//! assert!(report.exports.contains_key("rds_endpoint"));
//! ```
//!
//! # JSON Contracts
//!
//! `plan --json` emits the [`RunReport`] in JCS (RFC 8785) canonical form.
//! Use [`emit_jcs`] for the same canonicalization in your own integrations.

// ============================================================================
// Stable Public API
// ============================================================================

/// Execution phases, `Foundation < Infrastructure < Compute < Networking`.
pub use platform_utils::types::Phase;

/// Engine settings with discovery and precedence:
/// CLI arguments > environment > config file > built-in defaults.
pub use platform_config::{CliArgs, Config, ConfigBuilder};

/// The parsed `platform.yaml` service descriptor.
pub use platform_config::PlatformDescriptor;

/// Library-level error type.
///
/// `EngineError` renders user-facing output via
/// [`display_for_user()`](EngineError::display_for_user) and maps to the
/// process exit code via [`to_exit_code()`](EngineError::to_exit_code).
pub use platform_utils::error::EngineError;

/// Trait for providing user-friendly error reporting.
pub use platform_utils::error::{ErrorCategory, UserFriendlyError};

/// Exit codes matching the documented exit code table.
pub use platform_utils::exit_codes::ExitCode;

/// JCS (RFC 8785) canonical JSON emission.
pub use platform_utils::canonicalization::emit_jcs;

pub use platform_capabilities::builtin_registry;
pub use platform_capability_api::{CapabilityDefinition, Context, Handler, Registry, ServiceInfo};
pub use platform_orchestrator::{ActiveCapability, ActivePlan, Orchestrator, RunReport};
pub use platform_resources::{PlanProvider, ResourceProvider, ResourceRequest};

// ============================================================================
// Component crates - accessible but not stable
// ============================================================================

#[doc(hidden)]
pub use platform_capabilities as capabilities;
#[doc(hidden)]
pub use platform_config as config;
#[doc(hidden)]
pub use platform_resources as resources;
#[doc(hidden)]
pub use platform_utils::{canonicalization, error, exit_codes, logging, types};

pub mod cli;

/// Returns the platform-engine version.
#[must_use]
pub fn engine_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
