//! Capability contract shared by the orchestrator and capability handlers
//!
//! This crate holds the pieces both sides need without depending on each
//! other: the run-scoped [`Context`], the [`Registry`] of
//! [`CapabilityDefinition`]s and the [`Handler`] signature.
//!
//! # Handler contract
//!
//! A handler receives its raw configuration section (possibly `null` or an
//! empty mapping) and the shared `Context`:
//!
//! - cross-capability values it cannot do without are read with
//!   [`Context::require`], which fails the run when they are absent
//! - optional values are read with [`Context::get`]
//! - values for later handlers go through [`Context::set`] under
//!   `<capability>.<resource>.<attribute>` keys, and externally visible
//!   values through [`Context::export`] under flat `snake_case` names

pub mod context;
pub mod registry;

pub use context::{Context, ServiceInfo};
pub use registry::{CapabilityDefinition, Handler, Registry};

pub use platform_utils::types::Phase;
