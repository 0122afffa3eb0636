//! Resource provisioning seam
//!
//! Capability handlers describe what they need as [`ResourceRequest`]s and
//! hand them to a [`ResourceProvider`]. The provider returns a
//! [`Resource`] carrying identifiers and attributes other capabilities can
//! consume. [`PlanProvider`] is the in-process provider used for planning
//! and tests.

pub mod plan;
pub mod policy;
pub mod provider;
pub mod request;

pub use plan::{PlanProvider, PlannedResource};
pub use policy::{PolicyDocument, Statement};
pub use provider::ResourceProvider;
pub use request::{Resource, ResourceKind, ResourceRequest, attrs};
