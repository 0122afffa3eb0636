//! Configuration for platform-engine
//!
//! Two inputs feed a run:
//! - engine settings (`.platform-engine/config.toml`): region, stack prefix
//!   and the shared infrastructure snapshot
//! - the service descriptor (`platform.yaml`): which capabilities to
//!   provision and their sections

pub mod config;
pub mod descriptor;

pub use config::{CliArgs, Config, ConfigBuilder, ConfigSource, Defaults, SharedInfrastructure};
pub use descriptor::{ComputeSettings, PlatformDescriptor, SUPPORTED_API_VERSION};
