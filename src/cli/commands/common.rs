//! Helpers shared by the descriptor commands

use anyhow::Result;
use camino::Utf8Path;

use crate::PlatformDescriptor;

/// Resolve the descriptor path (argument or `PLATFORM_YAML_PATH`) and load it.
pub fn load_descriptor(explicit: Option<&Utf8Path>) -> Result<PlatformDescriptor> {
    let path = PlatformDescriptor::resolve_path(explicit)?;
    tracing::debug!(path = %path, "loading descriptor");
    Ok(PlatformDescriptor::from_path(&path)?)
}
