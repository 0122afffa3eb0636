use platform_utils::error::ProviderError;

use crate::request::{Resource, ResourceRequest};

/// Turns resource requests into provisioned resources.
///
/// Implementations own the translation to a concrete cloud toolchain.
/// Errors are returned unchanged to the orchestrator, which aborts the run.
pub trait ResourceProvider {
    /// Provision one resource and return its identifiers.
    fn provision(&mut self, request: ResourceRequest) -> Result<Resource, ProviderError>;
}

impl<P: ResourceProvider + ?Sized> ResourceProvider for &mut P {
    fn provision(&mut self, request: ResourceRequest) -> Result<Resource, ProviderError> {
        (**self).provision(request)
    }
}

impl<P: ResourceProvider + ?Sized> ResourceProvider for Box<P> {
    fn provision(&mut self, request: ResourceRequest) -> Result<Resource, ProviderError> {
        (**self).provision(request)
    }
}
