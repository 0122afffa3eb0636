//! Exit code constants and error kind mapping for platform-engine.
//!
//! # Exit Code Table
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Run completed successfully |
//! | 1 | `INTERNAL` | General/internal failure |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments, settings or descriptor |
//! | 4 | `DEPENDENCY_UNSATISFIED` | Capability `requires` not satisfiable |
//! | 5 | `MISSING_CONTEXT` | A handler required a Context key nobody set |
//! | 70 | `PROVISIONING_FAILURE` | The resource provider failed |

use crate::error::{CapabilityError, EngineError};
use crate::types::ErrorKind;

/// Exit codes matching the documented exit code table.
///
/// Use the named constants for common exit codes, or [`as_i32()`](Self::as_i32)
/// to get the numeric value for `std::process::exit()`.
///
/// # Example
///
/// ```rust
/// use platform_utils::exit_codes::ExitCode;
///
/// assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
/// assert_eq!(ExitCode::PROVISIONING_FAILURE.as_i32(), 70);
/// assert_eq!(ExitCode::SUCCESS, ExitCode::from_i32(0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success - the run completed and exports were published
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Internal error - general failure
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// CLI arguments error - invalid arguments, settings or descriptor
    pub const CLI_ARGS: ExitCode = ExitCode(2);

    /// A declared capability requires one that is absent or runs later
    pub const DEPENDENCY_UNSATISFIED: ExitCode = ExitCode(4);

    /// A handler required a Context key that no earlier step set
    pub const MISSING_CONTEXT: ExitCode = ExitCode(5);

    /// The resource provider reported a failure
    pub const PROVISIONING_FAILURE: ExitCode = ExitCode(70);

    /// Get the numeric exit code value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Create an ExitCode from a raw i32 value.
    ///
    /// Prefer using the named constants when possible.
    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<i32> for ExitCode {
    fn from(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

/// Convert `EngineError` to an (`exit_code`, `error_kind`) tuple
#[must_use]
pub fn error_to_exit_code_and_kind(error: &EngineError) -> (ExitCode, ErrorKind) {
    let kind = match error {
        EngineError::Config(_) => ErrorKind::CliArgs,
        EngineError::Capability(cap_err) => match cap_err {
            CapabilityError::MissingDependency { .. } => ErrorKind::MissingContext,
            CapabilityError::UnmetRequirement { .. }
            | CapabilityError::PhaseOrderViolation { .. } => ErrorKind::DependencyUnsatisfied,
            CapabilityError::InvalidSection { .. } => ErrorKind::CliArgs,
        },
        EngineError::Provider(_) => ErrorKind::ProvisioningFailure,
        EngineError::Io(_) => ErrorKind::Unknown,
    };
    (error.to_exit_code(), kind)
}

impl From<&EngineError> for (ExitCode, ErrorKind) {
    fn from(err: &EngineError) -> (ExitCode, ErrorKind) {
        error_to_exit_code_and_kind(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, ProviderError};

    #[test]
    fn test_exit_code_constants() {
        assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
        assert_eq!(ExitCode::INTERNAL.as_i32(), 1);
        assert_eq!(ExitCode::CLI_ARGS.as_i32(), 2);
        assert_eq!(ExitCode::DEPENDENCY_UNSATISFIED.as_i32(), 4);
        assert_eq!(ExitCode::MISSING_CONTEXT.as_i32(), 5);
        assert_eq!(ExitCode::PROVISIONING_FAILURE.as_i32(), 70);
    }

    #[test]
    fn test_i32_conversions() {
        let code: ExitCode = 5.into();
        assert_eq!(code, ExitCode::MISSING_CONTEXT);
        let raw: i32 = ExitCode::CLI_ARGS.into();
        assert_eq!(raw, 2);
    }

    #[test]
    fn test_config_error_mapping() {
        let err = EngineError::Config(ConfigError::InvalidFile("bad".to_string()));
        let (code, kind) = error_to_exit_code_and_kind(&err);
        assert_eq!(code, ExitCode::CLI_ARGS);
        assert_eq!(kind, ErrorKind::CliArgs);
    }

    #[test]
    fn test_missing_dependency_mapping() {
        let err = EngineError::Capability(CapabilityError::MissingDependency {
            key: "security_groups.database.id".to_string(),
            available: vec![],
        });
        let (code, kind): (ExitCode, ErrorKind) = (&err).into();
        assert_eq!(code, ExitCode::MISSING_CONTEXT);
        assert_eq!(kind, ErrorKind::MissingContext);
    }

    #[test]
    fn test_provider_error_mapping() {
        let err = EngineError::Provider(ProviderError::DuplicateLogicalName {
            logical_name: "svc_bucket_logs".to_string(),
        });
        let (code, kind) = error_to_exit_code_and_kind(&err);
        assert_eq!(code, ExitCode::PROVISIONING_FAILURE);
        assert_eq!(kind, ErrorKind::ProvisioningFailure);
    }

    #[test]
    fn test_io_error_mapping() {
        let err = EngineError::Io(std::io::Error::other("disk"));
        assert_eq!(error_to_exit_code_and_kind(&err), (ExitCode::INTERNAL, ErrorKind::Unknown));
    }
}
