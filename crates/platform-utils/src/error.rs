use std::fmt;
use thiserror::Error;

use crate::types::Phase;

/// Maximum number of validation problems rendered before the list is truncated.
pub const MAX_RENDERED_VALIDATION_ERRORS: usize = 10;

/// Library-level error type with rich context and user-friendly reporting.
///
/// `EngineError` is the error returned by every fallible engine operation.
/// It provides:
/// - Detailed error information for programmatic handling
/// - User-friendly messages with context and suggestions
/// - Mapping to CLI exit codes for consistent error reporting
///
/// # Error Categories
///
/// | Category | Description |
/// |----------|-------------|
/// | `Config` | Engine settings or service descriptor errors |
/// | `Capability` | Requirement graph and Context dependency failures |
/// | `Provider` | Failures raised by the resource provider |
/// | `Io` | Filesystem failures |
///
/// # Exit Code Mapping
///
/// | Exit Code | Error Type |
/// |-----------|------------|
/// | 2 | Configuration, descriptor or section errors |
/// | 4 | Unmet `requires` or phase-order violation |
/// | 5 | Missing Context dependency |
/// | 70 | Provider failure |
/// | 1 | Other errors |
///
/// # Example
///
/// ```rust
/// use platform_utils::error::{CapabilityError, EngineError};
/// use platform_utils::exit_codes::ExitCode;
///
/// let err = EngineError::from(CapabilityError::UnmetRequirement {
///     capability: "lambda".to_string(),
///     requires: "storage".to_string(),
/// });
/// assert_eq!(err.to_exit_code(), ExitCode::DEPENDENCY_UNSATISFIED);
/// assert!(err.display_for_user().contains("Suggestions:"));
/// ```
///
/// Library code returns `EngineError` and does NOT call `std::process::exit()`.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Capability error: {0}")]
    Capability(#[from] CapabilityError),

    #[error("Provisioning error: {0}")]
    Provider(#[from] ProviderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for providing user-friendly error reporting with context and suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Validation,
    DependencyResolution,
    Provisioning,
    FileSystem,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::Validation => write!(f, "Validation"),
            Self::DependencyResolution => write!(f, "Dependency Resolution"),
            Self::Provisioning => write!(f, "Provisioning"),
            Self::FileSystem => write!(f, "File System"),
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found at {path}")]
    NotFound { path: String },

    #[error("Configuration discovery failed: {reason}")]
    DiscoveryFailed { reason: String },

    #[error("Descriptor validation failed: {error_count} errors")]
    ValidationFailed {
        errors: Vec<String>,
        error_count: usize,
    },

    #[error("Unsupported apiVersion: {version}")]
    UnsupportedApiVersion { version: String },
}

impl ConfigError {
    /// Build a `ValidationFailed` error from a list of problems.
    #[must_use]
    pub fn validation_failed(errors: Vec<String>) -> Self {
        let error_count = errors.len();
        Self::ValidationFailed {
            errors,
            error_count,
        }
    }
}

/// Render validation problems as a numbered list, truncated after
/// [`MAX_RENDERED_VALIDATION_ERRORS`] entries.
#[must_use]
pub fn render_validation_errors(errors: &[String]) -> String {
    let mut lines = Vec::with_capacity(MAX_RENDERED_VALIDATION_ERRORS + 1);
    for (i, error) in errors.iter().take(MAX_RENDERED_VALIDATION_ERRORS).enumerate() {
        lines.push(format!("  {}. {}", i + 1, error));
    }
    if errors.len() > MAX_RENDERED_VALIDATION_ERRORS {
        lines.push(format!(
            "  ... and {} more errors",
            errors.len() - MAX_RENDERED_VALIDATION_ERRORS
        ));
    }
    lines.join("\n")
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(reason) => {
                format!("Configuration file has invalid format: {reason}")
            }
            Self::MissingRequired(key) => {
                format!("Required configuration '{key}' is missing")
            }
            Self::InvalidValue { key, value } => {
                format!("Configuration '{key}' has invalid value: {value}")
            }
            Self::NotFound { path } => {
                format!("Configuration file not found: {path}")
            }
            Self::DiscoveryFailed { reason } => {
                format!("Failed to discover configuration: {reason}")
            }
            Self::ValidationFailed { errors, .. } => {
                format!(
                    "platform.yaml validation failed:\n{}",
                    render_validation_errors(errors)
                )
            }
            Self::UnsupportedApiVersion { version } => {
                format!("apiVersion '{version}' is not supported by this version of platform-engine")
            }
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::InvalidFile(_) => Some(
                "Engine settings must be valid TOML with optional [defaults] and [infrastructure] sections."
                    .to_string(),
            ),
            Self::MissingRequired(_) => Some(
                "Some values are required before any capability can be provisioned.".to_string(),
            ),
            Self::InvalidValue { key, .. } => Some(format!(
                "The '{key}' option has specific format requirements."
            )),
            Self::NotFound { .. } => Some(
                "platform-engine searches for .platform-engine/config.toml starting from the current directory upward."
                    .to_string(),
            ),
            Self::DiscoveryFailed { .. } => Some(
                "Configuration discovery walks the directory tree looking for .platform-engine/config.toml."
                    .to_string(),
            ),
            Self::ValidationFailed { .. } => Some(
                "The service descriptor is validated before any resource is touched.".to_string(),
            ),
            Self::UnsupportedApiVersion { .. } => Some(
                "Descriptors are versioned so that field meanings stay stable.".to_string(),
            ),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec![
                "Check the TOML syntax of .platform-engine/config.toml".to_string(),
                "Compare with the example configuration in the README".to_string(),
            ],
            Self::MissingRequired(key) => match key.as_str() {
                "descriptor" => vec![
                    "Pass the descriptor path: platform plan path/to/platform.yaml".to_string(),
                    "Or set PLATFORM_YAML_PATH".to_string(),
                ],
                _ => vec![
                    format!("Add '{key}' to .platform-engine/config.toml"),
                    "Use the matching CLI flag as a temporary workaround".to_string(),
                ],
            },
            Self::InvalidValue { key, .. } => match key.as_str() {
                "region" => vec![
                    "Use a region identifier such as 'us-east-1' or 'eu-west-2'".to_string(),
                ],
                "stack_prefix" => vec![
                    "Use lowercase letters, digits and hyphens only (e.g. 'dev', 'prod')"
                        .to_string(),
                ],
                "vpc_cidr" => vec!["Use an IPv4 CIDR block such as '10.0.0.0/16'".to_string()],
                _ => vec![
                    "Check the documentation for valid values for this option".to_string(),
                    "Remove the option to use the default value".to_string(),
                ],
            },
            Self::NotFound { .. } => vec![
                "Create .platform-engine/config.toml in your project root".to_string(),
                "Use --config <path> to point at an explicit file".to_string(),
            ],
            Self::DiscoveryFailed { .. } => vec![
                "Check read permissions on the current and parent directories".to_string(),
                "Use --config <path> to specify the configuration file explicitly".to_string(),
            ],
            Self::ValidationFailed { .. } => vec![
                "Fix the listed fields in platform.yaml".to_string(),
                "Run 'platform validate' until it passes".to_string(),
            ],
            Self::UnsupportedApiVersion { .. } => vec![
                "Set apiVersion: platform.althq.com/v1".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::ValidationFailed { .. } | Self::UnsupportedApiVersion { .. } => {
                ErrorCategory::Validation
            }
            _ => ErrorCategory::Configuration,
        }
    }
}

fn format_keys(keys: &[String]) -> String {
    if keys.is_empty() {
        "(none)".to_string()
    } else {
        keys.join(", ")
    }
}

/// Capability resolution and cross-capability dependency errors
#[derive(Error, Debug)]
pub enum CapabilityError {
    /// A handler asked the Context for a key that is absent or holds a
    /// value of a different type. `available` is sorted.
    #[error("missing required key: '{key}'. Available keys: {}", format_keys(.available))]
    MissingDependency { key: String, available: Vec<String> },

    #[error("capability '{capability}' requires '{requires}', which is not declared")]
    UnmetRequirement { capability: String, requires: String },

    #[error(
        "capability '{capability}' ({phase}) requires '{requires}' which runs later ({requires_phase})"
    )]
    PhaseOrderViolation {
        capability: String,
        phase: Phase,
        requires: String,
        requires_phase: Phase,
    },

    #[error("invalid '{capability}' section: {reason}")]
    InvalidSection { capability: String, reason: String },
}

impl UserFriendlyError for CapabilityError {
    fn user_message(&self) -> String {
        match self {
            Self::MissingDependency { key, .. } => {
                format!("A capability needed '{key}' but no earlier step provided it")
            }
            Self::UnmetRequirement {
                capability,
                requires,
            } => {
                format!("'{capability}' cannot run without '{requires}'")
            }
            Self::PhaseOrderViolation {
                capability,
                requires,
                ..
            } => {
                format!("'{capability}' depends on '{requires}', which is scheduled after it")
            }
            Self::InvalidSection { capability, reason } => {
                format!("The '{capability}' section is invalid: {reason}")
            }
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::MissingDependency { .. } => Some(self.to_string()),
            Self::UnmetRequirement { .. } => Some(
                "Requirements are checked against the declared capabilities before anything is provisioned."
                    .to_string(),
            ),
            Self::PhaseOrderViolation {
                phase,
                requires_phase,
                ..
            } => Some(format!(
                "Capabilities run in phase order; {requires_phase} runs after {phase}."
            )),
            Self::InvalidSection { .. } => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::MissingDependency { .. } => vec![
                "Declare the capability that provides this key".to_string(),
                "Check that the providing capability runs in an earlier phase".to_string(),
            ],
            Self::UnmetRequirement { requires, .. } => vec![
                format!("Add a '{requires}' section to spec in platform.yaml"),
            ],
            Self::PhaseOrderViolation { .. } => vec![
                "Move the required capability to an earlier or equal phase".to_string(),
            ],
            Self::InvalidSection { capability, .. } => vec![
                format!("Review the '{capability}' section in platform.yaml"),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidSection { .. } => ErrorCategory::Validation,
            _ => ErrorCategory::DependencyResolution,
        }
    }
}

/// Errors raised by a resource provider
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("provider rejected {kind} '{logical_name}': {reason}")]
    Rejected {
        kind: String,
        logical_name: String,
        reason: String,
    },

    #[error("logical name '{logical_name}' was already provisioned in this run")]
    DuplicateLogicalName { logical_name: String },

    #[error("provider backend failure: {0}")]
    Backend(String),
}

impl UserFriendlyError for ProviderError {
    fn user_message(&self) -> String {
        match self {
            Self::Rejected {
                kind,
                logical_name,
                reason,
            } => format!("Could not provision {kind} '{logical_name}': {reason}"),
            Self::DuplicateLogicalName { logical_name } => {
                format!("Resource '{logical_name}' was requested twice")
            }
            Self::Backend(reason) => format!("The provisioning backend failed: {reason}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::DuplicateLogicalName { .. } => Some(
                "Logical names must be unique within one run so resources can be tracked."
                    .to_string(),
            ),
            _ => Some("The run was aborted and no exports were published.".to_string()),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::DuplicateLogicalName { .. } => vec![
                "Give each bucket, table, function and runtime a distinct name".to_string(),
            ],
            _ => vec![
                "Check provider credentials and quotas".to_string(),
                "Re-run once the underlying issue is fixed".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Provisioning
    }
}

impl UserFriendlyError for EngineError {
    fn user_message(&self) -> String {
        match self {
            Self::Config(err) => err.user_message(),
            Self::Capability(err) => err.user_message(),
            Self::Provider(err) => err.user_message(),
            Self::Io(err) => format!("File system operation failed: {err}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Config(err) => err.context(),
            Self::Capability(err) => err.context(),
            Self::Provider(err) => err.context(),
            Self::Io(_) => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Config(err) => err.suggestions(),
            Self::Capability(err) => err.suggestions(),
            Self::Provider(err) => err.suggestions(),
            Self::Io(_) => vec!["Check that the path exists and is readable".to_string()],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(err) => err.category(),
            Self::Capability(err) => err.category(),
            Self::Provider(err) => err.category(),
            Self::Io(_) => ErrorCategory::FileSystem,
        }
    }
}

impl EngineError {
    /// Get a user-friendly error message with context and actionable suggestions.
    ///
    /// ```text
    /// Error: <user message>
    ///
    /// Context: <context if available>
    ///
    /// Suggestions:
    ///   • <suggestion 1>
    /// ```
    #[must_use]
    pub fn display_for_user(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Error: {}\n", self.user_message()));

        if let Some(ctx) = self.context() {
            output.push_str(&format!("\nContext: {ctx}\n"));
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for suggestion in suggestions {
                output.push_str(&format!("  • {suggestion}\n"));
            }
        }

        output
    }

    /// Map this error to the appropriate CLI exit code.
    ///
    /// This is the single source of truth for CLI exit codes.
    #[must_use]
    pub fn to_exit_code(&self) -> crate::exit_codes::ExitCode {
        use crate::exit_codes::ExitCode;

        match self {
            EngineError::Config(_) => ExitCode::CLI_ARGS,
            EngineError::Capability(cap_err) => match cap_err {
                CapabilityError::MissingDependency { .. } => ExitCode::MISSING_CONTEXT,
                CapabilityError::UnmetRequirement { .. }
                | CapabilityError::PhaseOrderViolation { .. } => ExitCode::DEPENDENCY_UNSATISFIED,
                CapabilityError::InvalidSection { .. } => ExitCode::CLI_ARGS,
            },
            EngineError::Provider(_) => ExitCode::PROVISIONING_FAILURE,
            EngineError::Io(_) => ExitCode::INTERNAL,
        }
    }
}
