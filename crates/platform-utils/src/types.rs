use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator};

/// Execution phases for capability provisioning.
///
/// Phases are strictly ordered and map to the integers 0 through 3:
///
/// ```text
/// Foundation (0) < Infrastructure (1) < Compute (2) < Networking (3)
/// ```
///
/// `Foundation` never appears in the phase loop. It is run once by the
/// foundation provisioner before any capability handler.
///
/// # Example
///
/// ```rust
/// use platform_utils::types::Phase;
///
/// assert!(Phase::Foundation < Phase::Infrastructure);
/// assert_eq!(Phase::Compute.as_u8(), 2);
/// assert_eq!(Phase::Networking.as_str(), "networking");
/// ```
///
/// # Serialization
///
/// `Phase` serializes to its lowercase name (e.g. `"infrastructure"`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Phase {
    /// Shared security groups and IAM roles.
    Foundation = 0,
    /// Data stores, object storage, service discovery.
    Infrastructure = 1,
    /// Containers, functions, agent runtimes, schedulers.
    Compute = 2,
    /// Edge wiring that depends on compute.
    Networking = 3,
}

impl Phase {
    /// Returns the canonical lowercase name used in logs and reports.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Foundation => "foundation",
            Self::Infrastructure => "infrastructure",
            Self::Compute => "compute",
            Self::Networking => "networking",
        }
    }

    /// Returns the ordinal of the phase.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Phases walked by the orchestrator loop, in ascending order.
    pub fn execution_order() -> impl Iterator<Item = Phase> {
        Self::iter().filter(|phase| *phase != Self::Foundation)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error kinds reported alongside exit codes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    CliArgs,
    DependencyUnsatisfied,
    MissingContext,
    ProvisioningFailure,
    Unknown,
}

/// Source of a configuration value.
///
/// Precedence chain: CLI arguments > environment > config file >
/// programmatic overrides > built-in defaults.
///
/// # Serialization
///
/// Serializes to lowercase strings: `"cli"`, `"env"`, `"config"`,
/// `"programmatic"`, `"default"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    /// Value provided via CLI argument (highest precedence).
    Cli,
    /// Value read from an environment variable.
    Env,
    /// Value loaded from configuration file.
    Config,
    /// Value provided programmatically (e.g., `Config::builder()`).
    Programmatic,
    /// Built-in default value (lowest precedence).
    Default,
}

impl ConfigSource {
    /// Stable label used in effective-config output.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Cli => "cli",
            Self::Env => "env",
            Self::Config => "config",
            Self::Programmatic => "programmatic",
            Self::Default => "default",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_ordering_matches_integers() {
        assert!(Phase::Foundation < Phase::Infrastructure);
        assert!(Phase::Infrastructure < Phase::Compute);
        assert!(Phase::Compute < Phase::Networking);
        assert_eq!(Phase::Foundation.as_u8(), 0);
        assert_eq!(Phase::Infrastructure.as_u8(), 1);
        assert_eq!(Phase::Compute.as_u8(), 2);
        assert_eq!(Phase::Networking.as_u8(), 3);
    }

    #[test]
    fn test_execution_order_skips_foundation() {
        let order: Vec<Phase> = Phase::execution_order().collect();
        assert_eq!(
            order,
            vec![Phase::Infrastructure, Phase::Compute, Phase::Networking]
        );
    }

    #[test]
    fn test_phase_serialization() {
        let json = serde_json::to_string(&Phase::Infrastructure).unwrap();
        assert_eq!(json, r#""infrastructure""#);
        let back: Phase = serde_json::from_str(r#""compute""#).unwrap();
        assert_eq!(back, Phase::Compute);
    }

    #[test]
    fn test_config_source_serialization() {
        let json = serde_json::to_string(&ConfigSource::Env).unwrap();
        assert_eq!(json, r#""env""#);
        assert_eq!(ConfigSource::Programmatic.label(), "programmatic");
    }

    #[test]
    fn test_error_kind_serialization() {
        let json = serde_json::to_string(&ErrorKind::MissingContext).unwrap();
        assert_eq!(json, r#""missing_context""#);
    }
}
