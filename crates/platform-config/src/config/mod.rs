//! Engine settings
//!
//! Hierarchical configuration with discovery and precedence:
//! CLI > environment > file > defaults. The TOML file carries a
//! `[defaults]` section and an optional `[infrastructure]` snapshot.

mod builder;
mod cli_args;
mod discovery;
mod model;
mod sources;
mod validation;

pub use builder::ConfigBuilder;
pub use cli_args::CliArgs;
pub use model::*;
pub use platform_utils::types::ConfigSource;

/// Directory holding engine settings, searched upward from the working directory.
pub const CONFIG_DIR_NAME: &str = ".platform-engine";

/// Settings file name inside [`CONFIG_DIR_NAME`].
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Region used when no layer sets one.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Stack prefix used when no layer sets one.
pub const DEFAULT_STACK_PREFIX: &str = "dev";

/// Environment variable overriding `[defaults].region`.
pub const ENV_REGION: &str = "PLATFORM_ENGINE_REGION";

/// Environment variable overriding `[defaults].stack_prefix`.
pub const ENV_STACK_PREFIX: &str = "PLATFORM_ENGINE_STACK_PREFIX";

impl Config {
    /// Effective region.
    #[must_use]
    pub fn region(&self) -> &str {
        self.defaults.region.as_deref().unwrap_or(DEFAULT_REGION)
    }

    /// Effective stack prefix.
    #[must_use]
    pub fn stack_prefix(&self) -> &str {
        self.defaults
            .stack_prefix
            .as_deref()
            .unwrap_or(DEFAULT_STACK_PREFIX)
    }

    /// Stack name for a service: `{stack_prefix}.{service}.{region}`.
    ///
    /// ```rust
    /// use platform_config::Config;
    ///
    /// let config = Config::builder().region("eu-west-2").stack_prefix("prod").build().unwrap();
    /// assert_eq!(config.stack_name("orders"), "prod.orders.eu-west-2");
    /// ```
    #[must_use]
    pub fn stack_name(&self, service: &str) -> String {
        format!("{}.{}.{}", self.stack_prefix(), service, self.region())
    }

    /// The configured infrastructure snapshot, or a placeholder suitable for
    /// planning when none is configured.
    #[must_use]
    pub fn infrastructure_or_placeholder(&self) -> SharedInfrastructure {
        match &self.infrastructure {
            Some(infra) => infra.clone(),
            None => {
                tracing::warn!(
                    "No [infrastructure] section configured; planning against placeholder identifiers"
                );
                SharedInfrastructure::placeholder()
            }
        }
    }
}
