use std::collections::HashMap;

use platform_utils::error::EngineError;

use super::{Config, ConfigSource, Defaults, SharedInfrastructure};

impl Config {
    /// Create a builder for programmatic configuration.
    ///
    /// Use this when embedding the engine without environment variables or
    /// config files.
    ///
    /// # Example
    ///
    /// ```rust
    /// use platform_config::Config;
    ///
    /// let config = Config::builder()
    ///     .region("us-west-2")
    ///     .stack_prefix("staging")
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.region(), "us-west-2");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for programmatic configuration.
///
/// All values set via the builder are attributed to
/// `ConfigSource::Programmatic`.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    region: Option<String>,
    stack_prefix: Option<String>,
    backend_url: Option<String>,
    infrastructure: Option<SharedInfrastructure>,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    #[must_use]
    pub fn stack_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.stack_prefix = Some(prefix.into());
        self
    }

    #[must_use]
    pub fn backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn infrastructure(mut self, infra: SharedInfrastructure) -> Self {
        self.infrastructure = Some(infra);
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<Config, EngineError> {
        let mut source_attribution = HashMap::new();
        let mut attribute = |key: &str, set: bool| {
            let source = if set {
                ConfigSource::Programmatic
            } else {
                ConfigSource::Default
            };
            source_attribution.insert(key.to_string(), source);
        };
        attribute("region", self.region.is_some());
        attribute("stack_prefix", self.stack_prefix.is_some());
        if self.backend_url.is_some() {
            attribute("backend_url", true);
        }
        if self.infrastructure.is_some() {
            attribute("infrastructure", true);
        }

        let config = Config {
            defaults: Defaults {
                region: self.region,
                stack_prefix: self.stack_prefix,
                backend_url: self.backend_url,
            },
            infrastructure: self.infrastructure,
            config_path: None,
            source_attribution,
        };
        config.validate()?;
        Ok(config)
    }
}
