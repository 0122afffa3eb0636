use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use platform_utils::error::{ConfigError, EngineError};

use super::model::TomlConfig;
use super::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, CliArgs, Config, ConfigSource, Defaults, ENV_REGION,
    ENV_STACK_PREFIX,
};

impl Config {
    /// Discover and load configuration with precedence: CLI > env > file > defaults
    ///
    /// Uses the current working directory for discovery when no explicit path
    /// is provided in `cli_args`.
    pub fn discover(cli_args: &CliArgs) -> Result<Self, EngineError> {
        let start_dir = env::current_dir().map_err(|e| ConfigError::DiscoveryFailed {
            reason: format!("cannot determine current directory: {e}"),
        })?;
        Self::discover_from(&start_dir, cli_args)
    }

    /// Discover and load configuration starting from a specific directory
    ///
    /// This is the path-driven variant used by tests to avoid process-global state.
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs) -> Result<Self, EngineError> {
        let mut source_attribution = HashMap::new();
        let mut defaults = Defaults::default();
        let mut infrastructure = None;

        source_attribution.insert("region".to_string(), ConfigSource::Default);
        source_attribution.insert("stack_prefix".to_string(), ConfigSource::Default);

        let config_path = match &cli_args.config_path {
            Some(explicit) => {
                if !explicit.exists() {
                    return Err(ConfigError::NotFound {
                        path: explicit.display().to_string(),
                    }
                    .into());
                }
                Some(explicit.clone())
            }
            None => Self::discover_config_file_from(start_dir),
        };

        if let Some(path) = &config_path {
            let file_config = Self::load_config_file(path)?;

            if let Some(file_defaults) = file_config.defaults {
                if file_defaults.region.is_some() {
                    defaults.region = file_defaults.region;
                    source_attribution.insert("region".to_string(), ConfigSource::Config);
                }
                if file_defaults.stack_prefix.is_some() {
                    defaults.stack_prefix = file_defaults.stack_prefix;
                    source_attribution.insert("stack_prefix".to_string(), ConfigSource::Config);
                }
                if file_defaults.backend_url.is_some() {
                    defaults.backend_url = file_defaults.backend_url;
                    source_attribution.insert("backend_url".to_string(), ConfigSource::Config);
                }
            }

            if file_config.infrastructure.is_some() {
                infrastructure = file_config.infrastructure;
                source_attribution.insert("infrastructure".to_string(), ConfigSource::Config);
            }
        }

        // Environment overrides the file
        if let Ok(region) = env::var(ENV_REGION)
            && !region.is_empty()
        {
            defaults.region = Some(region);
            source_attribution.insert("region".to_string(), ConfigSource::Env);
        }
        if let Ok(prefix) = env::var(ENV_STACK_PREFIX)
            && !prefix.is_empty()
        {
            defaults.stack_prefix = Some(prefix);
            source_attribution.insert("stack_prefix".to_string(), ConfigSource::Env);
        }

        // CLI overrides everything
        if let Some(region) = &cli_args.region {
            defaults.region = Some(region.clone());
            source_attribution.insert("region".to_string(), ConfigSource::Cli);
        }
        if let Some(prefix) = &cli_args.stack_prefix {
            defaults.stack_prefix = Some(prefix.clone());
            source_attribution.insert("stack_prefix".to_string(), ConfigSource::Cli);
        }

        let config = Self {
            defaults,
            infrastructure,
            config_path,
            source_attribution,
        };

        config.validate()?;

        Ok(config)
    }

    /// Discover the settings file by searching upward from a given directory
    ///
    /// Walks up the directory tree looking for `.platform-engine/config.toml`,
    /// stopping at repository root markers (.git, .hg, .svn) or the filesystem root.
    #[must_use]
    pub fn discover_config_file_from(start_dir: &Path) -> Option<PathBuf> {
        let mut current_dir = start_dir;

        loop {
            let config_path = current_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Some(config_path);
            }

            if current_dir.join(".git").exists()
                || current_dir.join(".hg").exists()
                || current_dir.join(".svn").exists()
            {
                return None;
            }

            current_dir = current_dir.parent()?;
        }
    }

    /// Load configuration from TOML file
    fn load_config_file(path: &Path) -> Result<TomlConfig, EngineError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                ConfigError::InvalidFile(format!("{}: {e}", path.display())).into()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TomlConfig::default()),
            Err(e) => Err(ConfigError::DiscoveryFailed {
                reason: format!("failed to read {}: {e}", path.display()),
            }
            .into()),
        }
    }
}
