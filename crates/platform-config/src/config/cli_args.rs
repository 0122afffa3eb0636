use std::path::PathBuf;

/// CLI arguments for configuration override
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub region: Option<String>,
    pub stack_prefix: Option<String>,
    pub verbose: Option<bool>,
}
