//! CLI argument definitions and parsing structures

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// platform - capability orchestration for service infrastructure
#[derive(Parser, Debug)]
#[command(name = "platform")]
#[command(about = "Validate and plan the infrastructure a service declares in platform.yaml")]
#[command(long_about = r#"
platform reads a service descriptor (platform.yaml), works out which
capabilities it declares and provisions them in phase order:
foundation, infrastructure, compute, networking.

EXAMPLES:
  # Check the descriptor and capability requirements
  platform validate platform.yaml

  # Show every resource the run would create
  platform plan platform.yaml

  # Canonical JSON report for tooling
  platform plan platform.yaml --json

  # List registered capabilities
  platform capabilities

CONFIGURATION:
  Settings are loaded with precedence: CLI flags > environment > config file > defaults
  The config file is discovered by searching upward from CWD for .platform-engine/config.toml
  Use --config to specify an explicit config file path
  The descriptor path falls back to $PLATFORM_YAML_PATH when omitted
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Region to provision into
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Prefix for stack names
    #[arg(long, global = true)]
    pub stack_prefix: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a descriptor and its capability requirements
    Validate {
        /// Path to platform.yaml
        descriptor: Option<Utf8PathBuf>,
    },

    /// Plan a provisioning run without touching any cloud account
    Plan {
        /// Path to platform.yaml
        descriptor: Option<Utf8PathBuf>,

        /// Output the run report as canonical JSON
        #[arg(long)]
        json: bool,
    },

    /// List registered capabilities
    Capabilities {
        /// Output as canonical JSON
        #[arg(long)]
        json: bool,
    },

    /// Show effective engine settings and where each value came from
    Config,
}
