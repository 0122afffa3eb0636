//! Config command implementation
//!
//! Prints each effective setting with the layer it came from.

use anyhow::Result;

use crate::Config;

pub fn execute_config_command(config: &Config) -> Result<()> {
    match &config.config_path {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: (none found)"),
    }
    println!();
    for (key, (value, source)) in config.effective_config() {
        println!("  {key:<16} = {value:<40} [{source}]");
    }
    Ok(())
}
