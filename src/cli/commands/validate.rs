//! Validate command implementation
//!
//! Handles `platform validate`: descriptor schema plus the requirement graph.
//! No resource is requested.

use anyhow::Result;
use camino::Utf8Path;

use super::common::load_descriptor;
use crate::{Config, Orchestrator, builtin_registry};

pub fn execute_validate_command(descriptor: Option<&Utf8Path>, config: &Config) -> Result<()> {
    let descriptor = load_descriptor(descriptor)?;
    let registry = builtin_registry();
    let plan = Orchestrator::new(&registry).resolve(&descriptor)?;

    println!("✓ {} is valid", descriptor.service_name);
    println!("  Stack: {}", config.stack_name(&descriptor.service_name));
    if plan.is_empty() {
        println!("  No capabilities declared");
    } else {
        println!("  Capabilities:");
        for capability in &plan.capabilities {
            if capability.requires.is_empty() {
                println!("    {:<18} {}", capability.name, capability.phase);
            } else {
                println!(
                    "    {:<18} {:<15} requires {}",
                    capability.name,
                    capability.phase.as_str(),
                    capability.requires.join(", ")
                );
            }
        }
    }
    for section in &plan.unknown_sections {
        println!("  ⚠ Unknown section ignored: {section}");
    }
    Ok(())
}
