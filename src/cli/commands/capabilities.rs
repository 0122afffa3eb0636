//! Capabilities command implementation

use anyhow::{Context, Result};

use crate::{CapabilityDefinition, builtin_registry, emit_jcs};

pub fn execute_capabilities_command(json: bool) -> Result<()> {
    let registry = builtin_registry();
    let mut definitions: Vec<&CapabilityDefinition> = registry.iter().collect();
    definitions.sort_by(|a, b| a.phase.cmp(&b.phase).then_with(|| a.name.cmp(&b.name)));

    if json {
        let output = emit_jcs(&definitions).context("Failed to emit capabilities JSON")?;
        println!("{output}");
        return Ok(());
    }

    println!("{:<18} {:<15} REQUIRES", "CAPABILITY", "PHASE");
    for definition in definitions {
        let requires = if definition.requires.is_empty() {
            "-".to_string()
        } else {
            definition.requires.join(", ")
        };
        println!(
            "{:<18} {:<15} {}",
            definition.name,
            definition.phase.as_str(),
            requires
        );
    }
    Ok(())
}
