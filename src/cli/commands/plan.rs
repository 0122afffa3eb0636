//! Plan command implementation
//!
//! Handles `platform plan` and `platform plan --json`. The run goes through
//! the same orchestrator as a real deployment, against a planning provider.

use anyhow::{Context, Result};
use camino::Utf8Path;
use serde_json::Value;

use super::common::load_descriptor;
use crate::logging::Logger;
use crate::{Config, Orchestrator, RunReport, builtin_registry, emit_jcs};

pub fn execute_plan_command(
    descriptor: Option<&Utf8Path>,
    json: bool,
    verbose: bool,
    config: &Config,
) -> Result<()> {
    let mut logger = Logger::new(verbose);

    logger.start_timing("load descriptor");
    let descriptor = load_descriptor(descriptor)?;
    logger.end_timing("load descriptor");

    logger.start_timing("orchestrate");
    let registry = builtin_registry();
    let report = Orchestrator::new(&registry).plan(&descriptor, config)?;
    logger.end_timing("orchestrate");

    if json {
        let output = emit_jcs(&report).context("Failed to emit plan JSON")?;
        println!("{output}");
    } else {
        print_summary(&report);
    }
    logger.print_timing_summary();
    Ok(())
}

fn print_summary(report: &RunReport) {
    println!("Plan for {} ({})", report.service, report.stack_name);
    println!();

    println!("Capabilities:");
    if report.capabilities.is_empty() {
        println!("  (none)");
    }
    for capability in &report.capabilities {
        println!("  {:<18} {}", capability.name, capability.phase);
    }
    for section in &report.unknown_sections {
        println!("  ⚠ Unknown section ignored: {section}");
    }

    println!();
    println!("Resources ({}):", report.resources.len());
    for resource in &report.resources {
        println!(
            "  + {:<28} {:<40} {}",
            resource.kind.as_str(),
            resource.logical_name,
            resource.id
        );
    }

    println!();
    println!("Exports:");
    for (key, value) in &report.exports {
        println!("  {key} = {}", render(value));
    }

    println!();
    println!("Plan digest: {}", report.plan_digest);
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
