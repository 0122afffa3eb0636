//! Integration tests for the `platform` binary
//!
//! Every test runs in its own temp directory with the engine's environment
//! variables cleared, so discovery never picks up the developer's settings.

use assert_cmd::assert::OutputAssertExt;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const DESCRIPTOR: &str = "\
apiVersion: platform.althq.com/v1
kind: Service
metadata:
  name: orders
spec:
  compute:
    port: 8080
  database: {}
  cache: {}
";

fn platform(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("platform"));
    cmd.current_dir(dir)
        .env_remove("PLATFORM_YAML_PATH")
        .env_remove("PLATFORM_ENGINE_REGION")
        .env_remove("PLATFORM_ENGINE_STACK_PREFIX")
        .env_remove("RUST_LOG");
    cmd
}

fn workspace(descriptor: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("platform.yaml"), descriptor).unwrap();
    dir
}

#[test]
fn version_output() {
    let dir = TempDir::new().unwrap();
    platform(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("platform"));
}

#[test]
fn capabilities_lists_builtins() {
    let dir = TempDir::new().unwrap();
    platform(dir.path())
        .arg("capabilities")
        .assert()
        .success()
        .stdout(predicate::str::contains("serviceDiscovery"))
        .stdout(predicate::str::contains("agentcoreRuntime"))
        .stdout(predicate::str::is_match(r"lambda\s+compute\s+storage").unwrap());
}

#[test]
fn capabilities_json() {
    let dir = TempDir::new().unwrap();
    let output = platform(dir.path())
        .args(["capabilities", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let list: Vec<Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(list.len(), 12);
    assert_eq!(list[0]["phase"], "infrastructure");
    let lambda = list.iter().find(|c| c["name"] == "lambda").unwrap();
    assert_eq!(lambda["requires"], serde_json::json!(["storage"]));
}

#[test]
fn validate_prints_plan() {
    let dir = workspace(DESCRIPTOR);
    platform(dir.path())
        .args(["validate", "platform.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ orders is valid"))
        .stdout(predicate::str::contains("dev.orders.us-east-1"))
        .stdout(predicate::str::contains("database"));
}

#[test]
fn validate_uses_env_descriptor_path() {
    let dir = workspace(DESCRIPTOR);
    platform(dir.path())
        .arg("validate")
        .env("PLATFORM_YAML_PATH", dir.path().join("platform.yaml"))
        .assert()
        .success();
}

#[test]
fn validate_missing_descriptor_exits_2() {
    let dir = TempDir::new().unwrap();
    platform(dir.path())
        .args(["validate", "nope.yaml"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn validate_unmet_requirement_exits_4() {
    let dir = workspace(
        "apiVersion: platform.althq.com/v1\nmetadata:\n  name: orders\nspec:\n  lambda: {}\n",
    );
    platform(dir.path())
        .args(["validate", "platform.yaml"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("storage"));
}

#[test]
fn plan_json_report() {
    let dir = workspace(DESCRIPTOR);
    let output = platform(dir.path())
        .args([
            "plan",
            "platform.yaml",
            "--json",
            "--region",
            "eu-west-1",
            "--stack-prefix",
            "prod",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["schema_version"], "1");
    assert_eq!(report["stack_name"], "prod.orders.eu-west-1");
    assert_eq!(report["capabilities"][0]["name"], "cache");
    assert!(report["exports"]["rds_endpoint"].is_string());
    assert!(report["exports"]["redis_endpoint"].is_string());
    assert_eq!(report["plan_digest"].as_str().unwrap().len(), 64);
}

#[test]
fn plan_human_summary() {
    let dir = workspace(DESCRIPTOR);
    platform(dir.path())
        .args(["plan", "platform.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Plan for orders"))
        .stdout(predicate::str::contains("rds_instance"))
        .stdout(predicate::str::contains("Plan digest:"));
}

#[test]
fn plan_reads_config_file() {
    let dir = workspace(DESCRIPTOR);
    let settings = dir.path().join(".platform-engine");
    fs::create_dir_all(&settings).unwrap();
    fs::write(
        settings.join("config.toml"),
        "[defaults]\nregion = \"ap-southeast-2\"\nstack_prefix = \"staging\"\n",
    )
    .unwrap();

    let output = platform(dir.path())
        .args(["plan", "platform.yaml", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["stack_name"], "staging.orders.ap-southeast-2");
}

#[test]
fn invalid_region_exits_2() {
    let dir = workspace(DESCRIPTOR);
    platform(dir.path())
        .args(["plan", "platform.yaml", "--region", "Mars"])
        .assert()
        .code(2);
}

#[test]
fn config_shows_sources() {
    let dir = TempDir::new().unwrap();
    platform(dir.path())
        .args(["config", "--region", "eu-central-1"])
        .env("PLATFORM_ENGINE_STACK_PREFIX", "qa")
        .assert()
        .success()
        .stdout(predicate::str::contains("(none found)"))
        .stdout(predicate::str::is_match(r"region\s+= eu-central-1\s+\[cli\]").unwrap())
        .stdout(predicate::str::is_match(r"stack_prefix\s+= qa\s+\[env\]").unwrap());
}
