//! Service descriptor (`platform.yaml`)
//!
//! ```yaml
//! apiVersion: platform.althq.com/v1
//! kind: Service
//! metadata:
//!   name: orders
//! spec:
//!   compute:
//!     port: 8080
//!   database: {}
//!   secrets: [OPENAI_API_KEY]
//! ```
//!
//! Every key under `spec` other than `secrets` and `region` is a capability
//! section. A section whose value is `null` is treated as absent.

use camino::{Utf8Path, Utf8PathBuf};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use platform_utils::canonicalization::hash_yaml;
use platform_utils::error::{ConfigError, EngineError};

/// The only descriptor schema version this engine understands.
pub const SUPPORTED_API_VERSION: &str = "platform.althq.com/v1";

/// Environment variable naming the descriptor when no path is given.
pub const ENV_DESCRIPTOR_PATH: &str = "PLATFORM_YAML_PATH";

/// Keys under `spec` that are service settings rather than capabilities.
pub const NON_CAPABILITY_KEYS: &[&str] = &["secrets", "region"];

static SERVICE_NAME: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9-]{0,62}$").ok());
static ENV_VAR_NAME: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[A-Z_][A-Z0-9_]*$").ok());

fn matches(re: &Lazy<Option<Regex>>, value: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(value))
}

/// Container settings taken from `spec.compute`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComputeSettings {
    pub port: u16,
    pub health_path: String,
    pub cpu: u32,
    pub memory: u32,
    pub min_capacity: u32,
}

impl Default for ComputeSettings {
    fn default() -> Self {
        Self {
            port: 80,
            health_path: "/health".to_string(),
            cpu: 256,
            memory: 512,
            min_capacity: 1,
        }
    }
}

/// A parsed and validated service descriptor
#[derive(Debug, Clone)]
pub struct PlatformDescriptor {
    pub api_version: String,
    pub kind: Option<String>,
    pub service_name: String,
    /// Declared capability sections, `null` sections removed.
    pub sections: BTreeMap<String, Value>,
    pub secrets: Vec<String>,
    pub region: Option<String>,
    pub compute: ComputeSettings,
    /// BLAKE3 of the canonicalized document.
    pub digest: String,
}

impl PlatformDescriptor {
    /// Resolve the descriptor path from an explicit argument, falling back to
    /// `PLATFORM_YAML_PATH`.
    pub fn resolve_path(explicit: Option<&Utf8Path>) -> Result<Utf8PathBuf, EngineError> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }
        match std::env::var(ENV_DESCRIPTOR_PATH) {
            Ok(path) if !path.is_empty() => Ok(Utf8PathBuf::from(path)),
            _ => Err(ConfigError::MissingRequired("descriptor".to_string()).into()),
        }
    }

    /// Load and validate a descriptor file.
    pub fn from_path(path: &Utf8Path) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EngineError::Config(ConfigError::NotFound {
                    path: path.to_string(),
                })
            } else {
                EngineError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// Parse and validate descriptor YAML.
    pub fn parse(content: &str) -> Result<Self, EngineError> {
        let document: Value = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::InvalidFile(format!("platform.yaml: {e}")))?;
        let digest = hash_yaml(content)
            .map_err(|e| ConfigError::InvalidFile(format!("platform.yaml: {e:#}")))?;
        Self::from_value(&document, digest)
    }

    fn from_value(document: &Value, digest: String) -> Result<Self, EngineError> {
        let Some(root) = document.as_object() else {
            return Err(
                ConfigError::validation_failed(vec!["(root): must be a mapping".to_string()])
                    .into(),
            );
        };

        let api_version = match root.get("apiVersion") {
            Some(Value::String(v)) => v.clone(),
            Some(_) => {
                return Err(ConfigError::validation_failed(vec![
                    "apiVersion: must be a string".to_string(),
                ])
                .into());
            }
            None => {
                return Err(ConfigError::validation_failed(vec![
                    "(root): missing required field: apiVersion".to_string(),
                ])
                .into());
            }
        };
        if api_version != SUPPORTED_API_VERSION {
            return Err(ConfigError::UnsupportedApiVersion {
                version: api_version,
            }
            .into());
        }

        let mut errors = Vec::new();

        let kind = match root.get("kind") {
            None | Some(Value::Null) => None,
            Some(Value::String(k)) => Some(k.clone()),
            Some(_) => {
                errors.push("kind: must be a string".to_string());
                None
            }
        };

        let service_name = match root.get("metadata").and_then(|m| m.get("name")) {
            Some(Value::String(name)) if matches(&SERVICE_NAME, name) => name.clone(),
            Some(Value::String(name)) => {
                errors.push(format!(
                    "metadata.name: '{name}' must be a lowercase DNS label (letters, digits, hyphens)"
                ));
                String::new()
            }
            Some(_) => {
                errors.push("metadata.name: must be a string".to_string());
                String::new()
            }
            None => {
                errors.push("metadata: missing required field: name".to_string());
                String::new()
            }
        };

        let empty = Map::new();
        let spec = match root.get("spec") {
            Some(Value::Object(spec)) => spec,
            Some(_) => {
                errors.push("spec: must be a mapping".to_string());
                &empty
            }
            None => {
                errors.push("(root): missing required field: spec".to_string());
                &empty
            }
        };

        let secrets = parse_secrets(spec.get("secrets"), &mut errors);

        let region = match spec.get("region") {
            None | Some(Value::Null) => None,
            Some(Value::String(r)) => Some(r.clone()),
            Some(_) => {
                errors.push("spec.region: must be a string".to_string());
                None
            }
        };

        let mut sections = BTreeMap::new();
        for (name, section) in spec {
            if NON_CAPABILITY_KEYS.contains(&name.as_str()) {
                continue;
            }
            match section {
                Value::Null => {}
                Value::Object(_) => {
                    sections.insert(name.clone(), section.clone());
                }
                _ => errors.push(format!("spec.{name}: must be a mapping or null")),
            }
        }

        let compute = match sections.get("compute") {
            Some(section) => parse_compute(section, &mut errors),
            None => ComputeSettings::default(),
        };

        if !errors.is_empty() {
            return Err(ConfigError::validation_failed(errors).into());
        }

        Ok(Self {
            api_version,
            kind,
            service_name,
            sections,
            secrets,
            region,
            compute,
            digest,
        })
    }

    /// Whether a capability section is present and non-null.
    #[must_use]
    pub fn is_declared(&self, capability: &str) -> bool {
        self.sections.contains_key(capability)
    }

    /// Section for a capability, if declared.
    #[must_use]
    pub fn section(&self, capability: &str) -> Option<&Value> {
        self.sections.get(capability)
    }
}

fn parse_secrets(value: Option<&Value>, errors: &mut Vec<String>) -> Vec<String> {
    let Some(value) = value else {
        return Vec::new();
    };
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => {
            let mut secrets = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                match item.as_str() {
                    Some(name) if matches(&ENV_VAR_NAME, name) => secrets.push(name.to_string()),
                    Some(name) => errors.push(format!(
                        "spec.secrets.{i}: '{name}' is not an environment variable name"
                    )),
                    None => errors.push(format!("spec.secrets.{i}: must be a string")),
                }
            }
            secrets
        }
        _ => {
            errors.push("spec.secrets: must be a list".to_string());
            Vec::new()
        }
    }
}

fn non_negative_u32(
    section: &Value,
    pointer: &str,
    path: &str,
    default: u32,
    errors: &mut Vec<String>,
) -> u32 {
    match section.pointer(pointer) {
        None | Some(Value::Null) => default,
        Some(v) => match v.as_u64().and_then(|n| u32::try_from(n).ok()) {
            Some(n) => n,
            None => {
                errors.push(format!("{path}: must be a non-negative integer"));
                default
            }
        },
    }
}

fn parse_compute(section: &Value, errors: &mut Vec<String>) -> ComputeSettings {
    let defaults = ComputeSettings::default();

    let port = match section.get("port") {
        None | Some(Value::Null) => defaults.port,
        Some(v) => match v.as_u64().and_then(|n| u16::try_from(n).ok()) {
            Some(port) if port > 0 => port,
            _ => {
                errors.push("spec.compute.port: must be between 1 and 65535".to_string());
                defaults.port
            }
        },
    };

    let health_path = match section.pointer("/healthCheck/path") {
        None | Some(Value::Null) => defaults.health_path.clone(),
        Some(Value::String(p)) if p.starts_with('/') => p.clone(),
        Some(_) => {
            errors.push(
                "spec.compute.healthCheck.path: must be a path starting with '/'".to_string(),
            );
            defaults.health_path.clone()
        }
    };

    let cpu = non_negative_u32(section, "/cpu", "spec.compute.cpu", defaults.cpu, errors);
    let memory = non_negative_u32(section, "/memory", "spec.compute.memory", defaults.memory, errors);
    let min_capacity = non_negative_u32(
        section,
        "/instances/min",
        "spec.compute.instances.min",
        defaults.min_capacity,
        errors,
    );

    ComputeSettings {
        port,
        health_path,
        cpu,
        memory,
        min_capacity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
apiVersion: platform.althq.com/v1
kind: Service
metadata:
  name: orders
spec:
  database: {}
"#;

    fn validation_errors(err: EngineError) -> Vec<String> {
        match err {
            EngineError::Config(ConfigError::ValidationFailed { errors, .. }) => errors,
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_minimal_descriptor() {
        let descriptor = PlatformDescriptor::parse(MINIMAL).unwrap();
        assert_eq!(descriptor.service_name, "orders");
        assert_eq!(descriptor.kind.as_deref(), Some("Service"));
        assert!(descriptor.is_declared("database"));
        assert!(!descriptor.is_declared("compute"));
        assert_eq!(descriptor.compute, ComputeSettings::default());
        assert_eq!(descriptor.digest.len(), 64);
    }

    #[test]
    fn test_null_section_is_absent() {
        let yaml = r#"
apiVersion: platform.althq.com/v1
metadata: {name: orders}
spec:
  cache: ~
  storage:
"#;
        let descriptor = PlatformDescriptor::parse(yaml).unwrap();
        assert!(descriptor.sections.is_empty());
    }

    #[test]
    fn test_non_capability_keys_are_not_sections() {
        let yaml = r#"
apiVersion: platform.althq.com/v1
metadata: {name: orders}
spec:
  secrets: [OPENAI_API_KEY, DB_URL]
  region: eu-west-1
  s3: {buckets: []}
"#;
        let descriptor = PlatformDescriptor::parse(yaml).unwrap();
        assert_eq!(descriptor.secrets, vec!["OPENAI_API_KEY", "DB_URL"]);
        assert_eq!(descriptor.region.as_deref(), Some("eu-west-1"));
        assert_eq!(descriptor.sections.keys().collect::<Vec<_>>(), vec!["s3"]);
    }

    #[test]
    fn test_compute_settings_overrides() {
        let yaml = r#"
apiVersion: platform.althq.com/v1
metadata: {name: orders}
spec:
  compute:
    port: 8080
    cpu: 1024
    memory: 2048
    healthCheck: {path: /ready}
    instances: {min: 2}
"#;
        let descriptor = PlatformDescriptor::parse(yaml).unwrap();
        assert_eq!(
            descriptor.compute,
            ComputeSettings {
                port: 8080,
                health_path: "/ready".to_string(),
                cpu: 1024,
                memory: 2048,
                min_capacity: 2,
            }
        );
    }

    #[test]
    fn test_missing_api_version() {
        let errors = validation_errors(
            PlatformDescriptor::parse("metadata: {name: x}\nspec: {}\n").unwrap_err(),
        );
        assert_eq!(errors, vec!["(root): missing required field: apiVersion"]);
    }

    #[test]
    fn test_unsupported_api_version() {
        let err = PlatformDescriptor::parse("apiVersion: platform.althq.com/v2\n").unwrap_err();
        assert!(matches!(
            err,
            EngineError::Config(ConfigError::UnsupportedApiVersion { .. })
        ));
    }

    #[test]
    fn test_collects_all_errors() {
        let yaml = r#"
apiVersion: platform.althq.com/v1
metadata: {name: Orders_Service}
spec:
  secrets: [lower-case]
  compute: {port: 70000, healthCheck: {path: health}}
  cache: 3
"#;
        let errors = validation_errors(PlatformDescriptor::parse(yaml).unwrap_err());
        assert_eq!(errors.len(), 5, "{errors:?}");
        assert!(errors.iter().any(|e| e.starts_with("metadata.name")));
        assert!(errors.iter().any(|e| e.starts_with("spec.secrets.0")));
        assert!(errors.iter().any(|e| e.starts_with("spec.cache")));
        assert!(errors.iter().any(|e| e.starts_with("spec.compute.port")));
        assert!(errors.iter().any(|e| e.starts_with("spec.compute.healthCheck.path")));
    }

    #[test]
    fn test_invalid_yaml_is_invalid_file() {
        let err = PlatformDescriptor::parse("spec: [unterminated").unwrap_err();
        assert!(matches!(err, EngineError::Config(ConfigError::InvalidFile(_))));
    }

    #[test]
    fn test_from_path_not_found() {
        let err = PlatformDescriptor::from_path(Utf8Path::new("/definitely/not/here.yaml"))
            .unwrap_err();
        assert!(matches!(err, EngineError::Config(ConfigError::NotFound { .. })));
    }

    #[test]
    fn test_resolve_path_prefers_explicit() {
        let path = PlatformDescriptor::resolve_path(Some(Utf8Path::new("svc/platform.yaml")))
            .unwrap();
        assert_eq!(path, Utf8PathBuf::from("svc/platform.yaml"));
    }
}
