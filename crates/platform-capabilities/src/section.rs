//! Typed reads over a capability's raw configuration section.
//!
//! Absent keys and `null` values yield the caller's default. Values of the
//! wrong shape are reported as [`CapabilityError::InvalidSection`] with the
//! path of the offending field.

use serde_json::Value;
use std::collections::BTreeMap;

use platform_utils::error::CapabilityError;

static NULL: Value = Value::Null;

#[derive(Debug, Clone)]
pub(crate) struct Section<'a> {
    capability: &'static str,
    path: String,
    value: &'a Value,
}

impl<'a> Section<'a> {
    /// Wrap a capability section. `null` reads as an empty mapping.
    pub fn new(capability: &'static str, value: &'a Value) -> Result<Self, CapabilityError> {
        match value {
            Value::Null | Value::Object(_) => Ok(Self {
                capability,
                path: String::new(),
                value,
            }),
            other => Err(CapabilityError::InvalidSection {
                capability: capability.to_string(),
                reason: format!("expected a mapping, found {}", type_name(other)),
            }),
        }
    }

    fn field(&self, key: &str) -> Option<&'a Value> {
        match self.value.get(key) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value),
        }
    }

    fn nested(&self, key: &str, value: &'a Value) -> Section<'a> {
        Section {
            capability: self.capability,
            path: self.field_path(key),
            value,
        }
    }

    fn field_path(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{key}", self.path)
        }
    }

    fn invalid(&self, key: &str, expected: &str, found: &Value) -> CapabilityError {
        let field = self.field_path(key);
        CapabilityError::InvalidSection {
            capability: self.capability.to_string(),
            reason: format!("'{field}' must be {expected}, found {}", type_name(found)),
        }
    }

    pub fn opt_str(&self, key: &str) -> Result<Option<&'a str>, CapabilityError> {
        match self.field(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(self.invalid(key, "a string", other)),
        }
    }

    pub fn str_or(&self, key: &str, default: &str) -> Result<String, CapabilityError> {
        Ok(self.opt_str(key)?.unwrap_or(default).to_string())
    }

    /// A string the entry cannot do without. Empty strings count as missing.
    pub fn required_str(&self, key: &str) -> Result<&'a str, CapabilityError> {
        match self.opt_str(key)? {
            Some(s) if !s.is_empty() => Ok(s),
            _ => Err(self.invalid(key, "a non-empty string", self.field(key).unwrap_or(&NULL))),
        }
    }

    pub fn u64_or(&self, key: &str, default: u64) -> Result<u64, CapabilityError> {
        match self.field(key) {
            None => Ok(default),
            Some(value) => value
                .as_u64()
                .ok_or_else(|| self.invalid(key, "a non-negative integer", value)),
        }
    }

    pub fn opt_u64(&self, key: &str) -> Result<Option<u64>, CapabilityError> {
        match self.field(key) {
            None => Ok(None),
            Some(value) => value
                .as_u64()
                .map(Some)
                .ok_or_else(|| self.invalid(key, "a non-negative integer", value)),
        }
    }

    pub fn bool_or(&self, key: &str, default: bool) -> Result<bool, CapabilityError> {
        match self.field(key) {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => Err(self.invalid(key, "a boolean", other)),
        }
    }

    /// Nested mapping; absent reads as empty.
    pub fn child(&self, key: &str) -> Result<Section<'a>, CapabilityError> {
        match self.field(key) {
            None => Ok(self.nested(key, &NULL)),
            Some(value @ Value::Object(_)) => Ok(self.nested(key, value)),
            Some(other) => Err(self.invalid(key, "a mapping", other)),
        }
    }

    /// List of mappings; absent reads as empty.
    pub fn entries(&self, key: &str) -> Result<Vec<Section<'a>>, CapabilityError> {
        let items = match self.field(key) {
            None => return Ok(Vec::new()),
            Some(Value::Array(items)) => items,
            Some(other) => return Err(self.invalid(key, "a list", other)),
        };
        items
            .iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(_) => Ok(self.nested(&format!("{key}[{index}]"), item)),
                other => Err(self.invalid(&format!("{key}[{index}]"), "a mapping", other)),
            })
            .collect()
    }

    pub fn string_list(&self, key: &str) -> Result<Vec<String>, CapabilityError> {
        match self.field(key) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| self.invalid(key, "a list of strings", item))
                })
                .collect(),
            Some(other) => Err(self.invalid(key, "a list of strings", other)),
        }
    }

    /// Mapping of scalar values rendered as strings (environment variables).
    pub fn string_map(&self, key: &str) -> Result<BTreeMap<String, String>, CapabilityError> {
        let map = match self.field(key) {
            None => return Ok(BTreeMap::new()),
            Some(Value::Object(map)) => map,
            Some(other) => return Err(self.invalid(key, "a mapping", other)),
        };
        map.iter()
            .map(|(k, v)| match v {
                Value::String(s) => Ok((k.clone(), s.clone())),
                Value::Number(n) => Ok((k.clone(), n.to_string())),
                Value::Bool(b) => Ok((k.clone(), b.to_string())),
                other => Err(self.invalid(&format!("{key}.{k}"), "a scalar", other)),
            })
            .collect()
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_section_reads_defaults() {
        let value = Value::Null;
        let section = Section::new("cache", &value).unwrap();
        assert_eq!(section.str_or("nodeType", "cache.t3.micro").unwrap(), "cache.t3.micro");
        assert_eq!(section.u64_or("numNodes", 1).unwrap(), 1);
        assert!(section.entries("buckets").unwrap().is_empty());
        assert!(section.child("efs").unwrap().bool_or("encrypted", true).unwrap());
    }

    #[test]
    fn test_scalar_section_rejected() {
        let value = json!("yes");
        let err = Section::new("cache", &value).unwrap_err();
        assert!(err.to_string().contains("expected a mapping"));
    }

    #[test]
    fn test_wrong_type_names_field_path() {
        let value = json!({"efs": {"encrypted": "no"}});
        let section = Section::new("storage", &value).unwrap();
        let err = section
            .child("efs")
            .unwrap()
            .bool_or("encrypted", true)
            .unwrap_err();
        assert!(err.to_string().contains("'efs.encrypted' must be a boolean"));
    }

    #[test]
    fn test_entries_must_be_mappings() {
        let value = json!({"buckets": [{"name": "a"}, "b"]});
        let section = Section::new("s3", &value).unwrap();
        let err = section.entries("buckets").unwrap_err();
        assert!(err.to_string().contains("buckets[1]"));
    }

    #[test]
    fn test_required_str() {
        let value = json!({"tables": [{"name": ""}]});
        let section = Section::new("dynamodb", &value).unwrap();
        let tables = section.entries("tables").unwrap();
        let err = tables[0].required_str("name").unwrap_err();
        assert!(err.to_string().contains("'tables[0].name'"));
        assert!(tables[0].required_str("partitionKey").is_err());
    }

    #[test]
    fn test_string_map_renders_scalars() {
        let value = json!({"env": {"A": "x", "B": 2, "C": true}});
        let section = Section::new("agentcoreRuntime", &value).unwrap();
        let map = section.string_map("env").unwrap();
        assert_eq!(map["A"], "x");
        assert_eq!(map["B"], "2");
        assert_eq!(map["C"], "true");
    }
}
