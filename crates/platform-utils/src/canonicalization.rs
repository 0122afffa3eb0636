use anyhow::{Context, Result};
use blake3::Hasher;
use serde::Serialize;

pub const CANONICALIZATION_BACKEND: &str = "jcs-rfc8785";

/// Emit a value as JCS-canonical JSON (RFC 8785).
///
/// Run reports, capability listings and any other JSON contract go
/// through here so output is byte-stable regardless of field order.
///
/// # Example
///
/// ```rust
/// use platform_utils::canonicalization::emit_jcs;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Out {
///     zeta: u8,
///     alpha: u8,
/// }
///
/// let json = emit_jcs(&Out { zeta: 1, alpha: 2 }).unwrap();
/// assert_eq!(json, r#"{"alpha":2,"zeta":1}"#);
/// ```
pub fn emit_jcs<T: Serialize>(value: &T) -> Result<String> {
    let json_value =
        serde_json::to_value(value).with_context(|| "Failed to serialize value to JSON")?;
    let json_bytes = serde_json_canonicalizer::to_vec(&json_value)
        .with_context(|| "Failed to canonicalize JSON using JCS")?;
    String::from_utf8(json_bytes).with_context(|| "JCS output contained invalid UTF-8")
}

/// BLAKE3 hex digest of the JCS form of `value`.
pub fn hash_jcs<T: Serialize>(value: &T) -> Result<String> {
    let canonical = emit_jcs(value)?;
    Ok(hash_str(&canonical))
}

/// BLAKE3 hex digest of a YAML document after YAML -> JSON -> JCS.
///
/// Formatting, comments and key order do not affect the result.
pub fn hash_yaml(content: &str) -> Result<String> {
    let yaml_value: serde_yaml::Value =
        serde_yaml::from_str(content).with_context(|| "Failed to parse YAML content for hashing")?;
    let json_value: serde_json::Value = serde_json::to_value(&yaml_value)
        .with_context(|| "Failed to convert YAML to JSON for hashing")?;
    hash_jcs(&json_value)
}

/// BLAKE3 hex digest of a string.
#[must_use]
pub fn hash_str(content: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(content.as_bytes());
    hasher.finalize().to_hex().to_string()
}

/// First `len` hex characters of the BLAKE3 digest of `content`.
#[must_use]
pub fn short_hash(content: &str, len: usize) -> String {
    let full = hash_str(content);
    full.chars().take(len).collect()
}
