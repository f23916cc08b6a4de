//! Loader for the embedded agent card contract.
//!
//! The contract ships in `schema/agent_card.schema.json` and is compiled into
//! the binary. Loading checks the `schema_version` marker, pins the JSON Schema
//! draft, and compiles a validator that callers keep for the life of the
//! process.

use anyhow::{Context, Result, anyhow, bail};
use jsonschema::{Draft, JSONSchema};
use serde_json::Value;

pub(crate) const EMBEDDED_CARD_SCHEMA: &str = include_str!("../schema/agent_card.schema.json");

const SCHEMA_VERSION_POINTER: &str = "/schema_version";

// Only one contract generation exists; refuse anything else rather than
// validate cards against a schema the registry does not understand.
const SUPPORTED_SCHEMA_VERSIONS: &[&str] = &["agent_card_v1"];

/// Result of loading and compiling the card contract.
pub(crate) struct SchemaLoadResult {
    pub schema_version: String,
    pub compiled: JSONSchema,
}

pub(crate) fn load_embedded_card_schema() -> Result<SchemaLoadResult> {
    let raw: Value = serde_json::from_str(EMBEDDED_CARD_SCHEMA)
        .context("parsing embedded agent card schema")?;
    compile_card_schema(raw)
}

pub(crate) fn compile_card_schema(raw: Value) -> Result<SchemaLoadResult> {
    let schema_version = extract_schema_version(&raw, SCHEMA_VERSION_POINTER)
        .ok_or_else(|| anyhow!("agent card schema missing schema_version marker"))?;
    if !SUPPORTED_SCHEMA_VERSIONS.contains(&schema_version.as_str()) {
        bail!(
            "schema_version '{}' not in supported set {:?}",
            schema_version,
            SUPPORTED_SCHEMA_VERSIONS
        );
    }

    let compiled = JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(&raw)
        .map_err(|err| anyhow!("compiling agent card schema {schema_version}: {err}"))?;

    Ok(SchemaLoadResult {
        schema_version,
        compiled,
    })
}

fn extract_schema_version(schema: &Value, pointer: &str) -> Option<String> {
    let version = schema.pointer(pointer).and_then(Value::as_str)?;
    if !version.is_empty()
        && version
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        Some(version.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn embedded_schema_compiles() {
        let loaded = load_embedded_card_schema().expect("embedded schema compiles");
        assert_eq!(loaded.schema_version, "agent_card_v1");
        assert!(!loaded.compiled.is_valid(&json!({"name": "no skills"})));
    }

    #[test]
    fn rejects_unknown_schema_versions() {
        let err = compile_card_schema(json!({"schema_version": "agent_card_v9", "type": "object"}))
            .err()
            .expect("unsupported version rejected");
        assert!(err.to_string().contains("agent_card_v9"));
    }

    #[test]
    fn rejects_missing_or_malformed_markers() {
        assert!(compile_card_schema(json!({"type": "object"})).is_err());
        assert!(
            compile_card_schema(json!({"schema_version": "has spaces", "type": "object"}))
                .is_err()
        );
    }
}
