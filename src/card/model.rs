//! Typed representation of `schema/agent_card.schema.json`.
//!
//! The structs mirror the contract field for field and skip absent optional
//! fields when serializing, so a card decoded from a validated document
//! serializes back to the same tree. Fingerprints depend on that.

use crate::card::identity::{IdentityKey, SkillId, Transport};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
/// Top-level capability descriptor for one agent.
pub struct AgentCard {
    pub protocol_version: String,
    pub name: String,
    pub version: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintainers: Option<Vec<Maintainer>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<SecurityBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_schemes: Option<Vec<SecurityScheme>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_transport: Option<Transport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_transports: Option<Vec<Transport>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_interfaces: Option<Vec<AgentInterface>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_locales: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    pub skills: Vec<AgentSkill>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Maintainer {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
/// Card-level security posture.
pub struct SecurityBlock {
    pub authentication: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SecurityScheme {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, rename = "in", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
/// Secondary endpoint exposed next to the preferred transport.
pub struct AgentInterface {
    pub transport: Transport,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
/// One capability unit declared by a card.
///
/// `inputs`/`outputs` are schema fragments owned by the agent author; the
/// registry only checks their outer shape.
pub struct AgentSkill {
    pub id: SkillId,
    pub name: String,
    pub version: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    pub inputs: Value,
    pub outputs: Value,
    pub runtime: SkillRuntime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telemetry: Option<SkillTelemetry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<SkillSecurity>,
    pub examples: Vec<SkillExample>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SkillRuntime {
    #[serde(rename = "type")]
    pub kind: String,
    pub entry_point: String,
    #[serde(
        default,
        deserialize_with = "integral_u64",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout_ms: Option<u64>,
    #[serde(
        default,
        deserialize_with = "integral_u64",
        skip_serializing_if = "Option::is_none"
    )]
    pub memory: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SkillTelemetry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emits_logs: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emits_metrics: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emits_traces: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SkillSecurity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_auth: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
/// Literal input/output pair demonstrating a skill.
pub struct SkillExample {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub input: Value,
    pub output: Value,
}

impl AgentCard {
    pub fn identity(&self) -> IdentityKey {
        IdentityKey::new(self.name.clone(), self.version.clone())
    }

    /// Skill identifiers in declaration order, duplicates removed.
    pub fn skill_ids(&self) -> Vec<&SkillId> {
        let mut ids: Vec<&SkillId> = Vec::with_capacity(self.skills.len());
        for skill in &self.skills {
            if !ids.contains(&&skill.id) {
                ids.push(&skill.id);
            }
        }
        ids
    }

    pub fn has_skill(&self, id: &SkillId) -> bool {
        self.skills.iter().any(|skill| &skill.id == id)
    }
}

/// The contract's `integer` admits integral floats such as `800.0`, so the
/// typed side accepts them too.
fn integral_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(number) = Option::<Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Some(value) = number.as_u64() {
        return Ok(Some(value));
    }
    match number.as_f64() {
        Some(value) if value.fract() == 0.0 && value >= 0.0 && value < u64::MAX as f64 => {
            Ok(Some(value as u64))
        }
        _ => Err(D::Error::custom(format!(
            "expected a non-negative integer, found {number}"
        ))),
    }
}
