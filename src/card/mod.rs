//! Agent card documents and the identities derived from them.
//!
//! `model` holds the typed descriptor; `identity` holds the small keys the
//! registry indexes by (identity key, skill id, fingerprint, record id) and
//! the transport/status enums shared with the policy and store layers.

pub mod identity;
pub mod model;

pub use identity::{Fingerprint, IdentityKey, RecordId, RecordStatus, SkillId, Transport};
pub use model::{
    AgentCard, AgentInterface, AgentSkill, Maintainer, SecurityBlock, SecurityScheme,
    SkillExample, SkillRuntime, SkillSecurity, SkillTelemetry,
};
