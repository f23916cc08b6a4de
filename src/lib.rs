//! Content-addressed registry for agent capability cards.
//!
//! A candidate card passes through the schema validator, then the transport
//! policy, and is published under its `(name, version)` identity key with a
//! SHA-256 fingerprint of its canonical form. A key, once bound, keeps its
//! content forever: republishing identical content returns the existing
//! record, and different content is rejected as an immutability conflict.
//!
//! The binaries under `src/bin/` are thin wrappers over this API.

pub mod card;
pub mod card_validation;
pub mod cli_support;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod logging;
pub mod registry;
mod schema_loader;
pub mod transport_policy;

pub use card::{
    AgentCard, AgentInterface, AgentSkill, Fingerprint, IdentityKey, RecordId, RecordStatus,
    SkillId, Transport,
};
pub use card_validation::{SchemaValidator, ValidationError};
pub use config::RegistryConfig;
pub use error::{ConflictKind, ErrorKind, RegistryError};
pub use fingerprint::{canonical_bytes, canonicalize, fingerprint_card, fingerprint_value};
pub use registry::{
    MemoryStore, Page, Pagination, RecordFilter, RecordQuery, RecordStore, Registry, SqliteStore,
    StoreError, StoredAgentRecord,
};
pub use transport_policy::check_transport_consistency;
