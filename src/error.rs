//! Caller-facing error taxonomy.
//!
//! Outer layers (HTTP, CLI) map [`ErrorKind`] to their own status codes; the
//! registry itself never picks a wire-level code.

use crate::card::{Fingerprint, IdentityKey};
use crate::card_validation::ValidationError;
use crate::registry::StoreError;
use std::fmt;

/// Why a publication collided with an existing record.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ConflictKind {
    /// The identity key is already bound to different content.
    Immutable,
}

impl ConflictKind {
    pub fn code(&self) -> &'static str {
        match self {
            ConflictKind::Immutable => "CARD_IMMUTABLE_CONFLICT",
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Coarse classification of a [`RegistryError`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    Validation,
    Policy,
    Conflict,
    Store,
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The candidate is not a document or violates the card contract.
    #[error("{}", first_message(.errors, "agent card payload is invalid"))]
    Validation { errors: Vec<ValidationError> },

    /// The card is well-formed but a transport URL contradicts its transport.
    #[error("{}", first_message(.errors, "transport configuration is invalid"))]
    TransportPolicy { errors: Vec<ValidationError> },

    #[error("agent card {key} already exists with different content ({kind})")]
    Conflict {
        kind: ConflictKind,
        key: IdentityKey,
        existing: Fingerprint,
        attempted: Fingerprint,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("serializing agent card: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::Validation { .. } => ErrorKind::Validation,
            RegistryError::TransportPolicy { .. } => ErrorKind::Policy,
            RegistryError::Conflict { .. } => ErrorKind::Conflict,
            RegistryError::Store(_) => ErrorKind::Store,
            RegistryError::Serialization(_) => ErrorKind::Internal,
        }
    }

    /// Only backend failures may succeed on a later attempt; a conflict or a
    /// rejected card never will.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RegistryError::Store(err) if !err.is_duplicate_key())
    }

    /// Field-level details for validation and policy failures.
    pub fn details(&self) -> &[ValidationError] {
        match self {
            RegistryError::Validation { errors } | RegistryError::TransportPolicy { errors } => {
                errors
            }
            _ => &[],
        }
    }
}

fn first_message<'a>(errors: &'a [ValidationError], fallback: &'a str) -> &'a str {
    errors
        .first()
        .map(|error| error.message.as_str())
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_display_the_first_message() {
        let err = RegistryError::Validation {
            errors: vec![
                ValidationError::new("/version", "/version is required."),
                ValidationError::new("/name", "/name is required."),
            ],
        };
        assert_eq!(err.to_string(), "/version is required.");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.details().len(), 2);

        let empty = RegistryError::TransportPolicy { errors: Vec::new() };
        assert_eq!(empty.to_string(), "transport configuration is invalid");
    }

    #[test]
    fn conflicts_carry_the_key_and_are_not_retryable() {
        let err = RegistryError::Conflict {
            kind: ConflictKind::Immutable,
            key: IdentityKey::new("SalesBot", "2.0.0"),
            existing: Fingerprint("aa".into()),
            attempted: Fingerprint("bb".into()),
        };
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("SalesBot@2.0.0"));
        assert!(err.to_string().contains("CARD_IMMUTABLE_CONFLICT"));
    }
}
