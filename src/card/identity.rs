use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// Registry identity of a card: the `(name, version)` pair.
///
/// Once a key has been published it is bound to exactly one fingerprint.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct IdentityKey {
    pub name: String,
    pub version: String,
}

impl IdentityKey {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// Stable identifier of a skill; the key of the skill search index.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillId(pub String);

/// Hex-encoded SHA-256 digest of a canonicalized card.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(pub String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque primary key of a stored record.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Transport named by `preferredTransport` or an additional interface.
///
/// Known variants carry the URL scheme policy; `Other` keeps cards that
/// declare newer transports representable without a code change.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Transport {
    Http,
    Https,
    WebSocket,
    Grpc,
    Nats,
    Mqtt,
    JsonRpc,
    Other(String),
}

impl Transport {
    pub fn as_str(&self) -> &str {
        match self {
            Transport::Http => "http",
            Transport::Https => "https",
            Transport::WebSocket => "websocket",
            Transport::Grpc => "grpc",
            Transport::Nats => "nats",
            Transport::Mqtt => "mqtt",
            Transport::JsonRpc => "jsonrpc",
            Transport::Other(value) => value.as_str(),
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "http" => Transport::Http,
            "https" => Transport::Https,
            "websocket" => Transport::WebSocket,
            "grpc" => Transport::Grpc,
            "nats" => Transport::Nats,
            "mqtt" => Transport::Mqtt,
            "jsonrpc" => Transport::JsonRpc,
            other => Transport::Other(other.to_string()),
        }
    }

    /// URL schemes a transport may be served over, or `None` when the
    /// transport is not covered by the policy.
    pub fn accepted_schemes(&self) -> Option<&'static [&'static str]> {
        match self {
            Transport::Http => Some(&["http"]),
            Transport::Https => Some(&["https"]),
            Transport::WebSocket => Some(&["ws", "wss"]),
            Transport::Grpc => Some(&["grpc"]),
            Transport::Nats => Some(&["nats"]),
            Transport::Mqtt => Some(&["mqtt", "mqtts"]),
            // JSON-RPC rides over encrypted HTTP or encrypted WebSocket.
            Transport::JsonRpc => Some(&["https", "wss"]),
            Transport::Other(_) => None,
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Transport {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Transport {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Self::parse(&value))
    }
}

/// Lifecycle status of a stored record.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Draft,
    Published,
    Deprecated,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Draft => "draft",
            RecordStatus::Published => "published",
            RecordStatus::Deprecated => "deprecated",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(RecordStatus::Draft),
            "published" => Some(RecordStatus::Published),
            "deprecated" => Some(RecordStatus::Deprecated),
            _ => None,
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
