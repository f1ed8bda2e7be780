//! Identifiers and content fingerprints using SHA256 hashing.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// An opaque identifier, either assigned by the telemetry source (map ids)
/// or derived from content (row fingerprints).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Create a new EntityId from an existing string.
    pub fn new(id: String) -> Self {
        Self(id)
    }

    /// Generate a full-length fingerprint from input fields.
    ///
    /// Fields are separated so that `["ab", "c"]` and `["a", "bc"]` hash
    /// differently. The whole digest is kept: fingerprints stand in for
    /// field-by-field equality, so they must not be truncated.
    pub fn fingerprint(fields: &[&str]) -> Self {
        let mut hasher = Sha256::new();
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                hasher.update(b"\x1f");
            }
            hasher.update(field.as_bytes());
        }
        Self(hex::encode(hasher.finalize()))
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Type alias for recorded map ids
pub type MapId = EntityId;

/// Type alias for snapshot row fingerprints
pub type RowFingerprint = EntityId;

/// Type alias for kill event fingerprints
pub type EventFingerprint = EntityId;
