//! PreferenceHash computation using BLAKE3
//!
//! PreferenceHash = blake3("prefs:v1" || 0x00 || canonical_json)
//!
//! The hash is a cache-validity signal only. It is never used as a credential.

use blake3::Hasher;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::canonical::CanonicalPreferences;
use super::snapshot::PreferenceSnapshot;
use crate::error::ApiError;
use crate::types::Hash;

/// Version tag mixed into every preference hash; bump when the canonical form changes.
pub const PREFERENCE_HASH_VERSION: &[u8] = b"prefs:v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PreferenceHash(Hash);

impl PreferenceHash {
    pub fn from_bytes(bytes: Hash) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &Hash {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 12 hex characters, for log lines and tables.
    pub fn short(&self) -> String {
        let mut text = self.to_hex();
        text.truncate(12);
        text
    }
}

impl fmt::Display for PreferenceHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for PreferenceHash {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim())
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid preference hash: {}", e)))?;
        let hash: Hash = bytes.try_into().map_err(|_| {
            ApiError::InvalidRequest("Preference hash must be 32 bytes".to_string())
        })?;
        Ok(Self(hash))
    }
}

impl Serialize for PreferenceHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PreferenceHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        PreferenceHash::from_str(&text).map_err(serde::de::Error::custom)
    }
}

/// Hash an already-canonical preference set.
pub fn hash_canonical(canonical: &CanonicalPreferences) -> PreferenceHash {
    let canonical_json = canonical.to_json_string();

    let mut hasher = Hasher::new();
    hasher.update(PREFERENCE_HASH_VERSION);
    hasher.update(&[0u8]);
    hasher.update(canonical_json.as_bytes());

    PreferenceHash(*hasher.finalize().as_bytes())
}

/// Canonicalize and hash a snapshot.
pub fn hash_preferences(snapshot: &PreferenceSnapshot) -> PreferenceHash {
    hash_canonical(&CanonicalPreferences::from_snapshot(snapshot))
}
