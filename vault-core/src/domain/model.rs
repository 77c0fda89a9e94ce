use crate::foundation::{KeyId, VaultError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Signing algorithm of a stored key.
///
/// The integer tags are stable: they appear identically on the wire and in
/// the persisted store file. Append only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyAlgorithm {
    EcdsaP256,
    EcdsaP384,
}

impl KeyAlgorithm {
    pub const fn tag(self) -> u8 {
        match self {
            KeyAlgorithm::EcdsaP256 => 1,
            KeyAlgorithm::EcdsaP384 => 2,
        }
    }
}

impl TryFrom<u8> for KeyAlgorithm {
    type Error = VaultError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            1 => Ok(KeyAlgorithm::EcdsaP256),
            2 => Ok(KeyAlgorithm::EcdsaP384),
            other => Err(VaultError::InvalidAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyAlgorithm::EcdsaP256 => write!(f, "ECDSA_P256"),
            KeyAlgorithm::EcdsaP384 => write!(f, "ECDSA_P384"),
        }
    }
}

impl Serialize for KeyAlgorithm {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.tag())
    }
}

impl<'de> Deserialize<'de> for KeyAlgorithm {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = u8::deserialize(deserializer)?;
        KeyAlgorithm::try_from(tag).map_err(serde::de::Error::custom)
    }
}

/// Lifecycle state of a stored key.
///
/// Transitions are monotone: ACTIVE -> ROTATED, ACTIVE -> DEACTIVATED,
/// ROTATED -> DEACTIVATED. The store itself does not enforce this; the
/// facade does. Integer tags are stable on the wire and on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyStatus {
    Active,
    Rotated,
    Deactivated,
}

impl KeyStatus {
    pub const fn tag(self) -> u8 {
        match self {
            KeyStatus::Active => 1,
            KeyStatus::Rotated => 2,
            KeyStatus::Deactivated => 3,
        }
    }
}

impl TryFrom<u8> for KeyStatus {
    type Error = VaultError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            1 => Ok(KeyStatus::Active),
            2 => Ok(KeyStatus::Rotated),
            3 => Ok(KeyStatus::Deactivated),
            other => Err(VaultError::Message(format!("unknown key status tag: {other}"))),
        }
    }
}

impl fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyStatus::Active => write!(f, "ACTIVE"),
            KeyStatus::Rotated => write!(f, "ROTATED"),
            KeyStatus::Deactivated => write!(f, "DEACTIVATED"),
        }
    }
}

impl Serialize for KeyStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.tag())
    }
}

impl<'de> Deserialize<'de> for KeyStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = u8::deserialize(deserializer)?;
        KeyStatus::try_from(tag).map_err(serde::de::Error::custom)
    }
}

/// Observable attributes of a stored key. Never carries private material.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct KeyMetadata {
    pub key_id: KeyId,
    pub algorithm: KeyAlgorithm,
    pub status: KeyStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}
