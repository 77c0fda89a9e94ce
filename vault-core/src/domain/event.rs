use crate::domain::KeyMetadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Kind of a key lifecycle transition. Integer tags are stable on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyEventKind {
    Created,
    Rotated,
    Deactivated,
}

impl KeyEventKind {
    pub const fn tag(self) -> u8 {
        match self {
            KeyEventKind::Created => 1,
            KeyEventKind::Rotated => 2,
            KeyEventKind::Deactivated => 3,
        }
    }
}

impl fmt::Display for KeyEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyEventKind::Created => write!(f, "CREATED"),
            KeyEventKind::Rotated => write!(f, "ROTATED"),
            KeyEventKind::Deactivated => write!(f, "DEACTIVATED"),
        }
    }
}

impl Serialize for KeyEventKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.tag())
    }
}

impl<'de> Deserialize<'de> for KeyEventKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match u8::deserialize(deserializer)? {
            1 => Ok(KeyEventKind::Created),
            2 => Ok(KeyEventKind::Rotated),
            3 => Ok(KeyEventKind::Deactivated),
            other => Err(serde::de::Error::custom(format!("unknown key event tag: {other}"))),
        }
    }
}

/// Lifecycle change notification delivered to watch subscribers.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct KeyEvent {
    #[serde(rename = "type")]
    pub kind: KeyEventKind,
    pub metadata: KeyMetadata,
    pub timestamp: DateTime<Utc>,
}
