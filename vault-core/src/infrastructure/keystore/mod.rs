//! Key storage: a mapping from key id to key entry with lifecycle status.
//!
//! The store owns every entry; callers receive cloned snapshots. Concurrent
//! reads are permitted, any mutation excludes all other readers and writers.
//! The store deliberately accepts any status transition; lifecycle
//! monotonicity is a facade rule, which keeps the storage contract simple
//! and lets tests pre-seed arbitrary states.

pub mod memory;
pub mod persistent;

pub use memory::MemoryStore;
pub use persistent::PersistentStore;

use crate::domain::{KeyAlgorithm, KeyMetadata, KeyStatus};
use crate::foundation::{KeyId, Result};
use crate::infrastructure::crypto::EcdsaKeyPair;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// A stored key and its metadata. The private material never leaves the
/// entry except as an opaque handle to the signing provider.
#[derive(Clone, Debug)]
pub struct KeyEntry {
    pub id: KeyId,
    pub algorithm: KeyAlgorithm,
    pub status: KeyStatus,
    pub key_pair: EcdsaKeyPair,
    pub created_at: DateTime<Utc>,
    pub rotated_at: Option<DateTime<Utc>>,
    pub labels: BTreeMap<String, String>,
}

impl KeyEntry {
    /// The observable view of this entry.
    pub fn metadata(&self) -> KeyMetadata {
        KeyMetadata {
            key_id: self.id.clone(),
            algorithm: self.algorithm,
            status: self.status,
            created_at: self.created_at,
            rotated_at: self.rotated_at,
            labels: self.labels.clone(),
        }
    }
}

/// The key storage contract shared by the in-memory and file-backed stores.
pub trait KeyStore: Send + Sync {
    /// Inserts a new entry. Fails if the id is already present.
    fn put(&self, entry: KeyEntry) -> Result<()>;

    /// Returns a snapshot of the entry.
    fn get(&self, id: &KeyId) -> Result<KeyEntry>;

    /// Returns all entries matching `filter`, or every entry when `None`.
    /// Order is unspecified.
    fn list(&self, filter: Option<KeyStatus>) -> Result<Vec<KeyEntry>>;

    /// Mutates the status of an existing entry and returns the updated
    /// snapshot. Transitioning into [`KeyStatus::Rotated`] stamps
    /// `rotated_at` so the transition instant survives persistence.
    fn update_status(&self, id: &KeyId, status: KeyStatus) -> Result<KeyEntry>;

    /// Removes an entry.
    fn delete(&self, id: &KeyId) -> Result<()>;
}
