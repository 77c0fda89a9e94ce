use crate::domain::KeyStatus;
use crate::foundation::{KeyId, Result, VaultError};
use crate::infrastructure::keystore::{KeyEntry, KeyStore};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Thread-safe in-memory key store backed by a read/write lock.
pub struct MemoryStore {
    keys: RwLock<HashMap<KeyId, KeyEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self { keys: RwLock::new(HashMap::new()) }
    }

    fn read_keys(&self) -> Result<RwLockReadGuard<'_, HashMap<KeyId, KeyEntry>>> {
        self.keys.read().map_err(|_| VaultError::storage("keystore", "lock poisoned"))
    }

    fn write_keys(&self) -> Result<RwLockWriteGuard<'_, HashMap<KeyId, KeyEntry>>> {
        self.keys.write().map_err(|_| VaultError::storage("keystore", "lock poisoned"))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyStore for MemoryStore {
    fn put(&self, entry: KeyEntry) -> Result<()> {
        let mut keys = self.write_keys()?;
        if keys.contains_key(&entry.id) {
            return Err(VaultError::KeyAlreadyExists(entry.id.to_string()));
        }
        keys.insert(entry.id.clone(), entry);
        Ok(())
    }

    fn get(&self, id: &KeyId) -> Result<KeyEntry> {
        self.read_keys()?.get(id).cloned().ok_or_else(|| VaultError::key_not_found(id.as_str()))
    }

    fn list(&self, filter: Option<KeyStatus>) -> Result<Vec<KeyEntry>> {
        let keys = self.read_keys()?;
        Ok(keys.values().filter(|entry| filter.map_or(true, |status| entry.status == status)).cloned().collect())
    }

    fn update_status(&self, id: &KeyId, status: KeyStatus) -> Result<KeyEntry> {
        let mut keys = self.write_keys()?;
        let entry = keys.get_mut(id).ok_or_else(|| VaultError::key_not_found(id.as_str()))?;
        entry.status = status;
        if status == KeyStatus::Rotated && entry.rotated_at.is_none() {
            entry.rotated_at = Some(Utc::now());
        }
        Ok(entry.clone())
    }

    fn delete(&self, id: &KeyId) -> Result<()> {
        let mut keys = self.write_keys()?;
        if keys.remove(id).is_none() {
            return Err(VaultError::key_not_found(id.as_str()));
        }
        Ok(())
    }
}
