use crate::domain::{KeyAlgorithm, KeyStatus};
use crate::foundation::{KeyId, Result, VaultError};
use crate::infrastructure::crypto::EcdsaKeyPair;
use crate::infrastructure::keystore::{KeyEntry, KeyStore};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// JSON-serializable form of a [`KeyEntry`].
///
/// Field order and encoding are part of the on-disk contract: integer tags
/// for algorithm and status, base64 PKCS#8 DER, RFC-3339 timestamps.
#[derive(Debug, Deserialize, Serialize)]
struct PersistedKey {
    id: String,
    algorithm: KeyAlgorithm,
    status: KeyStatus,
    private_key_der: String,
    created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rotated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    labels: BTreeMap<String, String>,
}

/// Key store persisted to a single JSON file with atomic rename.
///
/// Every successful mutation rewrites the whole store to a sibling `.tmp`
/// file and renames it over the canonical path, all inside the same
/// exclusive critical section as the in-memory mutation. A mutation whose
/// save fails returns the error; memory and disk then disagree until the
/// next successful save or reload.
pub struct PersistentStore {
    keys: RwLock<HashMap<KeyId, KeyEntry>>,
    path: PathBuf,
}

impl PersistentStore {
    /// Opens the store at `path`, loading existing entries if the file is
    /// present. The containing directory is created with mode 0700; the
    /// store file is written with mode 0600.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(dir) = path.parent() {
            create_data_dir(dir)?;
        }

        let mut keys = HashMap::new();
        if path.exists() {
            keys = load_keys(&path)?;
            info!("persistent store loaded keys={}", keys.len());
        }

        Ok(Self { keys: RwLock::new(keys), path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_keys(&self) -> Result<RwLockReadGuard<'_, HashMap<KeyId, KeyEntry>>> {
        self.keys.read().map_err(|_| VaultError::storage("keystore", "lock poisoned"))
    }

    fn write_keys(&self) -> Result<RwLockWriteGuard<'_, HashMap<KeyId, KeyEntry>>> {
        self.keys.write().map_err(|_| VaultError::storage("keystore", "lock poisoned"))
    }

    /// Serializes the full key set to `<path>.tmp` and renames it over the
    /// canonical path. Called with the write lock held so a mutation and
    /// its save never interleave with another mutation.
    fn save_locked(&self, keys: &HashMap<KeyId, KeyEntry>) -> Result<()> {
        let mut records = Vec::with_capacity(keys.len());
        for entry in keys.values() {
            let der = entry
                .key_pair
                .to_pkcs8_der()
                .map_err(|err| VaultError::storage("save", format!("marshal key {}: {err}", entry.id)))?;
            records.push(PersistedKey {
                id: entry.id.to_string(),
                algorithm: entry.algorithm,
                status: entry.status,
                private_key_der: BASE64.encode(der.as_slice()),
                created_at: entry.created_at,
                rotated_at: entry.rotated_at,
                labels: entry.labels.clone(),
            });
        }

        let data = serde_json::to_vec_pretty(&records)?;

        let tmp_path = tmp_path_for(&self.path);
        write_secret_file(&tmp_path, &data)?;
        fs::rename(&tmp_path, &self.path)
            .map_err(|err| VaultError::storage("save", format!("atomic rename: {err}")))?;
        Ok(())
    }
}

impl KeyStore for PersistentStore {
    fn put(&self, entry: KeyEntry) -> Result<()> {
        let mut keys = self.write_keys()?;
        if keys.contains_key(&entry.id) {
            return Err(VaultError::KeyAlreadyExists(entry.id.to_string()));
        }
        keys.insert(entry.id.clone(), entry);
        self.save_locked(&keys)
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
        let snapshot = entry.clone();
        self.save_locked(&keys)?;
        Ok(snapshot)
    }

    fn delete(&self, id: &KeyId) -> Result<()> {
        let mut keys = self.write_keys()?;
        if keys.remove(id).is_none() {
            return Err(VaultError::key_not_found(id.as_str()));
        }
        self.save_locked(&keys)
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".tmp");
    PathBuf::from(os)
}

fn load_keys(path: &Path) -> Result<HashMap<KeyId, KeyEntry>> {
    let data = fs::read(path).map_err(|err| VaultError::storage("load", format!("read file: {err}")))?;
    let records: Vec<PersistedKey> = serde_json::from_slice(&data)?;

    let mut keys = HashMap::with_capacity(records.len());
    for record in records {
        let der = BASE64
            .decode(&record.private_key_der)
            .map_err(|err| VaultError::storage("load", format!("decode key {}: {err}", record.id)))?;
        let key_pair = EcdsaKeyPair::from_pkcs8_der(&der)
            .map_err(|err| VaultError::storage("load", format!("unmarshal key {}: {err}", record.id)))?;
        let id = KeyId::from(record.id);
        keys.insert(
            id.clone(),
            KeyEntry {
                id,
                algorithm: record.algorithm,
                status: record.status,
                key_pair,
                created_at: record.created_at,
                rotated_at: record.rotated_at,
                labels: record.labels,
            },
        );
    }
    Ok(keys)
}

#[cfg(unix)]
fn create_data_dir(dir: &Path) -> Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    if dir.as_os_str().is_empty() || dir.exists() {
        return Ok(());
    }
    fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(dir)
        .map_err(|err| VaultError::storage("open", format!("create data dir: {err}")))
}

#[cfg(not(unix))]
fn create_data_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() || dir.exists() {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|err| VaultError::storage("open", format!("create data dir: {err}")))
}

#[cfg(unix)]
fn write_secret_file(path: &Path, data: &[u8]) -> Result<()> {
    use std::os::unix::fs::OpenOptionsExt;
    let mut file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .map_err(|err| VaultError::storage("save", format!("open temp file: {err}")))?;
    file.write_all(data).map_err(|err| VaultError::storage("save", format!("write temp file: {err}")))?;
    file.sync_all().map_err(|err| VaultError::storage("save", format!("sync temp file: {err}")))?;
    Ok(())
}

#[cfg(not(unix))]
fn write_secret_file(path: &Path, data: &[u8]) -> Result<()> {
    let mut file = fs::File::create(path).map_err(|err| VaultError::storage("save", format!("open temp file: {err}")))?;
    file.write_all(data).map_err(|err| VaultError::storage("save", format!("write temp file: {err}")))?;
    file.sync_all().map_err(|err| VaultError::storage("save", format!("sync temp file: {err}")))?;
    Ok(())
}
