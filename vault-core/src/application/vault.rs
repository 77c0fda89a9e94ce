//! Operation facade: request-level orchestration over the keystore, the
//! HSM provider, the audit pipeline and the key-event fan-out.

use crate::application::events::KeyEventBus;
use crate::domain::{KeyAlgorithm, KeyEventKind, KeyMetadata, KeyStatus, AUDIT_STATUS_ERROR, AUDIT_STATUS_OK};
use crate::foundation::{KeyId, Result, VaultError};
use crate::infrastructure::audit::AuditLogger;
use crate::infrastructure::crypto::{decrypt_aes_gcm, derive_key, derive_symmetric_key, encrypt_aes_gcm};
use crate::infrastructure::hsm::HsmProvider;
use crate::infrastructure::keystore::{KeyEntry, KeyStore};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use uuid::Uuid;

/// Result of a public key lookup.
#[derive(Clone, Debug)]
pub struct PublicKeyInfo {
    pub key_id: KeyId,
    pub public_key_der: Vec<u8>,
    pub algorithm: KeyAlgorithm,
}

/// Result of a key rotation: the retired entry and its replacement.
#[derive(Clone, Debug)]
pub struct RotationOutcome {
    pub old_key: KeyMetadata,
    pub new_key: KeyMetadata,
}

/// Per-item result of a batch signing request. Exactly one of `signature`
/// and `error` is populated.
#[derive(Clone, Debug, Default)]
pub struct SignOutcome {
    pub signature: Vec<u8>,
    pub error: String,
}

/// The vault facade. Validates requests, consults the keystore, invokes
/// the provider or symmetric primitives, and feeds the audit pipeline and
/// key-event fan-out off the request path.
pub struct Vault {
    store: Arc<dyn KeyStore>,
    hsm: Arc<dyn HsmProvider>,
    audit: Arc<AuditLogger>,
    events: KeyEventBus,
}

impl Vault {
    pub fn new(store: Arc<dyn KeyStore>, hsm: Arc<dyn HsmProvider>, audit: Arc<AuditLogger>) -> Self {
        Self { store, hsm, audit, events: KeyEventBus::new() }
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    pub fn events(&self) -> &KeyEventBus {
        &self.events
    }

    /// Generates a fresh key. Unspecified algorithm defaults to P-256.
    pub fn generate_key(
        &self,
        algorithm: Option<KeyAlgorithm>,
        labels: BTreeMap<String, String>,
        peer: &str,
    ) -> Result<KeyMetadata> {
        let algorithm = algorithm.unwrap_or(KeyAlgorithm::EcdsaP256);
        let key_pair = self.hsm.generate_key(algorithm)?;

        let entry = KeyEntry {
            id: KeyId::new(Uuid::new_v4().to_string()),
            algorithm,
            status: KeyStatus::Active,
            key_pair,
            created_at: Utc::now(),
            rotated_at: None,
            labels,
        };
        let metadata = entry.metadata();
        self.store.put(entry)?;

        self.events.publish(KeyEventKind::Created, metadata.clone());
        self.audit.log("GenerateKey", metadata.key_id.as_str(), AUDIT_STATUS_OK, peer, BTreeMap::new());
        Ok(metadata)
    }

    pub fn get_public_key(&self, key_id: &KeyId) -> Result<PublicKeyInfo> {
        let entry = self.store.get(key_id)?;
        let public_key_der = entry.key_pair.public_key().to_public_key_der()?;
        Ok(PublicKeyInfo { key_id: entry.id, public_key_der, algorithm: entry.algorithm })
    }

    pub fn list_keys(&self, filter: Option<KeyStatus>) -> Result<Vec<KeyMetadata>> {
        let entries = self.store.list(filter)?;
        Ok(entries.iter().map(KeyEntry::metadata).collect())
    }

    /// Retires an active key and inserts a fresh replacement with the same
    /// algorithm and labels.
    pub fn rotate_key(&self, key_id: &KeyId, peer: &str) -> Result<RotationOutcome> {
        let old = self.store.get(key_id)?;
        ensure_active(&old)?;

        let key_pair = self.hsm.generate_key(old.algorithm)?;
        let new_entry = KeyEntry {
            id: KeyId::new(Uuid::new_v4().to_string()),
            algorithm: old.algorithm,
            status: KeyStatus::Active,
            key_pair,
            created_at: Utc::now(),
            rotated_at: None,
            labels: old.labels.clone(),
        };
        let new_key = new_entry.metadata();

        let old_key = self.store.update_status(key_id, KeyStatus::Rotated)?.metadata();
        self.store.put(new_entry)?;

        self.events.publish(KeyEventKind::Rotated, new_key.clone());
        let mut audit_metadata = BTreeMap::new();
        audit_metadata.insert("new_key_id".to_string(), new_key.key_id.to_string());
        self.audit.log("RotateKey", key_id.as_str(), AUDIT_STATUS_OK, peer, audit_metadata);

        Ok(RotationOutcome { old_key, new_key })
    }

    /// Permanently retires a key. The event is published from the snapshot
    /// returned by the status update, never from a second read.
    pub fn deactivate_key(&self, key_id: &KeyId, peer: &str) -> Result<KeyMetadata> {
        let metadata = self.store.update_status(key_id, KeyStatus::Deactivated)?.metadata();
        self.events.publish(KeyEventKind::Deactivated, metadata.clone());
        self.audit.log("DeactivateKey", key_id.as_str(), AUDIT_STATUS_OK, peer, BTreeMap::new());
        Ok(metadata)
    }

    /// Signs data with an active key.
    pub fn sign(&self, key_id: &KeyId, data: &[u8], peer: &str) -> Result<Vec<u8>> {
        let entry = self.store.get(key_id)?;
        ensure_active(&entry)?;

        match self.hsm.sign(&entry.key_pair, data) {
            Ok(signature) => {
                self.audit.log("Sign", key_id.as_str(), AUDIT_STATUS_OK, peer, BTreeMap::new());
                Ok(signature)
            }
            Err(err) => {
                self.audit.log("Sign", key_id.as_str(), AUDIT_STATUS_ERROR, peer, BTreeMap::new());
                Err(err)
            }
        }
    }

    /// Verifies a signature. Permitted for keys in any status so previously
    /// produced material stays auditable.
    pub fn verify(&self, key_id: &KeyId, data: &[u8], signature: &[u8], peer: &str) -> Result<bool> {
        let entry = self.store.get(key_id)?;
        let valid = self.hsm.verify(&entry.key_pair.public_key(), data, signature);
        self.audit.log("Verify", key_id.as_str(), AUDIT_STATUS_OK, peer, BTreeMap::new());
        Ok(valid)
    }

    /// Signs a batch of items concurrently, bounded by the CPU count.
    ///
    /// The key snapshot is captured once before the fan-out; a concurrent
    /// deactivation does not abort in-flight items. Results are returned in
    /// request order; per-item failures populate the error slot and never
    /// fail the batch.
    pub async fn batch_sign(&self, key_id: &KeyId, items: Vec<Vec<u8>>, peer: &str) -> Result<Vec<SignOutcome>> {
        let entry = self.store.get(key_id)?;
        ensure_active(&entry)?;

        let key_pair = Arc::new(entry.key_pair);
        let semaphore = Arc::new(Semaphore::new(num_cpus::get().max(1)));

        let mut handles = Vec::with_capacity(items.len());
        for data in items {
            let semaphore = Arc::clone(&semaphore);
            let hsm = Arc::clone(&self.hsm);
            let key_pair = Arc::clone(&key_pair);
            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                match hsm.sign(&key_pair, &data) {
                    Ok(signature) => SignOutcome { signature, error: String::new() },
                    Err(err) => SignOutcome { signature: Vec::new(), error: err.to_string() },
                }
            }));
        }

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(outcome) => results.push(outcome),
                Err(err) => results.push(SignOutcome { signature: Vec::new(), error: format!("sign task failed: {err}") }),
            }
        }

        self.audit.log("BatchSign", key_id.as_str(), AUDIT_STATUS_OK, peer, BTreeMap::new());
        Ok(results)
    }

    /// Authenticated-encrypts a caller blob under the AES key derived from
    /// the entry's signing key.
    pub fn encrypt(&self, key_id: &KeyId, plaintext: &[u8], aad: &[u8], peer: &str) -> Result<Vec<u8>> {
        let entry = self.store.get(key_id)?;
        ensure_active(&entry)?;

        let symmetric_key = derive_symmetric_key(&entry.key_pair)?;
        match encrypt_aes_gcm(&symmetric_key, plaintext, aad) {
            Ok(ciphertext) => {
                self.audit.log("Encrypt", key_id.as_str(), AUDIT_STATUS_OK, peer, BTreeMap::new());
                Ok(ciphertext)
            }
            Err(err) => {
                self.audit.log("Encrypt", key_id.as_str(), AUDIT_STATUS_ERROR, peer, BTreeMap::new());
                Err(err)
            }
        }
    }

    /// Decrypts a framed ciphertext. Permitted for keys in any status.
    pub fn decrypt(&self, key_id: &KeyId, ciphertext: &[u8], aad: &[u8], peer: &str) -> Result<Vec<u8>> {
        let entry = self.store.get(key_id)?;

        let symmetric_key = derive_symmetric_key(&entry.key_pair)?;
        match decrypt_aes_gcm(&symmetric_key, ciphertext, aad) {
            Ok(plaintext) => {
                self.audit.log("Decrypt", key_id.as_str(), AUDIT_STATUS_OK, peer, BTreeMap::new());
                Ok(plaintext)
            }
            Err(err) => {
                self.audit.log("Decrypt", key_id.as_str(), AUDIT_STATUS_ERROR, peer, BTreeMap::new());
                Err(err)
            }
        }
    }

    /// Derives `length` bytes of application key material from an active
    /// root key.
    pub fn derive_key(&self, root_key_id: &KeyId, context: &[u8], length: usize, peer: &str) -> Result<Vec<u8>> {
        let entry = self.store.get(root_key_id)?;
        ensure_active(&entry)?;

        let root = entry.key_pair.to_pkcs8_der()?;
        let derived = derive_key(&root, context, length)?;
        self.audit.log("DeriveKey", root_key_id.as_str(), AUDIT_STATUS_OK, peer, BTreeMap::new());
        Ok(derived)
    }
}

fn ensure_active(entry: &KeyEntry) -> Result<()> {
    if entry.status != KeyStatus::Active {
        return Err(VaultError::key_not_active(entry.id.as_str(), entry.status.to_string()));
    }
    Ok(())
}
