use super::vault_over;
use std::collections::BTreeMap;
use std::sync::Arc;
use vault_core::domain::{KeyAlgorithm, KeyStatus};
use vault_core::foundation::{ErrorCode, KeyId};
use vault_core::infrastructure::keystore::MemoryStore;

const PEER: &str = "127.0.0.1:9000";

#[tokio::test]
async fn generate_sign_verify_roundtrip() {
    let (vault, _audit) = vault_over(Arc::new(MemoryStore::new()));

    let metadata = vault.generate_key(Some(KeyAlgorithm::EcdsaP256), BTreeMap::new(), PEER).expect("generate");
    assert_eq!(metadata.status, KeyStatus::Active);
    assert!(metadata.rotated_at.is_none());

    let signature = vault.sign(&metadata.key_id, b"hello world", PEER).expect("sign");
    assert!(vault.verify(&metadata.key_id, b"hello world", &signature, PEER).expect("verify"));
    assert!(!vault.verify(&metadata.key_id, b"hello worlx", &signature, PEER).expect("verify"));
}

#[tokio::test]
async fn generate_defaults_to_p256_and_keeps_labels() {
    let (vault, _audit) = vault_over(Arc::new(MemoryStore::new()));
    let mut labels = BTreeMap::new();
    labels.insert("team".to_string(), "payments".to_string());

    let metadata = vault.generate_key(None, labels, PEER).expect("generate");
    assert_eq!(metadata.algorithm, KeyAlgorithm::EcdsaP256);
    assert_eq!(metadata.labels.get("team").map(String::as_str), Some("payments"));
}

#[tokio::test]
async fn rotation_retires_the_old_key_and_activates_a_new_one() {
    let (vault, _audit) = vault_over(Arc::new(MemoryStore::new()));
    let mut labels = BTreeMap::new();
    labels.insert("team".to_string(), "payments".to_string());
    let original = vault.generate_key(Some(KeyAlgorithm::EcdsaP384), labels, PEER).expect("generate");

    let outcome = vault.rotate_key(&original.key_id, PEER).expect("rotate");
    assert_ne!(outcome.new_key.key_id, original.key_id);
    assert_eq!(outcome.old_key.status, KeyStatus::Rotated);
    assert!(outcome.old_key.rotated_at.is_some());
    assert_eq!(outcome.new_key.status, KeyStatus::Active);
    assert_eq!(outcome.new_key.algorithm, KeyAlgorithm::EcdsaP384);
    assert_eq!(outcome.new_key.labels, outcome.old_key.labels);

    let err = vault.sign(&original.key_id, b"data", PEER).unwrap_err();
    assert_eq!(err.code(), ErrorCode::KeyNotActive);
    vault.sign(&outcome.new_key.key_id, b"data", PEER).expect("sign with the new key");

    // Rotating a non-active key is a failed precondition.
    let err = vault.rotate_key(&original.key_id, PEER).unwrap_err();
    assert_eq!(err.code(), ErrorCode::KeyNotActive);
}

#[tokio::test]
async fn verification_is_permitted_in_any_status() {
    let (vault, _audit) = vault_over(Arc::new(MemoryStore::new()));
    let metadata = vault.generate_key(None, BTreeMap::new(), PEER).expect("generate");
    let signature = vault.sign(&metadata.key_id, b"archived", PEER).expect("sign");

    vault.deactivate_key(&metadata.key_id, PEER).expect("deactivate");
    assert!(vault.verify(&metadata.key_id, b"archived", &signature, PEER).expect("verify"));
}

#[tokio::test]
async fn deactivation_blocks_signing() {
    let (vault, _audit) = vault_over(Arc::new(MemoryStore::new()));
    let metadata = vault.generate_key(None, BTreeMap::new(), PEER).expect("generate");

    let updated = vault.deactivate_key(&metadata.key_id, PEER).expect("deactivate");
    assert_eq!(updated.status, KeyStatus::Deactivated);

    let err = vault.sign(&metadata.key_id, b"data", PEER).unwrap_err();
    assert_eq!(err.code(), ErrorCode::KeyNotActive);
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let (vault, _audit) = vault_over(Arc::new(MemoryStore::new()));
    let missing = KeyId::from("missing");

    assert_eq!(vault.sign(&missing, b"data", PEER).unwrap_err().code(), ErrorCode::KeyNotFound);
    assert_eq!(vault.get_public_key(&missing).unwrap_err().code(), ErrorCode::KeyNotFound);
    assert_eq!(vault.rotate_key(&missing, PEER).unwrap_err().code(), ErrorCode::KeyNotFound);
    assert_eq!(vault.deactivate_key(&missing, PEER).unwrap_err().code(), ErrorCode::KeyNotFound);
    assert_eq!(vault.decrypt(&missing, b"ct", b"", PEER).unwrap_err().code(), ErrorCode::KeyNotFound);
}

#[tokio::test]
async fn encrypt_decrypt_roundtrip_binds_the_aad() {
    let (vault, _audit) = vault_over(Arc::new(MemoryStore::new()));
    let metadata = vault.generate_key(None, BTreeMap::new(), PEER).expect("generate");

    let ciphertext = vault.encrypt(&metadata.key_id, b"secret", b"context", PEER).expect("encrypt");
    let plaintext = vault.decrypt(&metadata.key_id, &ciphertext, b"context", PEER).expect("decrypt");
    assert_eq!(plaintext, b"secret");

    let err = vault.decrypt(&metadata.key_id, &ciphertext, b"wrong", PEER).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidCiphertext);

    // A different key derives a different AES key; the tag cannot check out.
    let other = vault.generate_key(None, BTreeMap::new(), PEER).expect("generate");
    let err = vault.decrypt(&other.key_id, &ciphertext, b"context", PEER).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidCiphertext);
}

#[tokio::test]
async fn decryption_is_permitted_after_deactivation() {
    let (vault, _audit) = vault_over(Arc::new(MemoryStore::new()));
    let metadata = vault.generate_key(None, BTreeMap::new(), PEER).expect("generate");
    let ciphertext = vault.encrypt(&metadata.key_id, b"secret", b"", PEER).expect("encrypt");

    vault.deactivate_key(&metadata.key_id, PEER).expect("deactivate");
    assert_eq!(vault.decrypt(&metadata.key_id, &ciphertext, b"", PEER).expect("decrypt"), b"secret");

    let err = vault.encrypt(&metadata.key_id, b"secret", b"", PEER).unwrap_err();
    assert_eq!(err.code(), ErrorCode::KeyNotActive);
}

#[tokio::test]
async fn derive_is_deterministic_and_context_separated() {
    let (vault, _audit) = vault_over(Arc::new(MemoryStore::new()));
    let root = vault.generate_key(None, BTreeMap::new(), PEER).expect("generate");

    let first = vault.derive_key(&root.key_id, b"txn-key", 32, PEER).expect("derive");
    assert_eq!(first.len(), 32);
    assert_eq!(first, vault.derive_key(&root.key_id, b"txn-key", 32, PEER).expect("derive"));
    assert_ne!(first, vault.derive_key(&root.key_id, b"other", 32, PEER).expect("derive"));

    assert_eq!(vault.derive_key(&root.key_id, b"ctx", 0, PEER).unwrap_err().code(), ErrorCode::InvalidDerivedLength);
    assert_eq!(vault.derive_key(&root.key_id, b"ctx", 65, PEER).unwrap_err().code(), ErrorCode::InvalidDerivedLength);

    vault.deactivate_key(&root.key_id, PEER).expect("deactivate");
    assert_eq!(vault.derive_key(&root.key_id, b"txn-key", 32, PEER).unwrap_err().code(), ErrorCode::KeyNotActive);
}

#[tokio::test]
async fn batch_sign_preserves_request_order() {
    let (vault, _audit) = vault_over(Arc::new(MemoryStore::new()));
    let metadata = vault.generate_key(None, BTreeMap::new(), PEER).expect("generate");

    let items: Vec<Vec<u8>> = (0..10).map(|i| format!("item-{i}").into_bytes()).collect();
    let results = vault.batch_sign(&metadata.key_id, items.clone(), PEER).await.expect("batch sign");
    assert_eq!(results.len(), items.len());

    for (item, outcome) in items.iter().zip(&results) {
        assert!(outcome.error.is_empty());
        assert!(vault.verify(&metadata.key_id, item, &outcome.signature, PEER).expect("verify"));
    }
}

#[tokio::test]
async fn batch_sign_requires_an_active_key() {
    let (vault, _audit) = vault_over(Arc::new(MemoryStore::new()));
    let metadata = vault.generate_key(None, BTreeMap::new(), PEER).expect("generate");
    vault.deactivate_key(&metadata.key_id, PEER).expect("deactivate");

    let err = vault.batch_sign(&metadata.key_id, vec![b"data".to_vec()], PEER).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::KeyNotActive);
}

#[tokio::test]
async fn batch_sign_of_nothing_is_empty() {
    let (vault, _audit) = vault_over(Arc::new(MemoryStore::new()));
    let metadata = vault.generate_key(None, BTreeMap::new(), PEER).expect("generate");
    let results = vault.batch_sign(&metadata.key_id, Vec::new(), PEER).await.expect("batch sign");
    assert!(results.is_empty());
}

#[tokio::test]
async fn list_keys_filters_by_status() {
    let (vault, _audit) = vault_over(Arc::new(MemoryStore::new()));
    let first = vault.generate_key(None, BTreeMap::new(), PEER).expect("generate");
    let _second = vault.generate_key(None, BTreeMap::new(), PEER).expect("generate");
    vault.rotate_key(&first.key_id, PEER).expect("rotate");

    assert_eq!(vault.list_keys(None).expect("list").len(), 3);
    assert_eq!(vault.list_keys(Some(KeyStatus::Active)).expect("list").len(), 2);
    assert_eq!(vault.list_keys(Some(KeyStatus::Rotated)).expect("list").len(), 1);
}

#[tokio::test]
async fn public_key_export_matches_the_signing_key() {
    let (vault, _audit) = vault_over(Arc::new(MemoryStore::new()));
    let metadata = vault.generate_key(Some(KeyAlgorithm::EcdsaP384), BTreeMap::new(), PEER).expect("generate");

    let info = vault.get_public_key(&metadata.key_id).expect("public key");
    assert_eq!(info.key_id, metadata.key_id);
    assert_eq!(info.algorithm, KeyAlgorithm::EcdsaP384);
    assert!(!info.public_key_der.is_empty());

    // The export stays valid for non-active keys.
    vault.deactivate_key(&metadata.key_id, PEER).expect("deactivate");
    let again = vault.get_public_key(&metadata.key_id).expect("public key");
    assert_eq!(again.public_key_der, info.public_key_der);
}
