use vault_core::domain::KeyAlgorithm;
use vault_core::foundation::ErrorCode;
use vault_core::infrastructure::crypto::{
    decrypt_aes_gcm, derive_key, derive_symmetric_key, encrypt_aes_gcm, generate_aes_key, EcdsaKeyPair,
    AES_KEY_SIZE, GCM_NONCE_SIZE, MAX_DERIVED_LENGTH,
};

#[test]
fn sign_verify_roundtrip_on_both_curves() {
    for algorithm in [KeyAlgorithm::EcdsaP256, KeyAlgorithm::EcdsaP384] {
        let key = EcdsaKeyPair::generate(algorithm);
        assert_eq!(key.algorithm(), algorithm);

        let signature = key.sign(b"hello world").expect("sign");
        assert!(key.public_key().verify(b"hello world", &signature));
    }
}

#[test]
fn verify_rejects_tampered_data_and_foreign_keys() {
    let key = EcdsaKeyPair::generate(KeyAlgorithm::EcdsaP256);
    let other = EcdsaKeyPair::generate(KeyAlgorithm::EcdsaP256);

    let signature = key.sign(b"hello world").expect("sign");
    assert!(!key.public_key().verify(b"hello worlx", &signature));
    assert!(!other.public_key().verify(b"hello world", &signature));
}

#[test]
fn verify_rejects_malformed_signatures() {
    let key = EcdsaKeyPair::generate(KeyAlgorithm::EcdsaP384);
    assert!(!key.public_key().verify(b"data", b"not a der signature"));
    assert!(!key.public_key().verify(b"data", &[]));
}

#[test]
fn pkcs8_roundtrip_preserves_the_key() {
    for algorithm in [KeyAlgorithm::EcdsaP256, KeyAlgorithm::EcdsaP384] {
        let key = EcdsaKeyPair::generate(algorithm);
        let der = key.to_pkcs8_der().expect("pkcs8 encode");

        let restored = EcdsaKeyPair::from_pkcs8_der(&der).expect("pkcs8 decode");
        assert_eq!(restored.algorithm(), algorithm);

        let signature = restored.sign(b"payload").expect("sign");
        assert!(key.public_key().verify(b"payload", &signature));

        let original_spki = key.public_key().to_public_key_der().expect("spki");
        let restored_spki = restored.public_key().to_public_key_der().expect("spki");
        assert_eq!(original_spki, restored_spki);
    }
}

#[test]
fn pkcs8_decode_rejects_garbage() {
    let err = EcdsaKeyPair::from_pkcs8_der(b"garbage").unwrap_err();
    assert_eq!(err.code(), ErrorCode::CryptoError);
}

#[test]
fn aes_gcm_roundtrip_with_aad() {
    let key = generate_aes_key().expect("key");
    let framed = encrypt_aes_gcm(&key, b"secret", b"context").expect("encrypt");
    assert!(framed.len() > GCM_NONCE_SIZE + b"secret".len());

    let plaintext = decrypt_aes_gcm(&key, &framed, b"context").expect("decrypt");
    assert_eq!(plaintext, b"secret");
}

#[test]
fn aes_gcm_rejects_wrong_aad_and_wrong_key() {
    let key = generate_aes_key().expect("key");
    let framed = encrypt_aes_gcm(&key, b"secret", b"context").expect("encrypt");

    let err = decrypt_aes_gcm(&key, &framed, b"wrong").unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidCiphertext);

    let other_key = generate_aes_key().expect("key");
    let err = decrypt_aes_gcm(&other_key, &framed, b"context").unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidCiphertext);
}

#[test]
fn aes_gcm_rejects_short_framing() {
    let key = generate_aes_key().expect("key");
    let err = decrypt_aes_gcm(&key, &[0u8; GCM_NONCE_SIZE - 1], b"").unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidCiphertext);
}

#[test]
fn aes_gcm_nonces_are_unique() {
    let key = generate_aes_key().expect("key");
    let first = encrypt_aes_gcm(&key, b"same input", b"same aad").expect("encrypt");
    let second = encrypt_aes_gcm(&key, b"same input", b"same aad").expect("encrypt");
    assert_ne!(first, second);
}

#[test]
fn aes_gcm_accepts_empty_aad() {
    let key = generate_aes_key().expect("key");
    let framed = encrypt_aes_gcm(&key, b"secret", b"").expect("encrypt");
    assert_eq!(decrypt_aes_gcm(&key, &framed, b"").expect("decrypt"), b"secret");
}

#[test]
fn aes_gcm_rejects_bad_key_length() {
    let err = encrypt_aes_gcm(&[0u8; 16], b"secret", b"").unwrap_err();
    assert_eq!(err.code(), ErrorCode::CryptoError);
}

#[test]
fn generated_aes_keys_differ() {
    let first = generate_aes_key().expect("key");
    let second = generate_aes_key().expect("key");
    assert_eq!(first.len(), AES_KEY_SIZE);
    assert_ne!(first, second);
}

#[test]
fn hkdf_is_deterministic_and_context_separated() {
    let root = b"root key material";
    let first = derive_key(root, b"txn-key", 32).expect("derive");
    let second = derive_key(root, b"txn-key", 32).expect("derive");
    assert_eq!(first, second);
    assert_eq!(first.len(), 32);

    let other = derive_key(root, b"other", 32).expect("derive");
    assert_ne!(first, other);
}

#[test]
fn hkdf_enforces_length_bounds() {
    let root = b"root";
    assert_eq!(derive_key(root, b"ctx", 0).unwrap_err().code(), ErrorCode::InvalidDerivedLength);
    assert_eq!(derive_key(root, b"ctx", MAX_DERIVED_LENGTH + 1).unwrap_err().code(), ErrorCode::InvalidDerivedLength);
    assert_eq!(derive_key(root, b"ctx", 1).expect("derive").len(), 1);
    assert_eq!(derive_key(root, b"ctx", MAX_DERIVED_LENGTH).expect("derive").len(), MAX_DERIVED_LENGTH);
}

#[test]
fn symmetric_key_is_stable_per_signing_key() {
    let key = EcdsaKeyPair::generate(KeyAlgorithm::EcdsaP256);
    let first = derive_symmetric_key(&key).expect("derive");
    let second = derive_symmetric_key(&key).expect("derive");
    assert_eq!(first, second);

    let other = EcdsaKeyPair::generate(KeyAlgorithm::EcdsaP256);
    assert_ne!(first, derive_symmetric_key(&other).expect("derive"));
}
