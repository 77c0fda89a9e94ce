//! Cryptographic primitives: ECDSA over the NIST curves, AES-256-GCM with
//! prepended nonce, and HKDF-SHA256 derivation.

pub mod aead;
pub mod ecdsa;
pub mod kdf;

pub use aead::{decrypt_aes_gcm, encrypt_aes_gcm, generate_aes_key, AES_KEY_SIZE, GCM_NONCE_SIZE};
pub use ecdsa::{EcdsaKeyPair, EcdsaPublicKey};
pub use kdf::{derive_key, derive_symmetric_key, MAX_DERIVED_LENGTH, SYMMETRIC_KEY_CONTEXT};
