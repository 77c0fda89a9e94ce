use crate::foundation::{Result, VaultError};
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;

/// Size of the AES-256-GCM nonce prepended to every ciphertext.
pub const GCM_NONCE_SIZE: usize = 12;

/// AES-256 key size.
pub const AES_KEY_SIZE: usize = 32;

/// Encrypts plaintext with AES-256-GCM under a 32-byte key.
///
/// Output layout: `nonce (12 bytes) || ciphertext || tag (16 bytes)`.
/// The nonce is drawn fresh from the system CSPRNG; `aad` may be empty.
pub fn encrypt_aes_gcm(key: &[u8], plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|_| VaultError::crypto("aes-gcm init", format!("invalid key length: {} (expected {AES_KEY_SIZE})", key.len())))?;

    let mut nonce_bytes = [0u8; GCM_NONCE_SIZE];
    OsRng
        .try_fill_bytes(&mut nonce_bytes)
        .map_err(|err| VaultError::crypto("nonce generation", err))?;
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, Payload { msg: plaintext, aad })
        .map_err(|err| VaultError::crypto("aes-gcm encrypt", err))?;

    let mut framed = Vec::with_capacity(GCM_NONCE_SIZE + ciphertext.len());
    framed.extend_from_slice(&nonce_bytes);
    framed.extend_from_slice(&ciphertext);
    Ok(framed)
}

/// Decrypts a `nonce || ciphertext || tag` frame produced by [`encrypt_aes_gcm`].
///
/// `aad` must match the value bound at encryption time. Framing and
/// authentication failures are both reported as an invalid ciphertext; they
/// reflect bad caller input, not an internal fault.
pub fn decrypt_aes_gcm(key: &[u8], framed: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|_| VaultError::crypto("aes-gcm init", format!("invalid key length: {} (expected {AES_KEY_SIZE})", key.len())))?;

    if framed.len() < GCM_NONCE_SIZE {
        return Err(VaultError::InvalidCiphertext("ciphertext too short".to_string()));
    }
    let (nonce_bytes, ciphertext) = framed.split_at(GCM_NONCE_SIZE);

    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), Payload { msg: ciphertext, aad })
        .map_err(|_| VaultError::InvalidCiphertext("authentication failed".to_string()))
}

/// Generates a random 256-bit AES key.
pub fn generate_aes_key() -> Result<[u8; AES_KEY_SIZE]> {
    let mut key = [0u8; AES_KEY_SIZE];
    OsRng.try_fill_bytes(&mut key).map_err(|err| VaultError::crypto("key generation", err))?;
    Ok(key)
}
