use crate::foundation::{Result, VaultError};
use crate::infrastructure::crypto::aead::AES_KEY_SIZE;
use crate::infrastructure::crypto::ecdsa::EcdsaKeyPair;
use hkdf::Hkdf;
use sha2::Sha256;

/// Upper bound on a derived key, in bytes.
pub const MAX_DERIVED_LENGTH: usize = 64;

/// HKDF info label binding symmetric keys to their signing key.
pub const SYMMETRIC_KEY_CONTEXT: &[u8] = b"vault-aes-gcm";

/// Derives `length` bytes from `root` with HKDF-SHA256, empty salt, and
/// `context` as the info parameter. Deterministic for fixed inputs.
pub fn derive_key(root: &[u8], context: &[u8], length: usize) -> Result<Vec<u8>> {
    if length == 0 || length > MAX_DERIVED_LENGTH {
        return Err(VaultError::InvalidDerivedLength { length });
    }
    let hk = Hkdf::<Sha256>::new(None, root);
    let mut derived = vec![0u8; length];
    hk.expand(context, &mut derived).map_err(|err| VaultError::crypto("hkdf expand", err))?;
    Ok(derived)
}

/// Derives the AES-256 key used to encrypt and decrypt under a signing key.
///
/// The construction is part of the interoperable ciphertext contract and
/// must be bit-identical across implementations:
///
/// ```text
/// aes_key = HKDF-SHA256(ikm = PKCS#8(private_key), salt = empty,
///                       info = "vault-aes-gcm", length = 32)
/// ```
///
/// The input keying material is the PKCS#8 DER serialization of the private
/// key, not a bare encoding of the scalar. This ties symmetric
/// confidentiality to the secrecy of the signing key so that a single root
/// of trust covers both operations.
pub fn derive_symmetric_key(key_pair: &EcdsaKeyPair) -> Result<[u8; AES_KEY_SIZE]> {
    let root = key_pair.to_pkcs8_der()?;
    let derived = derive_key(&root, SYMMETRIC_KEY_CONTEXT, AES_KEY_SIZE)?;
    let mut key = [0u8; AES_KEY_SIZE];
    key.copy_from_slice(&derived);
    Ok(key)
}
