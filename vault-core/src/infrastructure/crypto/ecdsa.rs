use crate::domain::KeyAlgorithm;
use crate::foundation::{Result, VaultError};
use p256::ecdsa::signature::hazmat::{PrehashVerifier, RandomizedPrehashSigner};
use p256::pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::Zeroizing;

/// An ECDSA private key on one of the supported NIST curves.
///
/// Signatures are ASN.1 DER encodings of (r, s) over SHA-256 of the input
/// for both curves, matching the persisted ciphertext/signature contract.
#[derive(Clone)]
pub enum EcdsaKeyPair {
    P256(p256::ecdsa::SigningKey),
    P384(p384::ecdsa::SigningKey),
}

/// The public half, used for verification and SubjectPublicKeyInfo export.
#[derive(Clone)]
pub enum EcdsaPublicKey {
    P256(p256::ecdsa::VerifyingKey),
    P384(p384::ecdsa::VerifyingKey),
}

impl EcdsaKeyPair {
    /// Generates a fresh key on the given curve from the system CSPRNG.
    pub fn generate(algorithm: KeyAlgorithm) -> Self {
        match algorithm {
            KeyAlgorithm::EcdsaP256 => EcdsaKeyPair::P256(p256::ecdsa::SigningKey::random(&mut OsRng)),
            KeyAlgorithm::EcdsaP384 => EcdsaKeyPair::P384(p384::ecdsa::SigningKey::random(&mut OsRng)),
        }
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            EcdsaKeyPair::P256(_) => KeyAlgorithm::EcdsaP256,
            EcdsaKeyPair::P384(_) => KeyAlgorithm::EcdsaP384,
        }
    }

    pub fn public_key(&self) -> EcdsaPublicKey {
        match self {
            EcdsaKeyPair::P256(key) => EcdsaPublicKey::P256(*key.verifying_key()),
            EcdsaKeyPair::P384(key) => EcdsaPublicKey::P384(*key.verifying_key()),
        }
    }

    /// Signs SHA-256(data) with a randomized nonce, returning the DER signature.
    pub fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        let prehash = Sha256::new_with_prefix(data).finalize();
        match self {
            EcdsaKeyPair::P256(key) => {
                let signature: p256::ecdsa::Signature = key
                    .sign_prehash_with_rng(&mut OsRng, &prehash)
                    .map_err(|err| VaultError::crypto("ecdsa sign", err))?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            EcdsaKeyPair::P384(key) => {
                let signature: p384::ecdsa::Signature = key
                    .sign_prehash_with_rng(&mut OsRng, &prehash)
                    .map_err(|err| VaultError::crypto("ecdsa sign", err))?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
        }
    }

    /// PKCS#8 DER encoding of the private key. The buffer is zeroized on drop.
    pub fn to_pkcs8_der(&self) -> Result<Zeroizing<Vec<u8>>> {
        let document = match self {
            EcdsaKeyPair::P256(key) => key.to_pkcs8_der(),
            EcdsaKeyPair::P384(key) => key.to_pkcs8_der(),
        }
        .map_err(|err| VaultError::crypto("pkcs8 encode", err))?;
        Ok(Zeroizing::new(document.as_bytes().to_vec()))
    }

    /// Decodes a PKCS#8 DER private key, detecting the curve from the encoding.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        if let Ok(key) = p256::ecdsa::SigningKey::from_pkcs8_der(der) {
            return Ok(EcdsaKeyPair::P256(key));
        }
        if let Ok(key) = p384::ecdsa::SigningKey::from_pkcs8_der(der) {
            return Ok(EcdsaKeyPair::P384(key));
        }
        Err(VaultError::crypto("pkcs8 decode", "not an ECDSA P-256 or P-384 private key"))
    }
}

impl fmt::Debug for EcdsaKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EcdsaKeyPair({})", self.algorithm())
    }
}

impl EcdsaPublicKey {
    /// Verifies a DER signature over SHA-256(data). Malformed signatures are
    /// indistinguishable from invalid ones.
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        let prehash = Sha256::new_with_prefix(data).finalize();
        match self {
            EcdsaPublicKey::P256(key) => match p256::ecdsa::Signature::from_der(signature) {
                Ok(sig) => key.verify_prehash(&prehash, &sig).is_ok(),
                Err(_) => false,
            },
            EcdsaPublicKey::P384(key) => match p384::ecdsa::Signature::from_der(signature) {
                Ok(sig) => key.verify_prehash(&prehash, &sig).is_ok(),
                Err(_) => false,
            },
        }
    }

    /// SubjectPublicKeyInfo DER encoding.
    pub fn to_public_key_der(&self) -> Result<Vec<u8>> {
        let document = match self {
            EcdsaPublicKey::P256(key) => key.to_public_key_der(),
            EcdsaPublicKey::P384(key) => key.to_public_key_der(),
        }
        .map_err(|err| VaultError::crypto("spki encode", err))?;
        Ok(document.as_bytes().to_vec())
    }
}

impl fmt::Debug for EcdsaPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let curve = match self {
            EcdsaPublicKey::P256(_) => KeyAlgorithm::EcdsaP256,
            EcdsaPublicKey::P384(_) => KeyAlgorithm::EcdsaP384,
        };
        write!(f, "EcdsaPublicKey({curve})")
    }
}
