//! HSM seam: a polymorphic provider over generate/sign/verify so the
//! signing path is agnostic to software vs hardware backing.

use crate::domain::KeyAlgorithm;
use crate::foundation::Result;
use crate::infrastructure::crypto::{EcdsaKeyPair, EcdsaPublicKey};

/// Abstracts hardware security module operations. Real implementations
/// would delegate to PKCS#11 or a cloud KMS.
pub trait HsmProvider: Send + Sync {
    fn generate_key(&self, algorithm: KeyAlgorithm) -> Result<EcdsaKeyPair>;

    fn sign(&self, key: &EcdsaKeyPair, data: &[u8]) -> Result<Vec<u8>>;

    fn verify(&self, public: &EcdsaPublicKey, data: &[u8], signature: &[u8]) -> bool;
}

/// Software-only provider delegating to the in-process primitives.
pub struct SoftwareHsm;

impl SoftwareHsm {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SoftwareHsm {
    fn default() -> Self {
        Self::new()
    }
}

impl HsmProvider for SoftwareHsm {
    fn generate_key(&self, algorithm: KeyAlgorithm) -> Result<EcdsaKeyPair> {
        Ok(EcdsaKeyPair::generate(algorithm))
    }

    fn sign(&self, key: &EcdsaKeyPair, data: &[u8]) -> Result<Vec<u8>> {
        key.sign(data)
    }

    fn verify(&self, public: &EcdsaPublicKey, data: &[u8], signature: &[u8]) -> bool {
        public.verify(data, signature)
    }
}
