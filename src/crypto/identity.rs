//! Local signing identity
//!
//! Generated once on first run and persisted alongside the audit history.
//! Never rotated.

use ed25519_dalek::pkcs8::{DecodePublicKey, EncodePublicKey};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey, KEYPAIR_LENGTH};
use p256::pkcs8::LineEnding;
use rand::rngs::OsRng;
use std::fmt;

use crate::error::MonitorError;

#[derive(Clone)]
pub struct Identity {
    signing_key: SigningKey,
    public_key_pem: Vec<u8>,
}

impl Identity {
    /// Generate a fresh Ed25519 keypair
    pub fn generate() -> Result<Self, MonitorError> {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self::from_signing_key(signing_key)
    }

    /// Restore from the 64-byte keypair encoding (secret seed followed by public key)
    pub fn from_keypair_bytes(bytes: &[u8]) -> Result<Self, MonitorError> {
        let bytes: &[u8; KEYPAIR_LENGTH] = bytes.try_into().map_err(|_| {
            MonitorError::CryptoError(format!(
                "private key must be {} bytes, got {}",
                KEYPAIR_LENGTH,
                bytes.len()
            ))
        })?;
        let signing_key = SigningKey::from_keypair_bytes(bytes)
            .map_err(|e| MonitorError::CryptoError(format!("Invalid keypair: {}", e)))?;
        Self::from_signing_key(signing_key)
    }

    fn from_signing_key(signing_key: SigningKey) -> Result<Self, MonitorError> {
        let public_key_pem = signing_key
            .verifying_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| MonitorError::CryptoError(format!("Failed to encode public key: {}", e)))?
            .into_bytes();

        Ok(Self {
            signing_key,
            public_key_pem,
        })
    }

    /// PKIX PEM bytes of the public key
    pub fn public_key(&self) -> &[u8] {
        &self.public_key_pem
    }

    pub fn private_key_bytes(&self) -> [u8; KEYPAIR_LENGTH] {
        self.signing_key.to_keypair_bytes()
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    pub fn sign(&self, payload: &[u8]) -> Vec<u8> {
        self.signing_key.sign(payload).to_bytes().to_vec()
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("public_key", &String::from_utf8_lossy(&self.public_key_pem))
            .finish_non_exhaustive()
    }
}

/// Check a detached signature against a PEM-encoded Ed25519 public key
pub fn verify_signature(public_key_pem: &[u8], payload: &[u8], signature: &[u8]) -> Result<(), MonitorError> {
    let pem = std::str::from_utf8(public_key_pem)
        .map_err(|e| MonitorError::CryptoError(format!("public key is not PEM text: {}", e)))?;
    let key = VerifyingKey::from_public_key_pem(pem)
        .map_err(|e| MonitorError::CryptoError(format!("Invalid public key: {}", e)))?;
    let signature = Signature::from_slice(signature)
        .map_err(|e| MonitorError::CryptoError(format!("Invalid signature: {}", e)))?;
    key.verify(payload, &signature)
        .map_err(|_| MonitorError::CryptoError("signature does not validate".into()))
}
