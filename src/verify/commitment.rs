//! Commitment Verifier
//!
//! Checks the log operator's signature over a signed tree head and only then
//! exposes the tree size and root hash it commits to.

use p256::ecdsa::signature::Verifier as _;
use p256::ecdsa::{Signature, VerifyingKey};
use p256::pkcs8::DecodePublicKey;
use tracing::debug;

use crate::error::{MonitorError, Result};
use crate::tlog::{LogClient, SignedCommitment};
use crate::verify::log_root::LogRootV1;

/// Log state recovered from a commitment whose signature checked out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedState {
    pub tree_size: u64,
    pub root_hash: Vec<u8>,
    pub timestamp_nanos: u64,
}

impl VerifiedState {
    /// Index of the newest entry, if the log has any
    pub fn last_index(&self) -> Option<u64> {
        self.tree_size.checked_sub(1)
    }
}

/// Verifies commitments against the log key fetched at startup.
#[derive(Debug, Clone)]
pub struct CommitmentVerifier {
    key: VerifyingKey,
}

impl CommitmentVerifier {
    pub fn new(key: VerifyingKey) -> Self {
        Self { key }
    }

    /// Parse a PKIX PEM-encoded P-256 key
    pub fn from_pem(pem: &str) -> Result<Self> {
        let key = VerifyingKey::from_public_key_pem(pem.trim())
            .map_err(|e| MonitorError::ConfigError(format!("Invalid log public key: {}", e)))?;
        Ok(Self { key })
    }

    /// Trust on first use: whatever key the log serves now is used for the process lifetime.
    pub async fn from_log(log: &LogClient) -> Result<Self> {
        let pem = log.get_public_key().await?;
        Self::from_pem(&pem)
    }

    pub fn verify(&self, commitment: &SignedCommitment) -> Result<VerifiedState> {
        if commitment.key_hint.is_empty() {
            return Err(MonitorError::malformed_commitment("missing key hint"));
        }
        if commitment.root_data.is_empty() || commitment.signature.is_empty() {
            return Err(MonitorError::malformed_commitment("missing log root or signature"));
        }

        let signature = Signature::from_der(&commitment.signature)
            .map_err(|e| MonitorError::malformed_commitment(format!("bad signature encoding: {}", e)))?;
        self.key
            .verify(&commitment.root_data, &signature)
            .map_err(|_| {
                MonitorError::VerificationError("signature over log root does not validate".into())
            })?;

        let root = LogRootV1::parse(&commitment.root_data)?;
        debug!("Verified log root: tree_size={} revision={}", root.tree_size, root.revision);

        Ok(VerifiedState {
            tree_size: root.tree_size,
            root_hash: root.root_hash,
            timestamp_nanos: root.timestamp_nanos,
        })
    }

    /// Fetch the current commitment and verify it in one step
    pub async fn fetch_verified(&self, log: &LogClient) -> Result<VerifiedState> {
        let commitment = log.get_log_info().await?;
        self.verify(&commitment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::ecdsa::signature::Signer as _;
    use p256::ecdsa::SigningKey;
    use p256::pkcs8::{EncodePublicKey, LineEnding};
    use rand::rngs::OsRng;

    fn signed(key: &SigningKey, root: &LogRootV1) -> SignedCommitment {
        let root_data = root.encode();
        let signature: Signature = key.sign(&root_data);
        SignedCommitment {
            key_hint: 7u64.to_be_bytes().to_vec(),
            root_data,
            signature: signature.to_der().as_bytes().to_vec(),
        }
    }

    fn root(tree_size: u64) -> LogRootV1 {
        LogRootV1 {
            tree_size,
            root_hash: vec![0xab; 32],
            timestamp_nanos: 1,
            revision: 1,
            metadata: vec![],
        }
    }

    fn verifier_for(key: &SigningKey) -> CommitmentVerifier {
        let pem = key.verifying_key().to_public_key_pem(LineEnding::LF).unwrap();
        CommitmentVerifier::from_pem(&pem).unwrap()
    }

    #[test]
    fn test_valid_commitment_verifies() {
        let key = SigningKey::random(&mut OsRng);
        let state = verifier_for(&key).verify(&signed(&key, &root(55))).unwrap();
        assert_eq!(state.tree_size, 55);
        assert_eq!(state.root_hash, vec![0xab; 32]);
        assert_eq!(state.last_index(), Some(54));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let key = SigningKey::random(&mut OsRng);
        let other = SigningKey::random(&mut OsRng);
        let err = verifier_for(&other).verify(&signed(&key, &root(55))).unwrap_err();
        assert!(matches!(err, MonitorError::VerificationError(_)));
    }

    #[test]
    fn test_tampered_root_rejected() {
        let key = SigningKey::random(&mut OsRng);
        let mut commitment = signed(&key, &root(55));
        commitment.root_data = root(56).encode();
        assert!(verifier_for(&key).verify(&commitment).is_err());
    }

    #[test]
    fn test_malformed_commitments_rejected() {
        let key = SigningKey::random(&mut OsRng);
        let verifier = verifier_for(&key);
        let good = signed(&key, &root(3));

        let mut no_hint = good.clone();
        no_hint.key_hint.clear();
        assert!(verifier.verify(&no_hint).is_err());

        let mut short_sig = good.clone();
        short_sig.signature.truncate(4);
        assert!(verifier.verify(&short_sig).is_err());

        // correctly signed, but not a log root
        let garbage = vec![1u8, 2, 3];
        let signature: Signature = key.sign(&garbage);
        let unparseable = SignedCommitment {
            key_hint: vec![1],
            root_data: garbage,
            signature: signature.to_der().as_bytes().to_vec(),
        };
        assert!(verifier.verify(&unparseable).is_err());
    }

    #[test]
    fn test_empty_log_has_no_last_index() {
        let state = VerifiedState {
            tree_size: 0,
            root_hash: vec![],
            timestamp_nanos: 0,
        };
        assert_eq!(state.last_index(), None);
    }

    #[test]
    fn test_invalid_pem_is_config_error() {
        assert!(matches!(
            CommitmentVerifier::from_pem("not a key"),
            Err(MonitorError::ConfigError(_))
        ));
    }
}
