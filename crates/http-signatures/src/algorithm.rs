//! Signature algorithms available to the signer and the verifier.

use ed25519_dalek::{Signature, Signer, Verifier, VerifyingKey};

use crate::keys::Keypair;

/// A stateless signature scheme. Every call is parameterized by the algorithm
/// value itself; there is no process-wide crypto handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureAlgorithm {
    #[default]
    Ed25519,
}

impl SignatureAlgorithm {
    /// JOSE `alg` value published in key documents.
    #[must_use]
    pub fn jose_algorithm(self) -> &'static str {
        match self {
            SignatureAlgorithm::Ed25519 => "EdDSA",
        }
    }

    /// JOSE `kty` value published in key documents.
    #[must_use]
    pub fn key_type(self) -> &'static str {
        match self {
            SignatureAlgorithm::Ed25519 => "OKP",
        }
    }

    /// JOSE `crv` value published in key documents.
    #[must_use]
    pub fn curve(self) -> &'static str {
        match self {
            SignatureAlgorithm::Ed25519 => "Ed25519",
        }
    }

    #[must_use]
    pub fn sign(self, keypair: &Keypair, message: &[u8]) -> Vec<u8> {
        match self {
            SignatureAlgorithm::Ed25519 => {
                keypair.signing_key.sign(message).to_bytes().to_vec()
            }
        }
    }

    /// Returns whether `signature` is valid for `message` under `public_key`.
    /// Malformed signatures are reported as `false`.
    #[must_use]
    pub fn verify(self, public_key: &VerifyingKey, message: &[u8], signature: &[u8]) -> bool {
        match self {
            SignatureAlgorithm::Ed25519 => {
                let Ok(signature) = Signature::from_slice(signature) else {
                    log::debug!(
                        "Rejecting signature of {} bytes (expected 64)",
                        signature.len()
                    );
                    return false;
                };
                public_key.verify(message, &signature).is_ok()
            }
        }
    }
}
