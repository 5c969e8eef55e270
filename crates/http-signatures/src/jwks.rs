//! JSON Web Key documents for Ed25519 keys.
//!
//! A [`PublicKeyDocument`] is what a client publishes (usually inside a
//! [`JsonWebKeySet`]) so verifiers can check its signatures. Conversions to
//! and from [`jose_jwk::Jwk`] are provided for callers that already hold keys
//! in that form.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE_NO_PAD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use ed25519_dalek::{VerifyingKey, PUBLIC_KEY_LENGTH};
use error_stack::{Report, ResultExt};
use jose_jwk::{
    jose_jwa::{Algorithm, Signing},
    Jwk, Key, Okp, OkpCurves, Parameters,
};
use serde::{Deserialize, Serialize};

use crate::algorithm::SignatureAlgorithm;
use crate::error::SignatureError;
use crate::keys::Keypair;

/// Base64url that accepts both padded and unpadded input.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

fn default_alg() -> String {
    SignatureAlgorithm::Ed25519.jose_algorithm().to_string()
}

/// A JWK describing an Ed25519 key. `d` is only present for private exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyDocument {
    pub kty: String,
    pub crv: String,
    #[serde(default = "default_alg")]
    pub alg: String,
    pub kid: String,
    pub x: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
}

impl PublicKeyDocument {
    /// Decodes `x` into a verifying key.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::InvalidKeyMaterial`] if the document is not an
    /// Ed25519 OKP key or `x` is not a valid 32-byte public key, and
    /// [`SignatureError::InvalidEncoding`] if `x` is not Base64url.
    pub fn verifying_key(&self) -> Result<VerifyingKey, Report<SignatureError>> {
        let algorithm = SignatureAlgorithm::Ed25519;
        if self.kty != algorithm.key_type() || self.crv != algorithm.curve() {
            return Err(Report::new(SignatureError::InvalidKeyMaterial {
                message: format!(
                    "Unsupported key type {}/{} (expected OKP/Ed25519)",
                    self.kty, self.crv
                ),
            }));
        }

        let bytes = URL_SAFE_LENIENT
            .decode(self.x.trim())
            .change_context(SignatureError::InvalidEncoding {
                message: format!("Failed to decode public key for kid: {}", self.kid),
            })?;

        let key_bytes: [u8; PUBLIC_KEY_LENGTH] = bytes.try_into().map_err(|_| {
            Report::new(SignatureError::InvalidKeyMaterial {
                message: "Public key must be 32 bytes".into(),
            })
        })?;

        VerifyingKey::from_bytes(&key_bytes).map_err(|e| {
            Report::new(SignatureError::InvalidKeyMaterial {
                message: format!("Failed to create verifying key: {}", e),
            })
        })
    }

    /// Converts the public part of the document into a [`Jwk`].
    ///
    /// # Errors
    ///
    /// Returns the errors of [`PublicKeyDocument::verifying_key`].
    pub fn to_jwk(&self) -> Result<Jwk, Report<SignatureError>> {
        let verifying_key = self.verifying_key()?;

        let okp = Okp {
            crv: OkpCurves::Ed25519,
            x: verifying_key.as_bytes().to_vec().into(),
            d: None,
        };

        Ok(Jwk {
            key: Key::Okp(okp),
            prm: Parameters {
                kid: Some(self.kid.clone()),
                alg: Some(Algorithm::Signing(Signing::EdDsa)),
                ..Default::default()
            },
        })
    }
}

impl TryFrom<&Jwk> for PublicKeyDocument {
    type Error = Report<SignatureError>;

    fn try_from(jwk: &Jwk) -> Result<Self, Self::Error> {
        let Key::Okp(okp) = &jwk.key else {
            return Err(Report::new(SignatureError::InvalidKeyMaterial {
                message: "Expected OKP key type".into(),
            }));
        };
        if okp.crv != OkpCurves::Ed25519 {
            return Err(Report::new(SignatureError::InvalidKeyMaterial {
                message: "Expected Ed25519 curve".into(),
            }));
        }

        let kid = jwk
            .prm
            .kid
            .clone()
            .filter(|kid| !kid.trim().is_empty())
            .ok_or_else(|| {
                Report::new(SignatureError::InvalidArgument {
                    message: "JWK is missing a key id".into(),
                })
            })?;

        let x: &[u8] = &okp.x;
        let algorithm = SignatureAlgorithm::Ed25519;
        Ok(Self {
            kty: algorithm.key_type().to_string(),
            crv: algorithm.curve().to_string(),
            alg: algorithm.jose_algorithm().to_string(),
            kid,
            x: URL_SAFE_NO_PAD.encode(x),
            d: None,
        })
    }
}

/// The `{"keys": [...]}` document published alongside a client identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonWebKeySet {
    pub keys: Vec<PublicKeyDocument>,
}

impl JsonWebKeySet {
    #[must_use]
    pub fn new(keys: Vec<PublicKeyDocument>) -> Self {
        Self { keys }
    }

    #[must_use]
    pub fn find(&self, kid: &str) -> Option<&PublicKeyDocument> {
        self.keys.iter().find(|key| key.kid == kid)
    }
}

impl Keypair {
    /// Builds the public key document for this keypair.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::InvalidArgument`] if `kid` is blank.
    pub fn to_public_key_document(
        &self,
        kid: &str,
    ) -> Result<PublicKeyDocument, Report<SignatureError>> {
        if kid.trim().is_empty() {
            return Err(Report::new(SignatureError::InvalidArgument {
                message: "keyId cannot be empty".into(),
            }));
        }

        let algorithm = self.algorithm();
        Ok(PublicKeyDocument {
            kty: algorithm.key_type().to_string(),
            crv: algorithm.curve().to_string(),
            alg: algorithm.jose_algorithm().to_string(),
            kid: kid.to_string(),
            x: URL_SAFE_NO_PAD.encode(self.verifying_key.as_bytes()),
            d: None,
        })
    }

    /// Like [`Keypair::to_public_key_document`] but also carries the private
    /// seed as `d`.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::InvalidArgument`] if `kid` is blank.
    pub fn to_private_key_document(
        &self,
        kid: &str,
    ) -> Result<PublicKeyDocument, Report<SignatureError>> {
        let mut document = self.to_public_key_document(kid)?;
        document.d = Some(URL_SAFE_NO_PAD.encode(self.signing_key.as_bytes()));
        Ok(document)
    }
}
