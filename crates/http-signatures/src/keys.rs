//! Ed25519 key lifecycle: generation, loading, persistence and export.
//!
//! Private keys are accepted as raw bytes (32-byte seed, or 64 bytes of seed
//! followed by the public key), Base64 text, or a file holding either the raw
//! bytes or a PKCS#8 PEM block. Generated keys are persisted as PKCS#8 PEM.

use std::fs;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose, Engine};
use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
use ed25519_dalek::pkcs8::{DecodePrivateKey, EncodePrivateKey};
use ed25519_dalek::{SigningKey, VerifyingKey, SECRET_KEY_LENGTH};
use error_stack::{Report, ResultExt};
use rand::rngs::OsRng;
use serde::Deserialize;
use validator::Validate;

use crate::algorithm::SignatureAlgorithm;
use crate::error::SignatureError;

const PEM_PREFIX: &[u8] = b"-----BEGIN";

/// An Ed25519 keypair owned by whoever generated or loaded it.
#[derive(Debug, Clone)]
pub struct Keypair {
    pub signing_key: SigningKey,
    pub verifying_key: VerifyingKey,
}

/// Where a generated key is persisted.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenerateKeyOptions {
    pub dir: PathBuf,
    /// Defaults to `private-key-<unix millis>.pem`.
    #[validate(length(min = 1))]
    pub filename: Option<String>,
}

impl GenerateKeyOptions {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            filename: None,
        }
    }

    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    #[must_use]
    pub fn key_path(&self) -> PathBuf {
        let filename = self.filename.clone().unwrap_or_else(|| {
            format!("private-key-{}.pem", chrono::Utc::now().timestamp_millis())
        });
        self.dir.join(filename)
    }
}

/// How [`Keypair::load_or_generate`] obtained its key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    Loaded(PathBuf),
    /// Freshly generated, with the path it was persisted to if any.
    Generated(Option<PathBuf>),
    /// Decoded from Base64 key material held in configuration.
    Inline,
}

impl Keypair {
    #[must_use]
    pub fn generate() -> Self {
        let mut csprng = OsRng;

        let signing_key = SigningKey::generate(&mut csprng);
        Self::from_signing_key(signing_key)
    }

    /// Generates a keypair and writes it as PKCS#8 PEM under `options`.
    ///
    /// Returns the keypair and the path it was written to.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::KeyPersistence`] if the directory cannot be
    /// created or the file cannot be written.
    pub fn generate_to(
        options: &GenerateKeyOptions,
    ) -> Result<(Self, PathBuf), Report<SignatureError>> {
        let keypair = Self::generate();

        fs::create_dir_all(&options.dir).change_context(SignatureError::KeyPersistence {
            message: format!("Failed to create key directory {}", options.dir.display()),
        })?;

        let path = options.key_path();
        keypair.export_pem(&path)?;
        log::info!("Generated new Ed25519 signing key at {}", path.display());

        Ok((keypair, path))
    }

    /// Loads a private key from raw bytes.
    ///
    /// Accepts a 32-byte seed or 64 bytes of seed followed by the public key.
    /// Only the seed is used; the trailing public half is not checked against
    /// the key derived from the seed.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::InvalidKeyLength`] for any other length.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Report<SignatureError>> {
        if bytes.len() != SECRET_KEY_LENGTH && bytes.len() != 2 * SECRET_KEY_LENGTH {
            return Err(Report::new(SignatureError::InvalidKeyLength {
                length: bytes.len(),
            }));
        }

        let mut seed = [0u8; SECRET_KEY_LENGTH];
        seed.copy_from_slice(&bytes[..SECRET_KEY_LENGTH]);

        Ok(Self::from_signing_key(SigningKey::from_bytes(&seed)))
    }

    /// Loads a private key from standard Base64 text.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::InvalidEncoding`] for malformed Base64, then
    /// the errors of [`Keypair::from_bytes`].
    pub fn from_base64(encoded: &str) -> Result<Self, Report<SignatureError>> {
        if encoded.trim().is_empty() {
            return Err(Report::new(SignatureError::InvalidArgument {
                message: "Base64 key cannot be empty".into(),
            }));
        }

        let bytes = general_purpose::STANDARD
            .decode(encoded.trim())
            .change_context(SignatureError::InvalidEncoding {
                message: "Failed to decode base64 key".into(),
            })?;

        Self::from_bytes(&bytes)
    }

    /// Loads a private key file holding raw key bytes or a PKCS#8 PEM block.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::KeyFileNotFound`] if the file cannot be read,
    /// [`SignatureError::InvalidKeyMaterial`] for a malformed PEM block, and
    /// [`SignatureError::InvalidKeyLength`] for raw content of the wrong size.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Report<SignatureError>> {
        let path = path.as_ref();
        let bytes = fs::read(path).change_context(SignatureError::KeyFileNotFound {
            path: path.display().to_string(),
        })?;

        if bytes.trim_ascii_start().starts_with(PEM_PREFIX) {
            return Self::from_pem(&bytes)
                .attach(format!("while loading key file {}", path.display()));
        }

        Self::from_bytes(&bytes).attach(format!("while loading key file {}", path.display()))
    }

    fn from_pem(bytes: &[u8]) -> Result<Self, Report<SignatureError>> {
        let pem = std::str::from_utf8(bytes).change_context(SignatureError::InvalidKeyMaterial {
            message: "PEM key file is not valid UTF-8".into(),
        })?;

        let signing_key = SigningKey::from_pkcs8_pem(pem).map_err(|e| {
            Report::new(SignatureError::InvalidKeyMaterial {
                message: format!("Failed to decode PKCS#8 private key: {}", e),
            })
        })?;

        Ok(Self::from_signing_key(signing_key))
    }

    /// Loads the key at `path`, falling back to a fresh key on any failure.
    ///
    /// The reason a load failed (missing file, wrong length, corrupt PEM) is
    /// logged but not returned; the [`KeySource`] only says which path was
    /// taken. A generated key is persisted when `options` is given.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::KeyPersistence`] if the fallback key cannot be
    /// written.
    pub fn load_or_generate(
        path: Option<&Path>,
        options: Option<&GenerateKeyOptions>,
    ) -> Result<(Self, KeySource), Report<SignatureError>> {
        if let Some(path) = path.filter(|p| !is_blank(p)) {
            match Self::from_file(path) {
                Ok(keypair) => return Ok((keypair, KeySource::Loaded(path.to_path_buf()))),
                Err(e) => log::warn!(
                    "Could not load signing key from {}, generating a new one: {:?}",
                    path.display(),
                    e
                ),
            }
        }

        match options {
            Some(options) => {
                let (keypair, written) = Self::generate_to(options)?;
                Ok((keypair, KeySource::Generated(Some(written))))
            }
            None => Ok((Self::generate(), KeySource::Generated(None))),
        }
    }

    /// Writes the private key to `path` as a PKCS#8 `PRIVATE KEY` PEM block.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::InvalidArgument`] for a blank path and
    /// [`SignatureError::KeyPersistence`] if encoding or writing fails.
    pub fn export_pem(&self, path: impl AsRef<Path>) -> Result<(), Report<SignatureError>> {
        let path = path.as_ref();
        if is_blank(path) {
            return Err(Report::new(SignatureError::InvalidArgument {
                message: "File path is required".into(),
            }));
        }

        let pem = self.to_pem()?;

        fs::write(path, pem.as_bytes()).change_context(SignatureError::KeyPersistence {
            message: format!("Failed to write private key to {}", path.display()),
        })
    }

    /// The private key as a PKCS#8 `PRIVATE KEY` PEM block.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::KeyPersistence`] if encoding fails.
    pub fn to_pem(&self) -> Result<String, Report<SignatureError>> {
        self.signing_key
            .to_pkcs8_pem(LineEnding::LF)
            .map(|pem| pem.to_string())
            .map_err(|e| {
                Report::new(SignatureError::KeyPersistence {
                    message: format!("Failed to encode PKCS#8 private key: {}", e),
                })
            })
    }

    /// Seed followed by the public key, the 64-byte raw key file layout.
    #[must_use]
    pub fn to_keypair_bytes(&self) -> [u8; 64] {
        self.signing_key.to_keypair_bytes()
    }

    #[must_use]
    pub fn algorithm(&self) -> SignatureAlgorithm {
        SignatureAlgorithm::Ed25519
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let verifying_key = signing_key.verifying_key();

        Self {
            signing_key,
            verifying_key,
        }
    }
}

fn is_blank(path: &Path) -> bool {
    path.as_os_str().to_string_lossy().trim().is_empty()
}
