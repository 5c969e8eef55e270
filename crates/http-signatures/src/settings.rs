//! Signer configuration.
//!
//! Settings are read from TOML and can be overridden from the environment
//! with the `HTTP_SIGNATURES` prefix and `__` as the section separator, e.g.
//! `HTTP_SIGNATURES__SIGNING__KEY_ID=my-key`.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use error_stack::{Report, ResultExt};
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::error::SignatureError;
use crate::keys::{GenerateKeyOptions, KeySource, Keypair};

pub const ENVIRONMENT_PREFIX: &str = "HTTP_SIGNATURES";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SigningSettings {
    #[validate(custom(function = validate_not_blank))]
    pub key_id: String,
    /// Raw (32/64-byte) or PKCS#8 PEM private key file.
    #[serde(default)]
    pub private_key_path: Option<PathBuf>,
    /// Base64 private key; takes precedence over `private_key_path`.
    #[serde(default)]
    pub private_key: Option<String>,
    /// Where a fallback key is written when `private_key_path` cannot be loaded.
    #[serde(default)]
    #[validate(nested)]
    pub generate: Option<GenerateKeyOptions>,
}

impl SigningSettings {
    /// Resolves the configured key material.
    ///
    /// A Base64 `private_key` is loaded strictly. Otherwise the key file is
    /// loaded, falling back to a freshly generated key (see
    /// [`Keypair::load_or_generate`]).
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Keypair::from_base64`], or
    /// [`SignatureError::KeyPersistence`] if a fallback key cannot be written.
    pub fn load_keypair(&self) -> Result<(Keypair, KeySource), Report<SignatureError>> {
        if let Some(encoded) = &self.private_key {
            let keypair = Keypair::from_base64(encoded)
                .attach("while loading signing.private_key from settings")?;
            return Ok((keypair, KeySource::Inline));
        }

        Keypair::load_or_generate(self.private_key_path.as_deref(), self.generate.as_ref())
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Settings {
    #[validate(nested)]
    pub signing: SigningSettings,
}

impl Settings {
    /// Parses and validates settings from a TOML string, applying
    /// environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::Configuration`] if the TOML is invalid,
    /// required fields are missing or validation fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, Report<SignatureError>> {
        Self::build(File::from_str(toml_str, FileFormat::Toml))
    }

    /// Parses and validates settings from a TOML file.
    ///
    /// # Errors
    ///
    /// See [`Settings::from_toml`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Report<SignatureError>> {
        let path = path.as_ref();
        Self::build(File::from(path).format(FileFormat::Toml))
            .attach(format!("while loading settings from {}", path.display()))
    }

    fn build<S>(source: S) -> Result<Self, Report<SignatureError>>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let environment = Environment::default()
            .prefix(ENVIRONMENT_PREFIX)
            .separator("__");

        let config = Config::builder()
            .add_source(source)
            .add_source(environment)
            .build()
            .change_context(SignatureError::Configuration {
                message: "Failed to build configuration".into(),
            })?;

        let settings: Self =
            config
                .try_deserialize()
                .change_context(SignatureError::Configuration {
                    message: "Failed to deserialize settings".into(),
                })?;

        settings
            .validate()
            .change_context(SignatureError::Configuration {
                message: "Settings validation failed".into(),
            })?;

        Ok(settings)
    }
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose, Engine};

    const KEY_ID_VAR: &str = "HTTP_SIGNATURES__SIGNING__KEY_ID";

    #[test]
    fn test_settings_from_valid_toml() {
        let toml_str = r#"
            [signing]
            key_id = "client-key-1"
            private_key_path = "keys/private.pem"

            [signing.generate]
            dir = "keys"
            filename = "private.pem"
            "#;

        let settings = temp_env::with_var_unset(KEY_ID_VAR, || {
            Settings::from_toml(toml_str).expect("should parse settings")
        });

        assert_eq!(settings.signing.key_id, "client-key-1");
        assert_eq!(
            settings.signing.private_key_path,
            Some(PathBuf::from("keys/private.pem"))
        );
        let generate = settings.signing.generate.expect("should have generate section");
        assert_eq!(generate.dir, PathBuf::from("keys"));
        assert_eq!(generate.filename.as_deref(), Some("private.pem"));
    }

    #[test]
    fn test_settings_missing_key_id() {
        let toml_str = r#"
            [signing]
            private_key_path = "keys/private.pem"
            "#;

        let err = temp_env::with_var_unset(KEY_ID_VAR, || {
            Settings::from_toml(toml_str).expect_err("should fail without key_id")
        });
        assert!(matches!(
            err.current_context(),
            SignatureError::Configuration { .. }
        ));
    }

    #[test]
    fn test_settings_blank_key_id_fails_validation() {
        let toml_str = r#"
            [signing]
            key_id = "   "
            "#;

        let err = temp_env::with_var_unset(KEY_ID_VAR, || {
            Settings::from_toml(toml_str).expect_err("should reject blank key_id")
        });
        assert!(matches!(
            err.current_context(),
            SignatureError::Configuration { .. }
        ));
    }

    #[test]
    fn test_settings_empty_generate_filename_fails_validation() {
        let toml_str = r#"
            [signing]
            key_id = "kid"

            [signing.generate]
            dir = "keys"
            filename = ""
            "#;

        let result = temp_env::with_var_unset(KEY_ID_VAR, || Settings::from_toml(toml_str));
        assert!(result.is_err());
    }

    #[test]
    fn test_settings_empty_toml() {
        let result = temp_env::with_var_unset(KEY_ID_VAR, || Settings::from_toml(""));
        assert!(result.is_err(), "Should fail with empty TOML");
    }

    #[test]
    fn test_settings_empty_toml_with_env_key_id() {
        temp_env::with_var(KEY_ID_VAR, Some("env-only"), || {
            let settings = Settings::from_toml("").expect("env should supply the key id");
            assert_eq!(settings.signing.key_id, "env-only");
        });
    }

    #[test]
    fn test_settings_invalid_toml_syntax() {
        assert!(Settings::from_toml("[signing\nkey_id = ").is_err());
    }

    #[test]
    fn test_settings_environment_override() {
        let toml_str = r#"
            [signing]
            key_id = "from-toml"
            "#;

        temp_env::with_var(KEY_ID_VAR, Some("from-env"), || {
            let settings = Settings::from_toml(toml_str).expect("should parse settings");
            assert_eq!(settings.signing.key_id, "from-env");
        });
    }

    #[test]
    fn test_settings_from_file() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = dir.path().join("signing.toml");
        std::fs::write(&path, "[signing]\nkey_id = \"file-kid\"\n").expect("should write toml");

        let settings = temp_env::with_var_unset(KEY_ID_VAR, || {
            Settings::from_file(&path).expect("should load settings file")
        });
        assert_eq!(settings.signing.key_id, "file-kid");
    }

    #[test]
    fn test_load_keypair_from_base64() {
        let keypair = Keypair::generate();
        let settings = SigningSettings {
            key_id: "inline".into(),
            private_key_path: None,
            private_key: Some(general_purpose::STANDARD.encode(keypair.signing_key.as_bytes())),
            generate: None,
        };

        let (loaded, source) = settings.load_keypair().expect("should load inline key");
        assert_eq!(source, KeySource::Inline);
        assert_eq!(loaded.verifying_key, keypair.verifying_key);
    }

    #[test]
    fn test_load_keypair_rejects_bad_base64() {
        let settings = SigningSettings {
            key_id: "inline".into(),
            private_key_path: None,
            private_key: Some("not base64!".into()),
            generate: None,
        };

        let err = settings.load_keypair().expect_err("should reject bad key");
        assert!(matches!(
            err.current_context(),
            SignatureError::InvalidEncoding { .. }
        ));
    }

    #[test]
    fn test_load_keypair_generates_when_file_missing() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = dir.path().join("signer.pem");
        let settings = SigningSettings {
            key_id: "generated".into(),
            private_key_path: Some(path.clone()),
            private_key: None,
            generate: Some(GenerateKeyOptions::new(dir.path()).with_filename("signer.pem")),
        };

        let (_, source) = settings.load_keypair().expect("should generate key");
        assert_eq!(source, KeySource::Generated(Some(path.clone())));

        let (_, source) = settings.load_keypair().expect("should load generated key");
        assert_eq!(source, KeySource::Loaded(path));
    }
}
