//! Error types for signing, key management and configuration.
//!
//! Signing and key-management operations fail fast with a
//! [`Report<SignatureError>`](error_stack::Report). Verification never surfaces
//! these errors; a malformed or tampered signature is reported as `false`.

use derive_more::{Display, Error};

/// Errors raised by the signer, the key manager and the settings loader.
#[derive(Debug, Display, Error)]
pub enum SignatureError {
    /// A supplied argument is present but unusable (blank key id, blank path).
    #[display("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// A required part of the input is absent.
    #[display("Missing argument: {message}")]
    MissingArgument { message: String },

    /// Input could not be decoded (malformed Base64).
    #[display("Invalid encoding: {message}")]
    InvalidEncoding { message: String },

    /// Ed25519 private key material must be 32 or 64 bytes.
    #[display("Invalid key length: expected 32 or 64 bytes, got {length}")]
    InvalidKeyLength { length: usize },

    /// Key bytes are structurally invalid for Ed25519.
    #[display("Invalid key material: {message}")]
    InvalidKeyMaterial { message: String },

    /// The key file could not be read.
    #[display("Key file not found: {path}")]
    KeyFileNotFound { path: String },

    /// A generated or exported key could not be written.
    #[display("Key persistence error: {message}")]
    KeyPersistence { message: String },

    /// The request body could not be read.
    #[display("Body read error: {message}")]
    BodyRead { message: String },

    /// Settings could not be loaded or failed validation.
    #[display("Configuration error: {message}")]
    Configuration { message: String },
}
