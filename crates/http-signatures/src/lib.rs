//! Ed25519 HTTP message signatures.
//!
//! Signs outgoing requests and verifies incoming ones using a single
//! `sig1` signature whose covered components are the method, the target URI,
//! the `Authorization` header when present and, for requests with a body,
//! the SHA-256 `Content-Digest` together with `Content-Length` and
//! `Content-Type`.
//!
//! # Modules
//!
//! - [`keys`]: Ed25519 key loading, generation and PEM export
//! - [`jwks`]: JSON Web Key documents for publishing public keys
//! - [`digest`]: `Content-Digest` computation
//! - [`components`]: Covered components and signature parameters
//! - [`base`]: Signature base construction
//! - [`signing`]: Request signing
//! - [`parser`]: `Signature-Input` parsing
//! - [`validation`]: Component list checks against a received request
//! - [`verification`]: Signature verification
//! - [`settings`]: Signer configuration
//! - [`logging`]: Logger setup

pub mod algorithm;
pub mod base;
pub mod components;
pub mod constants;
pub mod digest;
pub mod error;
pub mod jwks;
pub mod keys;
pub mod logging;
pub mod parser;
pub mod request;
pub mod settings;
pub mod signing;
pub mod validation;
pub mod verification;

pub use error::SignatureError;
pub use jwks::{JsonWebKeySet, PublicKeyDocument};
pub use keys::{GenerateKeyOptions, KeySource, Keypair};
pub use request::SignatureRequest;
pub use signing::{sign_request, RequestSigner, SignatureHeaders};
pub use verification::{verify_request, verify_signature, verify_with_key_set};
