//! `Content-Digest` computation for request bodies.

use base64::{engine::general_purpose, Engine};
use sha2::{Digest, Sha256};

/// Computes the `Content-Digest` value of `body`: `sha-256=:<base64>:`.
#[must_use]
pub fn content_digest(body: &[u8]) -> String {
    let hash = Sha256::digest(body);
    format!("sha-256=:{}:", general_purpose::STANDARD.encode(hash))
}
