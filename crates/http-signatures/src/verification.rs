//! Verification of signed requests.
//!
//! Verification treats its input as untrusted: a missing, malformed, tampered
//! or unverifiable signature yields `false` and is logged at debug level. No
//! verification path returns an error.
//!
//! When `content-digest` is covered, the received body is hashed and compared
//! with the `Content-Digest` header, so a body changed after signing fails
//! even if the header was left untouched.

use base64::{engine::general_purpose, Engine};

use crate::algorithm::SignatureAlgorithm;
use crate::base::build_signature_base_with_params;
use crate::constants::{
    COMPONENT_CONTENT_DIGEST, HEADER_CONTENT_DIGEST, HEADER_SIGNATURE, HEADER_SIGNATURE_INPUT,
    SIGNATURE_LABEL,
};
use crate::digest::content_digest;
use crate::jwks::{JsonWebKeySet, PublicKeyDocument};
use crate::parser::parse_signature_input;
use crate::request::SignatureRequest;
use crate::validation::validate_components;

/// Whether both `Signature` and `Signature-Input` are present on `request`.
#[must_use]
pub fn headers_present<R>(request: &R) -> bool
where
    R: SignatureRequest + ?Sized,
{
    request.has_header(HEADER_SIGNATURE.as_str())
        && request.has_header(HEADER_SIGNATURE_INPUT.as_str())
}

/// Verifies `signature` / `signature_input` over `request` against `key`.
///
/// The signature base is rebuilt with the received `Signature-Input`
/// parameters replayed verbatim, so any change to the covered content, the
/// component order or the parameters makes verification fail.
pub async fn verify_signature<R>(
    request: &R,
    signature: &str,
    signature_input: &str,
    key: &PublicKeyDocument,
) -> bool
where
    R: SignatureRequest + ?Sized,
{
    let Some(input) = parse_signature_input(signature_input) else {
        log::debug!("Rejecting signature: unparseable signature-input {signature_input:?}");
        return false;
    };

    if !validate_components(&input.components, request) {
        return false;
    }

    if input.components.contains(COMPONENT_CONTENT_DIGEST) && !body_matches_digest(request).await {
        return false;
    }

    let public_key = match key.verifying_key() {
        Ok(public_key) => public_key,
        Err(e) => {
            log::debug!("Rejecting signature: unusable key {}: {:?}", key.kid, e);
            return false;
        }
    };

    let base = match build_signature_base_with_params(request, &input.components, &input.raw_params)
        .await
    {
        Ok(base) => base,
        Err(e) => {
            log::debug!("Rejecting signature: could not rebuild signature base: {:?}", e);
            return false;
        }
    };

    let Some(signature_bytes) = decode_signature(signature) else {
        log::debug!("Rejecting signature: malformed signature value");
        return false;
    };

    let verified = SignatureAlgorithm::Ed25519.verify(&public_key, base.as_bytes(), &signature_bytes);
    if !verified {
        log::debug!(
            "Signature mismatch for {} {} (kid {})",
            request.get_method(),
            request.get_target_uri(),
            key.kid
        );
    }
    verified
}

/// Verifies the signature carried in the request's own headers.
///
/// Returns `false` if either header is absent.
pub async fn verify_request<R>(request: &R, key: &PublicKeyDocument) -> bool
where
    R: SignatureRequest + ?Sized,
{
    let (Some(signature), Some(signature_input)) = signature_headers(request) else {
        log::debug!("Rejecting request: signature headers are missing");
        return false;
    };

    verify_signature(request, &signature, &signature_input, key).await
}

/// Verifies the request's own signature with the key from `jwks` whose `kid`
/// matches the signature-input `keyid`.
pub async fn verify_with_key_set<R>(request: &R, jwks: &JsonWebKeySet) -> bool
where
    R: SignatureRequest + ?Sized,
{
    let (Some(signature), Some(signature_input)) = signature_headers(request) else {
        log::debug!("Rejecting request: signature headers are missing");
        return false;
    };

    let Some(key_id) = parse_signature_input(&signature_input).and_then(|input| input.key_id)
    else {
        log::debug!("Rejecting request: signature-input carries no keyid");
        return false;
    };

    let Some(key) = jwks.find(&key_id) else {
        log::debug!("Rejecting request: no published key for kid {key_id}");
        return false;
    };

    verify_signature(request, &signature, &signature_input, key).await
}

fn signature_headers<R>(request: &R) -> (Option<String>, Option<String>)
where
    R: SignatureRequest + ?Sized,
{
    (
        request.get_header_value(HEADER_SIGNATURE.as_str()),
        request.get_header_value(HEADER_SIGNATURE_INPUT.as_str()),
    )
}

async fn body_matches_digest<R>(request: &R) -> bool
where
    R: SignatureRequest + ?Sized,
{
    let Some(received) = request.get_header_value(HEADER_CONTENT_DIGEST.as_str()) else {
        return false;
    };

    match request.read_body().await {
        Ok(body) if content_digest(&body) == received => true,
        Ok(_) => {
            log::debug!("Rejecting signature: content-digest does not match the body");
            false
        }
        Err(e) => {
            log::debug!("Rejecting signature: could not read body: {:?}", e);
            false
        }
    }
}

/// Decodes `sig1=:<base64>:` into raw signature bytes.
fn decode_signature(value: &str) -> Option<Vec<u8>> {
    let encoded = value
        .trim()
        .strip_prefix(SIGNATURE_LABEL)?
        .strip_prefix('=')?
        .strip_prefix(':')?
        .strip_suffix(':')?;

    general_purpose::STANDARD.decode(encoded).ok()
}
