//! Signature base construction.
//!
//! The signature base is the exact string that gets signed. The signer and the
//! verifier both build it here so that identical inputs produce byte-identical
//! output:
//!
//! ```text
//! "@method": post
//! "@target-uri": https://example.com/payments
//! "content-digest": sha-256=:...:
//! "@signature-params": ("@method" "@target-uri" "content-digest");created=1;keyid="k"
//! ```

use std::fmt;

use error_stack::Report;

use crate::components::{Component, SignatureComponents, SignatureParameters};
use crate::constants::{COMPONENT_CONTENT_DIGEST, COMPONENT_SIGNATURE_PARAMS};
use crate::digest::content_digest;
use crate::error::SignatureError;
use crate::request::SignatureRequest;

/// The canonical string covered by a signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureBase(String);

impl SignatureBase {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SignatureBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builds the signature base for `params`.
///
/// # Errors
///
/// Returns [`SignatureError::MissingArgument`] if `@target-uri` is covered but
/// the request URI is not absolute, and [`SignatureError::BodyRead`] if the
/// body is needed and cannot be read.
pub async fn build_signature_base<R>(
    request: &R,
    params: &SignatureParameters,
) -> Result<SignatureBase, Report<SignatureError>>
where
    R: SignatureRequest + ?Sized,
{
    build_signature_base_with_params(request, &params.components, &params.to_string()).await
}

/// Builds the signature base from `components`, closing it with
/// `signature_params` verbatim as the `@signature-params` value.
///
/// The verifier passes the received parameters unmodified so the rebuilt base
/// matches what was signed.
///
/// # Errors
///
/// See [`build_signature_base`].
pub async fn build_signature_base_with_params<R>(
    request: &R,
    components: &SignatureComponents,
    signature_params: &str,
) -> Result<SignatureBase, Report<SignatureError>>
where
    R: SignatureRequest + ?Sized,
{
    let mut lines = Vec::with_capacity(components.len() + 1);

    for component in components.iter() {
        let value = resolve_component(request, component).await?;
        lines.push(format!("\"{}\": {}", component.name(), value));
    }

    lines.push(format!(
        "\"{}\": {}",
        COMPONENT_SIGNATURE_PARAMS, signature_params
    ));

    Ok(SignatureBase(lines.join("\n")))
}

async fn resolve_component<R>(
    request: &R,
    component: &Component,
) -> Result<String, Report<SignatureError>>
where
    R: SignatureRequest + ?Sized,
{
    match component {
        Component::Method => Ok(request.get_method().as_str().to_lowercase()),
        Component::TargetUri => {
            let uri = request.get_target_uri();
            if uri.scheme().is_none() || uri.authority().is_none() {
                return Err(Report::new(SignatureError::MissingArgument {
                    message: format!("Request target URI must be absolute, got: {}", uri),
                }));
            }
            Ok(uri.to_string())
        }
        Component::Field(name) => {
            if let Some(value) = request.get_header_value(name) {
                return Ok(value);
            }

            if name == COMPONENT_CONTENT_DIGEST && request.has_body() {
                let body = request.read_body().await?;
                return Ok(content_digest(&body));
            }

            // Missing headers resolve to empty; validation rejects them
            Ok(String::new())
        }
    }
}
