//! Consistency checks between a received component list and the request.

use http::header::{CONTENT_LENGTH, CONTENT_TYPE};

use crate::components::{Component, SignatureComponents};
use crate::constants::{
    COMPONENT_AUTHORIZATION, COMPONENT_CONTENT_DIGEST, COMPONENT_METHOD, COMPONENT_TARGET_URI,
    HEADER_CONTENT_DIGEST,
};
use crate::request::SignatureRequest;

/// Returns whether `components` is acceptable for `request`.
///
/// All of the following must hold:
/// - every component name is already lower-case,
/// - `@method` and `@target-uri` are covered,
/// - `authorization` is covered if the request carries that header,
/// - if `content-digest` is covered, the request has a body and carries
///   `Content-Digest`, `Content-Length` and `Content-Type`.
#[must_use]
pub fn validate_components<R>(components: &SignatureComponents, request: &R) -> bool
where
    R: SignatureRequest + ?Sized,
{
    if let Some(name) = components
        .iter()
        .map(Component::name)
        .find(|name| *name != name.to_lowercase())
    {
        log::debug!("Rejecting signature input: component {name:?} is not lower-case");
        return false;
    }

    if !components.contains(COMPONENT_METHOD) || !components.contains(COMPONENT_TARGET_URI) {
        log::debug!("Rejecting signature input: @method and @target-uri must be covered");
        return false;
    }

    if request.has_header(COMPONENT_AUTHORIZATION) && !components.contains(COMPONENT_AUTHORIZATION)
    {
        log::debug!("Rejecting signature input: authorization header is not covered");
        return false;
    }

    if components.contains(COMPONENT_CONTENT_DIGEST) {
        let headers = request.get_headers();
        let body_bound = request.has_body()
            && headers.contains_key(HEADER_CONTENT_DIGEST)
            && headers.contains_key(CONTENT_LENGTH)
            && headers.contains_key(CONTENT_TYPE);
        if !body_bound {
            log::debug!(
                "Rejecting signature input: content-digest covered without a body and content headers"
            );
            return false;
        }
    }

    true
}
