//! Request abstraction shared by the signer and the verifier.

use async_trait::async_trait;
use bytes::Bytes;
use error_stack::Report;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::{Method, Uri};

use crate::error::SignatureError;

/// The parts of an HTTP request that take part in a signature.
///
/// Header lookups are case-insensitive. Reading the body is the only
/// suspension point of signing and verification; implementations backed by a
/// stream may buffer it here.
#[async_trait]
pub trait SignatureRequest: Send + Sync {
    fn get_method(&self) -> &Method;

    fn get_target_uri(&self) -> &Uri;

    fn get_headers(&self) -> &HeaderMap;

    fn get_headers_mut(&mut self) -> &mut HeaderMap;

    /// Whether the request carries a non-empty body.
    fn has_body(&self) -> bool;

    /// Returns the raw body bytes; empty when there is no body.
    async fn read_body(&self) -> Result<Bytes, Report<SignatureError>>;

    /// Returns every value of `name` joined with `", "`, or `None` if absent.
    fn get_header_value(&self, name: &str) -> Option<String> {
        let name = name.to_ascii_lowercase();
        let mut values = self.get_headers().get_all(name.as_str()).iter().peekable();
        values.peek()?;

        let joined = values
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        Some(joined)
    }

    fn has_header(&self, name: &str) -> bool {
        self.get_headers()
            .contains_key(name.to_ascii_lowercase().as_str())
    }

    fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.get_headers_mut().insert(name, value);
    }
}

#[async_trait]
impl<B> SignatureRequest for http::Request<B>
where
    B: AsRef<[u8]> + Send + Sync,
{
    fn get_method(&self) -> &Method {
        self.method()
    }

    fn get_target_uri(&self) -> &Uri {
        self.uri()
    }

    fn get_headers(&self) -> &HeaderMap {
        self.headers()
    }

    fn get_headers_mut(&mut self) -> &mut HeaderMap {
        self.headers_mut()
    }

    fn has_body(&self) -> bool {
        !self.body().as_ref().is_empty()
    }

    async fn read_body(&self) -> Result<Bytes, Report<SignatureError>> {
        Ok(Bytes::copy_from_slice(self.body().as_ref()))
    }
}
