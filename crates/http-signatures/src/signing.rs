//! Request signing.
//!
//! Signing picks the covered components from the shape of the request, binds
//! the body through `Content-Digest`, and returns the `Signature` /
//! `Signature-Input` header pair. Misuse (blank key id, relative URI) fails
//! fast instead of producing an unsigned request.

use base64::{engine::general_purpose, Engine};
use error_stack::{Report, ResultExt};
use http::header::{HeaderMap, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};

use crate::base::build_signature_base;
use crate::components::{Component, SignatureComponents, SignatureParameters};
use crate::constants::{
    COMPONENT_AUTHORIZATION, COMPONENT_CONTENT_DIGEST, COMPONENT_CONTENT_LENGTH,
    COMPONENT_CONTENT_TYPE, DEFAULT_CONTENT_TYPE, HEADER_CONTENT_DIGEST, HEADER_SIGNATURE,
    HEADER_SIGNATURE_INPUT, SIGNATURE_LABEL,
};
use crate::digest::content_digest;
use crate::error::SignatureError;
use crate::jwks::PublicKeyDocument;
use crate::keys::Keypair;
use crate::request::SignatureRequest;
use crate::settings::SigningSettings;

/// The `Signature` and `Signature-Input` values produced for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeaders {
    /// `sig1=:<base64 signature>:`
    pub signature: String,
    /// `sig1=(<components>);created=<ts>;keyid="<kid>"`
    pub signature_input: String,
}

impl SignatureHeaders {
    /// Inserts both headers into `headers`, replacing previous values.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::InvalidArgument`] if a value is not a valid
    /// header value.
    pub fn apply_to(&self, headers: &mut HeaderMap) -> Result<(), Report<SignatureError>> {
        let signature = HeaderValue::from_str(&self.signature).change_context(
            SignatureError::InvalidArgument {
                message: "Signature is not a valid header value".into(),
            },
        )?;
        let signature_input = HeaderValue::from_str(&self.signature_input).change_context(
            SignatureError::InvalidArgument {
                message: "Signature-Input is not a valid header value".into(),
            },
        )?;

        headers.insert(HEADER_SIGNATURE, signature);
        headers.insert(HEADER_SIGNATURE_INPUT, signature_input);
        Ok(())
    }
}

/// Signs requests with a fixed keypair and key id.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    keypair: Keypair,
    pub kid: String,
}

impl RequestSigner {
    /// # Errors
    ///
    /// Returns [`SignatureError::InvalidArgument`] if `kid` is blank or cannot
    /// be carried in a quoted parameter.
    pub fn new(keypair: Keypair, kid: impl Into<String>) -> Result<Self, Report<SignatureError>> {
        let kid = kid.into();
        validate_key_id(&kid)?;

        Ok(Self { keypair, kid })
    }

    /// Builds a signer from configured key material.
    ///
    /// # Errors
    ///
    /// Returns an error if the key cannot be loaded or the key id is invalid.
    pub fn from_settings(settings: &SigningSettings) -> Result<Self, Report<SignatureError>> {
        let (keypair, source) = settings.load_keypair()?;
        log::info!(
            "Request signer ready for kid {} ({:?})",
            settings.key_id,
            source
        );

        Self::new(keypair, settings.key_id.clone())
    }

    #[must_use]
    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    /// The document verifiers need to check this signer's signatures.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::InvalidArgument`] if the key id is blank.
    pub fn public_key_document(&self) -> Result<PublicKeyDocument, Report<SignatureError>> {
        self.keypair.to_public_key_document(&self.kid)
    }

    /// Signs `request`, injecting body headers as a side effect.
    ///
    /// # Errors
    ///
    /// See [`sign_request`].
    pub async fn sign<R>(&self, request: &mut R) -> Result<SignatureHeaders, Report<SignatureError>>
    where
        R: SignatureRequest + ?Sized,
    {
        sign_request(request, &self.keypair, &self.kid).await
    }

    /// Like [`RequestSigner::sign`] with an explicit `created` timestamp.
    ///
    /// # Errors
    ///
    /// See [`sign_request`].
    pub async fn sign_at<R>(
        &self,
        request: &mut R,
        created: i64,
    ) -> Result<SignatureHeaders, Report<SignatureError>>
    where
        R: SignatureRequest + ?Sized,
    {
        sign_request_at(request, &self.keypair, &self.kid, created).await
    }
}

/// Signs `request` with `keypair`, stamping the current time as `created`.
///
/// Always covers `@method` and `@target-uri`, plus `authorization` when that
/// header is present. A non-empty body adds `content-digest`,
/// `content-length` and `content-type`, and those headers are written into
/// `request` (`Content-Type` defaults to `application/json` only if absent).
///
/// # Errors
///
/// Returns [`SignatureError::InvalidArgument`] for a blank key id,
/// [`SignatureError::MissingArgument`] if the request URI is not absolute and
/// [`SignatureError::BodyRead`] if the body cannot be read. On error no
/// header pair is produced.
pub async fn sign_request<R>(
    request: &mut R,
    keypair: &Keypair,
    key_id: &str,
) -> Result<SignatureHeaders, Report<SignatureError>>
where
    R: SignatureRequest + ?Sized,
{
    let created = chrono::Utc::now().timestamp();
    sign_request_at(request, keypair, key_id, created).await
}

/// [`sign_request`] with an explicit `created` timestamp (Unix seconds).
///
/// # Errors
///
/// See [`sign_request`].
pub async fn sign_request_at<R>(
    request: &mut R,
    keypair: &Keypair,
    key_id: &str,
    created: i64,
) -> Result<SignatureHeaders, Report<SignatureError>>
where
    R: SignatureRequest + ?Sized,
{
    validate_key_id(key_id)?;

    let uri = request.get_target_uri();
    if uri.scheme().is_none() || uri.authority().is_none() {
        return Err(Report::new(SignatureError::MissingArgument {
            message: format!("Request target URI must be absolute, got: {}", uri),
        }));
    }

    let components = select_components(request).await?;
    log::debug!(
        "Signing {} {} covering {}",
        request.get_method(),
        request.get_target_uri(),
        components
    );

    let params = SignatureParameters::new(components, created, key_id);
    let base = build_signature_base(&*request, &params).await?;

    let algorithm = keypair.algorithm();
    let signature = algorithm.sign(keypair, base.as_bytes());

    Ok(SignatureHeaders {
        signature: format!(
            "{}=:{}:",
            SIGNATURE_LABEL,
            general_purpose::STANDARD.encode(signature)
        ),
        signature_input: params.to_signature_input(),
    })
}

async fn select_components<R>(
    request: &mut R,
) -> Result<SignatureComponents, Report<SignatureError>>
where
    R: SignatureRequest + ?Sized,
{
    let mut components: SignatureComponents =
        [Component::Method, Component::TargetUri].into_iter().collect();

    if request.has_header(COMPONENT_AUTHORIZATION) {
        components.push(Component::field(COMPONENT_AUTHORIZATION));
    }

    if request.has_body() {
        let body = request.read_body().await?;
        if !body.is_empty() {
            inject_content_headers(request, &body)?;
            components.push(Component::field(COMPONENT_CONTENT_DIGEST));
            components.push(Component::field(COMPONENT_CONTENT_LENGTH));
            components.push(Component::field(COMPONENT_CONTENT_TYPE));
        }
    }

    Ok(components)
}

fn inject_content_headers<R>(request: &mut R, body: &[u8]) -> Result<(), Report<SignatureError>>
where
    R: SignatureRequest + ?Sized,
{
    let digest = HeaderValue::from_str(&content_digest(body)).change_context(
        SignatureError::InvalidArgument {
            message: "Content-Digest is not a valid header value".into(),
        },
    )?;

    request.set_header(HEADER_CONTENT_DIGEST, digest);
    request.set_header(CONTENT_LENGTH, HeaderValue::from(body.len()));
    if !request.has_header(COMPONENT_CONTENT_TYPE) {
        request.set_header(CONTENT_TYPE, HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    }

    Ok(())
}

fn validate_key_id(key_id: &str) -> Result<(), Report<SignatureError>> {
    if key_id.trim().is_empty() {
        return Err(Report::new(SignatureError::InvalidArgument {
            message: "KeyId cannot be empty".into(),
        }));
    }
    // keyid is carried as a quoted string in an ASCII header value
    let printable = key_id.chars().all(|c| c == ' ' || c.is_ascii_graphic());
    if !printable || key_id.contains('"') {
        return Err(Report::new(SignatureError::InvalidArgument {
            message: format!("KeyId must be printable ASCII without quotes: {key_id:?}"),
        }));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::SignatureAlgorithm;
    use crate::base::build_signature_base_with_params;
    use http::Method;

    fn get_request(uri: &str) -> http::Request<Vec<u8>> {
        http::Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Vec::new())
            .expect("should build request")
    }

    #[tokio::test]
    async fn test_sign_basic_request() {
        let keypair = Keypair::generate();
        let mut req = get_request("https://example.com/resource");

        let headers = sign_request(&mut req, &keypair, "test-key-id")
            .await
            .expect("should sign request");

        assert!(headers.signature.starts_with("sig1=:"));
        assert!(headers.signature.ends_with(':'));
        assert!(headers
            .signature_input
            .starts_with(r#"sig1=("@method" "@target-uri");created="#));
        assert!(headers.signature_input.ends_with(r#";keyid="test-key-id""#));
        assert!(!req.headers().contains_key("content-digest"));
    }

    #[tokio::test]
    async fn test_sign_with_authorization_header() {
        let keypair = Keypair::generate();
        let mut req = http::Request::builder()
            .method(Method::GET)
            .uri("https://example.com/auth")
            .header("Authorization", "GNAP abc123")
            .body(Vec::new())
            .expect("should build request");

        let headers = sign_request(&mut req, &keypair, "auth-key")
            .await
            .expect("should sign request");

        assert!(headers
            .signature_input
            .starts_with(r#"sig1=("@method" "@target-uri" "authorization");"#));
    }

    #[tokio::test]
    async fn test_sign_with_body_injects_content_headers() {
        let keypair = Keypair::generate();
        let body = r#"{"amount":100}"#;
        let mut req = http::Request::builder()
            .method(Method::POST)
            .uri("https://example.com/pay")
            .body(body)
            .expect("should build request");

        let headers = sign_request(&mut req, &keypair, "body-key")
            .await
            .expect("should sign request");

        assert!(headers.signature_input.starts_with(
            r#"sig1=("@method" "@target-uri" "content-digest" "content-length" "content-type");"#
        ));
        assert_eq!(
            req.headers()["content-digest"],
            content_digest(body.as_bytes()).as_str()
        );
        assert_eq!(req.headers()["content-length"], "14");
        assert_eq!(req.headers()["content-type"], "application/json");
    }

    #[tokio::test]
    async fn test_sign_keeps_existing_content_type() {
        let keypair = Keypair::generate();
        let mut req = http::Request::builder()
            .method(Method::POST)
            .uri("https://example.com/pay")
            .header("content-type", "text/plain; charset=utf-8")
            .body("héllo")
            .expect("should build request");

        sign_request(&mut req, &keypair, "body-key")
            .await
            .expect("should sign request");

        assert_eq!(req.headers()["content-type"], "text/plain; charset=utf-8");
        // UTF-8 byte length, not character count
        assert_eq!(req.headers()["content-length"], "6");
    }

    #[tokio::test]
    async fn test_sign_rejects_blank_key_id() {
        let keypair = Keypair::generate();
        for kid in ["", "   "] {
            let mut req = get_request("https://example.com");
            let err = sign_request(&mut req, &keypair, kid)
                .await
                .expect_err("should reject blank kid");
            assert!(matches!(
                err.current_context(),
                SignatureError::InvalidArgument { .. }
            ));
        }
    }

    #[tokio::test]
    async fn test_sign_rejects_unprintable_key_id() {
        let keypair = Keypair::generate();
        for kid in [r#"bad"kid"#, "clé", "tab\tkid", "line\nkid"] {
            let mut req = get_request("https://example.com");
            let err = sign_request(&mut req, &keypair, kid)
                .await
                .expect_err("should reject kid outside printable ASCII");
            assert!(matches!(
                err.current_context(),
                SignatureError::InvalidArgument { .. }
            ));
        }
    }

    #[test]
    fn test_signer_rejects_non_ascii_key_id() {
        assert!(RequestSigner::new(Keypair::generate(), "clé").is_err());
        assert!(RequestSigner::new(Keypair::generate(), "client key-1").is_ok());
    }

    #[tokio::test]
    async fn test_sign_rejects_relative_uri_without_side_effects() {
        let keypair = Keypair::generate();
        let mut req = http::Request::builder()
            .method(Method::POST)
            .uri("/pay")
            .body("{}")
            .expect("should build request");

        let err = sign_request(&mut req, &keypair, "kid")
            .await
            .expect_err("should reject relative uri");
        assert!(matches!(
            err.current_context(),
            SignatureError::MissingArgument { .. }
        ));
        assert!(!req.headers().contains_key("content-digest"));
    }

    #[tokio::test]
    async fn test_signature_covers_rebuilt_base() {
        let keypair = Keypair::generate();
        let mut req = http::Request::builder()
            .method(Method::POST)
            .uri("https://example.com/incoming-payments")
            .header("authorization", "GNAP token")
            .body(r#"{"walletAddress":"https://example.com/alice"}"#)
            .expect("should build request");

        let headers = sign_request_at(&mut req, &keypair, "kid-1", 1_700_000_000)
            .await
            .expect("should sign request");

        let components: SignatureComponents = [
            "@method",
            "@target-uri",
            "authorization",
            "content-digest",
            "content-length",
            "content-type",
        ]
        .into_iter()
        .collect();
        let raw_params = headers
            .signature_input
            .strip_prefix("sig1=")
            .expect("should carry label");
        let base = build_signature_base_with_params(&req, &components, raw_params)
            .await
            .expect("should rebuild base");

        let encoded = headers
            .signature
            .strip_prefix("sig1=:")
            .and_then(|s| s.strip_suffix(':'))
            .expect("should be wrapped in colons");
        let signature = general_purpose::STANDARD
            .decode(encoded)
            .expect("should be base64");

        assert_eq!(signature.len(), 64);
        assert!(SignatureAlgorithm::Ed25519.verify(
            &keypair.verifying_key,
            base.as_bytes(),
            &signature
        ));
    }

    #[tokio::test]
    async fn test_request_signer_sign_at_is_deterministic() {
        let signer =
            RequestSigner::new(Keypair::generate(), "fixed-kid").expect("should create signer");
        let mut first = get_request("https://example.com/a");
        let mut second = get_request("https://example.com/a");

        let a = signer.sign_at(&mut first, 1).await.expect("should sign");
        let b = signer.sign_at(&mut second, 1).await.expect("should sign");

        // Ed25519 signatures are deterministic
        assert_eq!(a, b);
    }

    #[test]
    fn test_request_signer_rejects_blank_kid() {
        let err = RequestSigner::new(Keypair::generate(), " ").expect_err("should reject kid");
        assert!(matches!(
            err.current_context(),
            SignatureError::InvalidArgument { .. }
        ));
    }

    #[test]
    fn test_request_signer_public_key_document() {
        let signer =
            RequestSigner::new(Keypair::generate(), "doc-kid").expect("should create signer");
        let document = signer
            .public_key_document()
            .expect("should build document");

        assert_eq!(document.kid, "doc-kid");
        assert_eq!(
            document.verifying_key().expect("should decode key"),
            signer.keypair().verifying_key
        );
    }

    #[test]
    fn test_apply_signature_headers() {
        let headers = SignatureHeaders {
            signature: "sig1=:abc=:".into(),
            signature_input: r#"sig1=("@method");created=1;keyid="k""#.into(),
        };
        let mut map = HeaderMap::new();

        headers.apply_to(&mut map).expect("should apply headers");

        assert_eq!(map["signature"], "sig1=:abc=:");
        assert_eq!(map["signature-input"], r#"sig1=("@method");created=1;keyid="k""#);
    }
}
