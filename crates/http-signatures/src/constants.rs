use http::header::HeaderName;

pub const HEADER_SIGNATURE: HeaderName = HeaderName::from_static("signature");
pub const HEADER_SIGNATURE_INPUT: HeaderName = HeaderName::from_static("signature-input");
pub const HEADER_CONTENT_DIGEST: HeaderName = HeaderName::from_static("content-digest");

/// Label of the single signature carried by `Signature` / `Signature-Input`.
pub const SIGNATURE_LABEL: &str = "sig1";

pub const COMPONENT_METHOD: &str = "@method";
pub const COMPONENT_TARGET_URI: &str = "@target-uri";
pub const COMPONENT_SIGNATURE_PARAMS: &str = "@signature-params";
pub const COMPONENT_AUTHORIZATION: &str = "authorization";
pub const COMPONENT_CONTENT_DIGEST: &str = "content-digest";
pub const COMPONENT_CONTENT_LENGTH: &str = "content-length";
pub const COMPONENT_CONTENT_TYPE: &str = "content-type";

pub const DEFAULT_CONTENT_TYPE: &str = "application/json";
