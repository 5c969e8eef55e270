//! Parsing of received `Signature-Input` values.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::components::SignatureComponents;
use crate::constants::SIGNATURE_LABEL;

static SIGNATURE_INPUT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^sig1=\((?P<list>[^()]*)\)(?P<params>(?:;[^;]*)*)$")
        .expect("valid signature-input regex")
});
static CREATED_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r";created=(?P<created>-?[0-9]+)").expect("valid created regex"));
static KEYID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#";keyid="(?P<keyid>[^"]*)""#).expect("valid keyid regex"));

/// A parsed `sig1=...` signature input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureInput {
    pub components: SignatureComponents,
    pub created: Option<i64>,
    pub key_id: Option<String>,
    /// Everything after `sig1=`, exactly as received.
    pub raw_params: String,
}

/// Parses a `Signature-Input` header value.
///
/// Returns `None` unless the value is a `sig1=` member with a well-formed
/// list of quoted component names. An empty list parses to an empty
/// component list.
#[must_use]
pub fn parse_signature_input(value: &str) -> Option<SignatureInput> {
    let value = value.trim();
    let captures = SIGNATURE_INPUT_PATTERN.captures(value)?;

    let list = captures.name("list").map_or("", |m| m.as_str());
    let params = captures.name("params").map_or("", |m| m.as_str());

    let components: SignatureComponents = list
        .split_whitespace()
        .map(|item| {
            item.strip_prefix('"')
                .and_then(|rest| rest.strip_suffix('"'))
                .filter(|name| !name.is_empty() && !name.contains('"'))
        })
        .collect::<Option<Vec<&str>>>()?
        .into_iter()
        .collect();

    let created = CREATED_PATTERN
        .captures(params)
        .and_then(|c| c.name("created"))
        .and_then(|m| m.as_str().parse().ok());
    let key_id = KEYID_PATTERN
        .captures(params)
        .and_then(|c| c.name("keyid"))
        .map(|m| m.as_str().to_string());

    let raw_params = value
        .strip_prefix(SIGNATURE_LABEL)
        .and_then(|rest| rest.strip_prefix('='))
        .unwrap_or_default()
        .to_string();

    Some(SignatureInput {
        components,
        created,
        key_id,
        raw_params,
    })
}

/// Extracts only the ordered component list from a `Signature-Input` value.
#[must_use]
pub fn parse_components(value: &str) -> Option<SignatureComponents> {
    parse_signature_input(value).map(|input| input.components)
}
