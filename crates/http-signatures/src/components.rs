//! Signature components and signature parameters.

use std::fmt;

use crate::constants::{COMPONENT_METHOD, COMPONENT_TARGET_URI, SIGNATURE_LABEL};

/// A single covered component.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Component {
    /// `@method`, the lower-cased request method.
    Method,
    /// `@target-uri`, the absolute request URI.
    TargetUri,
    /// A header field, named as it appears in the component list.
    Field(String),
}

impl Component {
    /// Maps a component identifier to a component. Derived names match
    /// exactly; anything else is a field.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            COMPONENT_METHOD => Component::Method,
            COMPONENT_TARGET_URI => Component::TargetUri,
            other => Component::Field(other.to_string()),
        }
    }

    #[must_use]
    pub fn field(name: &str) -> Self {
        Component::Field(name.to_string())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Component::Method => COMPONENT_METHOD,
            Component::TargetUri => COMPONENT_TARGET_URI,
            Component::Field(name) => name,
        }
    }

    #[must_use]
    pub fn is_derived(&self) -> bool {
        !matches!(self, Component::Field(_))
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered list of covered components. Order is significant and duplicates
/// are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureComponents(Vec<Component>);

impl SignatureComponents {
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, component: Component) {
        self.0.push(component);
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|c| c.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Component> {
        self.0.iter()
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(Component::name).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Component> for SignatureComponents {
    fn from_iter<I: IntoIterator<Item = Component>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<&'a str> for SignatureComponents {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        iter.into_iter().map(Component::parse).collect()
    }
}

/// Serializes as the inner list `("a" "b")`.
impl fmt::Display for SignatureComponents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quoted: Vec<String> = self.0.iter().map(|c| format!("\"{}\"", c)).collect();
        write!(f, "({})", quoted.join(" "))
    }
}

/// Covered components plus the `created` and `keyid` parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureParameters {
    pub components: SignatureComponents,
    /// Unix seconds.
    pub created: i64,
    pub key_id: String,
}

impl SignatureParameters {
    #[must_use]
    pub fn new(components: SignatureComponents, created: i64, key_id: impl Into<String>) -> Self {
        Self {
            components,
            created,
            key_id: key_id.into(),
        }
    }

    /// The full `Signature-Input` header value, `sig1=<params>`.
    #[must_use]
    pub fn to_signature_input(&self) -> String {
        format!("{}={}", SIGNATURE_LABEL, self)
    }
}

/// Serializes as `(<list>);created=<ts>;keyid="<kid>"`, the value of the
/// `@signature-params` line.
impl fmt::Display for SignatureParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{};created={};keyid=\"{}\"",
            self.components, self.created, self.key_id
        )
    }
}
