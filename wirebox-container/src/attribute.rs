//! Declarative metadata attached to factories.
//!
//! An [`Attribute`] is a kind plus a small property map. Tags,
//! descriptions and aliases are attributes with well-known kinds, so one
//! index answers "which ids carry X" for all of them.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::id::ServiceId;

/// Attribute kind of tags.
pub const TAG: &str = "tag";
/// Attribute kind of descriptions.
pub const DESCRIPTION: &str = "description";
/// Attribute kind of aliases.
pub const ALIAS: &str = "alias";

/// A property value of an [`Attribute`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// A piece of metadata attached to a factory.
///
/// # Examples
/// ```
/// use wirebox_container::attribute::Attribute;
///
/// let route = Attribute::new("route").with("method", "GET").with("path", "/users");
/// assert_eq!(route.kind(), "route");
/// assert_eq!(route.property("method").and_then(|v| v.as_str()), Some("GET"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    kind: String,
    properties: BTreeMap<String, AttributeValue>,
}

impl Attribute {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Sets a property.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// A tag named `name` with the given ordering priority.
    pub fn tag(name: impl Into<String>, priority: i64) -> Self {
        Self::new(TAG).with("name", name.into()).with("priority", priority)
    }

    pub fn description(text: impl Into<String>) -> Self {
        Self::new(DESCRIPTION).with("text", text.into())
    }

    pub fn alias(name: impl Into<ServiceId>) -> Self {
        let name: ServiceId = name.into();
        Self::new(ALIAS).with("name", name.as_str())
    }

    #[inline]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    #[inline]
    pub fn property(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Views this attribute as a tag, if it is one.
    pub fn as_tag(&self) -> Option<Tag> {
        if self.kind != TAG {
            return None;
        }
        let name = self.property("name")?.as_str()?.to_owned();
        let priority = self.property("priority").and_then(AttributeValue::as_int).unwrap_or(0);
        Some(Tag { name, priority })
    }
}

/// A named, priority-ordered label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub name: String,
    pub priority: i64,
}

/// Selects attributes of one kind whose listed properties are equal.
///
/// Properties not listed in the filter are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeFilter {
    kind: String,
    properties: BTreeMap<String, AttributeValue>,
}

impl AttributeFilter {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Requires `key` to equal `value`.
    pub fn matching(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    #[inline]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn matches(&self, attribute: &Attribute) -> bool {
        attribute.kind == self.kind
            && self
                .properties
                .iter()
                .all(|(key, value)| attribute.properties.get(key) == Some(value))
    }
}
