//! Service identifiers.
//!
//! [`ServiceId`] names a service within the container. It is an opaque
//! string: either a Rust type name (see [`ServiceId::of`]) or any symbolic
//! name such as `"my-string"`.

use std::any::type_name;
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Uniquely identifies a service in the container.
///
/// Cloning is cheap (the string is shared), so ids are passed around by
/// value freely.
///
/// # Examples
/// ```
/// use wirebox_container::id::ServiceId;
///
/// let by_type = ServiceId::of::<String>();
/// assert_eq!(by_type.as_str(), "alloc::string::String");
///
/// let by_name = ServiceId::new("database_url");
/// assert_eq!(by_name, ServiceId::from("database_url"));
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceId(Arc<str>);

impl ServiceId {
    /// Creates an id from any string.
    #[inline]
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// Creates the id conventionally used for type `T`.
    ///
    /// Type-based parameter lookup and constructor autowiring both use
    /// this id, so a factory registered under `ServiceId::of::<T>()` is
    /// what a parameter declared as `T` receives.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self(Arc::from(type_name::<T>()))
    }

    /// Returns the id as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ServiceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ServiceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ServiceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ServiceId {
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}

impl From<&ServiceId> for ServiceId {
    fn from(id: &ServiceId) -> Self {
        id.clone()
    }
}

impl fmt::Debug for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceId({:?})", &*self.0)
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Mailer;

    #[test]
    fn id_of_type_uses_type_name() {
        let id = ServiceId::of::<Mailer>();
        assert!(id.as_str().ends_with("Mailer"));
    }

    #[test]
    fn ids_compare_by_content() {
        assert_eq!(ServiceId::new("a"), ServiceId::from(String::from("a")));
        assert_ne!(ServiceId::new("a"), ServiceId::new("b"));
    }

    #[test]
    fn map_lookup_by_str() {
        let mut map = HashMap::new();
        map.insert(ServiceId::new("logger"), 1);
        assert_eq!(map.get("logger"), Some(&1));
        assert_eq!(map.get("mailer"), None);
    }

    #[test]
    fn unsized_type_id() {
        trait Greeter {}
        let id = ServiceId::of::<dyn Greeter>();
        assert!(id.as_str().starts_with("dyn "));
    }

    #[test]
    fn debug_and_display() {
        let id = ServiceId::new("cache");
        assert_eq!(format!("{id}"), "cache");
        assert_eq!(format!("{id:?}"), "ServiceId(\"cache\")");
    }
}
