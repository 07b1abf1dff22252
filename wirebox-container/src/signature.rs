//! Formal parameter lists.
//!
//! Rust has no runtime reflection, so every callable the container
//! invokes declares its parameters up front as a [`Signature`]. The
//! resolver chain reads these declarations to decide how each position
//! gets filled.

use std::fmt;
use std::sync::Arc;

use crate::attribute::AttributeFilter;
use crate::autowire::{Autowire, Constructor};
use crate::id::ServiceId;
use crate::value::{Service, wrap};

/// Produces a parameter's default value.
pub type DefaultFn = Arc<dyn Fn() -> Service + Send + Sync>;

/// The declared type of a parameter.
#[derive(Clone)]
pub struct TypeRef {
    id: ServiceId,
    constructor: Option<Constructor>,
}

impl TypeRef {
    /// A type known only by name.
    pub fn of<S: ?Sized + 'static>() -> Self {
        Self {
            id: ServiceId::of::<S>(),
            constructor: None,
        }
    }

    /// A type that also knows how to construct itself.
    pub fn constructible<T: Autowire>() -> Self {
        Self {
            id: ServiceId::of::<T>(),
            constructor: Some(Constructor::of::<T>()),
        }
    }

    /// The id type-based lookup asks the container for.
    #[inline]
    pub fn id(&self) -> &ServiceId {
        &self.id
    }

    #[inline]
    pub fn constructor(&self) -> Option<&Constructor> {
        self.constructor.as_ref()
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRef")
            .field("id", &self.id)
            .field("constructible", &self.constructor.is_some())
            .finish()
    }
}

/// How a parameter asks to be resolved, beyond its type.
#[derive(Debug, Clone)]
pub enum Marker {
    /// Resolve this exact id.
    Id(ServiceId),
    /// Resolve every service carrying a matching attribute.
    WithAttr(AttributeFilter),
    /// Resolve every service carrying this tag, by priority.
    Tagged(String),
}

/// One formal parameter.
///
/// # Examples
/// ```
/// use wirebox_container::signature::Param;
///
/// struct Clock;
///
/// let clock = Param::of::<Clock>("clock");
/// let handlers = Param::named("handlers").tagged("http.handler").variadic();
/// assert!(handlers.is_variadic());
/// assert!(clock.declared_type().is_some());
/// ```
#[derive(Clone)]
pub struct Param {
    name: String,
    ty: Option<TypeRef>,
    variadic: bool,
    nullable: bool,
    default: Option<DefaultFn>,
    marker: Option<Marker>,
}

impl Param {
    /// A parameter with no declared type (like a scalar).
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: None,
            variadic: false,
            nullable: false,
            default: None,
            marker: None,
        }
    }

    /// A parameter declared as type `S`.
    pub fn of<S: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self {
            ty: Some(TypeRef::of::<S>()),
            ..Self::named(name)
        }
    }

    /// A parameter declared as `T`, which can be built without registration
    /// when none of its own parameters need dependencies.
    pub fn autowired<T: Autowire>(name: impl Into<String>) -> Self {
        Self {
            ty: Some(TypeRef::constructible::<T>()),
            ..Self::named(name)
        }
    }

    /// Captures every remaining position.
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    /// Resolves to null when nothing else matches.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Falls back to `default` when nothing else matches.
    pub fn with_default<S, F>(mut self, default: F) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<S> + Send + Sync + 'static,
    {
        self.default = Some(Arc::new(move || wrap(default())));
        self
    }

    /// Resolves the service registered under `id`.
    pub fn id(mut self, id: impl Into<ServiceId>) -> Self {
        self.marker = Some(Marker::Id(id.into()));
        self
    }

    /// Resolves all services tagged `tag`.
    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.marker = Some(Marker::Tagged(tag.into()));
        self
    }

    /// Resolves all services with an attribute matching `filter`.
    pub fn with_attr(mut self, filter: AttributeFilter) -> Self {
        self.marker = Some(Marker::WithAttr(filter));
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn declared_type(&self) -> Option<&TypeRef> {
        self.ty.as_ref()
    }

    #[inline]
    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    #[inline]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    #[inline]
    pub fn default_value(&self) -> Option<&DefaultFn> {
        self.default.as_ref()
    }

    #[inline]
    pub fn marker(&self) -> Option<&Marker> {
        self.marker.as_ref()
    }

    /// Whether this parameter can be filled without any dependency.
    pub fn is_optional(&self) -> bool {
        self.nullable || self.variadic || self.default.is_some()
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Param")
            .field("name", &self.name)
            .field("type", &self.ty.as_ref().map(TypeRef::id))
            .field("variadic", &self.variadic)
            .field("nullable", &self.nullable)
            .field("has_default", &self.default.is_some())
            .field("marker", &self.marker)
            .finish()
    }
}

/// An ordered list of formal parameters.
#[derive(Debug, Clone, Default)]
pub struct Signature {
    params: Vec<Param>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parameter.
    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    #[inline]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// `true` when every parameter is individually satisfiable without
    /// resolving anything from the container.
    pub fn has_no_dependencies(&self) -> bool {
        self.params.iter().all(Param::is_optional)
    }
}

impl FromIterator<Param> for Signature {
    fn from_iter<I: IntoIterator<Item = Param>>(iter: I) -> Self {
        Self {
            params: iter.into_iter().collect(),
        }
    }
}
