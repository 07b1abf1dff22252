//! Constructor autowiring.
//!
//! [`Autowire`] is the declaration a type makes instead of being
//! reflected on: its constructor [`Signature`] and how to build itself
//! from resolved [`Arguments`]. `#[derive(Autowire)]` writes both and
//! submits a [`Constructor`] to the global registry, from which the
//! container's [`TypeCatalog`] is built.

use std::any::type_name;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::id::ServiceId;
use crate::signature::Signature;
use crate::value::{Arguments, Service, wrap};

/// A concrete type the container can construct on its own.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use wirebox_container::prelude::*;
///
/// struct Clock;
///
/// struct Scheduler {
///     clock: Arc<Clock>,
/// }
///
/// impl Autowire for Scheduler {
///     fn signature() -> Signature {
///         Signature::new().param(Param::of::<Clock>("clock"))
///     }
///
///     fn construct(args: &Arguments) -> Result<Self> {
///         Ok(Scheduler { clock: args.get(0)? })
///     }
/// }
/// ```
pub trait Autowire: Sized + Send + Sync + 'static {
    /// The constructor's formal parameters.
    fn signature() -> Signature;

    /// Builds an instance from resolved arguments.
    fn construct(args: &Arguments) -> Result<Self>;
}

/// Type-erased constructor of an [`Autowire`] type.
///
/// `const`-constructible so it can be submitted to the registry from a
/// static context.
#[derive(Clone, Copy)]
pub struct Constructor {
    type_name: fn() -> &'static str,
    signature: fn() -> Signature,
    build: fn(&Arguments) -> Result<Service>,
}

impl Constructor {
    pub const fn of<T: Autowire>() -> Self {
        Self {
            type_name: type_name::<T>,
            signature: T::signature,
            build: build_erased::<T>,
        }
    }

    /// The id under which the type is autowired.
    pub fn id(&self) -> ServiceId {
        ServiceId::new((self.type_name)())
    }

    pub fn type_name(&self) -> &'static str {
        (self.type_name)()
    }

    pub fn signature(&self) -> Signature {
        (self.signature)()
    }

    pub fn build(&self, args: &Arguments) -> Result<Service> {
        (self.build)(args)
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Constructor").field(&self.type_name()).finish()
    }
}

fn build_erased<T: Autowire>(args: &Arguments) -> Result<Service> {
    T::construct(args).map(|value| wrap(Arc::new(value)))
}

inventory::collect!(Constructor);

/// The set of types the container may construct without a factory.
#[derive(Debug, Default)]
pub struct TypeCatalog {
    constructors: HashMap<ServiceId, Constructor>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog of every constructor submitted to the global registry.
    pub fn discover() -> Self {
        let mut catalog = Self::new();
        for constructor in inventory::iter::<Constructor> {
            catalog.insert(*constructor);
        }
        debug!(types = catalog.len(), "Discovered autowirable types");
        catalog
    }

    pub fn insert(&mut self, constructor: Constructor) {
        self.constructors.insert(constructor.id(), constructor);
    }

    pub fn get(&self, id: &ServiceId) -> Option<&Constructor> {
        self.constructors.get(id)
    }

    pub fn contains(&self, id: &ServiceId) -> bool {
        self.constructors.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl Extend<Constructor> for TypeCatalog {
    fn extend<I: IntoIterator<Item = Constructor>>(&mut self, iter: I) {
        for constructor in iter {
            self.insert(constructor);
        }
    }
}
