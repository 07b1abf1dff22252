//! Type-erased service values and resolved argument lists.
//!
//! A [`Service`] always carries an `Arc<S>` for the service's type `S`.
//! `S` may be unsized (`dyn Trait`), which is why the payload is an `Arc`
//! inside the erasing `Arc`: downcasting yields the original `Arc<S>` and
//! therefore preserves pointer identity.

use std::any::{Any, type_name};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Result, WireError};

/// A type-erased service instance as stored in the cache.
pub type Service = Arc<dyn Any + Send + Sync>;

/// Erases a typed service.
#[inline]
pub fn wrap<S: ?Sized + Send + Sync + 'static>(value: Arc<S>) -> Service {
    Arc::new(value)
}

/// Recovers a typed service, or `None` if `service` holds another type.
#[inline]
pub fn unwrap<S: ?Sized + Send + Sync + 'static>(service: &Service) -> Option<Arc<S>> {
    (**service).downcast_ref::<Arc<S>>().cloned()
}

/// A sequence-valued service.
///
/// A parameter marked with an explicit id and declared variadic expects
/// the target service to be a `ServiceList`; each element then fills the
/// next position.
#[derive(Clone, Default)]
pub struct ServiceList(Vec<Service>);

impl ServiceList {
    /// Builds a list from typed elements.
    pub fn of<S, I>(items: I) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: IntoIterator<Item = Arc<S>>,
    {
        Self(items.into_iter().map(wrap).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Service> {
        self.0.iter()
    }
}

impl From<Vec<Service>> for ServiceList {
    fn from(items: Vec<Service>) -> Self {
        Self(items)
    }
}

impl fmt::Debug for ServiceList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceList").field("len", &self.0.len()).finish()
    }
}

/// One resolved positional argument.
#[derive(Clone)]
pub enum Argument {
    /// A resolved service.
    Value(Service),
    /// A nullable parameter that nothing resolved.
    Null,
}

/// Positional arguments produced by the parameter resolver chain.
///
/// Indices may run past the declared parameters when a variadic
/// parameter captured several values.
#[derive(Clone, Default)]
pub struct Arguments {
    values: BTreeMap<usize, Argument>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `position` has been filled (possibly with null).
    #[inline]
    pub fn contains(&self, position: usize) -> bool {
        self.values.contains_key(&position)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Filled positions in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Argument)> {
        self.values.iter().map(|(position, argument)| (*position, argument))
    }

    /// Fills `position` unless an earlier strategy already did.
    ///
    /// Returns whether the value was taken.
    pub fn fill(&mut self, position: usize, argument: Argument) -> bool {
        if self.values.contains_key(&position) {
            return false;
        }
        self.values.insert(position, argument);
        true
    }

    /// Fills successive positions starting at `start`.
    pub fn spread(&mut self, start: usize, values: impl IntoIterator<Item = Service>) {
        for (offset, value) in values.into_iter().enumerate() {
            self.fill(start + offset, Argument::Value(value));
        }
    }

    /// The erased value at `position`, if one is present and not null.
    pub fn raw(&self, position: usize) -> Option<&Service> {
        match self.values.get(&position) {
            Some(Argument::Value(value)) => Some(value),
            _ => None,
        }
    }

    /// Reads a required argument.
    pub fn get<S: ?Sized + Send + Sync + 'static>(&self, position: usize) -> Result<Arc<S>> {
        match self.values.get(&position) {
            Some(Argument::Value(value)) => downcast(position, value),
            Some(Argument::Null) => Err(WireError::Argument {
                position,
                reason: format!("expected {} but the parameter resolved to null", type_name::<S>()),
            }),
            None => Err(WireError::Argument {
                position,
                reason: format!("expected {} but nothing was resolved", type_name::<S>()),
            }),
        }
    }

    /// Reads a nullable argument.
    pub fn optional<S: ?Sized + Send + Sync + 'static>(
        &self,
        position: usize,
    ) -> Result<Option<Arc<S>>> {
        match self.values.get(&position) {
            Some(Argument::Value(value)) => downcast(position, value).map(Some),
            Some(Argument::Null) | None => Ok(None),
        }
    }

    /// Reads every argument from `start` on, as a variadic parameter sees them.
    pub fn variadic<S: ?Sized + Send + Sync + 'static>(&self, start: usize) -> Result<Vec<Arc<S>>> {
        self.values
            .range(start..)
            .filter_map(|(position, argument)| match argument {
                Argument::Value(value) => Some(downcast(*position, value)),
                Argument::Null => None,
            })
            .collect()
    }

    /// The value being decorated, for extension steps.
    #[inline]
    pub fn previous<S: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<S>> {
        self.get(0)
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filled: Vec<_> = self
            .values
            .iter()
            .map(|(position, argument)| match argument {
                Argument::Value(_) => format!("#{position}"),
                Argument::Null => format!("#{position}=null"),
            })
            .collect();
        f.debug_struct("Arguments").field("filled", &filled).finish()
    }
}

fn downcast<S: ?Sized + Send + Sync + 'static>(position: usize, value: &Service) -> Result<Arc<S>> {
    unwrap::<S>(value).ok_or_else(|| WireError::Argument {
        position,
        reason: format!("resolved value is not a {}", type_name::<S>()),
    })
}
