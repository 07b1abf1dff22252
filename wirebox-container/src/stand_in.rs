//! Forwarding stand-ins for services caught in a dependency cycle.
//!
//! When `A` needs `B` and `B` needs `A`, `B` receives a `StandIn` of `A`
//! instead of a second, recursive construction of `A`. The stand-in
//! resolves the real `A` the first time it is used and forwards every call
//! to it from then on.
//!
//! Forwarding needs an implementation of the service's trait for the
//! stand-in, so only trait-object services can be stood in for. The
//! `#[forward]` attribute writes that implementation.

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::{Result, WireError};
use crate::id::ServiceId;
use crate::value::{Service, unwrap};

type Resolve = Box<dyn Fn() -> Result<Service> + Send + Sync>;

/// A lazily bound placeholder for the service registered under an id.
pub struct StandIn<S: ?Sized> {
    id: ServiceId,
    resolve: Resolve,
    target: OnceCell<Arc<S>>,
}

impl<S: ?Sized + Send + Sync + 'static> StandIn<S> {
    pub fn new(id: ServiceId, resolve: impl Fn() -> Result<Service> + Send + Sync + 'static) -> Self {
        Self {
            id,
            resolve: Box::new(resolve),
            target: OnceCell::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> &ServiceId {
        &self.id
    }

    /// Whether the real service has been obtained yet.
    pub fn is_resolved(&self) -> bool {
        self.target.get().is_some()
    }

    /// The real service, resolving it on first call.
    pub fn try_target(&self) -> Result<&Arc<S>> {
        self.target.get_or_try_init(|| {
            let service = (self.resolve)()?;
            unwrap::<S>(&service).ok_or_else(|| WireError::TypeMismatch {
                id: self.id.clone(),
                expected: type_name::<S>(),
            })
        })
    }

    /// The real service, for use inside forwarding methods.
    ///
    /// # Panics
    /// If the real service cannot be resolved. This happens when the
    /// stand-in is used while its target is still being constructed, that
    /// is from inside a constructor that is part of the cycle. Call
    /// [`try_target`](Self::try_target) to observe the error instead.
    pub fn target(&self) -> &Arc<S> {
        match self.try_target() {
            Ok(target) => target,
            Err(err) => panic!("stand-in for {} could not reach its service: {err}", self.id),
        }
    }
}

impl<S: ?Sized> fmt::Debug for StandIn<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandIn")
            .field("id", &self.id)
            .field("resolved", &self.target.get().is_some())
            .finish()
    }
}

/// A service type that a [`StandIn`] can impersonate.
///
/// Implemented for `dyn Trait` by `#[forward]`:
///
/// ```ignore
/// #[wirebox::forward]
/// pub trait Mailer: Send + Sync {
///     fn send(&self, to: &str) -> bool;
/// }
/// ```
pub trait Forward: Send + Sync + 'static {
    /// Wraps the stand-in as a value of this type.
    fn forward(stand_in: StandIn<Self>) -> Arc<Self>;
}
