//! The interface shared by every layer of the container stack.
//!
//! ```text
//! AliasResolver ─> MemoizingCache ─> CircularDependencyBreaker ─> AutowiringContainer
//! ```
//!
//! Each layer wraps the next and adds one concern.

use crate::callable::Factory;
use crate::error::Result;
use crate::id::ServiceId;
use crate::value::Service;

/// Something services can be obtained from.
pub trait ServiceSource: Send + Sync {
    fn get(&self, id: &ServiceId) -> Result<Service>;

    /// Whether a factory is registered for `id`.
    fn has(&self, id: &ServiceId) -> bool;

    /// Like [`get`](Self::get), but never substitutes a stand-in for a
    /// service that is still being built.
    fn get_settled(&self, id: &ServiceId) -> Result<Service> {
        self.get(id)
    }
}

/// A [`ServiceSource`] that can also describe what it would build.
pub trait FactorySource: ServiceSource {
    /// The raw factory registered for `id`.
    fn factory(&self, id: &ServiceId) -> Option<&Factory>;

    /// Whether `id` names a type that can be built without a factory.
    fn can_autowire(&self, id: &ServiceId) -> bool;
}
