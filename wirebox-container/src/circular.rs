//! Cycle detection and breaking.

use tracing::{debug, warn};
use wirebox_support::rendering::render_chain;

use crate::callable::Factory;
use crate::container::ContainerRef;
use crate::error::{CircularDependencyError, CycleBreakError, Result, WireError};
use crate::id::ServiceId;
use crate::source::{FactorySource, ServiceSource};
use crate::stack::ResolutionStack;
use crate::value::Service;

/// Tracks which ids are under construction and answers a request for
/// one of them with a forwarding stand-in instead of recursing.
///
/// The stand-in resolves through the outer container once the real
/// service is cached. A stand-in is only possible when the id's factory
/// was registered with [`Factory::forwarding`].
#[derive(Debug)]
pub struct CircularDependencyBreaker<S> {
    inner: S,
    stack: ResolutionStack,
    outer: ContainerRef,
    break_cycles: bool,
}

impl<S: FactorySource> CircularDependencyBreaker<S> {
    pub fn new(inner: S, outer: ContainerRef, break_cycles: bool) -> Self {
        Self {
            inner,
            stack: ResolutionStack::new(),
            outer,
            break_cycles,
        }
    }

    #[inline]
    pub fn inner(&self) -> &S {
        &self.inner
    }

    #[inline]
    pub fn stack(&self) -> &ResolutionStack {
        &self.stack
    }

    /// Handles a request for an id that is already under construction.
    ///
    /// Returns a stand-in, or an error when cycle breaking is off or no
    /// stand-in can be built.
    pub fn recover(&self, id: &ServiceId) -> Result<Service> {
        if self.break_cycles {
            self.stand_in(id)
        } else {
            Err(self.reject(id))
        }
    }

    /// A forwarding stand-in for `id`.
    pub fn stand_in(&self, id: &ServiceId) -> Result<Service> {
        let chain = self.stack.cycle(id);
        debug!(id = %id, chain = %render_chain(&chain), "Breaking dependency cycle with a stand-in");

        let Some(output) = self.inner.factory(id).map(Factory::output) else {
            return Err(cycle_break(id, chain, "it has no factory, so the type to stand in for is unknown"));
        };

        let outer = self.outer.clone();
        let target = id.clone();
        let resolve: Box<dyn Fn() -> Result<Service> + Send + Sync> =
            Box::new(move || outer.container()?.get_settled(&target));

        output.stand_in(id.clone(), resolve).ok_or_else(|| {
            let reason = format!("{} cannot be forwarded to", output.type_name());
            cycle_break(id, chain, &reason)
        })
    }

    /// The error for a detected cycle when breaking is disabled.
    pub fn reject(&self, id: &ServiceId) -> WireError {
        let chain = self.stack.cycle(id);
        warn!(chain = %render_chain(&chain), "Circular dependency detected");
        WireError::CircularDependency(CircularDependencyError { chain })
    }
}

impl<S: FactorySource> ServiceSource for CircularDependencyBreaker<S> {
    fn get(&self, id: &ServiceId) -> Result<Service> {
        if self.stack.contains(id) {
            return self.recover(id);
        }

        let _frame = self.stack.enter(id);
        self.inner.get(id)
    }

    fn has(&self, id: &ServiceId) -> bool {
        self.inner.has(id)
    }
}

impl<S: FactorySource> FactorySource for CircularDependencyBreaker<S> {
    fn factory(&self, id: &ServiceId) -> Option<&Factory> {
        self.inner.factory(id)
    }

    fn can_autowire(&self, id: &ServiceId) -> bool {
        self.inner.can_autowire(id)
    }
}

fn cycle_break(id: &ServiceId, chain: Vec<ServiceId>, reason: &str) -> WireError {
    warn!(id = %id, reason, "Cannot break dependency cycle");
    WireError::CycleBreak(CycleBreakError {
        id: id.clone(),
        chain,
        reason: reason.to_owned(),
    })
}
