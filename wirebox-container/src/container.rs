//! # The Container
//!
//! The public face of the layered resolution stack.
//!
//! # Architecture
//! ```text
//! ContainerBuilder ──build()──> Container
//!                                  │ get(id)
//!                                  ▼
//!                            AliasResolver         alias → canonical id
//!                                  ▼
//!                            MemoizingCache        at most one build per id
//!                                  ▼
//!                     CircularDependencyBreaker    stand-ins for cycles
//!                                  ▼
//!                           AutowiringContainer    factories, constructors, extensions
//! ```
//!
//! # Examples
//! ```rust
//! use std::sync::Arc;
//! use wirebox_container::prelude::*;
//!
//! struct Logger;
//!
//! struct Service {
//!     logger: Arc<Logger>,
//! }
//!
//! let provider = ServiceProvider::new("app")
//!     .factory(ServiceId::of::<Logger>(), Factory::value(Arc::new(Logger)))
//!     .factory(
//!         "service",
//!         Factory::new(|args: &Arguments| Ok(Arc::new(Service { logger: args.get(0)? })))
//!             .param(Param::of::<Logger>("logger")),
//!     );
//!
//! let container = Container::builder()
//!     .provider(provider)
//!     .build()
//!     .expect("Failed to build container");
//!
//! let service = container.get_as::<Service>(&"service".into()).unwrap();
//! assert!(Arc::ptr_eq(&service.logger, &container.resolve::<Logger>().unwrap()));
//! ```

use std::any::type_name;
use std::fmt;
use std::sync::{Arc, Weak};

use once_cell::sync::OnceCell;
use parking_lot::ReentrantMutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};

use crate::alias::{AliasResolver, AliasTable};
use crate::attribute::{Attribute, Tag};
use crate::autowire::{Autowire, Constructor, TypeCatalog};
use crate::autowiring::{AutowiringContainer, invoke};
use crate::cache::MemoizingCache;
use crate::callable::{Callable, Factory};
use crate::circular::CircularDependencyBreaker;
use crate::error::{Result, WireError};
use crate::id::ServiceId;
use crate::metadata::{AttributeMap, MetadataIndex};
use crate::provider::{AggregateProvider, Provider, ServiceProvider};
use crate::report::{self, ReportRow};
use crate::resolver::ResolverChain;
use crate::source::{FactorySource, ServiceSource};
use crate::value::{Arguments, Service, unwrap};

/// Owner id reported by errors from [`Container::call`].
pub const CALL_OWNER: &str = "call";

type Stack = AliasResolver<MemoizingCache<CircularDependencyBreaker<AutowiringContainer>>>;

// ============================================================
// Settings
// ============================================================

/// Container behaviour switches.
///
/// Deserializable, so it can live in an application's config file:
///
/// ```rust
/// use wirebox_container::prelude::Settings;
///
/// let settings: Settings = serde_json::from_str(r#"{ "break_cycles": false }"#).unwrap();
/// assert!(settings.allow_override);
/// assert!(!settings.break_cycles);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Let later providers replace earlier providers' factories.
    pub allow_override: bool,
    /// Answer dependency cycles with forwarding stand-ins. When off, a
    /// cycle is a [`WireError::CircularDependency`].
    pub break_cycles: bool,
    /// Add every `#[derive(Autowire)]` type in the binary to the catalog.
    pub discover_constructors: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            allow_override: true,
            break_cycles: true,
            discover_constructors: true,
        }
    }
}

// ============================================================
// ContainerBuilder
// ============================================================

/// Builds a [`Container`] from providers.
///
/// All checks that can fail (duplicate factories when overriding is off,
/// alias collisions) run in [`build()`](ContainerBuilder::build), never
/// at resolution time.
pub struct ContainerBuilder {
    providers: Vec<Box<dyn Provider>>,
    constructors: Vec<Constructor>,
    settings: Settings,
}

impl ContainerBuilder {
    fn new() -> Self {
        Self {
            providers: Vec::new(),
            constructors: Vec::new(),
            settings: Settings::default(),
        }
    }

    /// Adds a provider. Later providers override earlier ones.
    pub fn provider(mut self, provider: impl Provider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Makes `T` autowirable even if it is not in the discovered catalog.
    pub fn autowire<T: Autowire>(mut self) -> Self {
        self.constructors.push(Constructor::of::<T>());
        self
    }

    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Allow overriding previously registered factories.
    pub fn allow_override(mut self, allow: bool) -> Self {
        self.settings.allow_override = allow;
        self
    }

    pub fn break_cycles(mut self, enabled: bool) -> Self {
        self.settings.break_cycles = enabled;
        self
    }

    pub fn discover_constructors(mut self, enabled: bool) -> Self {
        self.settings.discover_constructors = enabled;
        self
    }

    /// Build the container.
    ///
    /// # Errors
    /// [`WireError::Bootstrap`] when providers or aliases conflict.
    #[instrument(skip(self), name = "container_build")]
    pub fn build(self) -> Result<Container> {
        info!(providers = self.providers.len(), "Building container");
        let settings = self.settings;
        let outer = ContainerRef::default();

        let mut providers = AggregateProvider::new();
        providers.add(&internal_provider(&outer), settings.allow_override)?;
        for provider in &self.providers {
            providers.add(provider.as_ref(), settings.allow_override)?;
        }

        let metadata = AttributeMap::from_factories(providers.iter());
        let aliases = AliasTable::build(metadata.aliases(), |id| providers.contains(id))?;

        let mut catalog = if settings.discover_constructors {
            TypeCatalog::discover()
        } else {
            TypeCatalog::new()
        };
        catalog.extend(self.constructors);

        debug!(
            services = providers.len(),
            aliases = aliases.len(),
            autowirable = catalog.len(),
            "Assembling resolution stack"
        );

        let chain = Arc::new(ResolverChain::standard());
        let autowiring = AutowiringContainer::new(providers, catalog, chain.clone(), outer.clone());
        let breaker = CircularDependencyBreaker::new(autowiring, outer.clone(), settings.break_cycles);
        let cache = MemoizingCache::with_recovery(breaker, |id, breaker| breaker.recover(id));
        let stack = AliasResolver::new(cache, aliases);

        let inner = Arc::new(ContainerInner {
            stack,
            metadata,
            chain,
            settings,
            lock: ReentrantMutex::new(()),
        });
        outer.bind(&inner);

        info!("Container built successfully ✓");
        Ok(Container { inner })
    }
}

impl fmt::Debug for ContainerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerBuilder")
            .field("providers", &self.providers.iter().map(|p| p.name()).collect::<Vec<_>>())
            .field("constructors", &self.constructors)
            .field("settings", &self.settings)
            .finish()
    }
}

/// Services every container provides about itself.
fn internal_provider(outer: &ContainerRef) -> ServiceProvider {
    ServiceProvider::new("wirebox").factory(
        ServiceId::of::<ContainerRef>(),
        Factory::value(Arc::new(outer.clone()))
            .alias("container")
            .description("The application container"),
    )
}

// ═══════════════════════════════════════════
// Container
// ═══════════════════════════════════════════

pub(crate) struct ContainerInner {
    stack: Stack,
    metadata: AttributeMap,
    chain: Arc<ResolverChain>,
    settings: Settings,
    lock: ReentrantMutex<()>,
}

/// The dependency-resolution container.
///
/// Cheap to clone; clones share everything. Resolution is serialized: one
/// thread resolves at a time, and a thread may re-enter while resolving.
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Container {
    /// Create a new builder.
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// Resolve a service by id.
    ///
    /// The first call builds the service; later calls return the same
    /// instance.
    ///
    /// # Errors
    /// - [`WireError::NotFound`]: no factory and not autowirable
    /// - [`WireError::Autowiring`]: a parameter could not be resolved
    /// - [`WireError::CycleBreak`]: a cycle through a non-forwarding type
    pub fn get(&self, id: &ServiceId) -> Result<Service> {
        let _resolving = self.inner.lock.lock();
        trace!(id = %id, "Resolving");
        self.inner.stack.get(id)
    }

    /// Resolve a service by id and downcast it to `S`.
    pub fn get_as<S: ?Sized + Send + Sync + 'static>(&self, id: &ServiceId) -> Result<Arc<S>> {
        let service = self.get(id)?;
        unwrap::<S>(&service).ok_or_else(|| WireError::TypeMismatch {
            id: id.clone(),
            expected: type_name::<S>(),
        })
    }

    /// Resolve the service registered under `S`'s type name.
    ///
    /// ```rust,ignore
    /// let db: Arc<Database> = container.resolve()?;
    /// ```
    pub fn resolve<S: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<S>> {
        self.get_as(&ServiceId::of::<S>())
    }

    /// Like [`get`](Self::get), but fails with
    /// [`WireError::UsedBeforeReady`] instead of returning a stand-in while
    /// the service is still being built. Stand-ins resolve through this.
    pub fn get_settled(&self, id: &ServiceId) -> Result<Service> {
        let _resolving = self.inner.lock.lock();
        self.inner.stack.get_settled(id)
    }

    /// Whether a factory is registered for `id` (or for what it aliases).
    pub fn has(&self, id: &ServiceId) -> bool {
        self.inner.stack.has(id)
    }

    /// Whether `id` is a type the container can construct without a factory.
    pub fn can_autowire(&self, id: &ServiceId) -> bool {
        self.inner.stack.can_autowire(id)
    }

    /// Calls `callable`, resolving its parameters like a factory's.
    ///
    /// `overrides` fill positions before any other strategy runs. Errors
    /// name the owner [`CALL_OWNER`].
    pub fn call(&self, callable: &Callable, overrides: &Arguments) -> Result<Service> {
        let _resolving = self.inner.lock.lock();
        let owner = ServiceId::new(CALL_OWNER);
        invoke(&self.inner.chain, self, &owner, callable, overrides)
    }

    /// Ids tagged `tag`, ascending by priority, ties in registration order.
    pub fn ids_with_tag(&self, tag: &str) -> Vec<ServiceId> {
        self.inner.metadata.ids_with_tag(tag)
    }

    /// Ids carrying an attribute of `kind` accepted by `predicate`.
    pub fn ids_with_attribute(
        &self,
        kind: &str,
        predicate: Option<&dyn Fn(&Attribute) -> bool>,
    ) -> Vec<ServiceId> {
        self.inner.metadata.ids_with_attribute(kind, predicate)
    }

    /// Attributes of `id` (aliases are followed), optionally of one kind.
    pub fn attributes_of(&self, id: &ServiceId, kind: Option<&str>) -> Vec<Attribute> {
        let canonical = self.inner.stack.table().canonical(id);
        self.inner.metadata.attributes_of(canonical, kind)
    }

    pub fn tags_of(&self, id: &ServiceId) -> Vec<Tag> {
        let canonical = self.inner.stack.table().canonical(id);
        self.inner.metadata.tags_of(canonical)
    }

    pub fn metadata(&self) -> &dyn MetadataIndex {
        &self.inner.metadata
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    /// One row per registered service, in registration order.
    pub fn report(&self) -> Vec<ReportRow> {
        report::rows(self.providers(), &self.inner.metadata)
    }

    /// Number of registered factories.
    pub fn len(&self) -> usize {
        self.providers().len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers().is_empty()
    }

    fn providers(&self) -> &AggregateProvider {
        self.inner.stack.inner().inner().inner().providers()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("registered", &self.len())
            .field("settings", &self.inner.settings)
            .finish()
    }
}

// ═══════════════════════════════════════════
// ContainerRef
// ═══════════════════════════════════════════

/// A weak handle to a container.
///
/// Every container registers one under `ServiceId::of::<ContainerRef>()`
/// (alias `"container"`) so services can reach the container that built
/// them without keeping it alive.
#[derive(Clone, Default)]
pub struct ContainerRef(Arc<OnceCell<Weak<ContainerInner>>>);

impl ContainerRef {
    fn bind(&self, inner: &Arc<ContainerInner>) {
        if self.0.set(Arc::downgrade(inner)).is_err() {
            debug!("Container handle was already bound");
        }
    }

    /// The container, if it still exists.
    ///
    /// # Errors
    /// [`WireError::ContainerDropped`] when the container is gone or the
    /// handle was never bound.
    pub fn container(&self) -> Result<Container> {
        self.0
            .get()
            .and_then(Weak::upgrade)
            .map(|inner| Container { inner })
            .ok_or(WireError::ContainerDropped)
    }
}

impl fmt::Debug for ContainerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.0.get() {
            None => "unbound",
            Some(weak) if weak.strong_count() == 0 => "dropped",
            Some(_) => "live",
        };
        f.debug_tuple("ContainerRef").field(&state).finish()
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{Container, ContainerBuilder, ContainerRef, Settings};
    pub use crate::attribute::{Attribute, AttributeFilter, Tag};
    pub use crate::autowire::{Autowire, Constructor};
    pub use crate::callable::{Callable, Extension, Factory};
    pub use crate::error::{Result, WireError};
    pub use crate::id::ServiceId;
    pub use crate::metadata::MetadataIndex;
    pub use crate::provider::{Provider, ServiceProvider};
    pub use crate::report::ReportRow;
    pub use crate::signature::{Param, Signature};
    pub use crate::stand_in::{Forward, StandIn};
    pub use crate::value::{Argument, Arguments, Service, ServiceList};
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
