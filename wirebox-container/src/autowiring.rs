//! The innermost layer: builds services.

use std::sync::Arc;

use tracing::{debug, trace};
use wirebox_support::rendering::suggest_similar;

use crate::autowire::TypeCatalog;
use crate::callable::{Callable, Factory};
use crate::container::{Container, ContainerRef};
use crate::error::{NotFoundError, Result, WireError};
use crate::id::ServiceId;
use crate::provider::AggregateProvider;
use crate::resolver::{ResolutionContext, ResolverChain};
use crate::source::{FactorySource, ServiceSource};
use crate::value::{Argument, Arguments, Service};

const MAX_SUGGESTIONS: usize = 3;

/// Invokes factories, or constructors of autowirable types, and applies
/// registered extensions to the result.
///
/// Arguments are resolved against the outer [`Container`], so dependencies
/// go through aliasing, caching and cycle detection like any other request.
#[derive(Debug)]
pub struct AutowiringContainer {
    providers: AggregateProvider,
    catalog: TypeCatalog,
    chain: Arc<ResolverChain>,
    outer: ContainerRef,
}

impl AutowiringContainer {
    pub fn new(
        providers: AggregateProvider,
        catalog: TypeCatalog,
        chain: Arc<ResolverChain>,
        outer: ContainerRef,
    ) -> Self {
        Self {
            providers,
            catalog,
            chain,
            outer,
        }
    }

    #[inline]
    pub fn providers(&self) -> &AggregateProvider {
        &self.providers
    }

    #[inline]
    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    fn build(&self, container: &Container, id: &ServiceId) -> Result<Service> {
        if let Some(factory) = self.providers.factory(id) {
            trace!(id = %id, "Invoking factory");
            return invoke(&self.chain, container, id, factory.callable(), &Arguments::new());
        }

        if let Some(constructor) = self.catalog.get(id) {
            debug!(id = %id, "Autowiring constructor");
            let overrides = Arguments::new();
            let ctx = ResolutionContext::new(container, id, &overrides);
            let args = self.chain.resolve(&ctx, &constructor.signature())?;
            return constructor.build(&args);
        }

        Err(self.not_found(id))
    }

    fn extend(&self, container: &Container, id: &ServiceId, mut value: Service) -> Result<Service> {
        let Some(extension) = self.providers.extension(id) else {
            return Ok(value);
        };

        for (index, step) in extension.steps().iter().enumerate() {
            trace!(id = %id, step = index, "Applying extension");
            let mut previous = Arguments::new();
            previous.fill(0, Argument::Value(value));
            value = invoke(&self.chain, container, id, step, &previous)?;
        }
        Ok(value)
    }

    fn not_found(&self, id: &ServiceId) -> WireError {
        let available: Vec<&str> = self.providers.ids().map(ServiceId::as_str).collect();
        let suggestions = suggest_similar(id.as_str(), &available, MAX_SUGGESTIONS)
            .into_iter()
            .map(ServiceId::from)
            .collect();

        WireError::NotFound(NotFoundError {
            requested: id.clone(),
            required_by: None,
            suggestions,
        })
    }
}

impl ServiceSource for AutowiringContainer {
    fn get(&self, id: &ServiceId) -> Result<Service> {
        let container = self.outer.container()?;
        let value = self.build(&container, id)?;
        self.extend(&container, id, value)
    }

    fn has(&self, id: &ServiceId) -> bool {
        self.providers.contains(id)
    }
}

impl FactorySource for AutowiringContainer {
    fn factory(&self, id: &ServiceId) -> Option<&Factory> {
        self.providers.factory(id)
    }

    fn can_autowire(&self, id: &ServiceId) -> bool {
        self.catalog.contains(id)
    }
}

/// Resolves `callable`'s signature for `owner` and calls it.
pub(crate) fn invoke(
    chain: &ResolverChain,
    container: &Container,
    owner: &ServiceId,
    callable: &Callable,
    overrides: &Arguments,
) -> Result<Service> {
    let ctx = ResolutionContext::new(container, owner, overrides);
    let args = chain.resolve(&ctx, callable.signature())?;
    callable.invoke(&args)
}
