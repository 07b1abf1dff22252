//! Providers: modules of related factories and extensions.
//!
//! Split registrations by concern and let the container merge them:
//!
//! ```rust
//! use std::sync::Arc;
//! use wirebox_container::prelude::*;
//!
//! struct DbConfig {
//!     url: String,
//! }
//!
//! let database = ServiceProvider::new("database")
//!     .factory("database.url", Factory::value(Arc::new(String::from("postgres://localhost"))))
//!     .factory(
//!         ServiceId::of::<DbConfig>(),
//!         Factory::new(|args: &Arguments| {
//!             Ok(Arc::new(DbConfig { url: args.get::<String>(0)?.to_string() }))
//!         })
//!         .param(Param::named("url").id("database.url")),
//!     );
//!
//! let container = Container::builder().provider(database).build().unwrap();
//! assert_eq!(container.resolve::<DbConfig>().unwrap().url, "postgres://localhost");
//! ```

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::callable::{Extension, Factory};
use crate::error::BootstrapError;
use crate::id::ServiceId;

/// A bundle of factories and extensions.
///
/// Both lists are ordered; the order is the registration order the
/// container reports and uses to break tag priority ties.
pub trait Provider: Send + Sync {
    /// Factories keyed by the id they build.
    fn factories(&self) -> Vec<(ServiceId, Factory)>;

    /// Extensions keyed by the id they decorate.
    fn extensions(&self) -> Vec<(ServiceId, Extension)> {
        Vec::new()
    }

    /// Human-readable name, shown as the module of each service it provides.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// A [`Provider`] assembled with a builder.
#[derive(Debug, Default, Clone)]
pub struct ServiceProvider {
    name: String,
    factories: Vec<(ServiceId, Factory)>,
    extensions: Vec<(ServiceId, Extension)>,
}

impl ServiceProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn factory(mut self, id: impl Into<ServiceId>, factory: Factory) -> Self {
        self.factories.push((id.into(), factory));
        self
    }

    /// Adds an extension. Two extensions for the same id within one
    /// provider are applied in the order they were added.
    pub fn extend(mut self, id: impl Into<ServiceId>, extension: Extension) -> Self {
        self.extensions.push((id.into(), extension));
        self
    }
}

impl Provider for ServiceProvider {
    fn factories(&self) -> Vec<(ServiceId, Factory)> {
        self.factories.clone()
    }

    fn extensions(&self) -> Vec<(ServiceId, Extension)> {
        self.extensions.clone()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug)]
struct FactoryEntry {
    id: ServiceId,
    factory: Factory,
    module: String,
}

/// Several providers merged into one.
///
/// Factories: a later provider replaces an earlier provider's factory for
/// the same id, and the id keeps its original registration position.
/// Extensions: same-id extensions compose in provider order, so with
/// providers `[p1, p2]` the value seen by callers is `e2(e1(factory()))`.
#[derive(Debug, Default)]
pub struct AggregateProvider {
    factories: Vec<FactoryEntry>,
    index: HashMap<ServiceId, usize>,
    extensions: Vec<(ServiceId, Extension)>,
    extension_index: HashMap<ServiceId, usize>,
}

impl AggregateProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `providers` in order.
    ///
    /// # Errors
    /// [`BootstrapError::DuplicateFactory`] when `allow_override` is false
    /// and two providers define the same id.
    pub fn merge<'a>(
        providers: impl IntoIterator<Item = &'a dyn Provider>,
        allow_override: bool,
    ) -> Result<Self, BootstrapError> {
        let mut merged = Self::new();
        for provider in providers {
            merged.add(provider, allow_override)?;
        }
        Ok(merged)
    }

    /// Merges one more provider on top of those already added.
    pub fn add(&mut self, provider: &dyn Provider, allow_override: bool) -> Result<(), BootstrapError> {
        let module = provider.name().to_owned();

        for (id, factory) in provider.factories() {
            match self.index.get(&id) {
                Some(&position) => {
                    if !allow_override {
                        return Err(BootstrapError::DuplicateFactory { id, provider: module });
                    }
                    debug!(id = %id, module = %module, "Overriding factory");
                    let entry = &mut self.factories[position];
                    entry.factory = factory;
                    entry.module = module.clone();
                }
                None => {
                    trace!(id = %id, module = %module, "Registered factory");
                    self.index.insert(id.clone(), self.factories.len());
                    self.factories.push(FactoryEntry {
                        id,
                        factory,
                        module: module.clone(),
                    });
                }
            }
        }

        for (id, extension) in provider.extensions() {
            match self.extension_index.get(&id) {
                Some(&position) => {
                    debug!(id = %id, module = %module, "Composing extension");
                    let slot = &mut self.extensions[position].1;
                    *slot = std::mem::take(slot).then(extension);
                }
                None => {
                    trace!(id = %id, module = %module, "Registered extension");
                    self.extension_index.insert(id.clone(), self.extensions.len());
                    self.extensions.push((id, extension));
                }
            }
        }

        Ok(())
    }

    pub fn factory(&self, id: &ServiceId) -> Option<&Factory> {
        self.index.get(id).map(|&position| &self.factories[position].factory)
    }

    pub fn extension(&self, id: &ServiceId) -> Option<&Extension> {
        self.extension_index
            .get(id)
            .map(|&position| &self.extensions[position].1)
    }

    /// Name of the provider whose factory for `id` won.
    pub fn module_of(&self, id: &ServiceId) -> Option<&str> {
        self.index
            .get(id)
            .map(|&position| self.factories[position].module.as_str())
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &ServiceId> {
        self.factories.iter().map(|entry| &entry.id)
    }

    /// Registered factories in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&ServiceId, &Factory)> {
        self.factories.iter().map(|entry| (&entry.id, &entry.factory))
    }

    pub fn contains(&self, id: &ServiceId) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl Provider for AggregateProvider {
    fn factories(&self) -> Vec<(ServiceId, Factory)> {
        self.iter().map(|(id, factory)| (id.clone(), factory.clone())).collect()
    }

    fn extensions(&self) -> Vec<(ServiceId, Extension)> {
        self.extensions.clone()
    }

    fn name(&self) -> &str {
        "aggregate"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::value::{Argument, Arguments, unwrap, wrap};

    struct Database;

    impl Provider for Database {
        fn factories(&self) -> Vec<(ServiceId, Factory)> {
            vec![(ServiceId::new("db"), Factory::value(Arc::new(1u8)))]
        }
    }

    fn apply(extension: &Extension, value: i32) -> i32 {
        let mut current = wrap(Arc::new(value));
        for step in extension.steps() {
            let mut args = Arguments::new();
            args.fill(0, Argument::Value(current));
            current = step.invoke(&args).unwrap();
        }
        *unwrap::<i32>(&current).unwrap()
    }

    fn build(factory: &Factory) -> u8 {
        let built = factory.callable().invoke(&Arguments::new()).unwrap();
        *unwrap::<u8>(&built).unwrap()
    }

    #[test]
    fn provider_has_name() {
        assert!(Database.name().ends_with("Database"));
        assert_eq!(ServiceProvider::new("mail").name(), "mail");
    }

    #[test]
    fn later_factory_wins_in_place() {
        let first = ServiceProvider::new("first")
            .factory("a", Factory::value(Arc::new(1u8)))
            .factory("b", Factory::value(Arc::new(2u8)));
        let second = ServiceProvider::new("second").factory("a", Factory::value(Arc::new(9u8)));

        let merged = AggregateProvider::merge([&first as &dyn Provider, &second], true).unwrap();

        let ids: Vec<_> = merged.ids().map(ServiceId::as_str).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(build(merged.factory(&ServiceId::new("a")).unwrap()), 9);
        assert_eq!(merged.module_of(&ServiceId::new("a")), Some("second"));
        assert_eq!(merged.module_of(&ServiceId::new("b")), Some("first"));
    }

    #[test]
    fn duplicate_fails_without_override() {
        let err = AggregateProvider::merge([&Database as &dyn Provider, &Database], false).unwrap_err();
        assert!(matches!(err, BootstrapError::DuplicateFactory { ref id, .. } if id.as_str() == "db"));
    }

    #[test]
    fn extensions_compose_in_provider_order() {
        let add = ServiceProvider::new("add")
            .extend("n", Extension::new(|n: Arc<i32>, _: &Arguments| Ok(Arc::new(*n + 1))));
        let double = ServiceProvider::new("double")
            .extend("n", Extension::new(|n: Arc<i32>, _: &Arguments| Ok(Arc::new(*n * 2))));
        let negate = ServiceProvider::new("negate")
            .extend("n", Extension::new(|n: Arc<i32>, _: &Arguments| Ok(Arc::new(-*n))));

        let merged =
            AggregateProvider::merge([&add as &dyn Provider, &double, &negate], true).unwrap();

        let extension = merged.extension(&ServiceId::new("n")).unwrap();
        assert_eq!(extension.len(), 3);
        assert_eq!(apply(extension, 3), -8);
    }

    #[test]
    fn uncollided_extensions_pass_through() {
        let provider = ServiceProvider::new("p")
            .extend("x", Extension::new(|n: Arc<i32>, _: &Arguments| Ok(n)));
        let merged = AggregateProvider::merge([&provider as &dyn Provider], true).unwrap();

        assert_eq!(merged.extension(&ServiceId::new("x")).unwrap().len(), 1);
        assert!(merged.extension(&ServiceId::new("y")).is_none());
        assert!(merged.is_empty());
    }
}
