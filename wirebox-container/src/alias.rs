//! Alias rewriting, the outermost layer.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::callable::Factory;
use crate::error::{BootstrapError, Result};
use crate::id::ServiceId;
use crate::source::{FactorySource, ServiceSource};
use crate::value::Service;

/// Maps alias ids to canonical ids. Built once, never changed.
#[derive(Debug, Default, Clone)]
pub struct AliasTable {
    aliases: HashMap<ServiceId, ServiceId>,
}

impl AliasTable {
    /// Builds the table from `(alias, target)` pairs.
    ///
    /// # Errors
    /// - [`BootstrapError::AliasCollision`] if an alias is itself a
    ///   registered id
    /// - [`BootstrapError::AmbiguousAlias`] if two services declare the
    ///   same alias
    pub fn build(
        pairs: impl IntoIterator<Item = (ServiceId, ServiceId)>,
        is_registered: impl Fn(&ServiceId) -> bool,
    ) -> std::result::Result<Self, BootstrapError> {
        let mut aliases: HashMap<ServiceId, ServiceId> = HashMap::new();

        for (alias, target) in pairs {
            if is_registered(&alias) {
                return Err(BootstrapError::AliasCollision { alias, service: target });
            }
            if let Some(first) = aliases.get(&alias) {
                if first != &target {
                    return Err(BootstrapError::AmbiguousAlias {
                        first: first.clone(),
                        alias,
                        second: target,
                    });
                }
                continue;
            }
            debug!(alias = %alias, target = %target, "Registered alias");
            aliases.insert(alias, target);
        }

        Ok(Self { aliases })
    }

    /// The canonical id for `id`. Ids that are not aliases map to themselves.
    pub fn canonical<'a>(&'a self, id: &'a ServiceId) -> &'a ServiceId {
        self.aliases.get(id).unwrap_or(id)
    }

    pub fn is_alias(&self, id: &ServiceId) -> bool {
        self.aliases.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

/// Rewrites alias ids to canonical ids before delegating.
///
/// A single hop: an alias always names a registered service, never
/// another alias.
#[derive(Debug)]
pub struct AliasResolver<S> {
    inner: S,
    table: AliasTable,
}

impl<S: FactorySource> AliasResolver<S> {
    pub fn new(inner: S, table: AliasTable) -> Self {
        Self { inner, table }
    }

    #[inline]
    pub fn inner(&self) -> &S {
        &self.inner
    }

    #[inline]
    pub fn table(&self) -> &AliasTable {
        &self.table
    }

    fn canonical<'a>(&'a self, id: &'a ServiceId) -> &'a ServiceId {
        let canonical = self.table.canonical(id);
        if canonical != id {
            trace!(alias = %id, target = %canonical, "Following alias");
        }
        canonical
    }
}

impl<S: FactorySource> ServiceSource for AliasResolver<S> {
    fn get(&self, id: &ServiceId) -> Result<Service> {
        self.inner.get(self.canonical(id))
    }

    fn has(&self, id: &ServiceId) -> bool {
        self.inner.has(self.table.canonical(id))
    }

    fn get_settled(&self, id: &ServiceId) -> Result<Service> {
        self.inner.get_settled(self.canonical(id))
    }
}

impl<S: FactorySource> FactorySource for AliasResolver<S> {
    fn factory(&self, id: &ServiceId) -> Option<&Factory> {
        self.inner.factory(self.table.canonical(id))
    }

    fn can_autowire(&self, id: &ServiceId) -> bool {
        self.inner.can_autowire(self.table.canonical(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> ServiceId {
        ServiceId::new(name)
    }

    #[test]
    fn canonical_is_single_hop() {
        let table = AliasTable::build([(id("db"), id("database"))], |_| false).unwrap();

        assert_eq!(table.canonical(&id("db")), &id("database"));
        assert_eq!(table.canonical(&id("database")), &id("database"));
        assert!(table.is_alias(&id("db")));
    }

    #[test]
    fn alias_shadowing_service_fails() {
        let err = AliasTable::build([(id("db"), id("database"))], |candidate| candidate == &id("db"))
            .unwrap_err();
        assert!(matches!(err, BootstrapError::AliasCollision { ref alias, .. } if alias == &id("db")));
    }

    #[test]
    fn alias_declared_twice_fails() {
        let err = AliasTable::build(
            [(id("db"), id("primary")), (id("db"), id("replica"))],
            |_| false,
        )
        .unwrap_err();

        match err {
            BootstrapError::AmbiguousAlias { alias, first, second } => {
                assert_eq!(alias, id("db"));
                assert_eq!(first, id("primary"));
                assert_eq!(second, id("replica"));
            }
            other => panic!("Expected AmbiguousAlias, got: {other:?}"),
        }
    }

    #[test]
    fn repeated_alias_for_same_target_is_fine() {
        let table = AliasTable::build([(id("db"), id("primary")), (id("db"), id("primary"))], |_| false)
            .unwrap();
        assert_eq!(table.len(), 1);
    }
}
