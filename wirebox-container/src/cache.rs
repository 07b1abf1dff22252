//! At-most-once construction per id.

use dashmap::DashMap;
use tracing::trace;

use crate::callable::Factory;
use crate::error::{Result, WireError};
use crate::id::ServiceId;
use crate::source::{FactorySource, ServiceSource};
use crate::value::Service;

/// Called for a request that arrives while the same id is being built.
pub type RecoveryHook<S> = Box<dyn Fn(&ServiceId, &S) -> Result<Service> + Send + Sync>;

#[derive(Clone)]
enum Slot {
    Building,
    Ready(Service),
}

/// Memoizes every service the inner layer builds.
///
/// A re-entrant request for an id that is still being built goes to the
/// recovery hook instead of starting a second build. The default hook
/// fails with [`WireError::UsedBeforeReady`].
pub struct MemoizingCache<S> {
    inner: S,
    slots: DashMap<ServiceId, Slot>,
    recover: RecoveryHook<S>,
}

impl<S: FactorySource> MemoizingCache<S> {
    pub fn new(inner: S) -> Self {
        Self::with_recovery(inner, |id, _| Err(WireError::UsedBeforeReady { id: id.clone() }))
    }

    pub fn with_recovery(
        inner: S,
        recover: impl Fn(&ServiceId, &S) -> Result<Service> + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner,
            slots: DashMap::new(),
            recover: Box::new(recover),
        }
    }

    #[inline]
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Whether `id` has been built.
    pub fn is_ready(&self, id: &ServiceId) -> bool {
        matches!(self.slot(id), Some(Slot::Ready(_)))
    }

    /// Number of built services.
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|entry| matches!(entry.value(), Slot::Ready(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // The map guard is released before returning, so a build may insert.
    fn slot(&self, id: &ServiceId) -> Option<Slot> {
        self.slots.get(id).map(|slot| slot.value().clone())
    }

    fn build(&self, id: &ServiceId) -> Result<Service> {
        self.slots.insert(id.clone(), Slot::Building);
        let guard = BuildGuard {
            slots: &self.slots,
            id,
            armed: true,
        };

        let value = self.inner.get(id)?;
        self.slots.insert(id.clone(), Slot::Ready(value.clone()));
        guard.disarm();

        trace!(id = %id, "Cached service");
        Ok(value)
    }
}

impl<S: FactorySource> ServiceSource for MemoizingCache<S> {
    fn get(&self, id: &ServiceId) -> Result<Service> {
        match self.slot(id) {
            Some(Slot::Ready(value)) => Ok(value),
            Some(Slot::Building) => {
                trace!(id = %id, "Requested while building");
                (self.recover)(id, &self.inner)
            }
            None => self.build(id),
        }
    }

    fn has(&self, id: &ServiceId) -> bool {
        self.inner.has(id)
    }

    fn get_settled(&self, id: &ServiceId) -> Result<Service> {
        match self.slot(id) {
            Some(Slot::Ready(value)) => Ok(value),
            Some(Slot::Building) => Err(WireError::UsedBeforeReady { id: id.clone() }),
            None => self.build(id),
        }
    }
}

impl<S: FactorySource> FactorySource for MemoizingCache<S> {
    fn factory(&self, id: &ServiceId) -> Option<&Factory> {
        self.inner.factory(id)
    }

    fn can_autowire(&self, id: &ServiceId) -> bool {
        self.inner.can_autowire(id)
    }
}

/// Removes the `Building` marker unless the build completed.
struct BuildGuard<'a> {
    slots: &'a DashMap<ServiceId, Slot>,
    id: &'a ServiceId,
    armed: bool,
}

impl BuildGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.slots.remove(self.id);
        }
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for MemoizingCache<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoizingCache")
            .field("inner", &self.inner)
            .field("slots", &self.slots.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Weak};

    use once_cell::sync::OnceCell;

    use super::*;
    use crate::value::{unwrap, wrap};

    /// Counts builds. "fail" fails, "reenter" and "settle" ask the cache
    /// for themselves through `get` and `get_settled`.
    #[derive(Default)]
    struct Counting {
        builds: AtomicUsize,
        cache: OnceCell<Weak<MemoizingCache<Counting>>>,
    }

    impl Counting {
        fn cache(&self) -> Arc<MemoizingCache<Counting>> {
            self.cache.get().and_then(Weak::upgrade).unwrap()
        }
    }

    impl ServiceSource for Counting {
        fn get(&self, id: &ServiceId) -> Result<Service> {
            let n = self.builds.fetch_add(1, Ordering::SeqCst);
            match id.as_str() {
                "fail" => Err(WireError::construction(id, "boom")),
                "reenter" => self.cache().get(id),
                "settle" => self.cache().get_settled(id),
                _ => Ok(wrap(Arc::new(n))),
            }
        }

        fn has(&self, _: &ServiceId) -> bool {
            true
        }
    }

    impl FactorySource for Counting {
        fn factory(&self, _: &ServiceId) -> Option<&Factory> {
            None
        }

        fn can_autowire(&self, _: &ServiceId) -> bool {
            false
        }
    }

    fn cache(cache: MemoizingCache<Counting>) -> Arc<MemoizingCache<Counting>> {
        let cache = Arc::new(cache);
        cache.inner().cache.set(Arc::downgrade(&cache)).unwrap();
        cache
    }

    #[test]
    fn builds_once_and_returns_same_instance() {
        let cache = cache(MemoizingCache::new(Counting::default()));
        let id = ServiceId::new("a");

        let first = cache.get(&id).unwrap();
        let second = cache.get(&id).unwrap();

        assert!(Arc::ptr_eq(&unwrap::<usize>(&first).unwrap(), &unwrap::<usize>(&second).unwrap()));
        assert_eq!(cache.inner().builds.load(Ordering::SeqCst), 1);
        assert!(cache.is_ready(&id));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn failed_build_is_not_cached() {
        let cache = cache(MemoizingCache::new(Counting::default()));
        let id = ServiceId::new("fail");

        assert!(cache.get(&id).is_err());
        assert!(cache.get(&id).is_err());
        assert_eq!(cache.inner().builds.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn reentry_uses_default_hook() {
        let cache = cache(MemoizingCache::new(Counting::default()));
        let err = cache.get(&ServiceId::new("reenter")).unwrap_err();

        assert!(matches!(err, WireError::UsedBeforeReady { ref id } if id.as_str() == "reenter"));
        assert!(!cache.is_ready(&ServiceId::new("reenter")));
    }

    #[test]
    fn reentry_uses_custom_hook() {
        let cache = cache(MemoizingCache::with_recovery(Counting::default(), |_, _| {
            Ok(wrap(Arc::new(usize::MAX)))
        }));

        let value = cache.get(&ServiceId::new("reenter")).unwrap();
        assert_eq!(*unwrap::<usize>(&value).unwrap(), usize::MAX);
        assert!(cache.is_ready(&ServiceId::new("reenter")));
    }

    #[test]
    fn settled_get_ignores_hook() {
        let cache = cache(MemoizingCache::with_recovery(Counting::default(), |_, _| {
            Ok(wrap(Arc::new(0usize)))
        }));

        let err = cache.get(&ServiceId::new("settle")).unwrap_err();
        assert!(matches!(err, WireError::UsedBeforeReady { .. }));

        let id = ServiceId::new("b");
        cache.get_settled(&id).unwrap();
        assert!(cache.is_ready(&id));
    }
}
