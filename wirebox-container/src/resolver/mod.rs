//! The parameter resolver chain.
//!
//! Before a factory, constructor or extension step runs, its
//! [`Signature`] is handed to an ordered list of [`ParameterResolver`]s.
//! Each strategy may fill any position that is still empty, so for every
//! parameter the first strategy able to resolve it wins.
//!
//! Standard order:
//!
//! 1. [`PositionalOverride`] caller-supplied values
//! 2. [`ExplicitId`] `Param::id`
//! 3. [`AttributeMatch`] `Param::with_attr`
//! 4. [`Tagged`] `Param::tagged`
//! 5. [`TypeHint`] the declared type, if registered or autowirable
//! 6. [`DefaultValue`] the declared default, else null for nullable params
//! 7. [`NoDependents`] direct construction of dependency-free types

mod defaults;
mod markers;
mod overrides;
mod types;

use std::fmt;

use tracing::trace;

pub use defaults::DefaultValue;
pub use markers::{AttributeMatch, ExplicitId, Tagged};
pub use overrides::PositionalOverride;
pub use types::{NoDependents, TypeHint};

use crate::container::Container;
use crate::error::{AutowiringError, Result, WireError};
use crate::id::ServiceId;
use crate::signature::{Param, Signature};
use crate::value::{Arguments, Service};

/// What a strategy may consult while resolving.
pub struct ResolutionContext<'a> {
    /// The container that resolved values come from.
    pub container: &'a Container,
    /// The service whose callable is being resolved.
    pub owner: &'a ServiceId,
    /// Caller-supplied positional values.
    pub overrides: &'a Arguments,
}

impl<'a> ResolutionContext<'a> {
    pub fn new(container: &'a Container, owner: &'a ServiceId, overrides: &'a Arguments) -> Self {
        Self {
            container,
            owner,
            overrides,
        }
    }

    /// Fetches a dependency, recording the owner on "not found".
    pub fn get(&self, id: &ServiceId) -> Result<Service> {
        self.container.get(id).map_err(|err| err.required_by(self.owner))
    }

    /// Fetches every id in order.
    pub fn get_all(&self, ids: &[ServiceId]) -> Result<Vec<Service>> {
        ids.iter().map(|id| self.get(id)).collect()
    }
}

impl fmt::Debug for ResolutionContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionContext")
            .field("owner", self.owner)
            .field("overrides", self.overrides)
            .finish_non_exhaustive()
    }
}

/// One parameter resolution strategy.
pub trait ParameterResolver: Send + Sync {
    /// Fills positions of `resolved` this strategy can resolve.
    ///
    /// Must leave already filled positions alone; [`Arguments::fill`]
    /// enforces that.
    fn resolve(
        &self,
        ctx: &ResolutionContext<'_>,
        signature: &Signature,
        resolved: &mut Arguments,
    ) -> Result<()>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// An ordered list of [`ParameterResolver`]s.
pub struct ResolverChain {
    resolvers: Vec<Box<dyn ParameterResolver>>,
}

impl ResolverChain {
    pub fn new(resolvers: Vec<Box<dyn ParameterResolver>>) -> Self {
        Self { resolvers }
    }

    /// The seven standard strategies, in order.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(PositionalOverride),
            Box::new(ExplicitId),
            Box::new(AttributeMatch),
            Box::new(Tagged),
            Box::new(TypeHint),
            Box::new(DefaultValue),
            Box::new(NoDependents),
        ])
    }

    /// Resolves `signature` into positional arguments.
    ///
    /// # Errors
    /// [`WireError::Autowiring`] for the first non-variadic parameter that
    /// no strategy could fill, or whatever a dependency's resolution failed
    /// with.
    pub fn resolve(&self, ctx: &ResolutionContext<'_>, signature: &Signature) -> Result<Arguments> {
        let mut resolved = Arguments::new();

        for resolver in &self.resolvers {
            let before = resolved.len();
            resolver.resolve(ctx, signature, &mut resolved)?;
            if resolved.len() > before {
                trace!(
                    owner = %ctx.owner,
                    strategy = resolver.name(),
                    filled = resolved.len() - before,
                    "Resolved parameters"
                );
            }
        }

        let unresolved = signature
            .params()
            .iter()
            .enumerate()
            .find(|(position, param)| !param.is_variadic() && !resolved.contains(*position));

        if let Some((position, param)) = unresolved {
            return Err(WireError::Autowiring(AutowiringError {
                service: ctx.owner.clone(),
                parameter: param.name().to_owned(),
                position,
                declared_type: param.declared_type().map(|ty| ty.id().clone()),
            }));
        }

        Ok(resolved)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.resolvers.iter().map(|resolver| resolver.name()).collect()
    }
}

impl Default for ResolverChain {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for ResolverChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Positions of the parameters not yet filled, with the parameters.
pub(crate) fn open_params<'s>(
    signature: &'s Signature,
    resolved: &Arguments,
) -> Vec<(usize, &'s Param)> {
    signature
        .params()
        .iter()
        .enumerate()
        .filter(|(position, _)| !resolved.contains(*position))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::attribute::{Attribute, AttributeFilter};
    use crate::autowire::Autowire;
    use crate::callable::Factory;
    use crate::provider::ServiceProvider;
    use crate::value::{Argument, unwrap, wrap};

    struct Clock;

    struct Counter(u32);

    impl Autowire for Counter {
        fn signature() -> Signature {
            Signature::new().param(Param::named("start").with_default(|| Arc::new(5u32)))
        }

        fn construct(args: &Arguments) -> Result<Self> {
            Ok(Counter(*args.get::<u32>(0)?))
        }
    }

    struct NeedsClock;

    impl Autowire for NeedsClock {
        fn signature() -> Signature {
            Signature::new().param(Param::of::<Clock>("clock"))
        }

        fn construct(_: &Arguments) -> Result<Self> {
            Ok(NeedsClock)
        }
    }

    fn container() -> Container {
        let provider = ServiceProvider::new("test")
            .factory(ServiceId::of::<Clock>(), Factory::value(Arc::new(Clock)))
            .factory("name", Factory::value(Arc::new(String::from("wirebox"))))
            .factory("late", Factory::value(Arc::new(3i32)).tag_with_priority("n", 10))
            .factory("early", Factory::value(Arc::new(1i32)).tag_with_priority("n", -10))
            .factory("mid", Factory::value(Arc::new(2i32)).tag("n"))
            .factory(
                "get_users",
                Factory::value(Arc::new(10i32)).attribute(Attribute::new("route").with("method", "GET")),
            )
            .factory(
                "post_users",
                Factory::value(Arc::new(20i32)).attribute(Attribute::new("route").with("method", "POST")),
            );

        Container::builder()
            .provider(provider)
            .discover_constructors(false)
            .build()
            .unwrap()
    }

    fn resolve(container: &Container, signature: &Signature, overrides: &Arguments) -> Result<Arguments> {
        let owner = ServiceId::new("owner");
        let ctx = ResolutionContext::new(container, &owner, overrides);
        ResolverChain::standard().resolve(&ctx, signature)
    }

    fn ints(args: &Arguments, start: usize) -> Vec<i32> {
        args.variadic::<i32>(start).unwrap().iter().map(|n| **n).collect()
    }

    #[test]
    fn standard_order() {
        assert_eq!(
            ResolverChain::standard().names(),
            [
                "positional_override",
                "explicit_id",
                "attribute_match",
                "tagged",
                "type_hint",
                "default_value",
                "no_dependents",
            ]
        );
    }

    #[test]
    fn override_beats_type_lookup() {
        let container = container();
        let own = Arc::new(Clock);
        let mut overrides = Arguments::new();
        overrides.fill(0, Argument::Value(wrap(own.clone())));

        let signature = Signature::new().param(Param::of::<Clock>("clock"));
        let args = resolve(&container, &signature, &overrides).unwrap();

        assert!(Arc::ptr_eq(&args.get::<Clock>(0).unwrap(), &own));
    }

    #[test]
    fn explicit_id_and_type_hint() {
        let container = container();
        let signature = Signature::new()
            .param(Param::named("name").id("name"))
            .param(Param::of::<Clock>("clock"));

        let args = resolve(&container, &signature, &Arguments::new()).unwrap();
        assert_eq!(args.get::<String>(0).unwrap().as_str(), "wirebox");
        assert!(Arc::ptr_eq(
            &args.get::<Clock>(1).unwrap(),
            &container.resolve::<Clock>().unwrap()
        ));
    }

    #[test]
    fn tagged_variadic_is_priority_ordered() {
        let container = container();
        let signature = Signature::new()
            .param(Param::named("first").id("name"))
            .param(Param::named("numbers").tagged("n").variadic());

        let args = resolve(&container, &signature, &Arguments::new()).unwrap();
        assert_eq!(ints(&args, 1), [1, 2, 3]);
    }

    #[test]
    fn tagged_single_takes_first() {
        let container = container();
        let signature = Signature::new().param(Param::named("lowest").tagged("n"));

        let args = resolve(&container, &signature, &Arguments::new()).unwrap();
        assert_eq!(*args.get::<i32>(0).unwrap(), 1);
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn attribute_filter_selects_matching() {
        let container = container();
        let signature = Signature::new().param(
            Param::named("routes")
                .with_attr(AttributeFilter::new("route").matching("method", "POST"))
                .variadic(),
        );

        let args = resolve(&container, &signature, &Arguments::new()).unwrap();
        assert_eq!(ints(&args, 0), [20]);
    }

    #[test]
    fn defaults_and_nulls() {
        let container = container();
        let signature = Signature::new()
            .param(Param::named("retries").with_default(|| Arc::new(3u8)))
            .param(Param::of::<u64>("missing").nullable())
            .param(Param::named("rest").variadic());

        let args = resolve(&container, &signature, &Arguments::new()).unwrap();
        assert_eq!(*args.get::<u8>(0).unwrap(), 3);
        assert!(args.optional::<u64>(1).unwrap().is_none());
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn no_dependents_builds_unregistered_type() {
        let container = container();
        let signature = Signature::new().param(Param::autowired::<Counter>("counter"));

        let first = resolve(&container, &signature, &Arguments::new()).unwrap();
        let second = resolve(&container, &signature, &Arguments::new()).unwrap();

        let a = first.get::<Counter>(0).unwrap();
        let b = second.get::<Counter>(0).unwrap();
        assert_eq!(a.0, 5);
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(!container.has(&ServiceId::of::<Counter>()));
    }

    #[test]
    fn no_dependents_skips_types_with_dependencies() {
        let container = container();
        let signature = Signature::new().param(Param::autowired::<NeedsClock>("needs"));

        let err = resolve(&container, &signature, &Arguments::new()).unwrap_err();
        assert!(matches!(err, WireError::Autowiring(ref e) if e.parameter == "needs"));
    }

    #[test]
    fn unresolved_param_names_owner_and_position() {
        let container = container();
        let signature = Signature::new()
            .param(Param::of::<Clock>("clock"))
            .param(Param::of::<u64>("timeout"));

        match resolve(&container, &signature, &Arguments::new()).unwrap_err() {
            WireError::Autowiring(err) => {
                assert_eq!(err.service, ServiceId::new("owner"));
                assert_eq!(err.parameter, "timeout");
                assert_eq!(err.position, 1);
                assert_eq!(err.declared_type, Some(ServiceId::of::<u64>()));
            }
            other => panic!("Expected Autowiring, got: {other:?}"),
        }
    }

    #[test]
    fn missing_explicit_id_records_owner() {
        let container = container();
        let signature = Signature::new().param(Param::named("x").id("nope"));

        match resolve(&container, &signature, &Arguments::new()).unwrap_err() {
            WireError::NotFound(err) => {
                assert_eq!(err.requested, ServiceId::new("nope"));
                assert_eq!(err.required_by, Some(ServiceId::new("owner")));
            }
            other => panic!("Expected NotFound, got: {other:?}"),
        }
    }

    #[test]
    fn custom_chain() {
        struct Always;

        impl ParameterResolver for Always {
            fn resolve(
                &self,
                _: &ResolutionContext<'_>,
                signature: &Signature,
                resolved: &mut Arguments,
            ) -> Result<()> {
                for (position, _) in open_params(signature, resolved) {
                    resolved.fill(position, Argument::Value(wrap(Arc::new(0u8))));
                }
                Ok(())
            }

            fn name(&self) -> &'static str {
                "always"
            }
        }

        let container = container();
        let owner = ServiceId::new("owner");
        let overrides = Arguments::new();
        let ctx = ResolutionContext::new(&container, &owner, &overrides);
        let chain = ResolverChain::new(vec![Box::new(Always)]);

        let args = chain
            .resolve(&ctx, &Signature::new().param(Param::of::<Clock>("clock")))
            .unwrap();
        assert_eq!(*unwrap::<u8>(args.raw(0).unwrap()).unwrap(), 0);
    }
}
