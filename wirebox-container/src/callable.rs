//! Factories, extensions and the callables behind them.

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use crate::attribute::Attribute;
use crate::error::Result;
use crate::id::ServiceId;
use crate::signature::{Param, Signature};
use crate::stand_in::{Forward, StandIn};
use crate::value::{Arguments, Service, wrap};

/// The erased body of a [`Callable`].
pub type InvokeFn = Arc<dyn Fn(&Arguments) -> Result<Service> + Send + Sync>;

/// Builds a forwarding stand-in for an id, given a resolver for the real value.
pub type StandInFn =
    Arc<dyn Fn(ServiceId, Box<dyn Fn() -> Result<Service> + Send + Sync>) -> Service + Send + Sync>;

/// A function with a declared [`Signature`].
///
/// The container resolves the signature through the parameter resolver
/// chain, then invokes the body with the result.
#[derive(Clone)]
pub struct Callable {
    signature: Signature,
    func: InvokeFn,
}

impl Callable {
    pub fn new<S, F>(func: F) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&Arguments) -> Result<Arc<S>> + Send + Sync + 'static,
    {
        Self {
            signature: Signature::new(),
            func: Arc::new(move |args| func(args).map(wrap)),
        }
    }

    /// Appends a formal parameter.
    pub fn param(mut self, param: Param) -> Self {
        self.signature = self.signature.param(param);
        self
    }

    #[inline]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn invoke(&self, args: &Arguments) -> Result<Service> {
        (self.func)(args)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// What a factory produces, as far as the container can tell without running it.
#[derive(Clone)]
pub struct OutputType {
    type_name: &'static str,
    stand_in: Option<StandInFn>,
}

impl OutputType {
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether a forwarding stand-in can be built for this type.
    #[inline]
    pub fn supports_forwarding(&self) -> bool {
        self.stand_in.is_some()
    }

    /// Builds a stand-in that obtains the real value from `resolve` on first use.
    pub fn stand_in(
        &self,
        id: ServiceId,
        resolve: Box<dyn Fn() -> Result<Service> + Send + Sync>,
    ) -> Option<Service> {
        self.stand_in.as_ref().map(|build| build(id, resolve))
    }
}

impl fmt::Debug for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputType")
            .field("type_name", &self.type_name)
            .field("forwarding", &self.supports_forwarding())
            .finish()
    }
}

/// Builds one service from resolved parameters.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use wirebox_container::prelude::*;
///
/// struct Pool {
///     size: u32,
/// }
///
/// let factory = Factory::new(|args: &Arguments| {
///     Ok(Arc::new(Pool { size: *args.get::<u32>(0)? }))
/// })
/// .param(Param::named("size").with_default(|| Arc::new(8u32)))
/// .tag("db")
/// .description("Connection pool");
///
/// assert_eq!(factory.signature().len(), 1);
/// ```
#[derive(Clone)]
pub struct Factory {
    callable: Callable,
    output: OutputType,
    attributes: Vec<Attribute>,
}

impl Factory {
    pub fn new<S, F>(func: F) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&Arguments) -> Result<Arc<S>> + Send + Sync + 'static,
    {
        Self {
            callable: Callable::new(func),
            output: OutputType {
                type_name: type_name::<S>(),
                stand_in: None,
            },
            attributes: Vec::new(),
        }
    }

    /// A factory whose output may be replaced by a forwarding stand-in
    /// while a dependency cycle through it is being built.
    pub fn forwarding<S, F>(func: F) -> Self
    where
        S: ?Sized + Forward,
        F: Fn(&Arguments) -> Result<Arc<S>> + Send + Sync + 'static,
    {
        let mut factory = Self::new(func);
        let stand_in: StandInFn = Arc::new(
            |id: ServiceId, resolve: Box<dyn Fn() -> Result<Service> + Send + Sync>| {
                wrap(S::forward(StandIn::<S>::new(id, resolve)))
            },
        );
        factory.output.stand_in = Some(stand_in);
        factory
    }

    /// A factory returning an already built value.
    pub fn value<S: ?Sized + Send + Sync + 'static>(value: Arc<S>) -> Self {
        Self::new(move |_| Ok(value.clone()))
    }

    pub fn param(mut self, param: Param) -> Self {
        self.callable = self.callable.param(param);
        self
    }

    /// Tags the service with priority 0.
    pub fn tag(self, name: impl Into<String>) -> Self {
        self.tag_with_priority(name, 0)
    }

    /// Tags the service; lower priorities are injected first.
    pub fn tag_with_priority(self, name: impl Into<String>, priority: i64) -> Self {
        self.attribute(Attribute::tag(name, priority))
    }

    pub fn description(self, text: impl Into<String>) -> Self {
        self.attribute(Attribute::description(text))
    }

    /// Makes the service also reachable as `alias`.
    pub fn alias(self, alias: impl Into<ServiceId>) -> Self {
        self.attribute(Attribute::alias(alias))
    }

    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    #[inline]
    pub fn callable(&self) -> &Callable {
        &self.callable
    }

    #[inline]
    pub fn signature(&self) -> &Signature {
        self.callable.signature()
    }

    #[inline]
    pub fn output(&self) -> &OutputType {
        &self.output
    }

    #[inline]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("output", &self.output)
            .field("params", &self.signature().len())
            .field("attributes", &self.attributes)
            .finish()
    }
}

/// Decorates an already built service.
///
/// An extension is a list of steps. Each step receives the value produced
/// so far at position 0 (see [`Arguments::previous`]) and its own resolved
/// parameters from position 1 on. Extensions for the same id compose by
/// concatenation, so `a.then(b)` applies `a` first.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use wirebox_container::prelude::*;
///
/// let shout = Extension::new(|name: Arc<String>, _: &Arguments| {
///     Ok(Arc::new(name.to_uppercase()))
/// });
/// let greet = Extension::new(|name: Arc<String>, args: &Arguments| {
///     let greeting = args.get::<String>(1)?;
///     Ok(Arc::new(format!("{greeting}, {name}")))
/// })
/// .param(Param::named("greeting").with_default(|| Arc::new(String::from("Hello"))));
///
/// assert_eq!(shout.then(greet).len(), 2);
/// ```
#[derive(Clone, Default)]
pub struct Extension {
    steps: Vec<Callable>,
}

impl Extension {
    pub fn new<P, T, F>(func: F) -> Self
    where
        P: ?Sized + Send + Sync + 'static,
        T: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<P>, &Arguments) -> Result<Arc<T>> + Send + Sync + 'static,
    {
        let step = Callable::new(move |args| func(args.previous::<P>()?, args))
            .param(Param::named("previous"));
        Self { steps: vec![step] }
    }

    /// Appends a parameter to the last step.
    pub fn param(mut self, param: Param) -> Self {
        if let Some(step) = self.steps.pop() {
            self.steps.push(step.param(param));
        }
        self
    }

    /// Runs `next` after `self`.
    pub fn then(mut self, next: Extension) -> Self {
        self.steps.extend(next.steps);
        self
    }

    #[inline]
    pub fn steps(&self) -> &[Callable] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Debug for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extension").field("steps", &self.steps.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Argument, unwrap};

    #[test]
    fn factory_records_output_type() {
        let factory = Factory::value(Arc::new(5u16));
        assert_eq!(factory.output().type_name(), "u16");
        assert!(!factory.output().supports_forwarding());

        let built = factory.callable().invoke(&Arguments::new()).unwrap();
        assert_eq!(*unwrap::<u16>(&built).unwrap(), 5);
    }

    #[test]
    fn metadata_builders_append_attributes() {
        let factory = Factory::value(Arc::new(()))
            .tag("a")
            .tag_with_priority("b", 3)
            .description("unit")
            .alias("nothing");

        let kinds: Vec<_> = factory.attributes().iter().map(Attribute::kind).collect();
        assert_eq!(kinds, ["tag", "tag", "description", "alias"]);
        assert_eq!(factory.attributes()[1].as_tag().unwrap().priority, 3);
    }

    #[test]
    fn extension_steps_read_previous_value() {
        let ext = Extension::new(|n: Arc<i32>, _: &Arguments| Ok(Arc::new(*n + 1)))
            .then(Extension::new(|n: Arc<i32>, _: &Arguments| Ok(Arc::new(*n * 10))));

        let mut value = wrap(Arc::new(1i32));
        for step in ext.steps() {
            let mut args = Arguments::new();
            args.fill(0, Argument::Value(value));
            value = step.invoke(&args).unwrap();
        }

        assert_eq!(*unwrap::<i32>(&value).unwrap(), 20);
    }

    #[test]
    fn extension_params_follow_previous() {
        let ext = Extension::new(|n: Arc<i32>, _: &Arguments| Ok(n))
            .param(Param::named("offset"))
            .param(Param::named("scale"));

        let names: Vec<_> = ext.steps()[0].signature().params().iter().map(Param::name).collect();
        assert_eq!(names, ["previous", "offset", "scale"]);
    }
}
