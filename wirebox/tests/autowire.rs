use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use wirebox::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct Clock;

struct AuditLog;

struct Retries(u8);

impl Default for Retries {
    fn default() -> Self {
        Self(3)
    }
}

#[derive(Autowire)]
struct Scheduler {
    clock: Arc<Clock>,
    audit: Option<Arc<AuditLog>>,
    #[autowire(skip)]
    ticks: AtomicU32,
}

#[derive(Autowire)]
struct Ticker(Arc<Clock>);

#[derive(Autowire)]
#[autowire(no_catalog)]
struct Manual {
    clock: Arc<Clock>,
}

trait Plugin: Send + Sync {
    fn name(&self) -> &str;
}

struct Named(&'static str);

impl Plugin for Named {
    fn name(&self) -> &str {
        self.0
    }
}

#[derive(Autowire)]
struct Host {
    #[autowire(tagged = "plugin")]
    plugins: Vec<Arc<dyn Plugin>>,
}

#[derive(Autowire)]
struct Dispatcher {
    #[autowire(id = "clock.primary")]
    clock: Arc<Clock>,
    #[autowire(with_attr = "listener")]
    listeners: Vec<Arc<dyn Plugin>>,
}

#[derive(Autowire)]
struct Shutdown {
    #[autowire(with_attr(kind = "listener", event = "stop"))]
    listener: Arc<dyn Plugin>,
}

#[derive(Autowire)]
struct Worker {
    #[autowire(default)]
    retries: Arc<Retries>,
}

fn clock_provider() -> ServiceProvider {
    ServiceProvider::new("clock").factory(ServiceId::of::<Clock>(), Factory::value(Arc::new(Clock)))
}

fn build(provider: ServiceProvider) -> Container {
    init_tracing();
    Container::builder().provider(provider).build().unwrap()
}

#[test]
fn derived_signature_lists_fields() {
    let signature = Scheduler::signature();
    let names: Vec<_> = signature.params().iter().map(Param::name).collect();

    assert_eq!(names, ["clock", "audit"]);
    assert!(!signature.params()[0].is_nullable());
    assert!(signature.params()[1].is_nullable());
    assert_eq!(
        signature.params()[0].declared_type().map(|ty| ty.id().clone()),
        Some(ServiceId::of::<Clock>())
    );
}

#[test]
fn tuple_fields_are_named_by_position() {
    let signature = Ticker::signature();
    assert_eq!(signature.params()[0].name(), "0");
}

#[test]
fn discovered_type_resolves_without_factory() {
    let container = build(clock_provider());

    assert!(!container.has(&ServiceId::of::<Scheduler>()));
    assert!(container.can_autowire(&ServiceId::of::<Scheduler>()));

    let scheduler = container.resolve::<Scheduler>().unwrap();
    assert!(Arc::ptr_eq(&scheduler.clock, &container.resolve::<Clock>().unwrap()));
    assert!(scheduler.audit.is_none());
    assert_eq!(scheduler.ticks.load(Ordering::SeqCst), 0);

    // Autowired instances are cached like any other.
    assert!(Arc::ptr_eq(&scheduler, &container.resolve::<Scheduler>().unwrap()));
}

#[test]
fn nullable_field_takes_registered_service() {
    let container = build(
        clock_provider().factory(ServiceId::of::<AuditLog>(), Factory::value(Arc::new(AuditLog))),
    );

    let scheduler = container.resolve::<Scheduler>().unwrap();
    assert!(scheduler.audit.is_some());
}

#[test]
fn tuple_struct_resolves() {
    let container = build(clock_provider());
    let ticker = container.resolve::<Ticker>().unwrap();
    assert!(Arc::ptr_eq(&ticker.0, &container.resolve::<Clock>().unwrap()));
}

#[test]
fn discovery_can_be_turned_off() {
    let container = Container::builder()
        .provider(clock_provider())
        .discover_constructors(false)
        .build()
        .unwrap();

    assert!(matches!(container.resolve::<Scheduler>(), Err(WireError::NotFound(_))));
}

#[test]
fn uncataloged_type_needs_explicit_registration() {
    let container = build(clock_provider());
    assert!(matches!(container.resolve::<Manual>(), Err(WireError::NotFound(_))));

    let container = Container::builder()
        .provider(clock_provider())
        .autowire::<Manual>()
        .build()
        .unwrap();
    assert!(container.resolve::<Manual>().is_ok());
}

#[test]
fn missing_dependency_names_the_parameter() {
    let container = Container::builder().discover_constructors(false).autowire::<Ticker>().build().unwrap();

    // `Ticker` is not `Debug`, so the result cannot be unwrapped directly.
    let Err(err) = container.resolve::<Ticker>() else {
        panic!("Expected resolving Ticker to fail");
    };
    match err {
        WireError::Autowiring(err) => {
            assert_eq!(err.service, ServiceId::of::<Ticker>());
            assert_eq!(err.parameter, "0");
            assert_eq!(err.position, 0);
        }
        other => panic!("Expected Autowiring, got: {other:?}"),
    }
}

#[test]
fn tagged_field_is_ordered_by_priority() {
    let plugin = |name: &'static str| Factory::value(Arc::new(Named(name)) as Arc<dyn Plugin>);
    let container = build(
        ServiceProvider::new("plugins")
            .factory("late", plugin("late").tag_with_priority("plugin", 50))
            .factory("first", plugin("first").tag_with_priority("plugin", -5))
            .factory("tie.a", plugin("tie.a").tag_with_priority("plugin", 10))
            .factory("tie.b", plugin("tie.b").tag_with_priority("plugin", 10))
            .factory("untagged", plugin("untagged")),
    );

    let host = container.resolve::<Host>().unwrap();
    let names: Vec<_> = host.plugins.iter().map(|plugin| plugin.name()).collect();
    assert_eq!(names, ["first", "tie.a", "tie.b", "late"]);
}

#[test]
fn explicit_id_and_attribute_match() {
    let listener = |name: &'static str| {
        Factory::value(Arc::new(Named(name)) as Arc<dyn Plugin>)
            .attribute(Attribute::new("listener").with("event", name))
    };
    let container = build(
        ServiceProvider::new("app")
            .factory("clock.primary", Factory::value(Arc::new(Clock)))
            .factory("on.start", listener("start"))
            .factory("on.stop", listener("stop")),
    );

    let dispatcher = container.resolve::<Dispatcher>().unwrap();
    assert!(Arc::ptr_eq(
        &dispatcher.clock,
        &container.get_as::<Clock>(&"clock.primary".into()).unwrap()
    ));
    let names: Vec<_> = dispatcher.listeners.iter().map(|plugin| plugin.name()).collect();
    assert_eq!(names, ["start", "stop"]);

    let shutdown = container.resolve::<Shutdown>().unwrap();
    assert_eq!(shutdown.listener.name(), "stop");
}

#[test]
fn default_applies_when_nothing_is_registered() {
    let container = build(ServiceProvider::new("empty"));
    assert_eq!(container.resolve::<Worker>().unwrap().retries.0, 3);

    let container = build(
        ServiceProvider::new("tuned").factory(ServiceId::of::<Retries>(), Factory::value(Arc::new(Retries(7)))),
    );
    assert_eq!(container.resolve::<Worker>().unwrap().retries.0, 7);
}

#[derive(Autowire)]
#[autowire(no_catalog)]
struct Limits {
    #[autowire(default)]
    retries: Arc<Retries>,
    audit: Option<Arc<AuditLog>>,
}

struct Client {
    limits: Arc<Limits>,
}

#[test]
fn dependency_free_type_is_built_in_place() {
    let client = || {
        Factory::new(|args: &Arguments| Ok(Arc::new(Client { limits: args.get(0)? })))
            .param(Param::autowired::<Limits>("limits"))
    };
    let container = build(ServiceProvider::new("app").factory("a", client()).factory("b", client()));

    let a = container.get_as::<Client>(&"a".into()).unwrap();
    let b = container.get_as::<Client>(&"b".into()).unwrap();

    assert_eq!(a.limits.retries.0, 3);
    assert!(a.limits.audit.is_none());
    // Neither registered nor cached.
    assert!(!Arc::ptr_eq(&a.limits, &b.limits));
    assert!(!container.has(&ServiceId::of::<Limits>()));
}

#[test]
fn extension_applies_to_autowired_instance() {
    let applied = Arc::new(AtomicU32::new(0));
    let provider = clock_provider().extend(
        ServiceId::of::<Ticker>(),
        Extension::new({
            let applied = applied.clone();
            move |ticker: Arc<Ticker>, _: &Arguments| {
                applied.fetch_add(1, Ordering::SeqCst);
                Ok(ticker)
            }
        }),
    );
    let container = build(provider);

    container.resolve::<Ticker>().unwrap();
    container.resolve::<Ticker>().unwrap();
    assert_eq!(applied.load(Ordering::SeqCst), 1);
}
