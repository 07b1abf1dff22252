//! Basic example of the wirebox container.

use std::sync::Arc;

use wirebox::prelude::*;

// === Define your traits and types ===

#[forward]
trait Logger: Send + Sync {
    fn log(&self, msg: &str);
}

struct ConsoleLogger {
    prefix: String,
}

impl Logger for ConsoleLogger {
    fn log(&self, msg: &str) {
        println!("[{}] {msg}", self.prefix);
    }
}

struct Config {
    database_url: String,
}

struct Database {
    url: String,
    logger: Arc<dyn Logger>,
}

impl Database {
    fn query(&self, sql: &str) -> String {
        self.logger.log(&format!("Executing: {sql}"));
        format!("Results from {}", self.url)
    }
}

trait Plugin: Send + Sync {
    fn name(&self) -> &str;
}

struct Audit;

impl Plugin for Audit {
    fn name(&self) -> &str {
        "audit"
    }
}

struct Metrics;

impl Plugin for Metrics {
    fn name(&self) -> &str {
        "metrics"
    }
}

// No factory: built from its fields.
#[derive(Autowire)]
struct UserService {
    db: Arc<Database>,
    #[autowire(id = "logger")]
    logger: Arc<dyn Logger>,
    #[autowire(tagged = "plugin")]
    plugins: Vec<Arc<dyn Plugin>>,
}

impl UserService {
    fn get_user(&self, id: u64) -> String {
        let plugins: Vec<_> = self.plugins.iter().map(|plugin| plugin.name()).collect();
        self.logger.log(&format!("Getting user {id} (plugins: {plugins:?})"));
        self.db.query(&format!("SELECT * FROM users WHERE id = {id}"))
    }
}

// === Group registrations into a provider ===

struct AppProvider;

impl Provider for AppProvider {
    fn factories(&self) -> Vec<(ServiceId, Factory)> {
        vec![
            (
                ServiceId::of::<Config>(),
                Factory::value(Arc::new(Config {
                    database_url: "postgres://localhost/myapp".to_string(),
                })),
            ),
            (
                "logger".into(),
                Factory::forwarding(|_: &Arguments| {
                    Ok(Arc::new(ConsoleLogger { prefix: "LOG".into() }) as Arc<dyn Logger>)
                })
                .description("Writes to stdout"),
            ),
            (
                ServiceId::of::<Database>(),
                Factory::new(|args: &Arguments| {
                    let config = args.get::<Config>(0)?;
                    Ok(Arc::new(Database {
                        url: config.database_url.clone(),
                        logger: args.get(1)?,
                    }))
                })
                .param(Param::of::<Config>("config"))
                .param(Param::named("logger").id("logger"))
                .alias("db"),
            ),
            (
                "plugin.metrics".into(),
                Factory::value(Arc::new(Metrics) as Arc<dyn Plugin>).tag_with_priority("plugin", 20),
            ),
            (
                "plugin.audit".into(),
                Factory::value(Arc::new(Audit) as Arc<dyn Plugin>).tag_with_priority("plugin", 10),
            ),
        ]
    }

    fn extensions(&self) -> Vec<(ServiceId, Extension)> {
        vec![(
            "logger".into(),
            Extension::new(|inner: Arc<dyn Logger>, _: &Arguments| {
                inner.log("logger decorated");
                Ok(inner)
            }),
        )]
    }

    fn name(&self) -> &str {
        "app"
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("wirebox=debug,wirebox_container=debug")
        .init();

    let container = Container::builder().provider(AppProvider).build()?;

    println!("✅ Container built successfully!");
    println!("{container:?}");

    let service = container.resolve::<UserService>()?;
    println!("👤 {}", service.get_user(42));

    let db = container.get_as::<Database>(&"db".into())?;
    println!("🔗 Alias 'db' reaches the same database: {}", Arc::ptr_eq(&db, &service.db));

    println!("\n📋 Registered services:");
    for row in container.report() {
        println!(
            "  {:<28} {:<10} {:<14} {}",
            row.id,
            row.module,
            row.return_type,
            row.description.unwrap_or_default()
        );
    }

    let json = serde_json::to_string_pretty(&container.report()).map_err(|err| WireError::construction("report", err))?;
    println!("\n{json}");

    println!("\n🎉 Everything works!");
    Ok(())
}
