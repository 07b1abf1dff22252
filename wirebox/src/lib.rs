//! # Wirebox: an autowiring dependency-resolution container
//!
//! Services are registered by providers as factories with declared
//! parameter lists, or autowired from `#[derive(Autowire)]` types.
//! Resolution memoizes every service, applies registered extensions, and
//! breaks dependency cycles through `#[forward]` traits with lazily
//! resolving stand-ins.
//!
//! ```rust
//! use std::sync::Arc;
//! use wirebox::prelude::*;
//!
//! struct Clock;
//!
//! #[derive(Autowire)]
//! struct Scheduler {
//!     clock: Arc<Clock>,
//! }
//!
//! let container = Container::builder()
//!     .provider(ServiceProvider::new("app").factory(ServiceId::of::<Clock>(), Factory::value(Arc::new(Clock))))
//!     .build()
//!     .unwrap();
//!
//! let scheduler = container.resolve::<Scheduler>().unwrap();
//! assert!(Arc::ptr_eq(&scheduler.clock, &container.resolve::<Clock>().unwrap()));
//! ```

pub use wirebox_container::*;
pub use wirebox_derive::*;
pub use wirebox_support::rendering;

pub mod prelude {
    pub use wirebox_container::prelude::*;
    pub use wirebox_derive::{Autowire, forward};
}
