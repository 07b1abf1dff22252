//! Core container implementation for wirebox.
//!
//! Services are built by a stack of layers, outermost first: alias
//! rewriting, memoization, cycle breaking, then autowiring.
//! [`Container`] fronts the stack; providers describe what goes in it.

pub mod alias;
pub mod attribute;
pub mod autowire;
pub mod autowiring;
pub mod cache;
pub mod callable;
pub mod circular;
pub mod container;
pub mod error;
pub mod id;
pub mod metadata;
pub mod provider;
pub mod report;
pub mod resolver;
pub mod signature;
pub mod source;
pub mod stack;
pub mod stand_in;
pub mod value;

pub use attribute::{Attribute, AttributeFilter, AttributeValue, Tag};
pub use autowire::{Autowire, Constructor, TypeCatalog};
pub use callable::{Callable, Extension, Factory};
pub use container::{CALL_OWNER, Container, ContainerBuilder, ContainerRef, Settings, prelude};
pub use error::{BootstrapError, Result, WireError};
pub use id::ServiceId;
pub use metadata::MetadataIndex;
pub use provider::{AggregateProvider, Provider, ServiceProvider};
pub use report::ReportRow;
pub use signature::{Param, Signature};
pub use stand_in::{Forward, StandIn};
pub use value::{Argument, Arguments, Service, ServiceList, unwrap, wrap};

// Generated code names `inventory` through this re-export.
#[doc(hidden)]
pub use inventory;
