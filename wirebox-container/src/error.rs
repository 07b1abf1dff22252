//! Error types for wirebox container operations.
//!
//! Every failure of a `get` call unwinds as one [`WireError`]. The payload
//! structs carry enough context (requested id, parameter, detected chain)
//! to render an actionable message.

use std::fmt;

use wirebox_support::rendering::{render_chain, shorten_type_name};

use crate::id::ServiceId;

/// Main error type for all wirebox operations.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The id has no factory and is not an autowirable type.
    #[error("{}", .0)]
    NotFound(NotFoundError),

    /// A factory or constructor parameter could not be resolved.
    #[error("{}", .0)]
    Autowiring(AutowiringError),

    /// The container could not be assembled.
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    /// A cycle was detected but no stand-in could be built for it.
    #[error("{}", .0)]
    CycleBreak(CycleBreakError),

    /// A cycle was detected while cycle breaking is disabled.
    #[error("{}", .0)]
    CircularDependency(CircularDependencyError),

    /// A service was accessed while its own construction was still running.
    #[error(
        "Service {id} was requested again before it was first instantiated\n  \
         Hint: a stand-in for {id} was used inside the constructor of one of its dependencies"
    )]
    UsedBeforeReady { id: ServiceId },

    /// The resolved value is not of the requested type.
    #[error("Service {id} is not of type {expected}")]
    TypeMismatch {
        id: ServiceId,
        expected: &'static str,
    },

    /// A factory read an argument that was missing or of the wrong type.
    #[error("Argument #{position}: {reason}")]
    Argument { position: usize, reason: String },

    /// A factory returned its own error.
    #[error("Failed to construct {id}: {source}")]
    ConstructionFailed {
        id: ServiceId,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A [`ContainerRef`](crate::container::ContainerRef) outlived its container.
    #[error("The container behind this handle is gone")]
    ContainerDropped,
}

impl WireError {
    /// Wraps an error raised by user code inside a factory.
    pub fn construction(
        id: impl Into<ServiceId>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::ConstructionFailed {
            id: id.into(),
            source: source.into(),
        }
    }

    /// Records which service needed the missing one, if not already known.
    pub(crate) fn required_by(self, owner: &ServiceId) -> Self {
        match self {
            Self::NotFound(mut err) if err.required_by.is_none() && &err.requested != owner => {
                err.required_by = Some(owner.clone());
                Self::NotFound(err)
            }
            other => other,
        }
    }
}

/// Error when an id can be neither built from a factory nor autowired.
#[derive(Debug)]
pub struct NotFoundError {
    /// The id that was requested.
    pub requested: ServiceId,
    /// The service whose parameter asked for it, if any.
    pub required_by: Option<ServiceId>,
    /// Registered ids that look alike ("did you mean?").
    pub suggestions: Vec<ServiceId>,
}

impl fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Service id '{}' not found in container", self.requested)?;

        if let Some(ref parent) = self.required_by {
            write!(f, "\n  Required by: {parent}")?;
        }

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        write!(
            f,
            "\n  Hint: register a factory for it, or derive Autowire on {}",
            shorten_type_name(self.requested.as_str())
        )
    }
}

/// Error when a parameter is left unresolved by every strategy.
#[derive(Debug)]
pub struct AutowiringError {
    /// The service being built.
    pub service: ServiceId,
    /// Name of the unresolved parameter.
    pub parameter: String,
    /// Zero-based position of the parameter.
    pub position: usize,
    /// Declared type of the parameter, if it has one.
    pub declared_type: Option<ServiceId>,
}

impl fmt::Display for AutowiringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Service '{}' could not be auto-wired: parameter #{} `{}`",
            self.service, self.position, self.parameter
        )?;
        match self.declared_type {
            Some(ref ty) => write!(f, " of type {ty} has no registered or constructible provider"),
            None => write!(f, " has no marker, type, default or null fallback"),
        }
    }
}

/// Failures raised once, while building the container.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// An alias shadows a service that is registered under that name.
    #[error(
        "Cannot create alias {alias} of service {service} because a service of the same name is already defined"
    )]
    AliasCollision { alias: ServiceId, service: ServiceId },

    /// Two services claim the same alias.
    #[error("Alias {alias} is declared by both {first} and {second}")]
    AmbiguousAlias {
        alias: ServiceId,
        first: ServiceId,
        second: ServiceId,
    },

    /// Overriding is disabled and two providers define the same id.
    #[error(
        "Service {id} is defined again by provider {provider}\n  \
         Hint: enable allow_override in the container settings to let later providers win"
    )]
    DuplicateFactory { id: ServiceId, provider: String },
}

/// Error when a real cycle is found but no stand-in can be built.
///
/// Carries the full in-flight chain so the loop is visible.
#[derive(Debug)]
pub struct CycleBreakError {
    /// The service that was requested again.
    pub id: ServiceId,
    /// The resolution stack at detection time, ending with `id`.
    pub chain: Vec<ServiceId>,
    /// Why no stand-in could be built.
    pub reason: String,
}

impl fmt::Display for CycleBreakError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Recursive dependency chain detected at service \"{}\". Breaking the chain with a stand-in has failed: {}",
            self.id, self.reason
        )?;
        write!(f, "\n  Chain: {}", render_chain(&self.chain))?;
        write!(
            f,
            "\n  Hint: either refactor the services to remove the recursion, \
             or register {} with Factory::forwarding for a #[forward] trait",
            self.id
        )
    }
}

/// Error when a cycle is detected and cycle breaking is turned off.
#[derive(Debug)]
pub struct CircularDependencyError {
    /// The chain of ids that forms the cycle, e.g. `[A, B, A]`.
    pub chain: Vec<ServiceId>,
}

impl fmt::Display for CircularDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Circular dependency detected:\n  {}", render_chain(&self.chain))?;
        write!(
            f,
            "\n  Hint: enable break_cycles in the container settings or restructure the services"
        )
    }
}

/// Convenient Result type for wirebox operations.
pub type Result<T> = std::result::Result<T, WireError>;
