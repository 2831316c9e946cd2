//! Unified error types for MicroGears.
//!
//! Registration problems are reported synchronously as [`RegistryError`].
//! Failures that happen while a call runs through its chain are shared
//! between every after-hook and the caller, who finally receives them as
//! [`InvokeError::Failed`].

use std::fmt;

use thiserror::Error;

use super::meta::SharedError;

// =============================================================================
// Registration Errors
// =============================================================================

/// Errors raised while registering or removing services and plugins.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A plugin declared neither a before-hook nor an after-hook.
    #[error("plugin '{name}' must provide a beforeChain or afterChain hook")]
    InvalidPlugin {
        /// Name of the rejected plugin (may be empty).
        name: String,
    },

    /// A plugin was registered without a name.
    #[error("plugin must have a name")]
    MissingName,

    /// A plugin with the same name is already registered.
    #[error("plugin '{0}' is already defined")]
    DuplicateName(String),

    /// No plugin with the given name is registered.
    #[error("plugin '{0}' does not exist")]
    UnknownPlugin(String),

    /// A service was registered without a name.
    #[error("service must have a name")]
    MissingServiceName,

    /// A service was registered without a namespace.
    #[error("service '{service}' must have a namespace")]
    MissingNamespace {
        /// Name of the rejected service.
        service: String,
    },

    /// A service with the same name is already registered.
    #[error("service '{0}' is already registered")]
    DuplicateServiceName(String),
}

impl RegistryError {
    /// Creates an invalid plugin error.
    pub fn invalid_plugin(name: impl Into<String>) -> Self {
        Self::InvalidPlugin { name: name.into() }
    }

    /// Creates a missing namespace error.
    pub fn missing_namespace(service: impl Into<String>) -> Self {
        Self::MissingNamespace {
            service: service.into(),
        }
    }
}

// =============================================================================
// Chain Errors
// =============================================================================

/// Stage of a chain in which something happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainStage {
    /// A plugin's before-hook.
    Before,
    /// The intercepted service method.
    Target,
    /// A plugin's after-hook.
    After,
}

impl ChainStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Before => "beforeChain",
            Self::Target => "target",
            Self::After => "afterChain",
        }
    }
}

impl fmt::Display for ChainStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A hook of a synchronous service returned a pending value.
///
/// Synchronous chains run every stage immediately; only the target method
/// may hand back a pending value (which turns the rest of the call into a
/// deferred continuation).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("plugin '{plugin}' returned a pending value from {stage} in a synchronous service")]
pub struct UnexpectedDeferred {
    /// Name of the offending plugin.
    pub plugin: String,
    /// Hook that returned the pending value.
    pub stage: ChainStage,
}

// =============================================================================
// Invocation Errors
// =============================================================================

/// Errors delivered to the caller of a service method.
#[derive(Debug, Clone, Error)]
pub enum InvokeError {
    /// No service is registered under the given name.
    #[error("service '{0}' is not registered")]
    UnknownService(String),

    /// The service has no method with the given name.
    #[error("service '{service}' has no method '{method}'")]
    UnknownMethod {
        /// Service that was called.
        service: String,
        /// Method that was requested.
        method: String,
    },

    /// A hook or the target method failed.
    #[error(transparent)]
    Failed(SharedError),
}

impl InvokeError {
    /// Creates an unknown method error.
    pub fn unknown_method(service: impl Into<String>, method: impl Into<String>) -> Self {
        Self::UnknownMethod {
            service: service.into(),
            method: method.into(),
        }
    }

    /// The error raised inside the chain, if this is a chain failure.
    pub fn failure(&self) -> Option<&SharedError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Downcasts the chain failure to a concrete error type.
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.failure().and_then(|err| err.downcast_ref::<E>())
    }

    /// Returns `true` if the chain failure is of type `E`.
    pub fn is<E: std::error::Error + 'static>(&self) -> bool {
        self.downcast_ref::<E>().is_some()
    }
}

impl From<SharedError> for InvokeError {
    fn from(err: SharedError) -> Self {
        Self::Failed(err)
    }
}

// =============================================================================
// Argument Errors
// =============================================================================

/// Errors raised when extracting typed values from call arguments.
#[derive(Debug, Error)]
pub enum ArgumentError {
    /// There is no argument at the requested position.
    #[error("missing argument {index} (call has {len})")]
    Missing {
        /// Requested position.
        index: usize,
        /// Number of arguments the call carried.
        len: usize,
    },

    /// The argument does not have the requested shape.
    #[error("invalid argument {index}: {source}")]
    Invalid {
        /// Requested position.
        index: usize,
        /// Deserialisation failure.
        #[source]
        source: serde_json::Error,
    },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Result type for service calls.
pub type InvokeResult<T> = Result<T, InvokeError>;

/// Result type for argument extraction.
pub type ArgumentResult<T> = Result<T, ArgumentError>;
