//! Runtime error types.

use thiserror::Error;

use microgears_core::RegistryError;

use crate::config::ConfigError;

/// Errors that can occur while building or resetting a runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A built-in plugin could not be registered.
    #[error("Failed to install built-in plugins: {0}")]
    Registry(#[from] RegistryError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
