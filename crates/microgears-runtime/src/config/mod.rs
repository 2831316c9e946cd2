//! Configuration module for the MicroGears runtime.
//!
//! This module provides layered configuration loading (files, environment,
//! programmatic overrides) and validation for logging, service defaults and
//! the built-in plugins.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    GearsConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, PerformancePluginConfig,
    PluginsConfig, ServicesConfig, SpanEventConfig, TracePluginConfig,
};
pub use validation::validate_config;
