//! Runtime wiring: configuration, logging and the plugin registry.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use microgears_runtime::GearsRuntime;
//!
//! // Loads microgears.toml from the current directory (if any)
//! let runtime = GearsRuntime::new()?;
//!
//! let runtime = GearsRuntime::builder()
//!     .config_file("config/microgears.toml")
//!     .profile("production")
//!     .build()?;
//!
//! let users = runtime.gears().add_service(user_service())?;
//! ```

use std::sync::Arc;

use tracing::{debug, info};

use microgears_core::RegistryResult;
use microgears_framework::MicroGears;

use crate::config::{ConfigLoader, GearsConfig, validate_config};
use crate::error::RuntimeResult;
use crate::logging;

/// A [`MicroGears`] registry set up from configuration.
///
/// Building a runtime initializes logging, applies the `services` defaults
/// and registers the enabled built-in plugins before any user plugin.
pub struct GearsRuntime {
    config: GearsConfig,
    gears: Arc<MicroGears>,
}

impl GearsRuntime {
    /// Creates a runtime from the configuration found in the current
    /// directory, the user config directory and the environment.
    ///
    /// A configuration that cannot be loaded is reported and replaced by
    /// the defaults; an invalid one is an error.
    pub fn new() -> RuntimeResult<Self> {
        let config = ConfigLoader::new()
            .with_current_dir()
            .with_user_config_dir()
            .load()
            .unwrap_or_else(|e| {
                eprintln!("Warning: Failed to load config ({e}), using defaults");
                GearsConfig::default()
            });

        Self::from_config(config)
    }

    /// Creates a runtime builder for custom configuration.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from an already loaded configuration.
    pub fn from_config(config: GearsConfig) -> RuntimeResult<Self> {
        validate_config(&config)?;
        logging::init_from_config(&config.logging);

        let runtime = Self {
            gears: Arc::new(MicroGears::with_options(config.services.to_options())),
            config,
        };
        runtime.install_builtins()?;

        info!(
            log_level = %runtime.config.logging.level,
            default_call_mode = %runtime.config.services.default_call_mode,
            plugins = ?runtime.gears.plugin_names(),
            "MicroGears runtime ready"
        );
        Ok(runtime)
    }

    pub fn config(&self) -> &GearsConfig {
        &self.config
    }

    /// The registry. Clone the `Arc` to share it with other tasks.
    pub fn gears(&self) -> &Arc<MicroGears> {
        &self.gears
    }

    /// Resets the registry and re-installs the configured built-in plugins.
    ///
    /// See [`MicroGears::reset`].
    pub fn reset(&self) -> RuntimeResult<()> {
        self.gears.reset();
        self.install_builtins()?;
        Ok(())
    }

    #[cfg(feature = "builtin-plugins")]
    fn install_builtins(&self) -> RegistryResult<()> {
        use microgears_framework::plugin::builtin::{
            PERFORMANCE_PLUGIN_NAME, TRACE_PLUGIN, TRACE_PLUGIN_NAME, performance_plugin,
        };

        let plugins = &self.config.plugins;
        if plugins.trace.enabled && !self.gears.has_plugin(TRACE_PLUGIN_NAME) {
            self.gears.add_plugin(&TRACE_PLUGIN)?;
        }
        if plugins.performance.enabled && !self.gears.has_plugin(PERFORMANCE_PLUGIN_NAME) {
            self.gears
                .add_plugin(performance_plugin(plugins.performance.slow_threshold()))?;
        }
        Ok(())
    }

    #[cfg(not(feature = "builtin-plugins"))]
    fn install_builtins(&self) -> RegistryResult<()> {
        let plugins = &self.config.plugins;
        if plugins.trace.enabled || plugins.performance.enabled {
            debug!("Built-in plugins not compiled in, skipping");
        }
        Ok(())
    }
}

impl std::fmt::Debug for GearsRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GearsRuntime")
            .field("config", &self.config)
            .field("gears", &self.gears)
            .finish()
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for creating a [`GearsRuntime`] with custom configuration.
///
/// ```rust,ignore
/// let runtime = GearsRuntime::builder()
///     .config_file("config/production.toml")
///     .profile("production")
///     .build()?;
/// ```
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Enables loading environment variables (enabled by default).
    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Replaces the base configuration that files and the environment
    /// apply on top of.
    pub fn defaults(mut self, config: GearsConfig) -> Self {
        self.config_loader = self.config_loader.defaults(config);
        self
    }

    /// Overrides a single dotted key over every other source.
    pub fn set<T: serde::Serialize>(mut self, key: &str, value: T) -> Self {
        self.config_loader = self.config_loader.set(key, value);
        self
    }

    /// Merges a provider over every other source.
    pub fn merge<P: figment::Provider>(mut self, provider: P) -> Self {
        self.config_loader = self.config_loader.merge(provider);
        self
    }

    /// Loads the configuration and builds the runtime.
    pub fn build(self) -> RuntimeResult<GearsRuntime> {
        let config = self.config_loader.load()?;
        debug!("Building runtime from loaded configuration");
        GearsRuntime::from_config(config)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
