//! Layered configuration loading.
//!
//! Sources, lowest priority first:
//!
//! 1. Defaults ([`GearsConfig::default`] or [`ConfigLoader::defaults`])
//! 2. Profile file (`microgears.{profile}.toml` / `.yaml`)
//! 3. Main file (`microgears.toml` / `microgears.yaml`)
//! 4. Environment variables (`MICROGEARS_*`)
//! 5. Overrides ([`ConfigLoader::set`], [`ConfigLoader::merge`])
//!
//! Every layer only replaces the keys it actually sets. `toml-config`
//! *(default)* and `yaml-config` select the file formats that are searched.
//!
//! Environment variables use `__` between keys:
//!
//! - `MICROGEARS_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `MICROGEARS_SERVICES__DEFAULT_CALL_MODE=sync` → `services.default_call_mode = "sync"`
//! - `MICROGEARS_PLUGINS__TRACE__ENABLED=false` → `plugins.trace.enabled = false`
//!
//! `MICROGEARS_PROFILE` selects the profile.
//!
//! ```rust,ignore
//! use microgears_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .profile("production")
//!     .set("plugins.performance.slow_threshold_ms", 100)
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::providers::{Env, Serialized};
#[cfg(any(feature = "toml-config", feature = "yaml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::{Figment, Provider};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::GearsConfig;

const ENV_PREFIX: &str = "MICROGEARS_";
const PROFILE_VAR: &str = "MICROGEARS_PROFILE";
const FILE_STEMS: [&str; 2] = ["microgears", "config"];

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    #[default]
    Development,
    Production,
    Custom(String),
}

impl Profile {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Parses a profile name; `prod` and `dev` are accepted as short forms.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Reads `MICROGEARS_PROFILE`, defaulting to development.
    pub fn from_env() -> Self {
        std::env::var(PROFILE_VAR)
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Config file formats compiled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    #[cfg(feature = "toml-config")]
    Toml,
    #[cfg(feature = "yaml-config")]
    Yaml,
}

impl FileFormat {
    const ENABLED: &'static [FileFormat] = &[
        #[cfg(feature = "toml-config")]
        FileFormat::Toml,
        #[cfg(feature = "yaml-config")]
        FileFormat::Yaml,
    ];

    fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        Self::ENABLED
            .iter()
            .copied()
            .find(|format| format.extensions().contains(&ext))
    }

    fn extensions(self) -> &'static [&'static str] {
        match self {
            #[cfg(feature = "toml-config")]
            Self::Toml => &["toml"],
            #[cfg(feature = "yaml-config")]
            Self::Yaml => &["yaml", "yml"],
        }
    }

    #[allow(unused_variables)]
    fn layer(self, figment: Figment, path: &Path) -> Figment {
        match self {
            #[cfg(feature = "toml-config")]
            Self::Toml => figment.merge(Toml::file(path)),
            #[cfg(feature = "yaml-config")]
            Self::Yaml => figment.merge(Yaml::file(path)),
        }
    }
}

/// Builds a [`GearsConfig`] from defaults, files, the environment and
/// programmatic overrides.
pub struct ConfigLoader {
    defaults: GearsConfig,
    overrides: Figment,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    /// Explicit file; disables the search.
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            defaults: GearsConfig::default(),
            overrides: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Profile::parse(&profile.into());
        self
    }

    /// Adds a directory to search for config files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    pub fn with_current_dir(self) -> Self {
        match std::env::current_dir() {
            Ok(cwd) => self.search_path(cwd),
            Err(_) => self,
        }
    }

    /// Adds `<user config dir>/microgears` to the search paths.
    pub fn with_user_config_dir(self) -> Self {
        match dirs::config_dir() {
            Some(dir) => self.search_path(dir.join("microgears")),
            None => self,
        }
    }

    /// Loads exactly this file instead of searching.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Replaces the base layer. Files, environment and overrides still
    /// apply on top of it.
    pub fn defaults(mut self, config: GearsConfig) -> Self {
        self.defaults = config;
        self
    }

    /// Overrides a single dotted key over every other source.
    ///
    /// ```rust,ignore
    /// let config = ConfigLoader::new()
    ///     .set("plugins.trace.enabled", false)
    ///     .set("logging.level", "debug")
    ///     .load()?;
    /// ```
    pub fn set<T: Serialize>(self, key: &str, value: T) -> Self {
        self.merge(Serialized::default(key, value))
    }

    /// Merges a provider over every other source. Only the keys the
    /// provider sets are overridden.
    pub fn merge<P: Provider>(mut self, provider: P) -> Self {
        self.overrides = self.overrides.merge(provider);
        self
    }

    /// Loads and returns the configuration.
    pub fn load(self) -> ConfigResult<GearsConfig> {
        let profile = self.profile.clone();
        let config: GearsConfig = self.figment()?.extract().map_err(|e| {
            ConfigError::ParseError(format!("Failed to extract configuration: {e}"))
        })?;

        debug!(
            profile = %profile,
            logging_level = %config.logging.level,
            default_call_mode = %config.services.default_call_mode,
            "Configuration loaded"
        );
        Ok(config)
    }

    fn figment(self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(self.defaults.clone()));

        figment = match &self.config_file {
            Some(path) => Self::layer_file(figment, path)?,
            None => self.layer_search(figment),
        };

        if self.load_env {
            trace!(prefix = ENV_PREFIX, "Layering environment variables");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        Ok(figment.merge(self.overrides))
    }

    fn layer_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        let format = FileFormat::from_path(path).ok_or_else(|| {
            ConfigError::ParseError(format!(
                "Unsupported or disabled configuration file format: {}",
                path.display()
            ))
        })?;
        info!(path = %path.display(), "Loading configuration file");
        Ok(format.layer(figment, path))
    }

    fn search_dirs(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        std::env::current_dir()
            .ok()
            .into_iter()
            .chain(dirs::config_dir().map(|dir| dir.join("microgears")))
            .collect()
    }

    /// Searches every enabled format. Within a format the first main file
    /// found ends the search; a profile file next to a candidate is layered
    /// just below it.
    fn layer_search(&self, mut figment: Figment) -> Figment {
        let dirs = self.search_dirs();
        let mut found = false;

        for &format in FileFormat::ENABLED {
            'format: for dir in &dirs {
                for stem in FILE_STEMS {
                    for ext in format.extensions() {
                        let profiled = dir.join(format!("{stem}.{}.{ext}", self.profile));
                        if profiled.exists() {
                            debug!(path = %profiled.display(), "Loading profile configuration");
                            figment = format.layer(figment, &profiled);
                            found = true;
                        }

                        let main = dir.join(format!("{stem}.{ext}"));
                        if main.exists() {
                            info!(path = %main.display(), "Loading configuration file");
                            figment = format.layer(figment, &main);
                            found = true;
                            break 'format;
                        }
                    }
                }
            }
        }

        if !found {
            warn!(paths = ?dirs, "No configuration file found, using defaults");
        }
        figment
    }
}

/// Loads the configuration from the default locations and the environment.
pub fn load_config() -> ConfigResult<GearsConfig> {
    ConfigLoader::new().load()
}

/// Loads `path` plus environment overrides.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<GearsConfig> {
    ConfigLoader::new().file(path).load()
}
