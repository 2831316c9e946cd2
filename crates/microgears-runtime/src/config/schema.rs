//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use microgears_core::CallMode;
use microgears_framework::GearsOptions;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GearsConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Defaults applied to every mounted service.
    #[serde(default)]
    pub services: ServicesConfig,

    /// Built-in plugin switches.
    #[serde(default)]
    pub plugins: PluginsConfig,
}

// =============================================================================
// Logging
// =============================================================================

/// Log level accepted in configuration files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Newline-delimited JSON. Needs the `json-log` feature; falls back to
    /// `Full` without it.
    Json,
}

/// Where log lines are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    /// Append to `logging.file_path`.
    File,
}

/// Which span lifecycle events are logged.
///
/// Every intercepted call runs in a `gear_call` span, so enabling `new` and
/// `close` gives one line per call with its total busy time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base level. `RUST_LOG` takes precedence when set.
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Include thread ids in every line.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line number in every line.
    #[serde(default)]
    pub file_location: bool,

    /// Log file used with `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Per-target levels, e.g. `microgears_framework = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,
}

// =============================================================================
// Services
// =============================================================================

/// Defaults applied when services are mounted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    /// Call mode of services that do not request one.
    #[serde(default)]
    pub default_call_mode: CallMode,

    /// Prefix marking methods that bypass the plugin chain.
    #[serde(default = "default_private_prefix")]
    pub private_prefix: String,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            default_call_mode: CallMode::default(),
            private_prefix: default_private_prefix(),
        }
    }
}

impl ServicesConfig {
    /// Registry options matching this section.
    pub fn to_options(&self) -> GearsOptions {
        GearsOptions {
            default_call_mode: self.default_call_mode,
            private_prefix: self.private_prefix.clone(),
        }
    }
}

fn default_private_prefix() -> String {
    "_".to_string()
}

// =============================================================================
// Plugins
// =============================================================================

/// Switches and settings of the built-in plugins.
///
/// Ignored when the runtime is built without the `builtin-plugins` feature.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginsConfig {
    #[serde(default)]
    pub trace: TracePluginConfig,

    #[serde(default)]
    pub performance: PerformancePluginConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracePluginConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for TracePluginConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformancePluginConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Calls at least this slow are logged at `warn` level.
    #[serde(default = "default_slow_threshold_ms")]
    pub slow_threshold_ms: u64,
}

impl Default for PerformancePluginConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            slow_threshold_ms: default_slow_threshold_ms(),
        }
    }
}

impl PerformancePluginConfig {
    pub fn slow_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_threshold_ms)
    }
}

fn default_enabled() -> bool {
    true
}

fn default_slow_threshold_ms() -> u64 {
    500
}
