//! Built-in plugins shipped with the MicroGears framework.
//!
//! These plugins are enabled by the `builtin-plugins` feature flag and cover
//! the two cross-cutting concerns nearly every service wants.
//!
//! | Plugin | Name | Description |
//! |--------|------|-------------|
//! | [`TRACE_PLUGIN`] | `"tracePlugin"` | Logs entry and exit of every call |
//! | [`performance_plugin`] | `"performancePlugin"` | Measures call duration |
//!
//! # Loading built-in plugins
//!
//! ```rust,ignore
//! use microgears_framework::plugin::builtin::{TRACE_PLUGIN, performance_plugin};
//!
//! gears.add_plugin(TRACE_PLUGIN)?;
//! gears.add_plugin(performance_plugin(Duration::from_millis(250)))?;
//! ```
//!
//! `GearsRuntime` installs both according to its configuration.

pub mod performance;
pub mod trace;

pub use performance::{PERFORMANCE_PLUGIN_NAME, performance_plugin};
pub use trace::{TRACE_PLUGIN, TRACE_PLUGIN_NAME};
