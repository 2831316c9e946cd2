//! MicroGears Runtime - configuration and start-up for MicroGears applications.
//!
//! This crate provides:
//! - Layered configuration (`microgears.toml`, profiles, `MICROGEARS_*`
//!   environment variables) with validation
//! - Logging set-up with `tracing-subscriber`
//! - [`GearsRuntime`], a [`MicroGears`](microgears_framework::MicroGears)
//!   registry built from that configuration with the enabled built-in
//!   plugins already registered
//!
//! ```ignore
//! use microgears_runtime::GearsRuntime;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runtime = GearsRuntime::new()?;
//!     let users = runtime.gears().add_service(user_service())?;
//!
//!     let user = users.call("findUserById", args![1]).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{ConfigError, ConfigLoader, ConfigResult, GearsConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{GearsRuntime, RuntimeBuilder};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Logging macros for application code.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
