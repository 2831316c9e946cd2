//! # MicroGears
//!
//! Wrap every public method of a service with an ordered chain of plugins.
//!
//! ## Overview
//!
//! A *plugin* is a pair of hooks: `before_chain` sees (and may replace) the
//! arguments of a call, `after_chain` sees (and may replace) its result.
//! A *service* is a named set of methods. Registering a service installs each
//! public method behind the hooks of every registered plugin:
//!
//! ```text
//!             ┌──────────── plugin A ────────────┐
//!             │      ┌───── plugin B ─────┐      │
//! args ──▶ before_A ─▶ before_B ─▶ target ─▶ after_B ─▶ after_A ──▶ reply
//!             │      └────────────────────┘      │
//!             └──────────────────────────────────┘
//! ```
//!
//! - **Registry**: [`MicroGears`](framework::MicroGears) holds plugins (in
//!   registration order) and services
//! - **Services**: built with [`ServiceDefinition`](framework::ServiceDefinition);
//!   methods starting with `_` bypass the chain
//! - **Call modes**: async services always reply with a deferred value, sync
//!   services reply immediately
//! - **Runtime**: [`GearsRuntime`](runtime::GearsRuntime) loads
//!   `microgears.toml`, sets up logging and registers the built-in plugins
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use microgears::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runtime = GearsRuntime::new()?;
//!
//!     let users = runtime.gears().add_service(
//!         ServiceDefinition::new("userService")
//!             .namespace("services.userservice")
//!             .method("findUserById", |_ctx, args| {
//!                 Ok(json!({ "name": "clark kent", "id": args.arg::<u64>(0)? }))
//!             }),
//!     )?;
//!
//!     let user = users.call("findUserById", args![1]).await?;
//!     println!("{user}");
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `builtin-plugins` *(default)*: trace and performance plugins
//! - `toml-config` *(default)*: TOML configuration files
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use microgears_core as core;
pub use microgears_framework as framework;
pub use microgears_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use microgears::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use microgears_runtime::{GearsConfig, GearsRuntime};

    // Registry, services and plugins
    pub use microgears_framework::prelude::*;

    pub use serde_json::json;
}
