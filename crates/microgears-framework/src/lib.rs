//! # MicroGears Framework
//!
//! Interception and composition core of MicroGears.
//!
//! This layer provides:
//! - The plugin model (`beforeChain` / `afterChain` hooks) and the
//!   [`define_plugin!`] macro for static plugin descriptors
//! - Service definitions, method classification and mounted service handles
//! - The chain builder with its two composition strategies (a tower stack for
//!   async services, direct execution for sync services) and the chain cache
//! - [`MicroGears`], the registry that ties plugins and services together
//! - Built-in trace and performance plugins (with the `builtin-plugins`
//!   feature)
//!
//! Configuration and logging set-up live in the runtime crate.

pub mod chain;
pub mod context;
pub mod manager;
pub mod plugin;
pub mod service;

pub use chain::{ChainCache, ChainKey, ComposedChain, ServiceId};
pub use context::{CallContext, HookContext};
pub use manager::{GearsOptions, MicroGears};
pub use plugin::{Plugin, PluginDescriptor, PluginMetadata};
pub use service::{MethodResult, ServiceDefinition, ServiceHandle};

/// Prelude for writing services and plugins.
pub mod prelude {
    pub use crate::context::{CallContext, HookContext};
    pub use crate::define_plugin;
    pub use crate::manager::{GearsOptions, MicroGears};
    pub use crate::plugin::{Plugin, PluginDescriptor, PluginMetadata};
    pub use crate::service::{MethodResult, ServiceDefinition, ServiceHandle};
    pub use microgears_core::prelude::*;

    #[cfg(feature = "builtin-plugins")]
    pub use crate::plugin::builtin::{TRACE_PLUGIN, performance_plugin};
}
