//! Plugin and service registration.
//!
//! [`MicroGears`] is the owner of everything registered with the framework.
//! It:
//!
//! - Keeps the plugin table in registration order and rejects invalid or
//!   duplicate plugins. Every change invalidates all composed chains.
//! - Mounts service definitions, installing each qualifying method behind its
//!   plugin chain, and makes the result reachable by name.
//! - Supports a full [`reset`](MicroGears::reset) that forgets every
//!   service, plugin and cached chain.
//!
//! Registrations fail synchronously with a [`RegistryError`]; calls never
//! touch the registry locks except for the service lookup by name.
//!
//! # Example
//!
//! ```rust,ignore
//! use microgears::prelude::*;
//!
//! let gears = MicroGears::new();
//! gears.add_plugin(TRACE_PLUGIN)?;
//!
//! let users = gears.add_service(
//!     ServiceDefinition::new("userService")
//!         .namespace("services.userservice")
//!         .method("findUserById", |_ctx, args| {
//!             Ok(json!({ "name": "clark kent", "id": args.arg::<u64>(0)? }))
//!         }),
//! )?;
//!
//! let user = users.call("findUserById", args![1]).await?;
//! let same = gears.call("userService", "findUserById", args![1]).await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use microgears_core::{Args, CallMode, InvokeError, RegistryError, RegistryResult, Reply};

use crate::chain::ChainSource;
use crate::plugin::Plugin;
use crate::service::introspect::DEFAULT_PRIVATE_PREFIX;
use crate::service::{ServiceDefinition, ServiceHandle};

#[cfg(test)]
mod tests;

// =============================================================================
// GearsOptions
// =============================================================================

/// Registry-wide defaults applied when services are mounted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GearsOptions {
    /// Call mode of services that do not request one.
    pub default_call_mode: CallMode,
    /// Methods whose name starts with this prefix are not intercepted.
    /// An empty prefix intercepts every method except `constructor`.
    pub private_prefix: String,
}

impl Default for GearsOptions {
    fn default() -> Self {
        Self {
            default_call_mode: CallMode::Async,
            private_prefix: DEFAULT_PRIVATE_PREFIX.to_owned(),
        }
    }
}

// =============================================================================
// MicroGears
// =============================================================================

/// Registry of plugins and services.
///
/// Cheap operations only take short `parking_lot` locks; `MicroGears` can be
/// shared behind an `Arc` and used from any thread.
pub struct MicroGears {
    source: Arc<ChainSource>,
    services: RwLock<HashMap<String, ServiceHandle>>,
    options: GearsOptions,
}

impl MicroGears {
    /// Creates an empty registry with default options.
    pub fn new() -> Self {
        Self::with_options(GearsOptions::default())
    }

    pub fn with_options(options: GearsOptions) -> Self {
        Self {
            source: Arc::new(ChainSource::new()),
            services: RwLock::new(HashMap::new()),
            options,
        }
    }

    pub fn options(&self) -> &GearsOptions {
        &self.options
    }

    // ─── Plugins ─────────────────────────────────────────────────────────────

    /// Registers a plugin after every plugin already registered.
    ///
    /// Accepts a [`Plugin`] or a [`PluginDescriptor`](crate::plugin::PluginDescriptor).
    ///
    /// # Errors
    ///
    /// [`RegistryError::InvalidPlugin`], [`RegistryError::MissingName`] or
    /// [`RegistryError::DuplicateName`]. A failed registration changes nothing.
    pub fn add_plugin(&self, plugin: impl Into<Plugin>) -> RegistryResult<()> {
        self.source.add_plugin(plugin.into())
    }

    /// Removes the plugin called `name`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnknownPlugin`] if no such plugin is registered.
    pub fn remove_plugin(&self, name: &str) -> RegistryResult<()> {
        self.source.remove_plugin(name).map(drop)
    }

    pub fn has_plugin(&self, name: &str) -> bool {
        self.source.has_plugin(name)
    }

    /// Plugin names in registration order.
    pub fn plugin_names(&self) -> Vec<String> {
        self.source.plugin_names()
    }

    pub fn plugin_count(&self) -> usize {
        self.source.plugin_count()
    }

    // ─── Services ────────────────────────────────────────────────────────────

    /// Mounts a service and registers it under its name.
    ///
    /// # Errors
    ///
    /// [`RegistryError::MissingServiceName`], [`RegistryError::MissingNamespace`]
    /// or [`RegistryError::DuplicateServiceName`].
    pub fn add_service(&self, def: impl Into<ServiceDefinition>) -> RegistryResult<ServiceHandle> {
        let def = def.into();
        let handle = ServiceHandle::mount(def, &self.options, self.source.clone())?;

        let mut services = self.services.write();
        if services.contains_key(handle.name()) {
            return Err(RegistryError::DuplicateServiceName(handle.name().to_owned()));
        }
        services.insert(handle.name().to_owned(), handle.clone());
        info!(
            service   = %handle.name(),
            namespace = %handle.namespace(),
            mode      = %handle.call_mode(),
            methods   = handle.intercepted_methods().len(),
            "Service registered"
        );
        Ok(handle)
    }

    /// Looks up a registered service.
    pub fn service(&self, name: &str) -> Option<ServiceHandle> {
        self.services.read().get(name).cloned()
    }

    /// Unregisters a service and drops its cached chains.
    ///
    /// Handles already held by callers keep working, but their chains are no
    /// longer cached.
    pub fn remove_service(&self, name: &str) -> Option<ServiceHandle> {
        let handle = self.services.write().remove(name)?;
        self.source.cache().remove_service(handle.id());
        info!(service = %name, "Service removed");
        Some(handle)
    }

    pub fn has_service(&self, name: &str) -> bool {
        self.services.read().contains_key(name)
    }

    /// Registered service names, sorted.
    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.services.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn service_count(&self) -> usize {
        self.services.read().len()
    }

    /// Calls `service.method(args)`.
    ///
    /// An unknown service answers immediately with
    /// [`InvokeError::UnknownService`].
    pub fn call(&self, service: &str, method: &str, args: impl Into<Args>) -> Reply {
        match self.service(service) {
            Some(handle) => handle.call(method, args),
            None => Reply::Ready(Err(InvokeError::UnknownService(service.to_owned()))),
        }
    }

    // ─── Cache and reset ─────────────────────────────────────────────────────

    /// Number of composed chains currently cached.
    pub fn cached_chains(&self) -> usize {
        self.source.cache().len()
    }

    /// Unregisters every service, removes every plugin and clears the chain
    /// cache.
    ///
    /// Handles obtained before the reset stay callable; their chains are
    /// rebuilt on every call against whatever plugins are registered
    /// afterwards.
    pub fn reset(&self) {
        let services = std::mem::take(&mut *self.services.write());
        for name in services.keys() {
            debug!(service = %name, "Service unregistered");
        }
        self.source
            .cache()
            .retire(services.values().map(ServiceHandle::id));
        self.source.clear_plugins();
        info!(services = services.len(), "MicroGears reset");
    }
}

impl Default for MicroGears {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MicroGears {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MicroGears")
            .field("plugins", &self.plugin_names())
            .field("services", &self.service_names())
            .field("cached_chains", &self.cached_chains())
            .field("options", &self.options)
            .finish()
    }
}
