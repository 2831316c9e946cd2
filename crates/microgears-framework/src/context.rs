//! Invocation contexts handed to service methods and plugin hooks.
//!
//! Two context types model what a piece of user code can see during a call:
//!
//! - [`CallContext`]: the **bound service context**. Service methods receive
//!   it as their first argument. It exposes the service identity, its data
//!   fields, the per-call [`CallMeta`] and a [`ServiceHandle`] for calling
//!   sibling methods (which go through their own chains).
//!
//! - [`HookContext`]: what plugin hooks receive: the same call context plus
//!   the name of the plugin running the hook. Its state accessors are scoped
//!   to that plugin, so a value stored by a plugin's `beforeChain` is visible
//!   to its own `afterChain` and to no other plugin.
//!
//! Both are cheap to clone; clone them into a future when a hook or method
//! answers asynchronously.

use std::ops::Deref;
use std::sync::Arc;

use serde_json::{Map, Value};

use microgears_core::{CallMeta, ServiceInfo, SharedError};

use crate::service::ServiceHandle;

// =============================================================================
// CallContext: the service a call is bound to
// =============================================================================

/// The context a service method runs in.
///
/// # Example
///
/// ```rust,ignore
/// ServiceDefinition::new("testService")
///     .namespace("services.test")
///     .method("describe", |ctx, _args| {
///         Ok(json!({
///             "service": ctx.info().name(),
///             "namespace": ctx.info().namespace(),
///             "method": ctx.meta().method_name(),
///         }))
///     });
/// ```
#[derive(Clone)]
pub struct CallContext {
    meta: Arc<CallMeta>,
    service: ServiceHandle,
}

impl CallContext {
    pub(crate) fn new(meta: Arc<CallMeta>, service: ServiceHandle) -> Self {
        Self { meta, service }
    }

    /// Metadata of the running call.
    pub fn meta(&self) -> &CallMeta {
        &self.meta
    }

    /// Shared handle to the call metadata.
    pub fn meta_arc(&self) -> Arc<CallMeta> {
        self.meta.clone()
    }

    /// Identity of the service the call is bound to.
    pub fn info(&self) -> &ServiceInfo {
        self.meta.service()
    }

    /// The service the call is bound to.
    ///
    /// Calls made through this handle are intercepted like any external call.
    pub fn service(&self) -> &ServiceHandle {
        &self.service
    }

    /// Looks up a data field of the service.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.service.field(name)
    }

    /// All data fields of the service.
    pub fn fields(&self) -> &Map<String, Value> {
        self.service.fields()
    }
}

impl std::fmt::Debug for CallContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallContext")
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// HookContext: call context seen through one plugin
// =============================================================================

/// The context a plugin hook runs in.
///
/// Dereferences to [`CallContext`] for the shared call data.
///
/// # Example
///
/// ```rust,ignore
/// Plugin::new("timer")
///     .before_chain(|args, ctx| {
///         ctx.set_state(Instant::now());
///         Step::ok(args)
///     })
///     .after_chain(|result, ctx| {
///         if let Some(start) = ctx.take_state::<Instant>() {
///             info!(elapsed = ?start.elapsed(), "call finished");
///         }
///         Step::ok(result)
///     });
/// ```
#[derive(Clone)]
pub struct HookContext {
    call: CallContext,
    plugin: Arc<str>,
}

impl HookContext {
    pub(crate) fn new(call: CallContext, plugin: Arc<str>) -> Self {
        Self { call, plugin }
    }

    /// Name of the plugin running the hook.
    pub fn plugin_name(&self) -> &str {
        &self.plugin
    }

    /// The underlying call context.
    pub fn call(&self) -> &CallContext {
        &self.call
    }

    /// The error the call failed with, if it has failed so far.
    ///
    /// Inside `afterChain` a `Some` means the result is `null` and the
    /// error will be delivered to the caller.
    pub fn error(&self) -> Option<&SharedError> {
        self.call.meta().error()
    }

    // ─── Plugin-scoped state ─────────────────────────────────────────────────

    /// Stores a value for this plugin, replacing any previous `T`.
    pub fn set_state<T: Send + Sync + 'static>(&self, value: T) {
        self.call.meta().scratch().insert(&self.plugin, value);
    }

    /// Returns a clone of this plugin's `T`.
    pub fn get_state<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        self.call.meta().scratch().get(&self.plugin)
    }

    /// Removes and returns this plugin's `T`.
    pub fn take_state<T: Send + Sync + 'static>(&self) -> Option<T> {
        self.call.meta().scratch().remove(&self.plugin)
    }

    pub fn has_state<T: Send + Sync + 'static>(&self) -> bool {
        self.call.meta().scratch().contains::<T>(&self.plugin)
    }
}

impl Deref for HookContext {
    type Target = CallContext;

    fn deref(&self) -> &CallContext {
        &self.call
    }
}

impl std::fmt::Debug for HookContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookContext")
            .field("plugin", &self.plugin)
            .field("meta", self.call.meta())
            .finish()
    }
}
