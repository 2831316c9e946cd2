use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use microgears_core::{Args, RegistryError, RegistryResult, Step};

use crate::context::HookContext;

/// Hook run on the arguments before the target method.
pub type BeforeHook = Arc<dyn Fn(Args, &HookContext) -> Step<Args> + Send + Sync>;

/// Hook run on the result after the target method.
pub type AfterHook = Arc<dyn Fn(Value, &HookContext) -> Step<Value> + Send + Sync>;

// ─── PluginMetadata ───────────────────────────────────────────────────────────

/// Descriptive metadata attached to every plugin.
///
/// Populated by the [`define_plugin!`] macro from build-environment constants
/// and the optional `metadata` block; plugins built with [`Plugin::new`]
/// start from [`PluginMetadata::EMPTY`].
///
/// | Field | `define_plugin!` default |
/// |-------|---------|
/// | `version` | `CARGO_PKG_VERSION` of the crate that defined the plugin |
/// | `desc` | `CARGO_PKG_DESCRIPTION` of the defining crate |
/// | `full_desc` | the `///` doc comment above `name:`, or `None` |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginMetadata {
    /// Semver version string of the plugin.
    pub version: &'static str,
    /// One-line description shown in logs.
    pub desc: &'static str,
    /// Optional long-form description.
    pub full_desc: Option<&'static str>,
}

impl PluginMetadata {
    pub const EMPTY: Self = Self {
        version: "",
        desc: "",
        full_desc: None,
    };
}

impl Default for PluginMetadata {
    fn default() -> Self {
        Self::EMPTY
    }
}

// ─── Plugin ───────────────────────────────────────────────────────────────────

/// A named cross-cutting behaviour applied to every intercepted call.
///
/// A plugin carries up to two hooks:
///
/// - `beforeChain` receives the call arguments and returns the (possibly
///   transformed) arguments for the next stage.
/// - `afterChain` receives the result and returns the (possibly transformed)
///   result for the previous stage. When the call has failed it receives
///   `null` and can inspect [`HookContext::error`].
///
/// Either hook may answer with [`Step::Pending`]. At least one hook is
/// required for the plugin to be accepted by the registry.
///
/// # Example
///
/// ```rust,ignore
/// let shout = Plugin::new("shout")
///     .before_chain(|args, _ctx| Step::ok(args.map(|v| json!(format!("{v}!")))))
///     .after_chain(|result, ctx| {
///         if let Some(err) = ctx.error() {
///             warn!(error = %err, "call failed");
///         }
///         Step::ok(result)
///     });
/// gears.add_plugin(shout)?;
/// ```
#[derive(Clone)]
pub struct Plugin {
    name: Arc<str>,
    before: Option<BeforeHook>,
    after: Option<AfterHook>,
    metadata: PluginMetadata,
}

impl Plugin {
    /// Creates a plugin with no hooks yet.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            before: None,
            after: None,
            metadata: PluginMetadata::EMPTY,
        }
    }

    /// Sets the `beforeChain` hook.
    pub fn before_chain<F>(mut self, hook: F) -> Self
    where
        F: Fn(Args, &HookContext) -> Step<Args> + Send + Sync + 'static,
    {
        self.before = Some(Arc::new(hook));
        self
    }

    /// Sets the `afterChain` hook.
    pub fn after_chain<F>(mut self, hook: F) -> Self
    where
        F: Fn(Value, &HookContext) -> Step<Value> + Send + Sync + 'static,
    {
        self.after = Some(Arc::new(hook));
        self
    }

    /// Replaces the plugin metadata.
    pub fn with_metadata(mut self, metadata: PluginMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Returns the plugin's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_arc(&self) -> Arc<str> {
        self.name.clone()
    }

    /// Returns the plugin's metadata.
    pub fn metadata(&self) -> &PluginMetadata {
        &self.metadata
    }

    pub fn has_before(&self) -> bool {
        self.before.is_some()
    }

    pub fn has_after(&self) -> bool {
        self.after.is_some()
    }

    /// Checks the registration requirements: at least one hook, then a name.
    pub fn validate(&self) -> RegistryResult<()> {
        if self.before.is_none() && self.after.is_none() {
            return Err(RegistryError::invalid_plugin(self.name()));
        }
        if self.name.trim().is_empty() {
            return Err(RegistryError::MissingName);
        }
        Ok(())
    }

    /// Runs `beforeChain`, passing the arguments through when absent.
    pub(crate) fn run_before(&self, args: Args, ctx: &HookContext) -> Step<Args> {
        match &self.before {
            Some(hook) => hook(args, ctx),
            None => Step::ok(args),
        }
    }

    /// Runs `afterChain`, passing the result through when absent.
    pub(crate) fn run_after(&self, result: Value, ctx: &HookContext) -> Step<Value> {
        match &self.after {
            Some(hook) => hook(result, ctx),
            None => Step::ok(result),
        }
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("before_chain", &self.before.is_some())
            .field("after_chain", &self.after.is_some())
            .field("metadata", &self.metadata)
            .finish()
    }
}

// ─── Internal constructor (used by define_plugin! macro) ─────────────────────

impl Plugin {
    /// Creates a `Plugin` directly.  Only called by the [`define_plugin!`] macro.
    #[doc(hidden)]
    pub fn __new(
        name: &'static str,
        before: Option<BeforeHook>,
        after: Option<AfterHook>,
        metadata: PluginMetadata,
    ) -> Self {
        Plugin {
            name: Arc::from(name),
            before,
            after,
            metadata,
        }
    }
}
