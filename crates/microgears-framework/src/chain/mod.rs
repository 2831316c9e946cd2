//! Chain composition and caching.
//!
//! A composed chain runs, for one `(service, method)` pair:
//!
//! ```text
//! before(P1) → before(P2) → … → target → … → after(P2) → after(P1)
//! ```
//!
//! Plugins wrap the target like an onion: the first registered plugin is the
//! outermost layer. Two strategies implement the same order:
//!
//! - **async services** build a tower stack of [`PluginLayer`]s around a
//!   [`TargetService`] and always answer with a deferred reply;
//! - **sync services** run every stage immediately and only turn deferred
//!   when the target itself returns a pending value.
//!
//! # Failure handling
//!
//! The first error of a call is recorded in `CallMeta::error`. The after-hook
//! of every plugin whose before-hook started runs with `null`, then the error
//! is handed to the caller. An after-hook failing on the success path becomes
//! the call's error; one failing while an error unwinds is only logged.

pub mod builder;
pub mod cache;
mod immediate;
pub mod layer;
pub mod source;

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use microgears_core::{BoxError, CallMeta, SharedError};

use crate::context::HookContext;
use crate::plugin::Plugin;

pub use builder::{ChainBuilder, ComposedChain};
pub use cache::{ChainCache, ChainKey, ServiceId};
pub use layer::{ChainRequest, PluginLayer, PluginService, TargetService};
pub use source::ChainSource;

/// Shares a stage error and records it as the call's error.
///
/// Only the first recorded error is kept in the metadata.
pub(crate) fn fail(meta: &CallMeta, err: BoxError) -> SharedError {
    let err: SharedError = Arc::from(err);
    meta.record_error(err.clone());
    err
}

/// Runs an after-hook on the success path, awaiting it if needed.
pub(crate) async fn finish(
    plugin: &Plugin,
    ctx: &HookContext,
    outcome: Result<Value, SharedError>,
) -> Result<Value, SharedError> {
    match outcome {
        Ok(value) => plugin
            .run_after(value, ctx)
            .resolve()
            .await
            .map_err(|err| fail(ctx.meta(), err)),
        Err(err) => Err(unwind(plugin, ctx, err).await),
    }
}

/// Lets a plugin observe a failure, awaiting its after-hook if needed.
pub(crate) async fn unwind(plugin: &Plugin, ctx: &HookContext, err: SharedError) -> SharedError {
    if let Err(after_err) = plugin.run_after(Value::Null, ctx).resolve().await {
        log_unwind_failure(ctx, &after_err);
    }
    err
}

pub(crate) fn log_unwind_failure(ctx: &HookContext, err: &dyn fmt::Display) {
    warn!(
        plugin  = %ctx.plugin_name(),
        service = %ctx.meta().service_name(),
        method  = %ctx.meta().method_name(),
        error   = %err,
        "afterChain failed while unwinding; keeping the original error"
    );
}
