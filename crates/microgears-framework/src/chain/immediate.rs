//! Synchronous composition strategy.
//!
//! Runs every stage on the caller's stack. Only the target may hand back a
//! pending value; from that point on the remaining after-hooks become a
//! deferred continuation.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;

use microgears_core::{Args, ChainStage, SharedError, Step, UnexpectedDeferred};

use super::{fail, finish, log_unwind_failure};
use crate::context::{CallContext, HookContext};
use crate::plugin::Plugin;
use crate::service::MethodFn;

/// Outcome of running the chain from some plugin inwards.
pub(crate) enum Flow {
    Done(Result<Value, SharedError>),
    Deferred(BoxFuture<'static, Result<Value, SharedError>>),
}

/// Runs `plugins[index..]` around `target`.
pub(crate) fn run(
    plugins: &Arc<[Arc<Plugin>]>,
    index: usize,
    args: Args,
    ctx: &CallContext,
    target: &MethodFn,
) -> Flow {
    let Some(plugin) = plugins.get(index) else {
        return run_target(args, ctx, target);
    };
    let hook_ctx = HookContext::new(ctx.clone(), plugin.name_arc());

    let args = match plugin.run_before(args, &hook_ctx) {
        Step::Ready(Ok(args)) => args,
        Step::Ready(Err(err)) => {
            let err = fail(ctx.meta(), err);
            return Flow::Done(Err(unwind_now(plugin, &hook_ctx, err)));
        }
        Step::Pending(_) => {
            let err = fail(ctx.meta(), unexpected(plugin, ChainStage::Before));
            return Flow::Done(Err(unwind_now(plugin, &hook_ctx, err)));
        }
    };

    match run(plugins, index + 1, args, ctx, target) {
        Flow::Done(Ok(value)) => Flow::Done(after_now(plugin, &hook_ctx, value)),
        Flow::Done(Err(err)) => Flow::Done(Err(unwind_now(plugin, &hook_ctx, err))),
        Flow::Deferred(inner) => {
            let plugin = plugin.clone();
            Flow::Deferred(
                async move {
                    let outcome = inner.await;
                    finish(&plugin, &hook_ctx, outcome).await
                }
                .boxed(),
            )
        }
    }
}

fn run_target(args: Args, ctx: &CallContext, target: &MethodFn) -> Flow {
    match target(ctx, args) {
        Step::Ready(res) => Flow::Done(res.map_err(|err| fail(ctx.meta(), err))),
        Step::Pending(fut) => {
            let meta = ctx.meta_arc();
            Flow::Deferred(async move { fut.await.map_err(|err| fail(&meta, err)) }.boxed())
        }
    }
}

fn after_now(plugin: &Plugin, ctx: &HookContext, value: Value) -> Result<Value, SharedError> {
    match plugin.run_after(value, ctx) {
        Step::Ready(res) => res.map_err(|err| fail(ctx.meta(), err)),
        Step::Pending(_) => Err(fail(ctx.meta(), unexpected(plugin, ChainStage::After))),
    }
}

fn unwind_now(plugin: &Plugin, ctx: &HookContext, err: SharedError) -> SharedError {
    match plugin.run_after(Value::Null, ctx) {
        Step::Ready(Ok(_)) => {}
        Step::Ready(Err(after_err)) => log_unwind_failure(ctx, &after_err),
        Step::Pending(_) => log_unwind_failure(ctx, &unexpected(plugin, ChainStage::After)),
    }
    err
}

fn unexpected(plugin: &Plugin, stage: ChainStage) -> Box<UnexpectedDeferred> {
    Box::new(UnexpectedDeferred {
        plugin: plugin.name().to_owned(),
        stage,
    })
}
