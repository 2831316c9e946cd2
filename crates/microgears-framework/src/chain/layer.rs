//! Tower building blocks of the asynchronous composition strategy.
//!
//! Each plugin becomes a [`PluginLayer`] wrapping the rest of the chain; the
//! innermost service is the [`TargetService`] calling the service method.

use std::sync::Arc;
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;
use tower::{Layer, Service, ServiceExt};

use microgears_core::{Args, SharedError};

use super::{fail, finish, unwind};
use crate::context::{CallContext, HookContext};
use crate::plugin::Plugin;
use crate::service::MethodFn;

/// The request flowing through a chain.
#[derive(Debug, Clone)]
pub struct ChainRequest {
    pub args: Args,
    pub ctx: CallContext,
}

impl ChainRequest {
    pub fn new(args: Args, ctx: CallContext) -> Self {
        Self { args, ctx }
    }
}

// ============================================================================
// PluginLayer
// ============================================================================

/// Wraps a chain with one plugin's hooks.
#[derive(Clone)]
pub struct PluginLayer {
    plugin: Arc<Plugin>,
}

impl PluginLayer {
    pub fn new(plugin: Arc<Plugin>) -> Self {
        Self { plugin }
    }
}

impl<S> Layer<S> for PluginLayer {
    type Service = PluginService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        PluginService {
            plugin: self.plugin.clone(),
            inner,
        }
    }
}

/// Runs `beforeChain`, the inner chain, then `afterChain`.
pub struct PluginService<S> {
    plugin: Arc<Plugin>,
    inner: S,
}

impl<S> Clone for PluginService<S>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        PluginService {
            plugin: self.plugin.clone(),
            inner: self.inner.clone(),
        }
    }
}

impl<S> Service<ChainRequest> for PluginService<S>
where
    S: Service<ChainRequest, Response = Value, Error = SharedError> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Value;
    type Error = SharedError;
    type Future = BoxFuture<'static, Result<Value, SharedError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // The inner chain is driven with `oneshot`, which polls it itself.
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ChainRequest) -> Self::Future {
        let plugin = self.plugin.clone();
        let inner = self.inner.clone();
        async move {
            let ChainRequest { args, ctx } = req;
            let hook_ctx = HookContext::new(ctx.clone(), plugin.name_arc());

            let args = match plugin.run_before(args, &hook_ctx).resolve().await {
                Ok(args) => args,
                Err(err) => {
                    let err = fail(hook_ctx.meta(), err);
                    return Err(unwind(&plugin, &hook_ctx, err).await);
                }
            };

            let outcome = inner.oneshot(ChainRequest::new(args, ctx)).await;
            finish(&plugin, &hook_ctx, outcome).await
        }
        .boxed()
    }
}

// ============================================================================
// TargetService
// ============================================================================

/// Calls the service method with the fully transformed arguments.
#[derive(Clone)]
pub struct TargetService {
    target: MethodFn,
}

impl TargetService {
    pub fn new(target: MethodFn) -> Self {
        Self { target }
    }
}

impl Service<ChainRequest> for TargetService {
    type Response = Value;
    type Error = SharedError;
    type Future = BoxFuture<'static, Result<Value, SharedError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ChainRequest) -> Self::Future {
        let step = (self.target)(&req.ctx, req.args);
        let meta = req.ctx.meta_arc();
        async move { step.resolve().await.map_err(|err| fail(&meta, err)) }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tower::ServiceBuilder;

    use microgears_core::Step;

    use super::*;
    use crate::service::{ServiceDefinition, ServiceHandle};

    fn context(method: &str) -> CallContext {
        let handle = ServiceHandle::detached(
            ServiceDefinition::new("layerService").namespace("services.layer"),
        );
        handle.context_for(method)
    }

    fn suffix(name: &str, before: &'static str, after: &'static str) -> Arc<Plugin> {
        Arc::new(
            Plugin::new(name)
                .before_chain(move |args, _| {
                    let text = args.arg::<String>(0).unwrap_or_default();
                    Step::ok(args.with(0, format!("{text}{before}")))
                })
                .after_chain(move |result, _| {
                    Step::ok(json!(format!("{}{after}", result.as_str().unwrap_or_default())))
                }),
        )
    }

    #[tokio::test]
    async fn test_layers_compose_as_onion() {
        let target: MethodFn = Arc::new(|_: &CallContext, args: Args| {
            let text = args.arg::<String>(0).unwrap_or_default();
            Step::ok(json!(format!("{text} happens")))
        });
        let svc = ServiceBuilder::new()
            .layer(PluginLayer::new(suffix("p1", " weird", " these days")))
            .layer(PluginLayer::new(suffix("p2", " stuff", " a lot")))
            .service(TargetService::new(target));

        let out = svc
            .oneshot(ChainRequest::new(Args::from([json!("wtf")]), context("go")))
            .await
            .unwrap();
        assert_eq!(out, json!("wtf weird stuff happens a lot these days"));
    }

    #[tokio::test]
    async fn test_target_failure_is_recorded() {
        let target: MethodFn = Arc::new(|_: &CallContext, _: Args| -> Step<Value> {
            Step::err("database went away")
        });
        let ctx = context("find");
        let meta = ctx.meta_arc();

        let err = TargetService::new(target)
            .oneshot(ChainRequest::new(Args::empty(), ctx))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "database went away");
        assert!(meta.has_failed());
    }
}
