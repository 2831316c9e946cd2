//! Chain builder.
//!
//! Turns a target method and a plugin snapshot into an immutable
//! [`ComposedChain`]. The strategy is fixed by the service's call mode.

use std::fmt;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::Value;
use tower::util::BoxCloneSyncService;
use tower::{Layer, ServiceExt};

use microgears_core::{Args, CallMode, InvokeError, Reply, SharedError};

use super::immediate::{self, Flow};
use super::layer::{ChainRequest, PluginLayer, TargetService};
use crate::context::CallContext;
use crate::plugin::Plugin;
use crate::service::MethodFn;

type BoxedChainService = BoxCloneSyncService<ChainRequest, Value, SharedError>;

enum Strategy {
    Layered(BoxedChainService),
    Immediate(MethodFn),
}

/// Builds a [`ComposedChain`] for one method.
pub struct ChainBuilder {
    target: MethodFn,
    mode: CallMode,
}

impl ChainBuilder {
    pub fn new(target: MethodFn, mode: CallMode) -> Self {
        Self { target, mode }
    }

    /// Composes the chain over `plugins`, given in registration order.
    pub fn build(self, plugins: Arc<[Arc<Plugin>]>) -> ComposedChain {
        let strategy = match self.mode {
            CallMode::Async => {
                let mut svc = BoxCloneSyncService::new(TargetService::new(self.target));
                for plugin in plugins.iter().rev() {
                    svc = BoxCloneSyncService::new(PluginLayer::new(plugin.clone()).layer(svc));
                }
                Strategy::Layered(svc)
            }
            CallMode::Sync => Strategy::Immediate(self.target),
        };
        ComposedChain {
            mode: self.mode,
            plugins,
            strategy,
        }
    }
}

/// An immutable, shareable composed chain.
pub struct ComposedChain {
    mode: CallMode,
    plugins: Arc<[Arc<Plugin>]>,
    strategy: Strategy,
}

impl ComposedChain {
    pub fn mode(&self) -> CallMode {
        self.mode
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    /// Plugins whose `beforeChain` runs, in execution order.
    pub fn before_order(&self) -> Vec<&str> {
        self.plugins
            .iter()
            .filter(|p| p.has_before())
            .map(|p| p.name())
            .collect()
    }

    /// Plugins whose `afterChain` runs, in execution order.
    pub fn after_order(&self) -> Vec<&str> {
        self.plugins
            .iter()
            .rev()
            .filter(|p| p.has_after())
            .map(|p| p.name())
            .collect()
    }

    /// Runs the chain.
    ///
    /// Async chains never do any work before the reply is polled.
    pub fn invoke(&self, args: Args, ctx: CallContext) -> Reply {
        match &self.strategy {
            Strategy::Layered(svc) => {
                let svc = svc.clone();
                Reply::deferred(
                    svc.oneshot(ChainRequest::new(args, ctx))
                        .map(|res| res.map_err(InvokeError::Failed)),
                )
            }
            Strategy::Immediate(target) => {
                match immediate::run(&self.plugins, 0, args, &ctx, target) {
                    Flow::Done(res) => Reply::Ready(res.map_err(InvokeError::Failed)),
                    Flow::Deferred(fut) => {
                        Reply::deferred(fut.map(|res| res.map_err(InvokeError::Failed)))
                    }
                }
            }
        }
    }
}

impl fmt::Debug for ComposedChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposedChain")
            .field("mode", &self.mode)
            .field("before", &self.before_order())
            .field("after", &self.after_order())
            .finish()
    }
}
