//! Plugin set plus chain cache, shared by the registry and every mounted
//! service.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use microgears_core::{CallMode, RegistryResult};

use super::builder::{ChainBuilder, ComposedChain};
use super::cache::{ChainCache, ChainKey, ServiceId};
use crate::plugin::{Plugin, PluginRegistry};
use crate::service::MethodFn;

/// Source of composed chains.
///
/// Plugin changes take the plugin write lock and invalidate the cache while
/// holding it. Chain builds read the plugin snapshot and the cache generation
/// under the plugin read lock, so a committed chain always matches the plugin
/// set of its generation.
#[derive(Debug, Default)]
pub struct ChainSource {
    plugins: RwLock<PluginRegistry>,
    cache: ChainCache,
}

impl ChainSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_plugin(&self, plugin: Plugin) -> RegistryResult<()> {
        let mut plugins = self.plugins.write();
        let name = plugin.name_arc();
        plugins.add(plugin)?;
        self.cache.invalidate();
        info!(plugin = %name, total = plugins.len(), "Plugin registered");
        Ok(())
    }

    pub fn remove_plugin(&self, name: &str) -> RegistryResult<Arc<Plugin>> {
        let mut plugins = self.plugins.write();
        let removed = plugins.remove(name)?;
        self.cache.invalidate();
        info!(plugin = %name, total = plugins.len(), "Plugin removed");
        Ok(removed)
    }

    pub fn clear_plugins(&self) {
        let mut plugins = self.plugins.write();
        plugins.clear();
        self.cache.invalidate();
    }

    pub fn has_plugin(&self, name: &str) -> bool {
        self.plugins.read().contains(name)
    }

    pub fn plugin_names(&self) -> Vec<String> {
        self.plugins.read().names()
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.read().len()
    }

    pub fn cache(&self) -> &ChainCache {
        &self.cache
    }

    /// Returns the chain of `(service, method)`, building it on a miss.
    pub fn chain_for(
        &self,
        service: ServiceId,
        method: &Arc<str>,
        target: &MethodFn,
        mode: CallMode,
    ) -> Arc<ComposedChain> {
        let key = ChainKey::new(service, method.clone());
        if let Some(chain) = self.cache.get(&key) {
            return chain;
        }

        let (snapshot, generation) = {
            let plugins = self.plugins.read();
            (plugins.snapshot(), self.cache.generation())
        };
        let chain = Arc::new(ChainBuilder::new(target.clone(), mode).build(snapshot));
        let committed = self.cache.insert(key.clone(), chain.clone(), generation);
        debug!(
            service = %service,
            method = %method,
            plugins = chain.plugin_count(),
            committed,
            "Chain built"
        );
        // Another call may have committed first; prefer the shared one.
        if committed {
            self.cache.get(&key).unwrap_or(chain)
        } else {
            chain
        }
    }
}
