//! Ordered plugin table.

use std::sync::Arc;

use microgears_core::{RegistryError, RegistryResult};

use super::Plugin;

/// Registered plugins in registration order.
///
/// Registration order is the `beforeChain` execution order; its reverse is
/// the `afterChain` order. Names are unique.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    plugins: Vec<Arc<Plugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a plugin.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::InvalidPlugin`] if the plugin has no hook.
    /// - [`RegistryError::MissingName`] if its name is empty.
    /// - [`RegistryError::DuplicateName`] if the name is taken.
    pub fn add(&mut self, plugin: Plugin) -> RegistryResult<()> {
        plugin.validate()?;
        if self.contains(plugin.name()) {
            return Err(RegistryError::DuplicateName(plugin.name().to_owned()));
        }
        self.plugins.push(Arc::new(plugin));
        Ok(())
    }

    /// Removes the plugin called `name`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnknownPlugin`] if no such plugin is registered.
    pub fn remove(&mut self, name: &str) -> RegistryResult<Arc<Plugin>> {
        let index = self
            .plugins
            .iter()
            .position(|p| p.name() == name)
            .ok_or_else(|| RegistryError::UnknownPlugin(name.to_owned()))?;
        Ok(self.plugins.remove(index))
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Plugin>> {
        self.plugins.iter().find(|p| p.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// An immutable copy of the current plugin list, in registration order.
    pub fn snapshot(&self) -> Arc<[Arc<Plugin>]> {
        self.plugins.iter().cloned().collect()
    }

    /// Plugin names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.plugins.iter().map(|p| p.name().to_owned()).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn clear(&mut self) {
        self.plugins.clear();
    }
}
