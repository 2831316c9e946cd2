//! Plugin descriptor: the static, `Copy` handle to a plugin.

use super::Plugin;
use super::core::PluginMetadata;

/// A static, `Copy` descriptor that identifies and instantiates a plugin.
///
/// Produced by [`define_plugin!`] so a plugin can live in a `static` item
/// and be handed to [`MicroGears::add_plugin`] directly.
///
/// [`MicroGears::add_plugin`]: crate::MicroGears::add_plugin
#[derive(Debug, Clone, Copy)]
pub struct PluginDescriptor {
    /// Plugin name (the registry key).
    pub name: &'static str,

    /// Factory function that creates the live [`Plugin`] instance.
    pub create: fn() -> Plugin,

    /// Static metadata snapshot for this plugin.
    pub metadata: PluginMetadata,
}

impl PluginDescriptor {
    /// Creates the live plugin from the factory function.
    #[inline]
    pub fn instantiate(&self) -> Plugin {
        (self.create)()
    }

    /// Returns this plugin's static [`PluginMetadata`].
    #[inline]
    pub fn metadata(&self) -> PluginMetadata {
        self.metadata
    }
}

impl From<PluginDescriptor> for Plugin {
    fn from(desc: PluginDescriptor) -> Self {
        desc.instantiate()
    }
}

impl From<&PluginDescriptor> for Plugin {
    fn from(desc: &PluginDescriptor) -> Self {
        desc.instantiate()
    }
}
