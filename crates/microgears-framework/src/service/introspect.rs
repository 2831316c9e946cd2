//! Method classification.
//!
//! Decides which methods of a definition are installed behind a plugin chain
//! and which are installed as-is.

use std::collections::HashSet;
use std::sync::Arc;

use super::definition::{MethodFn, ServiceDefinition};

/// Name that is never intercepted, whatever the prefix.
pub const CONSTRUCTOR: &str = "constructor";

/// Default prefix marking private methods.
pub const DEFAULT_PRIVATE_PREFIX: &str = "_";

/// How a method is installed on the mounted service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    /// Runs behind the plugin chain.
    Intercepted,
    /// Runs directly, with no hooks and untouched arguments.
    Direct,
}

impl MethodKind {
    pub fn is_intercepted(self) -> bool {
        self == Self::Intercepted
    }
}

/// Returns `true` for names that must not be intercepted.
///
/// An empty prefix disables the private convention.
pub fn is_private(name: &str, prefix: &str) -> bool {
    name == CONSTRUCTOR || (!prefix.is_empty() && name.starts_with(prefix))
}

/// Classifies a single method name.
pub fn classify(name: &str, prefix: &str) -> MethodKind {
    if is_private(name, prefix) {
        MethodKind::Direct
    } else {
        MethodKind::Intercepted
    }
}

/// All methods of a definition, own methods first, then inherited ones not
/// overridden, each name once.
pub fn resolved_methods(def: &ServiceDefinition) -> Vec<(Arc<str>, MethodFn)> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    let mut current = Some(def);
    while let Some(def) = current {
        for entry in def.own_methods() {
            if seen.insert(entry.name_arc().clone()) {
                out.push((entry.name_arc().clone(), entry.func().clone()));
            }
        }
        current = def.base();
    }
    out
}

/// Names of the methods that run behind a chain, in [`resolved_methods`] order.
pub fn qualifying_methods(def: &ServiceDefinition, prefix: &str) -> Vec<Arc<str>> {
    resolved_methods(def)
        .into_iter()
        .map(|(name, _)| name)
        .filter(|name| classify(name, prefix).is_intercepted())
        .collect()
}
