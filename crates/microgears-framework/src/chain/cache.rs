//! Composed chain cache.
//!
//! Chains are keyed by `(service identity, method name)`. The whole cache is
//! cleared when the plugin set changes; a generation counter keeps a chain
//! built against an outdated plugin set from being committed afterwards.
//! Services that have been unregistered are retired and never cached again.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::debug;

use super::builder::ComposedChain;

static NEXT_SERVICE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a mounted service.
///
/// Two services mounted under the same name (for example before and after a
/// reset) never share an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceId(u64);

impl ServiceId {
    pub(crate) fn next() -> Self {
        Self(NEXT_SERVICE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Cache key of a composed chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChainKey {
    service: ServiceId,
    method: Arc<str>,
}

impl ChainKey {
    pub fn new(service: ServiceId, method: Arc<str>) -> Self {
        Self { service, method }
    }

    pub fn service(&self) -> ServiceId {
        self.service
    }

    pub fn method(&self) -> &str {
        &self.method
    }
}

#[derive(Default)]
struct CacheInner {
    generation: u64,
    chains: HashMap<ChainKey, Arc<ComposedChain>>,
    retired: HashSet<ServiceId>,
}

/// Shared store of composed chains.
#[derive(Default)]
pub struct ChainCache {
    inner: RwLock<CacheInner>,
}

impl ChainCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ChainKey) -> Option<Arc<ComposedChain>> {
        self.inner.read().chains.get(key).cloned()
    }

    /// Current generation. Bumped by every [`invalidate`](Self::invalidate).
    pub fn generation(&self) -> u64 {
        self.inner.read().generation
    }

    /// Commits a chain built while the cache was at `generation`.
    ///
    /// Returns `false`, without storing anything, if the cache has been
    /// invalidated since or the service has been retired. An entry already
    /// present for `key` is kept.
    pub fn insert(&self, key: ChainKey, chain: Arc<ComposedChain>, generation: u64) -> bool {
        let mut inner = self.inner.write();
        if inner.generation != generation || inner.retired.contains(&key.service) {
            return false;
        }
        inner.chains.entry(key).or_insert(chain);
        true
    }

    /// Drops every chain and starts a new generation.
    pub fn invalidate(&self) {
        let mut inner = self.inner.write();
        inner.generation += 1;
        let dropped = inner.chains.len();
        inner.chains.clear();
        debug!(generation = inner.generation, dropped, "Chain cache invalidated");
    }

    /// Drops the chains of a single service and retires it.
    pub fn remove_service(&self, service: ServiceId) {
        self.retire([service]);
    }

    /// Retires services. Their chains are dropped and later commits for them
    /// are refused, so handles kept after unregistering build uncached chains.
    pub fn retire(&self, services: impl IntoIterator<Item = ServiceId>) {
        let mut inner = self.inner.write();
        inner.retired.extend(services);
        let CacheInner { chains, retired, .. } = &mut *inner;
        chains.retain(|key, _| !retired.contains(&key.service));
    }

    pub fn is_retired(&self, service: ServiceId) -> bool {
        self.inner.read().retired.contains(&service)
    }

    pub fn len(&self) -> usize {
        self.inner.read().chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Methods with a cached chain for `service`.
    pub fn cached_methods(&self, service: ServiceId) -> Vec<String> {
        let mut methods: Vec<_> = self
            .inner
            .read()
            .chains
            .keys()
            .filter(|key| key.service == service)
            .map(|key| key.method().to_owned())
            .collect();
        methods.sort();
        methods
    }
}

impl fmt::Debug for ChainCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("ChainCache")
            .field("generation", &inner.generation)
            .field("chains", &inner.chains.len())
            .finish()
    }
}
