//! Per-call metadata.
//!
//! [`ServiceInfo`] is the identity a service reports to plugins; it is fixed
//! at registration. [`CallMeta`] is created fresh for every intercepted call
//! and carries:
//!
//! - the service identity and the name of the invoked method,
//! - a process-unique call id,
//! - the error slot that after-hooks inspect once the call has failed,
//! - scratch space for passing values from a plugin's before-hook to its own
//!   after-hook.
//!
//! The identity fields are read-only; only the error slot and the scratch
//! space change during a call, both through interior mutability.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// An error shared between the caller, `CallMeta` and every after-hook.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync>;

// ─── CallMode ────────────────────────────────────────────────────────────────

/// Whether intercepted methods of a service return deferred or direct results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallMode {
    /// Every call returns a deferred reply (the default).
    #[default]
    Async,
    /// Calls run immediately and return the value directly.
    Sync,
}

impl CallMode {
    pub fn is_async(self) -> bool {
        matches!(self, Self::Async)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Async => "async",
            Self::Sync => "sync",
        }
    }
}

impl From<bool> for CallMode {
    fn from(is_async: bool) -> Self {
        if is_async { Self::Async } else { Self::Sync }
    }
}

impl fmt::Display for CallMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── ServiceInfo ─────────────────────────────────────────────────────────────

/// Identity of a registered service as exposed to methods and plugins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    name: Arc<str>,
    namespace: Arc<str>,
    pathname: Option<Arc<str>>,
}

impl ServiceInfo {
    pub fn new(name: impl Into<Arc<str>>, namespace: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            pathname: None,
        }
    }

    /// Attaches the optional path the service is published under.
    pub fn with_pathname(mut self, pathname: impl Into<Arc<str>>) -> Self {
        self.pathname = Some(pathname.into());
        self
    }

    /// The registered service name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The namespace reported to plugins.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn pathname(&self) -> Option<&str> {
        self.pathname.as_deref()
    }
}

// ─── Scratch ─────────────────────────────────────────────────────────────────

type ScratchKey = (Arc<str>, TypeId);

/// Typed scratch storage partitioned by owner.
///
/// Entries are keyed by `(owner, TypeId)`, so two plugins storing the same
/// type never see each other's values.
#[derive(Default)]
pub struct Scratch {
    entries: Mutex<HashMap<ScratchKey, Box<dyn Any + Send + Sync>>>,
}

impl Scratch {
    /// Stores `value` for `owner`, replacing any previous value of type `T`.
    pub fn insert<T: Send + Sync + 'static>(&self, owner: &Arc<str>, value: T) {
        self.entries
            .lock()
            .insert((owner.clone(), TypeId::of::<T>()), Box::new(value));
    }

    /// Returns a clone of the `T` stored for `owner`.
    pub fn get<T: Clone + Send + Sync + 'static>(&self, owner: &Arc<str>) -> Option<T> {
        self.entries
            .lock()
            .get(&(owner.clone(), TypeId::of::<T>()))
            .and_then(|v| v.downcast_ref::<T>())
            .cloned()
    }

    /// Removes and returns the `T` stored for `owner`.
    pub fn remove<T: Send + Sync + 'static>(&self, owner: &Arc<str>) -> Option<T> {
        self.entries
            .lock()
            .remove(&(owner.clone(), TypeId::of::<T>()))
            .and_then(|v| v.downcast::<T>().ok())
            .map(|b| *b)
    }

    pub fn contains<T: Send + Sync + 'static>(&self, owner: &Arc<str>) -> bool {
        self.entries
            .lock()
            .contains_key(&(owner.clone(), TypeId::of::<T>()))
    }

    /// Number of stored entries across all owners.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

// ─── CallMeta ────────────────────────────────────────────────────────────────

static NEXT_CALL_ID: AtomicU64 = AtomicU64::new(1);

/// Metadata of a single intercepted call.
pub struct CallMeta {
    call_id: u64,
    service: ServiceInfo,
    method: Arc<str>,
    error: OnceLock<SharedError>,
    scratch: Scratch,
}

impl CallMeta {
    /// Creates metadata for a call of `method` on `service`.
    pub fn new(service: ServiceInfo, method: impl Into<Arc<str>>) -> Self {
        Self {
            call_id: NEXT_CALL_ID.fetch_add(1, Ordering::Relaxed),
            service,
            method: method.into(),
            error: OnceLock::new(),
            scratch: Scratch::default(),
        }
    }

    /// Process-unique id of this call.
    pub fn call_id(&self) -> u64 {
        self.call_id
    }

    pub fn service(&self) -> &ServiceInfo {
        &self.service
    }

    pub fn service_name(&self) -> &str {
        self.service.name()
    }

    pub fn service_namespace(&self) -> &str {
        self.service.namespace()
    }

    pub fn method_name(&self) -> &str {
        &self.method
    }

    /// The first error raised during this call, if any.
    pub fn error(&self) -> Option<&SharedError> {
        self.error.get()
    }

    pub fn has_failed(&self) -> bool {
        self.error.get().is_some()
    }

    /// Records `error` as the call's failure.
    ///
    /// Only the first recorded error is kept; returns `false` when an error
    /// was already present.
    pub fn record_error(&self, error: SharedError) -> bool {
        self.error.set(error).is_ok()
    }

    pub fn scratch(&self) -> &Scratch {
        &self.scratch
    }
}

impl fmt::Debug for CallMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallMeta")
            .field("call_id", &self.call_id)
            .field("service", &self.service.name())
            .field("namespace", &self.service.namespace())
            .field("method", &self.method)
            .field("error", &self.error.get().map(|e| e.to_string()))
            .field("scratch_entries", &self.scratch.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> CallMeta {
        CallMeta::new(ServiceInfo::new("testService", "services.test"), "plus1")
    }

    #[test]
    fn test_identity_fields() {
        let meta = meta();
        assert_eq!(meta.service_name(), "testService");
        assert_eq!(meta.service_namespace(), "services.test");
        assert_eq!(meta.method_name(), "plus1");
        assert!(meta.error().is_none());
    }

    #[test]
    fn test_call_ids_are_unique() {
        assert_ne!(meta().call_id(), meta().call_id());
    }

    #[test]
    fn test_first_error_wins() {
        let meta = meta();
        let first: SharedError = Arc::from(Box::<dyn std::error::Error + Send + Sync>::from("first"));
        let second: SharedError = Arc::from(Box::<dyn std::error::Error + Send + Sync>::from("second"));

        assert!(meta.record_error(first));
        assert!(!meta.record_error(second));
        assert_eq!(meta.error().map(|e| e.to_string()).as_deref(), Some("first"));
    }

    #[test]
    fn test_scratch_is_partitioned_by_owner() {
        let meta = meta();
        let trace: Arc<str> = Arc::from("trace");
        let perf: Arc<str> = Arc::from("perf");

        meta.scratch().insert(&trace, 1_u32);
        assert_eq!(meta.scratch().get::<u32>(&trace), Some(1));
        assert_eq!(meta.scratch().get::<u32>(&perf), None);
        assert!(!meta.scratch().contains::<u32>(&perf));

        assert_eq!(meta.scratch().remove::<u32>(&trace), Some(1));
        assert!(meta.scratch().is_empty());
    }

    #[test]
    fn test_call_mode_from_flag() {
        assert_eq!(CallMode::from(true), CallMode::Async);
        assert_eq!(CallMode::from(false), CallMode::Sync);
        assert_eq!(CallMode::default(), CallMode::Async);
    }
}
