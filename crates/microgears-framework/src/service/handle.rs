//! Mounted services.
//!
//! Mounting validates a [`ServiceDefinition`], classifies its methods and
//! freezes everything into a [`ServiceHandle`]. Calls on the handle of an
//! intercepted method go through the composed chain of that method.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::{Map, Value};
use tracing::{Instrument, debug_span};

use microgears_core::{
    Args, BoxError, CallMeta, CallMode, InvokeError, RegistryError, RegistryResult, Reply,
    ServiceInfo, Step,
};

use super::definition::{MethodFn, ServiceDefinition};
use super::introspect::{MethodKind, classify, resolved_methods};
use crate::chain::{ChainSource, ServiceId};
use crate::context::CallContext;
use crate::manager::GearsOptions;

struct InstalledMethod {
    name: Arc<str>,
    func: MethodFn,
    kind: MethodKind,
}

struct MountedService {
    id: ServiceId,
    info: ServiceInfo,
    mode: CallMode,
    fields: Map<String, Value>,
    methods: HashMap<Arc<str>, InstalledMethod>,
    order: Vec<Arc<str>>,
    source: Arc<ChainSource>,
}

/// A registered, instrumented service.
///
/// Cheap to clone. Every clone refers to the same mounted service.
///
/// # Example
///
/// ```rust,ignore
/// let users = gears.add_service(definition)?;
///
/// // async services answer with a deferred reply
/// let user = users.call("findUserById", args![7]).await?;
///
/// // sync services answer immediately
/// let total = counter.call("add", args![1, 2]).ready().unwrap()?;
/// ```
#[derive(Clone)]
pub struct ServiceHandle(Arc<MountedService>);

impl ServiceHandle {
    /// Validates `def` and installs its methods.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::MissingServiceName`] if the name is empty.
    /// - [`RegistryError::MissingNamespace`] if no namespace was given.
    pub(crate) fn mount(
        def: ServiceDefinition,
        options: &GearsOptions,
        source: Arc<ChainSource>,
    ) -> RegistryResult<Self> {
        if def.name().trim().is_empty() {
            return Err(RegistryError::MissingServiceName);
        }
        let namespace = match def.namespace_str() {
            Some(ns) if !ns.trim().is_empty() => ns,
            _ => return Err(RegistryError::missing_namespace(def.name())),
        };

        let mut info = ServiceInfo::new(def.name(), namespace);
        if let Some(pathname) = def.pathname_str() {
            info = info.with_pathname(pathname);
        }

        let mut methods = HashMap::new();
        let mut order = Vec::new();
        for (name, func) in resolved_methods(&def) {
            let kind = classify(&name, &options.private_prefix);
            order.push(name.clone());
            methods.insert(name.clone(), InstalledMethod { name, func, kind });
        }

        Ok(Self(Arc::new(MountedService {
            id: ServiceId::next(),
            info,
            mode: def
                .requested_call_mode()
                .unwrap_or(options.default_call_mode),
            fields: def.resolved_fields(),
            methods,
            order,
            source,
        })))
    }

    pub fn id(&self) -> ServiceId {
        self.0.id
    }

    pub fn info(&self) -> &ServiceInfo {
        &self.0.info
    }

    pub fn name(&self) -> &str {
        self.0.info.name()
    }

    pub fn namespace(&self) -> &str {
        self.0.info.namespace()
    }

    pub fn call_mode(&self) -> CallMode {
        self.0.mode
    }

    /// Looks up a data field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.fields.get(name)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0.fields
    }

    /// Method names, own methods first, then inherited ones.
    pub fn methods(&self) -> Vec<&str> {
        self.0.order.iter().map(|name| &**name).collect()
    }

    /// Names of the methods running behind a plugin chain.
    pub fn intercepted_methods(&self) -> Vec<&str> {
        self.0
            .order
            .iter()
            .filter(|name| self.is_intercepted(name))
            .map(|name| &**name)
            .collect()
    }

    pub fn has_method(&self, method: &str) -> bool {
        self.0.methods.contains_key(method)
    }

    pub fn is_intercepted(&self, method: &str) -> bool {
        self.0
            .methods
            .get(method)
            .is_some_and(|m| m.kind.is_intercepted())
    }

    /// Returns `true` if both handles refer to the same mounted service.
    pub fn ptr_eq(&self, other: &ServiceHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Calls `method` with `args`.
    ///
    /// Intercepted methods run behind their composed chain; in async mode the
    /// reply is always deferred and nothing runs until it is polled. Private
    /// methods run directly with the arguments as given.
    pub fn call(&self, method: &str, args: impl Into<Args>) -> Reply {
        let Some(installed) = self.0.methods.get(method) else {
            return Reply::Ready(Err(InvokeError::unknown_method(self.name(), method)));
        };
        let args = args.into();
        let meta = Arc::new(CallMeta::new(self.0.info.clone(), installed.name.clone()));
        let ctx = CallContext::new(meta, self.clone());

        match installed.kind {
            MethodKind::Direct => match (installed.func)(&ctx, args) {
                Step::Ready(res) => Reply::Ready(res.map_err(failed)),
                Step::Pending(fut) => Reply::deferred(fut.map(|res| res.map_err(failed))),
            },
            MethodKind::Intercepted => {
                let span = debug_span!(
                    "gear_call",
                    service = %self.name(),
                    method = %installed.name,
                    call_id = ctx.meta().call_id(),
                );
                let chain = self.0.source.chain_for(
                    self.0.id,
                    &installed.name,
                    &installed.func,
                    self.0.mode,
                );
                match span.in_scope(|| chain.invoke(args, ctx)) {
                    Reply::Deferred(fut) => Reply::Deferred(fut.instrument(span).boxed()),
                    ready => ready,
                }
            }
        }
    }
}

fn failed(err: BoxError) -> InvokeError {
    InvokeError::Failed(err.into())
}

impl fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceHandle")
            .field("id", &self.0.id)
            .field("info", &self.0.info)
            .field("mode", &self.0.mode)
            .field("methods", &self.methods())
            .finish()
    }
}

#[cfg(test)]
impl ServiceHandle {
    /// Mounts `def` against an empty plugin set.
    pub(crate) fn detached(def: ServiceDefinition) -> Self {
        match Self::mount(def, &GearsOptions::default(), Arc::new(ChainSource::new())) {
            Ok(handle) => handle,
            Err(err) => panic!("invalid test service: {err}"),
        }
    }

    /// A fresh call context for `method`, as a call would create it.
    pub(crate) fn context_for(&self, method: &str) -> CallContext {
        let meta = Arc::new(CallMeta::new(self.0.info.clone(), method));
        CallContext::new(meta, self.clone())
    }
}
