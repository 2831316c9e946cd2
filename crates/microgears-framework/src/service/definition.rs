//! Service definitions.
//!
//! A [`ServiceDefinition`] is the raw, un-instrumented description of a
//! service: its identity, its call mode, its data fields and its methods.
//! Registering it with [`MicroGears::add_service`] installs the methods behind
//! their plugin chains and yields a [`ServiceHandle`].
//!
//! [`MicroGears::add_service`]: crate::MicroGears::add_service
//! [`ServiceHandle`]: crate::service::ServiceHandle

use std::future::Future;
use std::sync::Arc;

use serde_json::{Map, Value};

use microgears_core::{Args, BoxError, CallMode, Step};

use crate::context::CallContext;

/// A service method as stored by the framework.
pub type MethodFn = Arc<dyn Fn(&CallContext, Args) -> Step<Value> + Send + Sync>;

/// Result type returned by plain service methods.
pub type MethodResult = Result<Value, BoxError>;

/// A named method of a definition.
#[derive(Clone)]
pub struct MethodEntry {
    name: Arc<str>,
    func: MethodFn,
}

impl MethodEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_arc(&self) -> &Arc<str> {
        &self.name
    }

    pub(crate) fn func(&self) -> &MethodFn {
        &self.func
    }
}

impl std::fmt::Debug for MethodEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("MethodEntry").field(&self.name).finish()
    }
}

/// Builder-style description of a service.
///
/// # Example
///
/// ```rust,ignore
/// let users = ServiceDefinition::new("userService")
///     .namespace("services.userservice")
///     .field("table", "users")
///     .method("findUserById", |_ctx, args| {
///         let id = args.arg::<u64>(0)?;
///         Ok(json!({ "name": "user", "id": id }))
///     })
///     .method("_cacheKey", |_ctx, args| Ok(json!(format!("user:{}", args[0]))));
///
/// let users = gears.add_service(users)?;
/// let user = users.call("findUserById", args![7]).await?;
/// ```
#[derive(Clone, Debug)]
pub struct ServiceDefinition {
    name: String,
    namespace: Option<String>,
    pathname: Option<String>,
    call_mode: Option<CallMode>,
    fields: Map<String, Value>,
    methods: Vec<MethodEntry>,
    base: Option<Box<ServiceDefinition>>,
}

impl ServiceDefinition {
    /// Starts a definition for the service called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            pathname: None,
            call_mode: None,
            fields: Map::new(),
            methods: Vec::new(),
            base: None,
        }
    }

    /// Sets the namespace reported to plugins.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Sets the path the service is published under.
    pub fn pathname(mut self, pathname: impl Into<String>) -> Self {
        self.pathname = Some(pathname.into());
        self
    }

    /// Fixes the call mode; unset definitions use the registry default.
    pub fn call_mode(mut self, mode: CallMode) -> Self {
        self.call_mode = Some(mode);
        self
    }

    /// Equivalent to the `async` flag of the service: `false` makes calls
    /// return their value directly.
    pub fn async_calls(self, enabled: bool) -> Self {
        self.call_mode(CallMode::from(enabled))
    }

    /// Shorthand for `call_mode(CallMode::Sync)`.
    pub fn sync(self) -> Self {
        self.call_mode(CallMode::Sync)
    }

    /// Adds a data field. Fields are never intercepted.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Adds a method answering synchronously.
    pub fn method<F>(self, name: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn(&CallContext, Args) -> MethodResult + Send + Sync + 'static,
    {
        self.step_method(name, move |ctx, args| Step::Ready(f(ctx, args)))
    }

    /// Adds a method answering with a future.
    ///
    /// The context is borrowed for the duration of the call only; clone it
    /// into the future if the body needs it.
    pub fn async_method<F, Fut>(self, name: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn(&CallContext, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = MethodResult> + Send + 'static,
    {
        self.step_method(name, move |ctx, args| Step::defer(f(ctx, args)))
    }

    /// Adds a method that decides per call whether to answer immediately.
    ///
    /// A method with the same name replaces the earlier one.
    pub fn step_method<F>(mut self, name: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn(&CallContext, Args) -> Step<Value> + Send + Sync + 'static,
    {
        let entry = MethodEntry {
            name: name.into(),
            func: Arc::new(f),
        };
        match self.methods.iter_mut().find(|m| m.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.methods.push(entry),
        }
        self
    }

    /// Inherits methods and fields from `base`.
    ///
    /// Own methods and fields take precedence over inherited ones.
    pub fn inherit(mut self, base: ServiceDefinition) -> Self {
        self.base = Some(Box::new(base));
        self
    }

    // ─── Accessors ───────────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace_str(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn pathname_str(&self) -> Option<&str> {
        self.pathname.as_deref()
    }

    /// The explicitly requested call mode, if any.
    pub fn requested_call_mode(&self) -> Option<CallMode> {
        self.call_mode
    }

    /// Own fields, not including inherited ones.
    pub fn own_fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Own methods in declaration order.
    pub fn own_methods(&self) -> &[MethodEntry] {
        &self.methods
    }

    pub fn base(&self) -> Option<&ServiceDefinition> {
        self.base.as_deref()
    }

    /// Own and inherited fields; own values win.
    pub fn resolved_fields(&self) -> Map<String, Value> {
        let mut fields = self
            .base
            .as_deref()
            .map(ServiceDefinition::resolved_fields)
            .unwrap_or_default();
        for (key, value) in &self.fields {
            fields.insert(key.clone(), value.clone());
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_builder_records_identity() {
        let def = ServiceDefinition::new("testService")
            .namespace("services.test")
            .pathname("/test")
            .sync();

        assert_eq!(def.name(), "testService");
        assert_eq!(def.namespace_str(), Some("services.test"));
        assert_eq!(def.pathname_str(), Some("/test"));
        assert_eq!(def.requested_call_mode(), Some(CallMode::Sync));
    }

    #[test]
    fn test_same_method_name_replaces() {
        let def = ServiceDefinition::new("s")
            .method("f", |_, _| Ok(json!(1)))
            .method("g", |_, _| Ok(json!(2)))
            .method("f", |_, _| Ok(json!(3)));

        let names: Vec<_> = def.own_methods().iter().map(MethodEntry::name).collect();
        assert_eq!(names, ["f", "g"]);
    }

    #[test]
    fn test_resolved_fields_prefer_own() {
        let base = ServiceDefinition::new("base")
            .field("table", "base_table")
            .field("limit", 10);
        let def = ServiceDefinition::new("derived")
            .field("table", "users")
            .inherit(base);

        let fields = def.resolved_fields();
        assert_eq!(fields["table"], json!("users"));
        assert_eq!(fields["limit"], json!(10));
    }

    #[test]
    fn test_async_calls_flag() {
        let def = ServiceDefinition::new("s").async_calls(false);
        assert_eq!(def.requested_call_mode(), Some(CallMode::Sync));
        let def = ServiceDefinition::new("s").async_calls(true);
        assert_eq!(def.requested_call_mode(), Some(CallMode::Async));
    }
}
