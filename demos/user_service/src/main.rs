//! User Service Example
//!
//! Registers a `userService` behind the built-in trace and performance
//! plugins plus a small audit plugin, then calls it a few times.
//!
//! ```text
//! findUserById(1)
//! └── tracePlugin.before ─▶ performancePlugin.before ─▶ auditPlugin.before
//!     └── target
//!     auditPlugin.after ─▶ performancePlugin.after ─▶ tracePlugin.after
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --package user-service
//! MICROGEARS_LOGGING__LEVEL=debug cargo run --package user-service
//! ```

use std::time::Duration;

use anyhow::Result;
use microgears::prelude::*;
use tracing::{error, info};

// ============================================================================
// Plugins
// ============================================================================

fn audit_before(args: Args, ctx: &HookContext) -> Step<Args> {
    info!(
        method = %ctx.meta().method_name(),
        call_id = ctx.meta().call_id(),
        "audit: call started"
    );
    Step::ok(args)
}

fn audit_after(result: Value, ctx: &HookContext) -> Step<Value> {
    if let Some(err) = ctx.error() {
        error!(method = %ctx.meta().method_name(), error = %err, "audit: call failed");
    }
    Step::ok(result)
}

/// Logs every call on its own, next to the built-in plugins.
static AUDIT_PLUGIN: PluginDescriptor = define_plugin! {
    name: "auditPlugin",
    before_chain: audit_before,
    after_chain: audit_after,
    metadata: {
        desc: "Audit log of service calls",
    },
};

// ============================================================================
// Services
// ============================================================================

async fn find_user(args: Args, cache_key: Option<InvokeResult<Value>>) -> MethodResult {
    let id = args.arg::<u64>(0)?;
    tokio::time::sleep(Duration::from_millis(10)).await;
    if id == 0 {
        return Err("user ids start at 1".into());
    }
    let cache_key = match cache_key {
        Some(res) => res?,
        None => Value::Null,
    };
    Ok(json!({ "id": id, "name": "clark kent", "cacheKey": cache_key }))
}

fn user_service() -> ServiceDefinition {
    ServiceDefinition::new("userService")
        .namespace("services.userservice")
        .pathname("/users")
        .field("source", "memory")
        .async_method("findUserById", |ctx, args| {
            let cache_key = ctx.service().call("_cacheKey", args.clone()).ready();
            find_user(args, cache_key)
        })
        // private: runs without any plugin
        .method("_cacheKey", |ctx, args| {
            Ok(json!(format!(
                "{}:{}",
                ctx.info().namespace(),
                args.arg::<u64>(0)?
            )))
        })
}

fn math_service() -> ServiceDefinition {
    ServiceDefinition::new("mathService")
        .namespace("services.math")
        .sync()
        .method("add", |_, args| {
            Ok(json!(args.arg::<i64>(0)? + args.arg::<i64>(1)?))
        })
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // report the 10ms lookups as slow
    let runtime = GearsRuntime::builder()
        .set("plugins.performance.slow_threshold_ms", 5)
        .build()?;
    let gears = runtime.gears();
    gears.add_plugin(&AUDIT_PLUGIN)?;

    let users = gears.add_service(user_service())?;
    gears.add_service(math_service())?;
    info!(plugins = ?gears.plugin_names(), services = ?gears.service_names(), "Ready");

    let user = users.call("findUserById", args![1]).await?;
    info!(%user, "Found user");

    match users.call("findUserById", args![0]).await {
        Ok(user) => info!(%user, "Found user"),
        Err(err) => error!(%err, "Lookup failed"),
    }

    // sync services answer without awaiting
    if let Some(res) = gears.call("mathService", "add", args![40, 2]).ready() {
        let sum = res?;
        info!(%sum, "Added");
    }

    Ok(())
}
