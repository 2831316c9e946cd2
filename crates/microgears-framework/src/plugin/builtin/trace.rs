//! Built-in call tracing plugin.
//!
//! Emits one `BEFORE` event when a call enters the chain and one `AFTER`
//! event when it leaves, tagged with namespace, service, method and call id.
//! Failed calls are reported at `warn` level together with their error.

use serde_json::Value;
use tracing::{info, warn};

use microgears_core::{Args, Step};

use crate::context::HookContext;
use crate::define_plugin;
use crate::plugin::PluginDescriptor;

/// Registry name of the trace plugin.
pub const TRACE_PLUGIN_NAME: &str = "tracePlugin";

fn trace_before(args: Args, ctx: &HookContext) -> Step<Args> {
    let meta = ctx.meta();
    info!(
        namespace = %meta.service_namespace(),
        service   = %meta.service_name(),
        method    = %meta.method_name(),
        call_id   = meta.call_id(),
        args      = args.len(),
        "BEFORE"
    );
    Step::ok(args)
}

fn trace_after(result: Value, ctx: &HookContext) -> Step<Value> {
    let meta = ctx.meta();
    match ctx.error() {
        Some(err) => warn!(
            namespace = %meta.service_namespace(),
            service   = %meta.service_name(),
            method    = %meta.method_name(),
            call_id   = meta.call_id(),
            error     = %err,
            "AFTER (failed)"
        ),
        None => info!(
            namespace = %meta.service_namespace(),
            service   = %meta.service_name(),
            method    = %meta.method_name(),
            call_id   = meta.call_id(),
            "AFTER"
        ),
    }
    Step::ok(result)
}

/// Logs entry and exit of every intercepted call.
pub static TRACE_PLUGIN: PluginDescriptor = define_plugin! {
    name: "tracePlugin",
    before_chain: trace_before,
    after_chain: trace_after,
    metadata: {
        desc: "Logs entry and exit of every intercepted call",
    },
};
