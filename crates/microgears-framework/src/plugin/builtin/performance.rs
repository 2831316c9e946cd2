//! Built-in performance plugin.
//!
//! The before-hook stores the start instant in the plugin's scratch space;
//! the after-hook takes it back and logs the elapsed time. Calls slower than
//! the configured threshold are logged at `warn` level.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use microgears_core::Step;

use crate::plugin::{Plugin, PluginMetadata};

/// Registry name of the performance plugin.
pub const PERFORMANCE_PLUGIN_NAME: &str = "performancePlugin";

#[derive(Debug, Clone, Copy)]
struct Started(Instant);

/// Creates the performance plugin.
///
/// Calls taking at least `slow_threshold` are reported with `warn!`, all
/// others with `debug!`. A zero threshold reports every call as slow.
pub fn performance_plugin(slow_threshold: Duration) -> Plugin {
    Plugin::new(PERFORMANCE_PLUGIN_NAME)
        .with_metadata(PluginMetadata {
            version: env!("CARGO_PKG_VERSION"),
            desc: "Measures the duration of every intercepted call",
            full_desc: None,
        })
        .before_chain(|args, ctx| {
            ctx.set_state(Started(Instant::now()));
            Step::ok(args)
        })
        .after_chain(move |result, ctx| {
            let Some(Started(at)) = ctx.take_state::<Started>() else {
                return Step::ok(result);
            };
            let elapsed = at.elapsed();
            let meta = ctx.meta();
            if elapsed >= slow_threshold {
                warn!(
                    service   = %meta.service_name(),
                    method    = %meta.method_name(),
                    call_id   = meta.call_id(),
                    elapsed   = ?elapsed,
                    threshold = ?slow_threshold,
                    failed    = ctx.error().is_some(),
                    "Slow call"
                );
            } else {
                debug!(
                    service = %meta.service_name(),
                    method  = %meta.method_name(),
                    call_id = meta.call_id(),
                    elapsed = ?elapsed,
                    "Execution time"
                );
            }
            Step::ok(result)
        })
}
