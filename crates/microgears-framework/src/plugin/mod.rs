//! Plugin system for the MicroGears framework.
//!
//! # Architecture
//!
//! A [`Plugin`] is a named pair of optional hooks applied to every
//! intercepted call:
//!
//! - `beforeChain(args, ctx) -> Step<Args>` runs in **registration order**
//!   before the target method and may rewrite the arguments.
//! - `afterChain(result, ctx) -> Step<Value>` runs in **reverse**
//!   registration order after the target method and may rewrite the result.
//!
//! The [`PluginRegistry`] keeps plugins in registration order and enforces
//! unique names. Every change to it invalidates all composed chains, so the
//! next call of any method sees the new plugin set.
//!
//! A [`PluginDescriptor`] is the *static, `Copy` handle* to a plugin created
//! by [`define_plugin!`]; plugins that capture configuration are built with
//! [`Plugin::new`] instead.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use microgears::prelude::*;
//!
//! let plus_one = Plugin::new("plusOne")
//!     .before_chain(|args, _ctx| {
//!         let n = args.arg::<i64>(0).unwrap_or_default();
//!         Step::ok(args.with(0, n + 1))
//!     });
//!
//! gears.add_plugin(plus_one)?;
//! ```
//!
//! # Passing data from before to after
//!
//! Hooks share the per-call scratch space through [`HookContext`]. Entries
//! are scoped to the plugin that wrote them:
//!
//! ```rust,ignore
//! Plugin::new("timer")
//!     .before_chain(|args, ctx| {
//!         ctx.set_state(Instant::now());
//!         Step::ok(args)
//!     })
//!     .after_chain(|result, ctx| {
//!         let elapsed = ctx.take_state::<Instant>().map(|t| t.elapsed());
//!         info!(?elapsed, method = %ctx.meta().method_name(), "done");
//!         Step::ok(result)
//!     });
//! ```
//!
//! [`HookContext`]: crate::context::HookContext

// ─── Submodules ──────────────────────────────────────────────────────────────
pub mod core;
pub mod descriptor;
pub mod macros;
pub mod registry;

#[cfg(feature = "builtin-plugins")]
pub mod builtin;

// ─── Re-exports from submodules ──────────────────────────────────────────────
pub use self::core::{AfterHook, BeforeHook, Plugin, PluginMetadata};
pub use descriptor::PluginDescriptor;
pub use registry::PluginRegistry;
