//! # MicroGears Core
//!
//! Foundation types for the MicroGears service-decoration framework.
//!
//! MicroGears wraps every public method of a registered service with an
//! ordered chain of plugin hooks. This crate holds the values that travel
//! through such a chain and carries no behaviour of its own:
//!
//! - **Arguments**: [`Args`] is the frozen copy of a call's positional
//!   arguments handed to hooks and to the target method.
//! - **Stages**: [`Step`] is what a hook or method returns, either a ready
//!   result or a pending future.
//! - **Metadata**: [`CallMeta`] describes one call (service, namespace,
//!   method, call id), records its failure and holds per-plugin scratch space.
//! - **Replies**: [`Reply`] is what the caller receives; it can be awaited.
//! - **Errors**: [`RegistryError`] for registration, [`InvokeError`] for calls.
//!
//! ## Call lifecycle
//!
//! ```text
//! caller ──▶ Args::freeze ──▶ before₁ … beforeₙ ──▶ target ──▶ afterₙ … after₁ ──▶ Reply
//!                                 (CallMeta shared by every stage)
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use microgears_core::{args, CallMeta, ServiceInfo, Step};
//!
//! let meta = CallMeta::new(ServiceInfo::new("userService", "services.user"), "findUserById");
//! let args = args![42];
//! let step: Step<serde_json::Value> = Step::ok(args[0].clone());
//! ```

pub mod foundation;

pub use foundation::{
    ArgumentError, ArgumentResult, Args, BoxError, CallMeta, CallMode, ChainStage, Deferred,
    InvokeError, InvokeResult, RegistryError, RegistryResult, Reply, Scratch, ServiceInfo,
    SharedError, Step, UnexpectedDeferred,
};

// Re-exported for the `args!` macro.
#[doc(hidden)]
pub use serde_json as __json;

/// JSON value type used for arguments and results.
pub use serde_json::Value;

/// Prelude for common imports.
pub mod prelude {
    pub use super::args;
    pub use super::foundation::*;
    pub use serde_json::Value;
}
