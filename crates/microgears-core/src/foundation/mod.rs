//! Foundation layer - value types shared by every MicroGears crate.
//!
//! - Frozen call arguments ([`Args`])
//! - Immediate-or-pending stage results ([`Step`]) and caller replies ([`Reply`])
//! - Per-call metadata and scratch space ([`CallMeta`])
//! - Error types for registration and invocation

pub mod args;
pub mod error;
pub mod meta;
pub mod reply;
pub mod step;

pub use args::Args;
pub use error::{
    ArgumentError, ArgumentResult, ChainStage, InvokeError, InvokeResult, RegistryError,
    RegistryResult, UnexpectedDeferred,
};
pub use meta::{CallMeta, CallMode, Scratch, ServiceInfo, SharedError};
pub use reply::Reply;
pub use step::{BoxError, Deferred, Step};
