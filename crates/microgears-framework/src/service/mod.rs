//! Services: definitions, method classification and mounted handles.
//!
//! # Lifecycle
//!
//! 1. Describe the service with a [`ServiceDefinition`] (identity, call mode,
//!    data fields, methods, optional base definition).
//! 2. Register it with `MicroGears::add_service`. Every method whose name
//!    does not start with the private prefix (`_` by default) and is not
//!    `constructor` is installed behind its plugin chain.
//! 3. Call methods through the returned [`ServiceHandle`], or by name through
//!    the registry.

pub mod definition;
pub mod handle;
pub mod introspect;

pub use definition::{MethodEntry, MethodFn, MethodResult, ServiceDefinition};
pub use handle::ServiceHandle;
pub use introspect::{MethodKind, is_private, qualifying_methods};
