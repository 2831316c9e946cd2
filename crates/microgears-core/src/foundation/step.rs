//! Immediate-or-pending values produced by hooks and service methods.
//!
//! Hooks and methods may answer right away or hand back a future. [`Step`]
//! models both so the chain can pick a composition strategy: an `async`
//! service awaits every stage, a synchronous one inspects the variant and
//! keeps going without a runtime.

use std::future::Future;

use futures::FutureExt;
use futures::future::BoxFuture;

/// Boxed error type returned by user hooks and methods.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A boxed future resolving to `T` or a [`BoxError`].
pub type Deferred<T> = BoxFuture<'static, Result<T, BoxError>>;

/// The outcome of a single chain stage.
pub enum Step<T> {
    /// The stage finished synchronously.
    Ready(Result<T, BoxError>),
    /// The stage returned a pending computation.
    Pending(Deferred<T>),
}

impl<T: Send + 'static> Step<T> {
    /// A successful immediate value.
    pub fn ok(value: T) -> Self {
        Self::Ready(Ok(value))
    }

    /// An immediate failure.
    pub fn err(error: impl Into<BoxError>) -> Self {
        Self::Ready(Err(error.into()))
    }

    /// Wraps a future as a pending stage.
    pub fn defer<F, E>(future: F) -> Self
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        Self::Pending(future.map(|res| res.map_err(Into::into)).boxed())
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Transforms the success value, staying immediate when possible.
    pub fn map<U, F>(self, f: F) -> Step<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        match self {
            Self::Ready(res) => Step::Ready(res.map(f)),
            Self::Pending(fut) => Step::Pending(fut.map(|res| res.map(f)).boxed()),
        }
    }

    /// Drives the stage to completion.
    pub async fn resolve(self) -> Result<T, BoxError> {
        match self {
            Self::Ready(res) => res,
            Self::Pending(fut) => fut.await,
        }
    }
}

impl<T, E> From<Result<T, E>> for Step<T>
where
    E: Into<BoxError>,
{
    fn from(res: Result<T, E>) -> Self {
        Self::Ready(res.map_err(Into::into))
    }
}

impl<T> std::fmt::Debug for Step<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(Ok(_)) => f.write_str("Step::Ready(Ok(..))"),
            Self::Ready(Err(e)) => write!(f, "Step::Ready(Err({e}))"),
            Self::Pending(_) => f.write_str("Step::Pending(..)"),
        }
    }
}
