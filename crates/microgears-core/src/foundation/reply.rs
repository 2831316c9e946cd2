//! What an intercepted method hands back to its caller.

use std::future::{Future, IntoFuture};

use futures::FutureExt;
use futures::future::{self, BoxFuture};
use serde_json::Value;

use super::error::{InvokeError, InvokeResult};

/// The result of calling an intercepted method.
///
/// Methods of an `async` service always answer with [`Reply::Deferred`].
/// Methods of a synchronous service answer with [`Reply::Ready`] unless the
/// target method itself returned a pending value.
///
/// `Reply` implements [`IntoFuture`], so callers that do not care about the
/// distinction simply `.await` it.
pub enum Reply {
    /// The call already settled.
    Ready(InvokeResult<Value>),
    /// The call settles when the future completes.
    Deferred(BoxFuture<'static, InvokeResult<Value>>),
}

impl Reply {
    /// Wraps a future as a deferred reply.
    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = InvokeResult<Value>> + Send + 'static,
    {
        Self::Deferred(future.boxed())
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Returns the settled result, or `None` for a deferred reply.
    pub fn ready(self) -> Option<InvokeResult<Value>> {
        match self {
            Self::Ready(res) => Some(res),
            Self::Deferred(_) => None,
        }
    }

    /// Converts a settled reply into a deferred one.
    pub fn into_deferred(self) -> Self {
        match self {
            Self::Ready(res) => Self::Deferred(future::ready(res).boxed()),
            deferred => deferred,
        }
    }
}

impl IntoFuture for Reply {
    type Output = InvokeResult<Value>;
    type IntoFuture = BoxFuture<'static, InvokeResult<Value>>;

    fn into_future(self) -> Self::IntoFuture {
        match self {
            Self::Ready(res) => future::ready(res).boxed(),
            Self::Deferred(fut) => fut,
        }
    }
}

impl From<InvokeResult<Value>> for Reply {
    fn from(res: InvokeResult<Value>) -> Self {
        Self::Ready(res)
    }
}

impl From<InvokeError> for Reply {
    fn from(err: InvokeError) -> Self {
        Self::Ready(Err(err))
    }
}

impl std::fmt::Debug for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(res) => f.debug_tuple("Reply::Ready").field(res).finish(),
            Self::Deferred(_) => f.write_str("Reply::Deferred(..)"),
        }
    }
}
