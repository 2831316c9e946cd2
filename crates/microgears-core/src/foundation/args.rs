//! Frozen call arguments.
//!
//! Every intercepted call captures its positional arguments into an [`Args`]
//! value before any hook or the target method sees them. `Args` owns a deep
//! copy of the caller's values behind an `Arc<[Value]>` and exposes no
//! mutable access: a hook that wants to change the arguments builds a new
//! `Args` (see [`Args::with`], [`Args::push`], [`Args::map`]) and returns it
//! from its before-hook.
//!
//! ```rust,ignore
//! use microgears_core::args;
//!
//! let args = args!["wtf", {"id": 7}];
//! let id: u64 = args.arg::<serde_json::Value>(1)?["id"].as_u64().unwrap_or_default();
//! let louder = args.with(0, format!("{} !!", args[0].as_str().unwrap_or("")));
//! ```

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::Value;

use super::error::{ArgumentError, ArgumentResult};

/// An immutable, cheaply clonable sequence of call arguments.
#[derive(Clone, PartialEq, Default)]
pub struct Args(Arc<[Value]>);

impl Args {
    /// Captures an owned vector of values.
    pub fn new(values: Vec<Value>) -> Self {
        Self(values.into())
    }

    /// An empty argument list.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Captures borrowed values by deep copy.
    ///
    /// The caller keeps its own values and may mutate them afterwards; the
    /// captured copy is unaffected.
    pub fn freeze(values: &[Value]) -> Self {
        Self(values.iter().cloned().collect())
    }

    /// Number of positional arguments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the argument at `index`, if present.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }

    /// Deserialises the argument at `index` into `T`.
    ///
    /// # Errors
    ///
    /// [`ArgumentError::Missing`] when there is no argument at `index`,
    /// [`ArgumentError::Invalid`] when it does not have the shape of `T`.
    pub fn arg<T: DeserializeOwned>(&self, index: usize) -> ArgumentResult<T> {
        let value = self
            .0
            .get(index)
            .ok_or(ArgumentError::Missing { index, len: self.len() })?;
        T::deserialize(value).map_err(|source| ArgumentError::Invalid { index, source })
    }

    /// Returns a copy with the argument at `index` replaced.
    ///
    /// Indices past the end extend the sequence, padding with `null`.
    pub fn with(&self, index: usize, value: impl Into<Value>) -> Self {
        let mut values = self.to_vec();
        if index >= values.len() {
            values.resize(index + 1, Value::Null);
        }
        values[index] = value.into();
        Self::new(values)
    }

    /// Returns a copy with `value` appended.
    pub fn push(&self, value: impl Into<Value>) -> Self {
        let mut values = self.to_vec();
        values.push(value.into());
        Self::new(values)
    }

    /// Returns a copy with `f` applied to every argument.
    pub fn map<F>(&self, f: F) -> Self
    where
        F: FnMut(&Value) -> Value,
    {
        self.0.iter().map(f).collect()
    }

    /// Copies the arguments out into an owned vector.
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.to_vec()
    }
}

impl Deref for Args {
    type Target = [Value];

    fn deref(&self) -> &[Value] {
        &self.0
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl Serialize for Args {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl From<Vec<Value>> for Args {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

impl From<&[Value]> for Args {
    fn from(values: &[Value]) -> Self {
        Self::freeze(values)
    }
}

impl<const N: usize> From<[Value; N]> for Args {
    fn from(values: [Value; N]) -> Self {
        Self(Arc::from(values))
    }
}

impl From<()> for Args {
    fn from(_: ()) -> Self {
        Self::empty()
    }
}

impl FromIterator<Value> for Args {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Args {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Builds [`Args`] from JSON-like literals.
///
/// Each element goes through `serde_json::json!`, so nested objects and
/// arrays can be written inline.
///
/// ```rust,ignore
/// let args = args![1, "two", { "three": [3] }];
/// assert_eq!(args.len(), 3);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::Args::empty()
    };
    ($($value:tt),+ $(,)?) => {
        $crate::Args::new(::std::vec![$($crate::__json::json!($value)),+])
    };
}
