//! Positional and keyword arguments handed to every handler of a dispatch.

use crate::event::Value;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

/// Arguments supplied by the caller of `dispatch`.
///
/// Every handler invoked by one dispatch receives the same `Arguments`, and
/// the [`DispatchResult`](crate::DispatchResult) echoes them back. Cloning is
/// cheap because the values are reference counted.
///
/// # Example
///
/// ```rust
/// use sync_events::Arguments;
///
/// let args = Arguments::new()
///     .with(7_u32)
///     .with_kw("name", String::from("Biology"));
///
/// assert_eq!(args.arg::<u32>(0), Some(&7));
/// assert_eq!(args.kwarg::<String>("name").map(String::as_str), Some("Biology"));
/// ```
#[derive(Clone, Default)]
pub struct Arguments {
    positional: Vec<Value>,
    keyword: BTreeMap<String, Value>,
}

impl Arguments {
    /// Create an empty argument list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument
    pub fn with<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.push(value);
        self
    }

    /// Set a keyword argument
    pub fn with_kw<T: Any + Send + Sync>(mut self, key: impl Into<String>, value: T) -> Self {
        self.insert(key, value);
        self
    }

    /// Append a positional argument in place
    pub fn push<T: Any + Send + Sync>(&mut self, value: T) {
        self.positional.push(Value::new(value));
    }

    /// Append an already wrapped positional argument
    pub fn push_value(&mut self, value: Value) {
        self.positional.push(value);
    }

    /// Set a keyword argument in place, replacing any previous value
    pub fn insert<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.keyword.insert(key.into(), Value::new(value));
    }

    /// Set an already wrapped keyword argument
    pub fn insert_value(&mut self, key: impl Into<String>, value: Value) {
        self.keyword.insert(key.into(), value);
    }

    /// Number of arguments, positional and keyword
    pub fn len(&self) -> usize {
        self.positional.len() + self.keyword.len()
    }

    /// Check if there are neither positional nor keyword arguments
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }

    /// All positional arguments in order
    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    /// All keyword arguments
    pub fn keyword(&self) -> &BTreeMap<String, Value> {
        &self.keyword
    }

    /// Get the positional argument at `index`
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    /// Get the keyword argument named `key`
    pub fn get_kw(&self, key: &str) -> Option<&Value> {
        self.keyword.get(key)
    }

    /// Get the positional argument at `index` as a `T`
    pub fn arg<T: Any>(&self, index: usize) -> Option<&T> {
        self.get(index).and_then(Value::downcast_ref::<T>)
    }

    /// Get the keyword argument named `key` as a `T`
    pub fn kwarg<T: Any>(&self, key: &str) -> Option<&T> {
        self.get_kw(key).and_then(Value::downcast_ref::<T>)
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arguments")
            .field("positional", &self.positional)
            .field("keyword", &self.keyword)
            .finish()
    }
}
