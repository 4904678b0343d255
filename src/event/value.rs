//! Type-erased values passed to and returned from handlers.

use crate::{Error, Result};
use std::any::{self, Any};
use std::fmt;
use std::sync::Arc;

/// A cheaply cloneable, type-erased value.
///
/// Handlers receive their arguments and hand back their results as `Value`s,
/// which lets one dispatcher carry payloads of any type. The original type
/// is recovered with [`Value::downcast_ref`] or [`Value::downcast`].
#[derive(Clone)]
pub struct Value {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Value {
    /// Wrap a value
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            type_name: any::type_name::<T>(),
        }
    }

    /// Wrap a value that is already shared
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            inner: value,
            type_name: any::type_name::<T>(),
        }
    }

    /// The unit value, returned by handlers that produce nothing
    pub fn unit() -> Self {
        Self::new(())
    }

    /// Name of the wrapped type
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Check if the wrapped value is a `T`
    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Check if the wrapped value is `()`
    pub fn is_unit(&self) -> bool {
        self.is::<()>()
    }

    /// Borrow the wrapped value as a `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Borrow the wrapped value as a `T`, reporting a mismatch as an error
    pub fn try_downcast_ref<T: Any>(&self) -> Result<&T> {
        self.downcast_ref::<T>().ok_or(Error::TypeMismatch {
            expected: any::type_name::<T>(),
            actual: self.type_name,
        })
    }

    /// Get a shared handle to the wrapped value as a `T`
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.inner).downcast::<T>().ok()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value<{}>", self.type_name)
    }
}
