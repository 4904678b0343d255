//! Event names, namespaces and the values carried by a dispatch.
//!
//! Events are plain string tags. They are case-insensitive: every name is
//! trimmed and upper-cased when it enters the dispatcher, so `"stack_created"`
//! and `"STACK_CREATED"` address the same subscribers. Namespaces follow the
//! same rules and partition the subscribers of one event into independent
//! audiences.

use crate::{Error, Result};
use std::fmt;

pub mod arguments;
pub mod value;

pub use arguments::Arguments;
pub use value::Value;

/// The namespace used when a caller does not name one.
pub const GLOBAL: &str = "GLOBAL";

fn normalize(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}

/// A normalized event name.
///
/// # Example
///
/// ```rust
/// use sync_events::EventName;
///
/// let name = EventName::new(" stack_created ").unwrap();
/// assert_eq!(name.as_str(), "STACK_CREATED");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventName(String);

impl EventName {
    /// Normalize a raw event name, rejecting blank input
    pub fn new(raw: impl AsRef<str>) -> Result<Self> {
        let raw = raw.as_ref();
        normalize(raw)
            .map(Self)
            .ok_or_else(|| Error::InvalidEventName(raw.to_string()))
    }

    /// Get the normalized name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EventName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A normalized namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace(String);

impl Namespace {
    /// Normalize a raw namespace, rejecting blank input
    pub fn new(raw: impl AsRef<str>) -> Result<Self> {
        let raw = raw.as_ref();
        normalize(raw)
            .map(Self)
            .ok_or_else(|| Error::InvalidNamespace(raw.to_string()))
    }

    /// The `GLOBAL` namespace
    pub fn global() -> Self {
        Self(GLOBAL.to_string())
    }

    /// Get the normalized namespace
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if this is the `GLOBAL` namespace
    pub fn is_global(&self) -> bool {
        self.0 == GLOBAL
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self::global()
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Namespace {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
