//! Error types for the sync-events library.

use std::fmt;
use thiserror::Error;

/// Type alias for Results in this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for sync-events
#[derive(Error, Debug)]
pub enum Error {
    /// Event name was empty or blank
    #[error("Invalid event name: {0:?}")]
    InvalidEventName(String),

    /// Namespace was empty or blank
    #[error("Invalid namespace: {0:?}")]
    InvalidNamespace(String),

    /// Handler display name was empty or blank
    #[error("Invalid handler name: {0:?}")]
    InvalidHandlerName(String),

    /// Event handler returned an error
    #[error("Handler error: {0}")]
    HandlerError(String),

    /// Event handler panicked while running
    #[error("Handler panicked: {0}")]
    HandlerPanicked(String),

    /// The one-and-only result was requested but no handler produced one
    #[error("Dispatch produced no result")]
    NoResult,

    /// The one-and-only result was requested but several handlers were invoked
    #[error("Dispatch invoked {count} handlers where exactly one was expected")]
    AmbiguousResult {
        /// Number of handlers invoked, including failed ones
        count: usize,
    },

    /// A value could not be downcast to the requested type
    #[error("Value of type {actual} is not a {expected}")]
    TypeMismatch {
        /// Type that was requested
        expected: &'static str,
        /// Type actually stored
        actual: &'static str,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new internal error with a custom message
    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }

    /// Create a new handler error
    pub fn handler(msg: impl Into<String>) -> Self {
        Error::HandlerError(msg.into())
    }

    /// Check if this error was raised while validating a subscription or config
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidEventName(_)
                | Error::InvalidNamespace(_)
                | Error::InvalidHandlerName(_)
                | Error::ConfigError(_)
        )
    }

    /// Check if this error describes a failing handler
    pub fn is_handler_failure(&self) -> bool {
        matches!(self, Error::HandlerError(_) | Error::HandlerPanicked(_))
    }
}

/// Error context for debugging
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Event being dispatched
    pub event: Option<String>,
    /// Namespace being dispatched
    pub namespace: Option<String>,
    /// Display name of the handler involved
    pub handler_name: Option<String>,
    /// Subscription the handler belongs to
    pub subscription_id: Option<String>,
    /// When the context was captured
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorContext {
    /// Create a new error context
    pub fn new() -> Self {
        Self {
            event: None,
            namespace: None,
            handler_name: None,
            subscription_id: None,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Set the event name
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    /// Set the namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the handler name
    pub fn with_handler(mut self, name: impl Into<String>) -> Self {
        self.handler_name = Some(name.into());
        self
    }

    /// Set the subscription ID
    pub fn with_subscription(mut self, id: impl Into<String>) -> Self {
        self.subscription_id = Some(id.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error at {}", self.timestamp)?;
        if let Some(event) = &self.event {
            write!(f, " [event: {}]", event)?;
        }
        if let Some(namespace) = &self.namespace {
            write!(f, " [namespace: {}]", namespace)?;
        }
        if let Some(handler) = &self.handler_name {
            write!(f, " [handler: {}]", handler)?;
        }
        if let Some(id) = &self.subscription_id {
            write!(f, " [subscription: {}]", id)?;
        }
        Ok(())
    }
}
