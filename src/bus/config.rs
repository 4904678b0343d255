//! Configuration for the event bus.

use crate::dispatcher::DispatcherConfig;
use crate::event::{Namespace, GLOBAL};
use crate::{Error, Result};

/// Configuration for the event bus
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// Dispatcher configuration
    pub dispatcher: DispatcherConfig,

    /// Namespace used when a call does not name one
    pub default_namespace: String,

    /// Number of events to pre-size the registry for
    pub initial_capacity: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            dispatcher: DispatcherConfig::default(),
            default_namespace: GLOBAL.to_string(),
            initial_capacity: 64,
        }
    }
}

impl EventBusConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default namespace
    pub fn default_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.default_namespace = namespace.into();
        self
    }

    /// Set the registry's initial capacity
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Configure dispatcher
    pub fn dispatcher_config<F>(mut self, f: F) -> Self
    where
        F: FnOnce(DispatcherConfig) -> DispatcherConfig,
    {
        self.dispatcher = f(self.dispatcher);
        self
    }

    /// Check the configuration and return the normalized default namespace
    pub fn validate(&self) -> Result<Namespace> {
        Namespace::new(&self.default_namespace).map_err(|_| {
            Error::ConfigError(format!(
                "default namespace must not be blank, got {:?}",
                self.default_namespace
            ))
        })
    }
}

/// Preset configurations for common use cases
impl EventBusConfig {
    /// Configuration where dispatching to nobody is routine, so it is only
    /// logged at DEBUG
    pub fn quiet() -> Self {
        Self::default().dispatcher_config(|d| d.warn_on_unknown(false))
    }

    /// Configuration for testing
    pub fn test() -> Self {
        Self::default()
            .initial_capacity(8)
            .dispatcher_config(|d| d.warn_on_unknown(false).trace_handlers(false))
    }
}
