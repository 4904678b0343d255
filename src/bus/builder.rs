//! Builder pattern for constructing EventBus instances.

use crate::bus::config::EventBusConfig;
use crate::dispatcher::Dispatcher;
use crate::registry::{EventRegistry, LockedRegistry};
use crate::{EventBus, Result};
use std::sync::Arc;
use tracing::info;

/// Builder for creating EventBus instances
#[derive(Debug, Default)]
pub struct EventBusBuilder {
    config: EventBusConfig,
    registry: Option<Arc<dyn EventRegistry>>,
}

impl EventBusBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom configuration
    pub fn config(mut self, config: EventBusConfig) -> Self {
        self.config = config;
        self
    }

    /// Configure the event bus
    pub fn configure<F>(mut self, f: F) -> Self
    where
        F: FnOnce(EventBusConfig) -> EventBusConfig,
    {
        self.config = f(self.config);
        self
    }

    /// Set the namespace used when a call does not name one
    pub fn default_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.default_namespace = namespace.into();
        self
    }

    /// Use a custom registry implementation
    pub fn registry(mut self, registry: Arc<dyn EventRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Build with the quiet configuration
    pub fn quiet(self) -> Self {
        self.config(EventBusConfig::quiet())
    }

    /// Build the EventBus
    pub fn build(self) -> Result<EventBus> {
        let default_namespace = self.config.validate()?;

        let registry = self.registry.unwrap_or_else(|| {
            Arc::new(LockedRegistry::with_capacity(self.config.initial_capacity))
        });

        let dispatcher = Arc::new(Dispatcher::new(
            self.config.dispatcher.clone(),
            registry.clone(),
        ));

        info!(default_namespace = %default_namespace, "EventBus built");

        Ok(EventBus {
            default_namespace,
            registry,
            dispatcher,
        })
    }
}
