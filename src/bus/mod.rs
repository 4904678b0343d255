//! The main EventBus implementation.
//!
//! The EventBus is the handle every collaborator receives at startup. It
//! validates and normalizes subscriptions, forwards dispatches to the
//! [`Dispatcher`], and offers bulk variants of each operation. Cloning a bus
//! is cheap and every clone talks to the same registry.

use crate::dispatcher::{DispatchResult, Dispatcher, DispatcherStats};
use crate::event::{Arguments, EventName, Namespace};
use crate::registry::{EventRegistry, RegistryStatistics, RegistryStats};
use crate::subscription::{
    handler_fn, EventHandler, HandlerResult, Subscription, SubscriptionId, SubscriptionOptions,
    SubscriptionRequest,
};
use crate::Result;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

pub mod builder;
pub mod config;

pub use builder::EventBusBuilder;
pub use config::EventBusConfig;

/// The event bus for subscribing to and dispatching events.
///
/// # Example
///
/// ```rust
/// use sync_events::{Arguments, EventBus, SubscriptionOptions, Value};
///
/// let bus = EventBus::new();
///
/// let id = bus
///     .subscribe_with(
///         "stack_created",
///         "global",
///         sync_events::handler_fn("count_stacks", |_: &Arguments| Ok(Value::new(1_u32))),
///         SubscriptionOptions::new().persistent(true),
///     )
///     .unwrap();
///
/// let result = bus.dispatch("STACK_CREATED", Arguments::new());
/// assert_eq!(*result.only_as::<u32>().unwrap(), 1);
///
/// assert!(bus.unsubscribe(&id));
/// ```
#[derive(Clone)]
pub struct EventBus {
    pub(crate) default_namespace: Namespace,
    pub(crate) registry: Arc<dyn EventRegistry>,
    pub(crate) dispatcher: Arc<Dispatcher>,
}

impl EventBus {
    /// Create an EventBus with the default configuration
    pub fn new() -> Self {
        let registry: Arc<dyn EventRegistry> = Arc::new(crate::registry::LockedRegistry::new());
        Self {
            default_namespace: Namespace::global(),
            dispatcher: Arc::new(Dispatcher::new(Default::default(), registry.clone())),
            registry,
        }
    }

    /// Create a new EventBus builder
    pub fn builder() -> EventBusBuilder {
        EventBusBuilder::new()
    }

    /// Namespace used when a call does not name one
    pub fn default_namespace(&self) -> &Namespace {
        &self.default_namespace
    }

    /// The registry holding every subscription
    pub fn registry(&self) -> &Arc<dyn EventRegistry> {
        &self.registry
    }

    /// Subscribe a handler to an event in the default namespace.
    ///
    /// The subscription has priority 0 and fires once.
    pub fn subscribe(
        &self,
        event: impl AsRef<str>,
        handler: impl EventHandler,
    ) -> Result<SubscriptionId> {
        self.subscribe_shared(
            event,
            self.default_namespace.as_str(),
            Arc::new(handler),
            SubscriptionOptions::default(),
        )
    }

    /// Subscribe a handler with an explicit namespace and options
    pub fn subscribe_with(
        &self,
        event: impl AsRef<str>,
        namespace: impl AsRef<str>,
        handler: impl EventHandler,
        options: SubscriptionOptions,
    ) -> Result<SubscriptionId> {
        self.subscribe_shared(event, namespace, Arc::new(handler), options)
    }

    /// Subscribe a closure under the given display name in the default namespace
    pub fn subscribe_fn<F>(
        &self,
        event: impl AsRef<str>,
        name: impl Into<String>,
        function: F,
    ) -> Result<SubscriptionId>
    where
        F: Fn(&Arguments) -> HandlerResult + Send + Sync + 'static,
    {
        self.subscribe(event, handler_fn(name, function))
    }

    /// Subscribe an already shared handler
    pub fn subscribe_shared(
        &self,
        event: impl AsRef<str>,
        namespace: impl AsRef<str>,
        handler: Arc<dyn EventHandler>,
        options: SubscriptionOptions,
    ) -> Result<SubscriptionId> {
        let subscription = Self::prepare(event.as_ref(), namespace.as_ref(), handler, options)?;
        Ok(self.register(subscription))
    }

    /// Subscribe according to a request
    pub fn subscribe_request(&self, request: SubscriptionRequest) -> Result<SubscriptionId> {
        let subscription = self.prepare_request(request)?;
        Ok(self.register(subscription))
    }

    /// Subscribe every request, or none of them.
    ///
    /// All requests are validated before the first one is registered, so a
    /// malformed element leaves the registry untouched.
    pub fn bulk_subscribe<I>(&self, requests: I) -> Result<Vec<SubscriptionId>>
    where
        I: IntoIterator<Item = SubscriptionRequest>,
    {
        let subscriptions = requests
            .into_iter()
            .map(|request| self.prepare_request(request))
            .collect::<Result<Vec<_>>>()?;

        Ok(subscriptions
            .into_iter()
            .map(|subscription| self.register(subscription))
            .collect())
    }

    /// Remove a subscription, returning whether it was registered
    pub fn unsubscribe(&self, id: &SubscriptionId) -> bool {
        self.registry.unregister(id)
    }

    /// Remove several subscriptions, reporting each outcome in order
    pub fn bulk_unsubscribe<'a, I>(&self, ids: I) -> Vec<bool>
    where
        I: IntoIterator<Item = &'a SubscriptionId>,
    {
        ids.into_iter().map(|id| self.unsubscribe(id)).collect()
    }

    /// Check if a subscription is still registered
    pub fn is_subscribed(&self, id: &SubscriptionId) -> bool {
        self.registry.contains(id)
    }

    /// Dispatch an event in the default namespace
    pub fn dispatch(&self, event: impl AsRef<str>, args: Arguments) -> DispatchResult {
        self.dispatcher
            .dispatch(event.as_ref(), self.default_namespace.as_str(), args)
    }

    /// Dispatch an event in the given namespace
    pub fn dispatch_in(
        &self,
        event: impl AsRef<str>,
        namespace: impl AsRef<str>,
        args: Arguments,
    ) -> DispatchResult {
        self.dispatcher
            .dispatch(event.as_ref(), namespace.as_ref(), args)
    }

    /// Dispatch to each (event, namespace) pair in turn with the same arguments
    pub fn bulk_dispatch<I, E, N>(&self, targets: I, args: &Arguments) -> Vec<DispatchResult>
    where
        I: IntoIterator<Item = (E, N)>,
        E: AsRef<str>,
        N: AsRef<str>,
    {
        targets
            .into_iter()
            .map(|(event, namespace)| self.dispatch_in(event, namespace, args.clone()))
            .collect()
    }

    /// Dispatch on Tokio's blocking thread pool.
    ///
    /// The handlers still run one after another, in order, on a single
    /// thread; only the caller is freed from waiting. Must be called from
    /// within a Tokio runtime.
    pub fn spawn_dispatch(
        &self,
        event: impl Into<String>,
        namespace: impl Into<String>,
        args: Arguments,
    ) -> tokio::task::JoinHandle<DispatchResult> {
        let dispatcher = Arc::clone(&self.dispatcher);
        let event = event.into();
        let namespace = namespace.into();
        tokio::task::spawn_blocking(move || dispatcher.dispatch(&event, &namespace, args))
    }

    /// Remove every subscription
    pub fn clear(&self) {
        self.registry.clear();
    }

    /// Get statistics about the event bus
    pub fn stats(&self) -> EventBusStats {
        EventBusStats {
            registry: self.registry.stats(),
            dispatcher: self.dispatcher.stats(),
        }
    }

    fn prepare(
        event: &str,
        namespace: &str,
        handler: Arc<dyn EventHandler>,
        options: SubscriptionOptions,
    ) -> Result<Subscription> {
        let event = EventName::new(event)?;
        let namespace = Namespace::new(namespace)?;
        Subscription::new(event, namespace, handler, options)
    }

    fn prepare_request(&self, request: SubscriptionRequest) -> Result<Subscription> {
        let namespace = request
            .namespace
            .as_deref()
            .unwrap_or(self.default_namespace.as_str());
        Self::prepare(&request.event, namespace, request.handler, request.options)
    }

    fn register(&self, subscription: Subscription) -> SubscriptionId {
        let event = subscription.event().clone();
        let namespace = subscription.namespace().clone();
        let id = self.registry.register(subscription);

        debug!(
            subscription_id = %id,
            event = %event,
            namespace = %namespace,
            "Subscribed to event"
        );

        id
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("default_namespace", &self.default_namespace)
            .field("subscriptions", &self.registry.total_subscriptions())
            .finish()
    }
}

/// Statistics about the event bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBusStats {
    /// Registry statistics
    pub registry: RegistryStats,

    /// Dispatcher statistics
    pub dispatcher: DispatcherStats,
}

impl fmt::Display for EventBusStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EventBus Stats: {} subscriptions, {} events, {} dispatches, {} handler failures",
            self.registry.total_subscriptions,
            self.registry.events,
            self.dispatcher.dispatches,
            self.dispatcher.handler_failures
        )
    }
}
