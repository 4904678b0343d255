//! Subscriptions: one handler's interest in one (event, namespace) pair.
//!
//! A [`Subscription`] is created by `subscribe`, read by every dispatch that
//! targets its event and namespace, and destroyed either explicitly through
//! `unsubscribe` or, for non-persistent subscriptions, by the dispatcher right
//! after its first invocation. Apart from that removal nothing about a
//! subscription ever changes.

use crate::event::{Arguments, EventName, Namespace};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub mod handle;
pub mod handler;

pub use handle::SubscriptionId;
pub use handler::{handler_fn, EventHandler, FunctionHandler, HandlerResult};

/// Priority and persistence of a subscription.
///
/// Higher priorities run earlier. Non-persistent subscriptions (the default)
/// fire once and are then removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubscriptionOptions {
    /// Invocation priority; higher runs first
    pub priority: i32,

    /// Whether the subscription survives being invoked
    pub persistent: bool,
}

impl SubscriptionOptions {
    /// Default options: priority 0, fire once
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the priority
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set whether the subscription persists after being invoked
    pub fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }
}

/// A registered handler.
pub struct Subscription {
    id: SubscriptionId,
    event: EventName,
    namespace: Namespace,
    handler: Arc<dyn EventHandler>,
    options: SubscriptionOptions,
    created_at: DateTime<Utc>,
    fired: AtomicBool,
}

impl Subscription {
    /// Create a subscription with a freshly generated ID.
    ///
    /// Fails if the handler's display name is blank, since results are keyed
    /// by that name.
    pub fn new(
        event: EventName,
        namespace: Namespace,
        handler: Arc<dyn EventHandler>,
        options: SubscriptionOptions,
    ) -> Result<Self> {
        if handler.name().trim().is_empty() {
            return Err(Error::InvalidHandlerName(handler.name().to_string()));
        }

        Ok(Self {
            id: SubscriptionId::generate(),
            event,
            namespace,
            handler,
            options,
            created_at: Utc::now(),
            fired: AtomicBool::new(false),
        })
    }

    /// Get the subscription ID
    pub fn id(&self) -> &SubscriptionId {
        &self.id
    }

    /// Get the normalized event name
    pub fn event(&self) -> &EventName {
        &self.event
    }

    /// Get the normalized namespace
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Get the handler's display name
    pub fn handler_name(&self) -> &str {
        self.handler.name()
    }

    /// Get the priority
    pub fn priority(&self) -> i32 {
        self.options.priority
    }

    /// Check if the subscription survives being invoked
    pub fn is_persistent(&self) -> bool {
        self.options.persistent
    }

    /// Get the creation timestamp
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Reserve this subscription for one invocation.
    ///
    /// Persistent subscriptions can always be invoked. A non-persistent one is
    /// handed out exactly once, so overlapping or re-entrant dispatches that
    /// still see it before its removal do not fire it a second time.
    pub(crate) fn claim(&self) -> bool {
        self.options.persistent || !self.fired.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn invoke(&self, args: &Arguments) -> HandlerResult {
        self.handler.handle(args)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("event", &self.event)
            .field("namespace", &self.namespace)
            .field("handler", &self.handler.name())
            .field("priority", &self.options.priority)
            .field("persistent", &self.options.persistent)
            .finish()
    }
}

/// One element of a bulk subscribe.
///
/// Leaving the namespace unset uses the bus's default namespace.
#[derive(Clone)]
pub struct SubscriptionRequest {
    pub(crate) event: String,
    pub(crate) namespace: Option<String>,
    pub(crate) handler: Arc<dyn EventHandler>,
    pub(crate) options: SubscriptionOptions,
}

impl SubscriptionRequest {
    /// Request a subscription of `handler` to `event`
    pub fn new(event: impl Into<String>, handler: impl EventHandler) -> Self {
        Self::shared(event, Arc::new(handler))
    }

    /// Request a subscription of an already shared handler
    pub fn shared(event: impl Into<String>, handler: Arc<dyn EventHandler>) -> Self {
        Self {
            event: event.into(),
            namespace: None,
            handler,
            options: SubscriptionOptions::default(),
        }
    }

    /// Set the namespace
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the priority
    pub fn priority(mut self, priority: i32) -> Self {
        self.options.priority = priority;
        self
    }

    /// Set whether the subscription persists after being invoked
    pub fn persistent(mut self, persistent: bool) -> Self {
        self.options.persistent = persistent;
        self
    }

    /// Replace all options at once
    pub fn options(mut self, options: SubscriptionOptions) -> Self {
        self.options = options;
        self
    }
}

impl fmt::Debug for SubscriptionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionRequest")
            .field("event", &self.event)
            .field("namespace", &self.namespace)
            .field("handler", &self.handler.name())
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Value;

    fn noop(name: &str) -> Arc<dyn EventHandler> {
        Arc::new(handler_fn(name, |_: &Arguments| Ok(Value::unit())))
    }

    fn subscription(options: SubscriptionOptions) -> Subscription {
        Subscription::new(
            EventName::new("stack_created").unwrap(),
            Namespace::global(),
            noop("on_stack_created"),
            options,
        )
        .unwrap()
    }

    #[test]
    fn test_subscription_fields() {
        let sub = subscription(SubscriptionOptions::new().priority(5).persistent(true));

        assert_eq!(sub.event().as_str(), "STACK_CREATED");
        assert!(sub.namespace().is_global());
        assert_eq!(sub.handler_name(), "on_stack_created");
        assert_eq!(sub.priority(), 5);
        assert!(sub.is_persistent());
        assert!(format!("{:?}", sub).contains("on_stack_created"));
    }

    #[test]
    fn test_blank_handler_name_is_rejected() {
        let result = Subscription::new(
            EventName::new("x").unwrap(),
            Namespace::global(),
            noop("  "),
            SubscriptionOptions::default(),
        );
        assert!(matches!(result, Err(Error::InvalidHandlerName(_))));
    }

    #[test]
    fn test_one_shot_claims_once() {
        let sub = subscription(SubscriptionOptions::default());
        assert!(sub.claim());
        assert!(!sub.claim());

        let persistent = subscription(SubscriptionOptions::new().persistent(true));
        assert!(persistent.claim());
        assert!(persistent.claim());
    }

    #[test]
    fn test_request_builder() {
        let request = SubscriptionRequest::shared("question_created", noop("h"))
            .namespace("create_view")
            .priority(-1)
            .persistent(true);

        assert_eq!(request.event, "question_created");
        assert_eq!(request.namespace.as_deref(), Some("create_view"));
        assert_eq!(
            request.options,
            SubscriptionOptions {
                priority: -1,
                persistent: true
            }
        );
    }
}
