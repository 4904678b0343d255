//! Subscription registry mapping (event, namespace) pairs to subscribers.
//!
//! The registry owns all subscription state and is the only shared mutable
//! part of the dispatcher. Implementations must be thread-safe: background
//! threads subscribe and dispatch concurrently with the main thread.

use crate::event::{EventName, Namespace};
use crate::subscription::{Subscription, SubscriptionId};
use std::fmt::Debug;
use std::sync::Arc;

mod locked;
pub use locked::LockedRegistry;

/// Outcome of resolving an (event, namespace) pair in one atomic read.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// Nothing was ever registered under the event, or all of it was removed
    UnknownEvent,

    /// The event is known but has no subscribers in this namespace
    UnknownNamespace,

    /// Subscribers in invocation order
    Found(Vec<Arc<Subscription>>),
}

impl Resolution {
    /// Subscribers in invocation order, empty when the pair is unknown
    pub fn into_subscribers(self) -> Vec<Arc<Subscription>> {
        match self {
            Resolution::Found(subs) => subs,
            Resolution::UnknownEvent | Resolution::UnknownNamespace => Vec::new(),
        }
    }
}

/// Trait for registries that map event names and namespaces to subscribers.
///
/// Every method is one atomic section with respect to the others. None of
/// them may call into handler code.
pub trait EventRegistry: Send + Sync + Debug {
    /// Store a subscription and return its ID
    fn register(&self, subscription: Subscription) -> SubscriptionId;

    /// Remove a subscription, returning whether it was present
    fn unregister(&self, id: &SubscriptionId) -> bool;

    /// Subscribers of a pair, by descending priority then registration order
    fn lookup(&self, event: &EventName, namespace: &Namespace) -> Vec<Arc<Subscription>> {
        self.resolve(event, namespace).into_subscribers()
    }

    /// Like [`lookup`](Self::lookup), but distinguishes why nothing was found
    fn resolve(&self, event: &EventName, namespace: &Namespace) -> Resolution;

    /// Get a specific subscription by ID
    fn get(&self, id: &SubscriptionId) -> Option<Arc<Subscription>>;

    /// Check if a subscription is registered
    fn contains(&self, id: &SubscriptionId) -> bool {
        self.get(id).is_some()
    }

    /// Total number of subscriptions across all events and namespaces
    fn total_subscriptions(&self) -> usize;

    /// Number of subscriptions for one pair
    fn subscription_count(&self, event: &EventName, namespace: &Namespace) -> usize {
        self.lookup(event, namespace).len()
    }

    /// All events with at least one subscriber
    fn events(&self) -> Vec<EventName>;

    /// All namespaces of an event with at least one subscriber
    fn namespaces(&self, event: &EventName) -> Vec<Namespace>;

    /// Remove every subscription
    fn clear(&self);
}

/// Registry statistics for monitoring
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Number of events with subscribers
    pub events: usize,

    /// Number of (event, namespace) pairs with subscribers
    pub namespaces: usize,

    /// Total number of subscriptions
    pub total_subscriptions: usize,

    /// Subscriptions that survive invocation
    pub persistent_subscriptions: usize,

    /// Subscriptions removed after their first invocation
    pub one_shot_subscriptions: usize,
}

/// Extension trait for registries with statistics
pub trait RegistryStatistics: EventRegistry {
    /// Get current registry statistics
    fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats::default();

        for event in self.events() {
            stats.events += 1;
            for namespace in self.namespaces(&event) {
                stats.namespaces += 1;
                for sub in self.lookup(&event, &namespace) {
                    stats.total_subscriptions += 1;
                    if sub.is_persistent() {
                        stats.persistent_subscriptions += 1;
                    } else {
                        stats.one_shot_subscriptions += 1;
                    }
                }
            }
        }

        stats
    }
}

impl<T: EventRegistry + ?Sized> RegistryStatistics for T {}
