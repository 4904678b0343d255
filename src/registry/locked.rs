//! Mutex-guarded implementation of EventRegistry.

use super::{EventRegistry, Resolution};
use crate::event::{EventName, Namespace};
use crate::subscription::{Subscription, SubscriptionId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

type Buckets = HashMap<EventName, HashMap<Namespace, Vec<Arc<Subscription>>>>;

#[derive(Debug)]
struct IndexEntry {
    event: EventName,
    namespace: Namespace,
    priority: i32,
}

#[derive(Debug, Default)]
struct Inner {
    /// event -> namespace -> subscribers, kept in invocation order
    subscribers: Buckets,

    /// Reverse index from subscription ID to its bucket and priority
    index: HashMap<SubscriptionId, IndexEntry>,
}

/// A thread-safe event registry guarded by a single lock.
///
/// Both maps live behind the same mutex, so registration, removal and lookup
/// never observe one map updated without the other. Each subscriber list is
/// kept sorted by descending priority at insertion time; a new subscription
/// goes after every existing one of equal priority, which makes registration
/// order the tie-break.
#[derive(Debug, Clone, Default)]
pub struct LockedRegistry {
    inner: Arc<Mutex<Inner>>,
}

impl LockedRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with pre-allocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                subscribers: HashMap::with_capacity(capacity),
                index: HashMap::with_capacity(capacity * 4),
            })),
        }
    }
}

impl EventRegistry for LockedRegistry {
    fn register(&self, subscription: Subscription) -> SubscriptionId {
        let id = subscription.id().clone();
        let event = subscription.event().clone();
        let namespace = subscription.namespace().clone();
        let priority = subscription.priority();

        trace!(
            subscription_id = %id,
            event = %event,
            namespace = %namespace,
            priority,
            "Registering subscription"
        );

        {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;

            let bucket = inner
                .subscribers
                .entry(event.clone())
                .or_default()
                .entry(namespace.clone())
                .or_default();
            let position = bucket.partition_point(|s| s.priority() >= priority);
            bucket.insert(position, Arc::new(subscription));

            inner.index.insert(
                id.clone(),
                IndexEntry {
                    event,
                    namespace,
                    priority,
                },
            );
        }

        debug!(subscription_id = %id, "Subscription registered");
        id
    }

    fn unregister(&self, id: &SubscriptionId) -> bool {
        trace!(subscription_id = %id, "Unregistering subscription");

        let removed = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;

            match inner.index.remove(id) {
                None => None,
                Some(IndexEntry {
                    event,
                    namespace,
                    priority,
                }) => {
                    if let Some(namespaces) = inner.subscribers.get_mut(&event) {
                        if let Some(bucket) = namespaces.get_mut(&namespace) {
                            if let Some(position) = position_of(bucket, id, priority) {
                                bucket.remove(position);
                            }
                            if bucket.is_empty() {
                                namespaces.remove(&namespace);
                            }
                        }
                        if namespaces.is_empty() {
                            inner.subscribers.remove(&event);
                        }
                    }
                    Some((event, namespace))
                }
            }
        };

        match removed {
            Some((event, namespace)) => {
                debug!(
                    subscription_id = %id,
                    event = %event,
                    namespace = %namespace,
                    "Subscription unregistered"
                );
                true
            }
            None => {
                trace!(subscription_id = %id, "Subscription not found");
                false
            }
        }
    }

    fn resolve(&self, event: &EventName, namespace: &Namespace) -> Resolution {
        let inner = self.inner.lock();
        match inner.subscribers.get(event) {
            None => Resolution::UnknownEvent,
            Some(namespaces) => match namespaces.get(namespace) {
                None => Resolution::UnknownNamespace,
                Some(bucket) => Resolution::Found(bucket.clone()),
            },
        }
    }

    fn get(&self, id: &SubscriptionId) -> Option<Arc<Subscription>> {
        let inner = self.inner.lock();
        let entry = inner.index.get(id)?;
        let bucket = inner
            .subscribers
            .get(&entry.event)
            .and_then(|namespaces| namespaces.get(&entry.namespace))?;
        position_of(bucket, id, entry.priority).map(|position| bucket[position].clone())
    }

    fn contains(&self, id: &SubscriptionId) -> bool {
        self.inner.lock().index.contains_key(id)
    }

    fn total_subscriptions(&self) -> usize {
        self.inner.lock().index.len()
    }

    fn subscription_count(&self, event: &EventName, namespace: &Namespace) -> usize {
        self.inner
            .lock()
            .subscribers
            .get(event)
            .and_then(|namespaces| namespaces.get(namespace))
            .map(Vec::len)
            .unwrap_or(0)
    }

    fn events(&self) -> Vec<EventName> {
        let mut events: Vec<_> = self.inner.lock().subscribers.keys().cloned().collect();
        events.sort();
        events
    }

    fn namespaces(&self, event: &EventName) -> Vec<Namespace> {
        let mut namespaces: Vec<_> = self
            .inner
            .lock()
            .subscribers
            .get(event)
            .map(|namespaces| namespaces.keys().cloned().collect())
            .unwrap_or_default();
        namespaces.sort();
        namespaces
    }

    fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.subscribers.clear();
        inner.index.clear();
        debug!("Registry cleared");
    }
}

/// Find `id` in a bucket sorted by descending priority.
///
/// Only the run of entries sharing `priority` is scanned.
fn position_of(
    bucket: &[Arc<Subscription>],
    id: &SubscriptionId,
    priority: i32,
) -> Option<usize> {
    let start = bucket.partition_point(|s| s.priority() > priority);
    let end = bucket.partition_point(|s| s.priority() >= priority);
    bucket[start..end]
        .iter()
        .position(|s| s.id() == id)
        .map(|offset| start + offset)
}
