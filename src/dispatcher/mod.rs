//! The dispatch engine.
//!
//! A dispatch resolves its event and namespace in the registry, invokes the
//! subscribers in order on the calling thread, isolates every handler
//! failure, and finally removes the one-shot subscriptions it fired. Handler
//! code never runs while the registry lock is held, so handlers are free to
//! subscribe, unsubscribe or dispatch again.

use crate::event::{Arguments, EventName, Namespace};
use crate::registry::{EventRegistry, Resolution};
use crate::subscription::{Subscription, SubscriptionId};
use crate::{Error, HandlerResult};
use chrono::Utc;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, trace, warn};

pub mod result;

pub use result::{
    DispatchResult, DispatchStatus, DispatchSummary, HandlerFailure, HandlerRecord, OnlyResult,
    Timing,
};

/// Statistics for the dispatcher
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatcherStats {
    /// Total dispatch calls, found or not
    pub dispatches: u64,

    /// Dispatch calls whose event or namespace had no subscribers
    pub unknown_targets: u64,

    /// Handler invocations
    pub handler_invocations: u64,

    /// Handler invocations that returned an error or panicked
    pub handler_failures: u64,

    /// One-shot subscriptions skipped because another dispatch already fired them
    pub skipped_one_shots: u64,

    /// Average time spent invoking handlers, in microseconds
    pub avg_dispatch_time_us: u64,
}

#[derive(Debug, Default)]
struct Counters {
    dispatches: AtomicU64,
    unknown_targets: AtomicU64,
    handler_invocations: AtomicU64,
    handler_failures: AtomicU64,
    skipped_one_shots: AtomicU64,
    timed_dispatches: AtomicU64,
    total_dispatch_time_us: AtomicU64,
}

/// Configuration for the dispatcher
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Log unknown events and namespaces at WARN instead of DEBUG
    pub warn_on_unknown: bool,

    /// Emit a TRACE event around every handler invocation
    pub trace_handlers: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            warn_on_unknown: true,
            trace_handlers: true,
        }
    }
}

impl DispatcherConfig {
    /// Create a new dispatcher configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the log level used for unknown events and namespaces
    pub fn warn_on_unknown(mut self, warn: bool) -> Self {
        self.warn_on_unknown = warn;
        self
    }

    /// Enable or disable per-handler trace events
    pub fn trace_handlers(mut self, enable: bool) -> Self {
        self.trace_handlers = enable;
        self
    }
}

/// Runs handlers for dispatched events.
#[derive(Debug)]
pub struct Dispatcher {
    config: DispatcherConfig,
    registry: Arc<dyn EventRegistry>,
    counters: Counters,
}

impl Dispatcher {
    /// Create a dispatcher reading subscriptions from `registry`
    pub fn new(config: DispatcherConfig, registry: Arc<dyn EventRegistry>) -> Self {
        Self {
            config,
            registry,
            counters: Counters::default(),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Get the registry this dispatcher reads from
    pub fn registry(&self) -> &Arc<dyn EventRegistry> {
        &self.registry
    }

    /// Dispatch raw event and namespace names.
    ///
    /// Names are normalized first. A blank name cannot match any
    /// subscription and is reported like an unknown one. The event is
    /// checked before the namespace, so an unknown event is reported as such
    /// even when the namespace is blank too.
    pub fn dispatch(&self, event: &str, namespace: &str, args: Arguments) -> DispatchResult {
        let event = match EventName::new(event) {
            Ok(event) => event,
            Err(e) => {
                self.counters.dispatches.fetch_add(1, Ordering::Relaxed);
                return self.unknown(
                    event.trim().to_uppercase(),
                    namespace.trim().to_uppercase(),
                    args,
                    DispatchStatus::EventNotFound,
                    format!("{}. Aborting...", e),
                );
            }
        };
        let namespace = match Namespace::new(namespace) {
            Ok(namespace) => namespace,
            Err(e) => {
                self.counters.dispatches.fetch_add(1, Ordering::Relaxed);
                let namespace = namespace.trim().to_uppercase();
                if self.registry.namespaces(&event).is_empty() {
                    let message = format!("Event '{}' not found. Aborting...", event);
                    return self.unknown(
                        event.to_string(),
                        namespace,
                        args,
                        DispatchStatus::EventNotFound,
                        message,
                    );
                }
                return self.unknown(
                    event.to_string(),
                    namespace,
                    args,
                    DispatchStatus::NamespaceNotFound,
                    format!("{}. Aborting...", e),
                );
            }
        };

        self.dispatch_to(&event, &namespace, args)
    }

    /// Dispatch an already normalized event and namespace
    pub fn dispatch_to(
        &self,
        event: &EventName,
        namespace: &Namespace,
        args: Arguments,
    ) -> DispatchResult {
        self.counters.dispatches.fetch_add(1, Ordering::Relaxed);

        let subscribers = match self.registry.resolve(event, namespace) {
            Resolution::Found(subscribers) => subscribers,
            Resolution::UnknownEvent => {
                return self.unknown(
                    event.to_string(),
                    namespace.to_string(),
                    args,
                    DispatchStatus::EventNotFound,
                    format!("Event '{}' not found. Aborting...", event),
                );
            }
            Resolution::UnknownNamespace => {
                return self.unknown(
                    event.to_string(),
                    namespace.to_string(),
                    args,
                    DispatchStatus::NamespaceNotFound,
                    format!(
                        "Namespace '{}' not found for event '{}'. Aborting...",
                        namespace, event
                    ),
                );
            }
        };

        trace!(
            event = %event,
            namespace = %namespace,
            subscriber_count = subscribers.len(),
            "Dispatching event"
        );

        let mut result = DispatchResult::started(event.as_str(), namespace.as_str(), args);
        let mut fired_once: Vec<SubscriptionId> = Vec::new();

        let start = Utc::now();
        let clock = Instant::now();

        for subscription in &subscribers {
            if !subscription.claim() {
                self.counters.skipped_one_shots.fetch_add(1, Ordering::Relaxed);
                trace!(
                    subscription_id = %subscription.id(),
                    "One-shot subscription already fired, skipping"
                );
                continue;
            }
            if !subscription.is_persistent() {
                fired_once.push(subscription.id().clone());
            }

            self.invoke(subscription, &mut result);
        }

        // Deferred until every handler had its turn.
        for id in &fired_once {
            self.registry.unregister(id);
        }

        let duration = clock.elapsed();
        let end = Utc::now().max(start);
        result.finish(Timing {
            start,
            end,
            duration,
        });

        self.counters.timed_dispatches.fetch_add(1, Ordering::Relaxed);
        self.counters
            .total_dispatch_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);

        debug!(
            event = %event,
            namespace = %namespace,
            invoked = result.invocation_count(),
            failed = result.errors().len(),
            removed = fired_once.len(),
            duration_us = duration.as_micros() as u64,
            "Dispatch complete"
        );

        result
    }

    fn invoke(&self, subscription: &Subscription, result: &mut DispatchResult) {
        if self.config.trace_handlers {
            trace!(
                subscription_id = %subscription.id(),
                handler = subscription.handler_name(),
                priority = subscription.priority(),
                "Invoking handler"
            );
        }

        self.counters
            .handler_invocations
            .fetch_add(1, Ordering::Relaxed);

        match call_isolated(subscription, result.arguments()) {
            Ok(value) => {
                result.record(
                    subscription.handler_name(),
                    HandlerRecord {
                        result: value,
                        subscription_id: subscription.id().clone(),
                    },
                );
            }
            Err(e) => {
                self.counters.handler_failures.fetch_add(1, Ordering::Relaxed);
                error!(
                    handler = subscription.handler_name(),
                    event = %subscription.event(),
                    namespace = %subscription.namespace(),
                    subscription_id = %subscription.id(),
                    error = %e,
                    "Handler failed"
                );
                result.record_failure(HandlerFailure::new(subscription, e));
            }
        }
    }

    fn unknown(
        &self,
        event: String,
        namespace: String,
        args: Arguments,
        status: DispatchStatus,
        message: String,
    ) -> DispatchResult {
        self.counters.unknown_targets.fetch_add(1, Ordering::Relaxed);

        if self.config.warn_on_unknown {
            warn!(event = %event, namespace = %namespace, "{}", message);
        } else {
            debug!(event = %event, namespace = %namespace, "{}", message);
        }

        DispatchResult::not_found(event, namespace, args, status, message)
    }

    /// Get dispatcher statistics
    pub fn stats(&self) -> DispatcherStats {
        let timed = self.counters.timed_dispatches.load(Ordering::Relaxed);
        let total_us = self.counters.total_dispatch_time_us.load(Ordering::Relaxed);

        DispatcherStats {
            dispatches: self.counters.dispatches.load(Ordering::Relaxed),
            unknown_targets: self.counters.unknown_targets.load(Ordering::Relaxed),
            handler_invocations: self.counters.handler_invocations.load(Ordering::Relaxed),
            handler_failures: self.counters.handler_failures.load(Ordering::Relaxed),
            skipped_one_shots: self.counters.skipped_one_shots.load(Ordering::Relaxed),
            avg_dispatch_time_us: if timed == 0 { 0 } else { total_us / timed },
        }
    }
}

/// Run a handler, turning a panic into an error.
fn call_isolated(subscription: &Subscription, args: &Arguments) -> HandlerResult {
    panic::catch_unwind(AssertUnwindSafe(|| subscription.invoke(args)))
        .unwrap_or_else(|payload| Err(Error::HandlerPanicked(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
