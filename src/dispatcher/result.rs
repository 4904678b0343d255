//! The aggregated outcome of one dispatch.

use crate::error::ErrorContext;
use crate::event::{Arguments, Value};
use crate::subscription::{Subscription, SubscriptionId};
use crate::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::any::{self, Any};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// How a dispatch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStatus {
    /// Every invoked handler succeeded
    Completed,

    /// At least one handler failed; the others still ran
    CompletedWithErrors,

    /// No subscriber was ever registered under the event
    EventNotFound,

    /// The event is known but nothing listens in this namespace
    NamespaceNotFound,
}

impl DispatchStatus {
    /// Check if handlers were looked up and run
    pub fn is_found(self) -> bool {
        matches!(
            self,
            DispatchStatus::Completed | DispatchStatus::CompletedWithErrors
        )
    }

    /// Check if this is a "nothing to do" warning
    pub fn is_warning(self) -> bool {
        !self.is_found()
    }

    /// Short label: `OK`, `ERROR` or `WARNING`
    pub fn label(self) -> &'static str {
        match self {
            DispatchStatus::Completed => "OK",
            DispatchStatus::CompletedWithErrors => "ERROR",
            DispatchStatus::EventNotFound | DispatchStatus::NamespaceNotFound => "WARNING",
        }
    }
}

impl fmt::Display for DispatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One value returned by one subscription.
#[derive(Debug, Clone)]
pub struct HandlerRecord {
    /// What the handler returned
    pub result: Value,

    /// The subscription whose handler produced it
    pub subscription_id: SubscriptionId,
}

/// A handler that failed during a dispatch.
#[derive(Debug)]
pub struct HandlerFailure {
    /// Display name of the failing handler
    pub handler: String,

    /// The subscription whose handler failed
    pub subscription_id: SubscriptionId,

    /// The error it returned, or the panic it raised
    pub error: Error,

    /// Where and when it failed
    pub context: ErrorContext,
}

impl HandlerFailure {
    pub(crate) fn new(subscription: &Subscription, error: Error) -> Self {
        let context = ErrorContext::new()
            .with_event(subscription.event().as_str())
            .with_namespace(subscription.namespace().as_str())
            .with_handler(subscription.handler_name())
            .with_subscription(subscription.id().as_str());

        Self {
            handler: subscription.handler_name().to_string(),
            subscription_id: subscription.id().clone(),
            error,
            context,
        }
    }
}

impl fmt::Display for HandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.handler, self.error, self.context)
    }
}

/// Wall-clock span of a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Wall-clock time before the first handler ran
    pub start: DateTime<Utc>,
    /// Wall-clock time after the last handler returned, never before `start`
    pub end: DateTime<Utc>,
    /// Measured on a monotonic clock, so never negative
    pub duration: Duration,
}

/// The "one and only result" of a dispatch.
#[derive(Debug, Clone)]
pub enum OnlyResult<'a> {
    /// No handler was invoked, or the only one invoked failed
    None,

    /// Exactly one handler produced exactly one value
    Exactly(&'a Value),

    /// Several handlers were invoked, or one produced several values.
    ///
    /// Holds whatever values were produced, which may be fewer than the
    /// handlers invoked when some of them failed.
    Many(Vec<&'a Value>),
}

impl<'a> OnlyResult<'a> {
    /// The value if there was exactly one
    pub fn exactly(self) -> Option<&'a Value> {
        match self {
            OnlyResult::Exactly(value) => Some(value),
            OnlyResult::None | OnlyResult::Many(_) => None,
        }
    }

    /// Check if there was exactly one value
    pub fn is_exactly(&self) -> bool {
        matches!(self, OnlyResult::Exactly(_))
    }
}

/// Everything one call to `dispatch` produced.
///
/// The result is owned by the caller and never shared back into the
/// registry. All accessors are plain reads over data assembled during the
/// dispatch.
#[derive(Debug)]
pub struct DispatchResult {
    event: String,
    namespace: String,
    arguments: Arguments,
    status: DispatchStatus,
    message: Option<String>,
    results: BTreeMap<String, Vec<HandlerRecord>>,
    errors: Vec<HandlerFailure>,
    timing: Option<Timing>,
}

impl DispatchResult {
    pub(crate) fn not_found(
        event: impl Into<String>,
        namespace: impl Into<String>,
        arguments: Arguments,
        status: DispatchStatus,
        message: String,
    ) -> Self {
        Self {
            event: event.into(),
            namespace: namespace.into(),
            arguments,
            status,
            message: Some(message),
            results: BTreeMap::new(),
            errors: Vec::new(),
            timing: None,
        }
    }

    pub(crate) fn started(
        event: impl Into<String>,
        namespace: impl Into<String>,
        arguments: Arguments,
    ) -> Self {
        Self {
            event: event.into(),
            namespace: namespace.into(),
            arguments,
            status: DispatchStatus::Completed,
            message: None,
            results: BTreeMap::new(),
            errors: Vec::new(),
            timing: None,
        }
    }

    pub(crate) fn record(&mut self, handler: &str, record: HandlerRecord) {
        self.results
            .entry(handler.to_string())
            .or_default()
            .push(record);
    }

    /// A failed handler still gets an entry, with no records in it.
    pub(crate) fn record_failure(&mut self, failure: HandlerFailure) {
        self.results.entry(failure.handler.clone()).or_default();
        self.status = DispatchStatus::CompletedWithErrors;
        self.errors.push(failure);
    }

    pub(crate) fn finish(&mut self, timing: Timing) {
        self.timing = Some(timing);
    }

    /// Normalized event name
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Normalized namespace
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The arguments every handler received
    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// How the dispatch ended
    pub fn status(&self) -> DispatchStatus {
        self.status
    }

    /// Human-readable explanation for "not found" outcomes
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Check if the event and namespace had subscribers
    pub fn is_found(&self) -> bool {
        self.status.is_found()
    }

    /// Check if any handler failed
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Failures recorded during this dispatch, in invocation order
    pub fn errors(&self) -> &[HandlerFailure] {
        &self.errors
    }

    /// Start, end and duration, if handlers were run
    pub fn timing(&self) -> Option<&Timing> {
        self.timing.as_ref()
    }

    /// When handler invocation started
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.timing.map(|t| t.start)
    }

    /// When handler invocation ended
    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.timing.map(|t| t.end)
    }

    /// How long handler invocation took
    pub fn duration(&self) -> Option<Duration> {
        self.timing.map(|t| t.duration)
    }

    /// Results of every subscription whose handler has this display name.
    ///
    /// A handler that was invoked but failed yields an empty slice.
    pub fn get(&self, handler: &str) -> Option<&[HandlerRecord]> {
        self.results.get(handler).map(Vec::as_slice)
    }

    /// Names of every handler invoked, failed ones included
    pub fn handler_names(&self) -> impl Iterator<Item = &str> {
        self.results.keys().map(String::as_str)
    }

    /// Every handler name with its records
    pub fn records(&self) -> impl Iterator<Item = (&str, &HandlerRecord)> {
        self.results
            .iter()
            .flat_map(|(name, records)| records.iter().map(move |r| (name.as_str(), r)))
    }

    /// Every value returned, grouped by handler name
    pub fn results(&self) -> impl Iterator<Item = &Value> {
        self.records().map(|(_, record)| &record.result)
    }

    /// Number of values returned
    pub fn result_count(&self) -> usize {
        self.results.values().map(Vec::len).sum()
    }

    /// Number of handlers invoked, successful or not
    pub fn invocation_count(&self) -> usize {
        self.result_count() + self.errors.len()
    }

    /// The one and only result, as a tagged outcome.
    ///
    /// `Exactly` only when a single handler was invoked and it produced a
    /// single value. A failure next to a success is `Many`, never a guess.
    pub fn one_and_only(&self) -> OnlyResult<'_> {
        let mut values: Vec<&Value> = self.results().collect();
        match (self.invocation_count(), values.len()) {
            (0, _) | (1, 0) => OnlyResult::None,
            (1, 1) => OnlyResult::Exactly(values.remove(0)),
            _ => OnlyResult::Many(values),
        }
    }

    /// The one and only result, or a usage error when there are zero or many
    pub fn only(&self) -> Result<&Value> {
        match self.one_and_only() {
            OnlyResult::Exactly(value) => Ok(value),
            OnlyResult::None => Err(Error::NoResult),
            OnlyResult::Many(_) => Err(Error::AmbiguousResult {
                count: self.invocation_count(),
            }),
        }
    }

    /// The one and only result downcast to `T`
    pub fn only_as<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
        let value = self.only()?;
        value.downcast::<T>().ok_or(Error::TypeMismatch {
            expected: any::type_name::<T>(),
            actual: value.type_name(),
        })
    }

    /// A serializable snapshot of this result
    pub fn summary(&self) -> DispatchSummary {
        DispatchSummary {
            event: self.event.clone(),
            namespace: self.namespace.clone(),
            status: self.status.label().to_string(),
            message: self.message.clone(),
            start: self
                .start()
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Micros, true)),
            end: self
                .end()
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Micros, true)),
            duration_secs: self.duration().map(|d| d.as_secs_f64()),
            handlers: self
                .results
                .iter()
                .map(|(name, records)| (name.clone(), records.len()))
                .collect(),
            errors: self.errors.iter().map(ToString::to_string).collect(),
        }
    }

    /// Render the summary as JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.summary()).map_err(|e| Error::SerializationError(e.to_string()))
    }
}

/// Serializable view of a [`DispatchResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchSummary {
    /// Normalized event name
    pub event: String,
    /// Normalized namespace
    pub namespace: String,
    /// `OK`, `ERROR` or `WARNING`
    pub status: String,
    /// Explanation for "not found" outcomes
    pub message: Option<String>,
    /// RFC 3339 start time, UTC
    pub start: Option<String>,
    /// RFC 3339 end time, UTC
    pub end: Option<String>,
    /// Time spent invoking handlers
    pub duration_secs: Option<f64>,
    /// Number of values returned per handler name; failed handlers count 0
    pub handlers: BTreeMap<String, usize>,
    /// One line per failed handler
    pub errors: Vec<String>,
}
