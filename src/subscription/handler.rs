//! Event handler traits and implementations.

use crate::event::{Arguments, Value};
use crate::Result;
use std::fmt;
use std::sync::Arc;

/// What a handler hands back to the dispatcher.
pub type HandlerResult = Result<Value>;

/// Trait for event handlers invoked synchronously by the dispatcher.
///
/// The display name is used as the key under which the handler's results are
/// aggregated in a [`DispatchResult`](crate::DispatchResult). Several
/// subscriptions may share one name.
pub trait EventHandler: Send + Sync + 'static {
    /// Process one dispatch
    fn handle(&self, args: &Arguments) -> HandlerResult;

    /// Get the handler name
    fn name(&self) -> &str;
}

impl<H: EventHandler + ?Sized> EventHandler for Arc<H> {
    fn handle(&self, args: &Arguments) -> HandlerResult {
        (**self).handle(args)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// A function-based event handler using closures.
pub struct FunctionHandler<F>
where
    F: Fn(&Arguments) -> HandlerResult + Send + Sync + 'static,
{
    function: F,
    name: String,
}

impl<F> FunctionHandler<F>
where
    F: Fn(&Arguments) -> HandlerResult + Send + Sync + 'static,
{
    /// Create a new function handler with the given display name
    pub fn new(name: impl Into<String>, function: F) -> Self {
        Self {
            function,
            name: name.into(),
        }
    }
}

impl<F> EventHandler for FunctionHandler<F>
where
    F: Fn(&Arguments) -> HandlerResult + Send + Sync + 'static,
{
    fn handle(&self, args: &Arguments) -> HandlerResult {
        (self.function)(args)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<F> fmt::Debug for FunctionHandler<F>
where
    F: Fn(&Arguments) -> HandlerResult + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionHandler")
            .field("name", &self.name)
            .finish()
    }
}

/// Build a [`FunctionHandler`] from a name and a closure.
///
/// ```rust
/// use sync_events::{handler_fn, EventHandler, Arguments, Value};
///
/// let handler = handler_fn("count_cards", |args: &Arguments| {
///     Ok(Value::new(args.len()))
/// });
/// assert_eq!(handler.name(), "count_cards");
/// ```
pub fn handler_fn<F>(name: impl Into<String>, function: F) -> FunctionHandler<F>
where
    F: Fn(&Arguments) -> HandlerResult + Send + Sync + 'static,
{
    FunctionHandler::new(name, function)
}
