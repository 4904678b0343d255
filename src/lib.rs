//! # sync-events
//!
//! A synchronous, in-process event dispatcher for decoupling the parts of an
//! application.
//!
//! ## Features
//!
//! - **Namespaced** events: one event name, independent audiences
//! - **Ordered** delivery by priority, ties broken by registration order
//! - **One-shot** subscriptions that remove themselves after firing
//! - **Fault isolation**: a failing or panicking handler never stops the others
//! - **Thread-safe** registry, safe to use from background threads
//!
//! ## Quick Example
//!
//! ```rust
//! use sync_events::{Arguments, EventBus, SubscriptionOptions, Value};
//!
//! # fn main() -> sync_events::Result<()> {
//! // Create event bus
//! let bus = EventBus::builder().build()?;
//!
//! // Subscribe to events
//! let id = bus.subscribe_with(
//!     "stack_created",
//!     "global",
//!     sync_events::handler_fn("on_stack_created", |args: &Arguments| {
//!         let name = args.kwarg::<String>("name").cloned().unwrap_or_default();
//!         Ok(Value::new(format!("created {name}")))
//!     }),
//!     SubscriptionOptions::new().persistent(true),
//! )?;
//!
//! // Dispatch events
//! let result = bus.dispatch(
//!     "STACK_CREATED",
//!     Arguments::new().with_kw("name", String::from("Biology")),
//! );
//! assert_eq!(result.only_as::<String>()?.as_str(), "created Biology");
//!
//! // Unsubscribe when done
//! assert!(bus.unsubscribe(&id));
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    unreachable_pub
)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Event names, namespaces, values and arguments
pub mod event;

/// Error types and result aliases
pub mod error;

/// Subscription registry for (event, namespace) to subscriber mapping
pub mod registry;

/// Subscriptions and event handlers
pub mod subscription;

/// The dispatch engine and its results
pub mod dispatcher;

/// The main event bus implementation
pub mod bus;

// Re-export commonly used types
pub use bus::{EventBus, EventBusBuilder, EventBusConfig, EventBusStats};
pub use dispatcher::{
    DispatchResult, DispatchStatus, DispatchSummary, Dispatcher, DispatcherConfig,
    DispatcherStats, HandlerFailure, HandlerRecord, OnlyResult, Timing,
};
pub use error::{Error, ErrorContext, Result};
pub use event::{Arguments, EventName, Namespace, Value, GLOBAL};
pub use registry::{EventRegistry, LockedRegistry, RegistryStatistics, RegistryStats};
pub use subscription::{
    handler_fn, EventHandler, FunctionHandler, HandlerResult, Subscription, SubscriptionId,
    SubscriptionOptions, SubscriptionRequest,
};

/// Prelude module for convenient imports
///
/// # Example
/// ```rust
/// use sync_events::prelude::*;
/// ```
pub mod prelude {
    pub use crate::bus::{EventBus, EventBusBuilder};
    pub use crate::dispatcher::{DispatchResult, DispatchStatus, OnlyResult};
    pub use crate::error::{Error, Result};
    pub use crate::event::{Arguments, Value, GLOBAL};
    pub use crate::subscription::{
        handler_fn, EventHandler, HandlerResult, SubscriptionId, SubscriptionOptions,
    };
}
