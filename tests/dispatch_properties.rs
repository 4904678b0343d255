//! End-to-end dispatch behavior through the public EventBus API.
//!
//! Covers delivery, namespace isolation, ordering, one-shot removal,
//! unsubscribe idempotence, fault isolation and unknown events.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use sync_events::{
    handler_fn, Arguments, DispatchStatus, Error, EventBus, EventBusConfig, OnlyResult,
    SubscriptionOptions, Value,
};

fn test_bus() -> EventBus {
    EventBus::builder()
        .config(EventBusConfig::test())
        .build()
        .unwrap()
}

fn persistent() -> SubscriptionOptions {
    SubscriptionOptions::new().persistent(true)
}

type Log = Arc<Mutex<Vec<&'static str>>>;

fn logging(log: &Log, name: &'static str) -> impl sync_events::EventHandler {
    let log = log.clone();
    handler_fn(name, move |_: &Arguments| {
        log.lock().push(name);
        Ok(Value::unit())
    })
}

// ─── Delivery ────────────────────────────────────────────────────

#[test]
fn test_stack_created_scenario() {
    let bus = test_bus();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let id = bus
        .subscribe_with(
            "STACK_CREATED",
            "GLOBAL",
            handler_fn("f", move |_: &Arguments| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Value::new("stack #1"))
            }),
            SubscriptionOptions::new().priority(0).persistent(true),
        )
        .unwrap();

    let result = bus.dispatch_in("stack_created", "global", Arguments::new());

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(result.event(), "STACK_CREATED");
    assert_eq!(result.namespace(), "GLOBAL");

    let records = result.get("f").unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].subscription_id, id);
    assert_eq!(records[0].result.downcast_ref::<&str>(), Some(&"stack #1"));

    let timing = result.timing().unwrap();
    assert!(timing.end >= timing.start);
    assert!(bus.is_subscribed(&id));
}

#[test]
fn test_every_handler_receives_the_arguments() {
    let bus = test_bus();
    let seen = Arc::new(Mutex::new(Vec::new()));

    for name in ["first", "second"] {
        let seen = seen.clone();
        bus.subscribe_with(
            "answer_given",
            "global",
            handler_fn(name, move |args: &Arguments| {
                let correct = *args.arg::<bool>(0).unwrap();
                let card = args.kwarg::<u64>("card").copied().unwrap();
                seen.lock().push((name, correct, card));
                Ok(Value::unit())
            }),
            persistent(),
        )
        .unwrap();
    }

    bus.dispatch(
        "answer_given",
        Arguments::new().with(true).with_kw("card", 17_u64),
    );

    assert_eq!(
        *seen.lock(),
        vec![("first", true, 17), ("second", true, 17)]
    );
}

#[test]
fn test_shared_handler_name_keeps_every_entry() {
    let bus = test_bus();
    let a = bus
        .subscribe_with(
            "get_all_difficulties",
            "global",
            handler_fn("load", |_: &Arguments| Ok(Value::new(1_u8))),
            persistent().priority(1),
        )
        .unwrap();
    let b = bus
        .subscribe_with(
            "get_all_difficulties",
            "global",
            handler_fn("load", |_: &Arguments| Ok(Value::new(2_u8))),
            persistent(),
        )
        .unwrap();

    let result = bus.dispatch("get_all_difficulties", Arguments::new());
    let records = result.get("load").unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].subscription_id, a);
    assert_eq!(records[1].subscription_id, b);
    assert!(matches!(result.one_and_only(), OnlyResult::Many(ref v) if v.len() == 2));
    assert!(matches!(result.only(), Err(Error::AmbiguousResult { count: 2 })));
}

// ─── Namespaces ──────────────────────────────────────────────────

#[test]
fn test_namespace_isolation() {
    let bus = test_bus();
    let log: Log = Arc::default();

    bus.subscribe_with("navigate_forward", "create_view", logging(&log, "create"), persistent())
        .unwrap();
    bus.subscribe_with("navigate_forward", "edit_view", logging(&log, "edit"), persistent())
        .unwrap();

    bus.dispatch_in("navigate_forward", "edit_view", Arguments::new());
    assert_eq!(*log.lock(), vec!["edit"]);

    bus.dispatch_in("navigate_forward", "CREATE_VIEW", Arguments::new());
    assert_eq!(*log.lock(), vec!["edit", "create"]);
}

// ─── Ordering ────────────────────────────────────────────────────

#[test]
fn test_higher_priority_runs_first() {
    let bus = test_bus();
    let log: Log = Arc::default();

    bus.subscribe_with("x", "global", logging(&log, "p1"), persistent().priority(1))
        .unwrap();
    bus.subscribe_with("x", "global", logging(&log, "p2"), persistent().priority(2))
        .unwrap();
    bus.subscribe_with("x", "global", logging(&log, "p10"), persistent().priority(10))
        .unwrap();
    bus.subscribe_with("x", "global", logging(&log, "p5"), persistent().priority(5))
        .unwrap();

    bus.dispatch("x", Arguments::new());
    assert_eq!(*log.lock(), vec!["p10", "p5", "p2", "p1"]);
}

#[test]
fn test_equal_priorities_keep_registration_order() {
    let bus = test_bus();
    let log: Log = Arc::default();

    for name in ["a", "b", "c", "d"] {
        bus.subscribe_with("x", "global", logging(&log, name), persistent())
            .unwrap();
    }

    bus.dispatch("x", Arguments::new());
    bus.dispatch("x", Arguments::new());
    assert_eq!(*log.lock(), vec!["a", "b", "c", "d", "a", "b", "c", "d"]);
}

// ─── Lifecycle ───────────────────────────────────────────────────

#[test]
fn test_one_shot_fires_once() {
    let bus = test_bus();
    let log: Log = Arc::default();

    let id = bus.subscribe("rehearsal_run_advanced", logging(&log, "once")).unwrap();
    assert!(bus.is_subscribed(&id));

    let first = bus.dispatch("rehearsal_run_advanced", Arguments::new());
    assert_eq!(first.status(), DispatchStatus::Completed);
    assert!(!bus.is_subscribed(&id));

    let second = bus.dispatch("rehearsal_run_advanced", Arguments::new());
    assert_eq!(second.status(), DispatchStatus::EventNotFound);
    assert_eq!(*log.lock(), vec!["once"]);
}

#[test]
fn test_one_shot_next_to_persistent() {
    let bus = test_bus();
    let log: Log = Arc::default();

    bus.subscribe_with("x", "global", logging(&log, "keep"), persistent())
        .unwrap();
    bus.subscribe("x", logging(&log, "once")).unwrap();

    bus.dispatch("x", Arguments::new());
    let second = bus.dispatch("x", Arguments::new());

    assert_eq!(second.status(), DispatchStatus::Completed);
    assert_eq!(*log.lock(), vec!["keep", "once", "keep"]);
}

#[test]
fn test_one_shot_never_dispatched_stays_registered() {
    let bus = test_bus();
    let log: Log = Arc::default();

    let id = bus.subscribe("x", logging(&log, "once")).unwrap();
    bus.dispatch("y", Arguments::new());
    bus.dispatch_in("x", "other", Arguments::new());

    assert!(bus.is_subscribed(&id));
    assert!(log.lock().is_empty());
}

#[test]
fn test_unsubscribe_is_idempotent() {
    let bus = test_bus();
    let log: Log = Arc::default();

    let id = bus
        .subscribe_with("x", "global", logging(&log, "gone"), persistent())
        .unwrap();
    bus.subscribe_with("x", "global", logging(&log, "stays"), persistent())
        .unwrap();

    assert!(bus.unsubscribe(&id));
    assert!(!bus.unsubscribe(&id));

    bus.dispatch("x", Arguments::new());
    assert_eq!(*log.lock(), vec!["stays"]);
}

// ─── Failures ────────────────────────────────────────────────────

#[test]
fn test_failing_handler_does_not_stop_others() {
    let bus = test_bus();

    bus.subscribe_with(
        "stack_deleted",
        "global",
        handler_fn("broken", |_: &Arguments| Err(Error::handler("database locked"))),
        persistent().priority(1),
    )
    .unwrap();
    bus.subscribe_with(
        "stack_deleted",
        "global",
        handler_fn("healthy", |_: &Arguments| Ok(Value::new(true))),
        persistent(),
    )
    .unwrap();

    let result = bus.dispatch("stack_deleted", Arguments::new());

    assert_eq!(result.status(), DispatchStatus::CompletedWithErrors);
    assert!(result.has_errors());
    assert_eq!(result.errors().len(), 1);
    assert_eq!(result.errors()[0].handler, "broken");
    assert!(result.errors()[0].error.is_handler_failure());
    assert_eq!(result.get("broken").map(|r| r.len()), Some(0));
    assert_eq!(result.get("healthy").map(|r| r.len()), Some(1));
    assert!(matches!(result.one_and_only(), OnlyResult::Many(ref v) if v.len() == 1));
    assert!(matches!(
        result.only_as::<bool>(),
        Err(Error::AmbiguousResult { count: 2 })
    ));

    let summary = result.summary();
    assert_eq!(summary.status, "ERROR");
    assert_eq!(summary.errors.len(), 1);
    assert!(summary.errors[0].contains("database locked"));
    assert_eq!(summary.handlers.get("broken"), Some(&0));
}

#[test]
fn test_single_failing_handler_has_no_result() {
    let bus = test_bus();
    bus.subscribe_with(
        "stack_deleted",
        "global",
        handler_fn("broken", |_: &Arguments| Err(Error::handler("database locked"))),
        persistent(),
    )
    .unwrap();

    let result = bus.dispatch("stack_deleted", Arguments::new());

    assert_eq!(result.invocation_count(), 1);
    assert!(matches!(result.one_and_only(), OnlyResult::None));
    assert!(matches!(result.only(), Err(Error::NoResult)));
}

#[test]
fn test_unknown_event_is_a_warning() {
    let bus = test_bus();

    let result = bus.dispatch("never_subscribed", Arguments::new().with(1));

    assert_eq!(result.status(), DispatchStatus::EventNotFound);
    assert!(result.status().is_warning());
    assert!(result.message().unwrap().contains("NEVER_SUBSCRIBED"));
    assert_eq!(result.handler_names().count(), 0);
    assert!(result.timing().is_none());
    assert_eq!(result.arguments().len(), 1);
    assert!(matches!(result.only(), Err(Error::NoResult)));

    let summary = result.summary();
    assert_eq!(summary.status, "WARNING");
    assert!(summary.start.is_none());
}
