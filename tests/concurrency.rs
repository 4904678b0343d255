//! Multi-threaded use of one EventBus.
//!
//! Background threads subscribe and dispatch while others do the same; the
//! registry must stay consistent and no one-shot subscription may fire twice.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use sync_events::{handler_fn, Arguments, EventBus, SubscriptionOptions, Value};

#[test]
fn test_concurrent_dispatch_of_persistent_handler() {
    let bus = EventBus::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    bus.subscribe_with(
        "similarity_computed",
        "analyzer",
        handler_fn("record", move |_: &Arguments| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Value::unit())
        }),
        SubscriptionOptions::new().persistent(true),
    )
    .unwrap();

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let bus = bus.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    let result = bus.dispatch_in("similarity_computed", "analyzer", Arguments::new());
                    assert!(!result.has_errors());
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(calls.load(Ordering::SeqCst), 800);
    assert_eq!(bus.stats().dispatcher.handler_invocations, 800);
}

#[test]
fn test_one_shot_fires_once_under_contention() {
    let bus = EventBus::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let id = bus
        .subscribe_fn("rehearsal_finished", "once", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Value::unit())
        })
        .unwrap();

    let barrier = Arc::new(Barrier::new(8));
    let workers: Vec<_> = (0..8)
        .map(|_| {
            let bus = bus.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                bus.dispatch("rehearsal_finished", Arguments::new())
                    .invocation_count()
            })
        })
        .collect();

    let invoked: usize = workers.into_iter().map(|w| w.join().unwrap()).sum();

    assert_eq!(invoked, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!bus.is_subscribed(&id));
}

#[test]
fn test_subscribe_and_unsubscribe_while_dispatching() {
    let bus = EventBus::new();
    let stop = Arc::new(AtomicBool::new(false));

    let dispatcher = {
        let bus = bus.clone();
        let stop = stop.clone();
        thread::spawn(move || {
            let mut rounds = 0_usize;
            loop {
                bus.dispatch("tick", Arguments::new());
                rounds += 1;
                if stop.load(Ordering::SeqCst) {
                    break rounds;
                }
            }
        })
    };

    let churners: Vec<_> = (0..4)
        .map(|t| {
            let bus = bus.clone();
            thread::spawn(move || {
                for i in 0..200 {
                    let id = bus
                        .subscribe_with(
                            "tick",
                            "global",
                            handler_fn(format!("h{t}"), |_: &Arguments| Ok(Value::unit())),
                            SubscriptionOptions::new().priority(i % 3).persistent(true),
                        )
                        .unwrap();
                    assert!(bus.unsubscribe(&id));
                }
            })
        })
        .collect();

    for churner in churners {
        churner.join().unwrap();
    }
    stop.store(true, Ordering::SeqCst);
    assert!(dispatcher.join().unwrap() > 0);

    assert_eq!(bus.registry().total_subscriptions(), 0);
    assert!(bus.registry().events().is_empty());
}

#[test]
fn test_handler_dispatching_from_another_thread() {
    let bus = EventBus::new();
    let inner_calls = Arc::new(AtomicUsize::new(0));

    {
        let counter = inner_calls.clone();
        bus.subscribe_with(
            "inner",
            "global",
            handler_fn("inner", move |_: &Arguments| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Value::unit())
            }),
            SubscriptionOptions::new().persistent(true),
        )
        .unwrap();
    }

    {
        let nested = bus.clone();
        bus.subscribe_with(
            "outer",
            "global",
            handler_fn("outer", move |_: &Arguments| {
                let bus = nested.clone();
                let handle = thread::spawn(move || bus.dispatch("inner", Arguments::new()));
                let result = handle
                    .join()
                    .map_err(|_| sync_events::Error::handler("inner dispatch panicked"))?;
                Ok(Value::new(result.invocation_count()))
            }),
            SubscriptionOptions::new().persistent(true),
        )
        .unwrap();
    }

    let result = bus.dispatch("outer", Arguments::new());
    assert_eq!(*result.only_as::<usize>().unwrap(), 1);
    assert_eq!(inner_calls.load(Ordering::SeqCst), 1);
}
