//! Integration tests for scheduler-routed delivery.

#![cfg(feature = "runtime")]

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use typebus::prelude::*;
use typebus_test::{Counter, ManualScheduler, Ping, Recorder, setup_test_logging};

const WAIT: Duration = Duration::from_secs(5);
const PROMPT: Duration = Duration::from_secs(2);

/// Routed callback that reports it started, then blocks until the gate opens.
fn gated_callback(started: Sender<i64>, gate: Receiver<()>) -> impl Fn(&Ping) + Send + Sync {
    let gate = Mutex::new(gate);
    move |ping: &Ping| {
        let _ = started.send(ping.value);
        let _ = gate.lock().unwrap().recv_timeout(WAIT);
    }
}

#[test]
fn test_routed_delivery_does_not_run_inline() {
    let bus = EventBus::new();
    let scheduler = ManualScheduler::new();
    let recorder: Recorder<Ping> = Recorder::new();

    let _subscription = bus.on_receive_on(scheduler.clone(), recorder.cloning());
    bus.send(Ping::new(1));
    bus.send(Ping::new(2));

    assert!(recorder.is_empty());
    assert_eq!(scheduler.run_pending(), 2);
    assert_eq!(recorder.values(), vec![Ping::new(1), Ping::new(2)]);
}

#[test]
fn test_dispose_between_send_and_run() {
    let bus = EventBus::new();
    let scheduler = ManualScheduler::new();
    let counter = Counter::new();

    let subscription = bus.on_receive_on(scheduler.clone(), counter.handler::<Ping>());
    bus.send(Ping::new(1));
    subscription.dispose();

    // The job still runs, but finds the subscription inactive.
    assert_eq!(scheduler.run_pending(), 1);
    assert_eq!(counter.get(), 0);
}

#[test]
fn test_mixed_inline_and_routed_subscribers() {
    let bus = EventBus::new();
    let scheduler = ManualScheduler::new();
    let inline = Counter::new();
    let routed = Counter::new();

    let _inline = bus.on_receive(inline.handler::<Ping>());
    let _routed = bus.on_receive_on(scheduler.clone(), routed.handler::<Ping>());

    bus.send(Ping::new(1));
    assert_eq!(inline.get(), 1);
    assert_eq!(routed.get(), 0);

    scheduler.run_pending();
    assert_eq!(routed.get(), 1);
}

#[test]
fn test_serial_scheduler_delivers_in_order_on_its_thread() {
    setup_test_logging("typebus=debug");
    let bus = EventBus::new();
    let scheduler = Arc::new(SerialScheduler::new("typebus-ui").unwrap());
    let recorder: Recorder<Ping> = Recorder::new();

    let _subscription = bus.on_receive_on(Arc::clone(&scheduler), recorder.cloning());
    for value in 0..10 {
        bus.send(Ping::new(value));
    }

    assert!(recorder.wait_for(10, WAIT));
    let expected: Vec<Ping> = (0..10).map(Ping::new).collect();
    assert_eq!(recorder.values(), expected);
    assert!(
        recorder
            .threads()
            .iter()
            .all(|id| *id == scheduler.thread_id())
    );
    assert_ne!(scheduler.thread_id(), thread::current().id());
}

#[test]
fn test_serial_scheduler_shared_by_many_subscriptions() {
    let bus = EventBus::new();
    let scheduler = Arc::new(SerialScheduler::new("typebus-shared").unwrap());
    let pings: Recorder<Ping> = Recorder::new();
    let greetings: Recorder<String> = Recorder::new();

    let _pings = bus.on_receive_on(Arc::clone(&scheduler), pings.cloning());
    let _greetings = bus.on_named_on(
        "hello",
        Arc::clone(&scheduler),
        greetings.mapping(|_: &Params| "hello".to_string()),
    );

    bus.send(Ping::new(1));
    bus.send_named("hello");

    assert!(pings.wait_for(1, WAIT));
    assert!(greetings.wait_for(1, WAIT));
    assert_eq!(pings.threads(), greetings.threads());
}

#[test]
fn test_dropping_owned_serial_scheduler_does_not_block() {
    let bus = EventBus::new();
    let (started_tx, started_rx) = mpsc::channel();
    let (gate_tx, gate_rx) = mpsc::channel();

    let routed = bus.on_receive_on(
        SerialScheduler::new("typebus-owned").unwrap(),
        gated_callback(started_tx, gate_rx),
    );
    bus.send(Ping::new(1));
    assert_eq!(started_rx.recv_timeout(WAIT).unwrap(), 1);

    // Dropping the handle releases the scheduler while its job is still blocked.
    let (dropped_tx, dropped_rx) = mpsc::channel();
    thread::spawn(move || {
        drop(routed);
        let _ = dropped_tx.send(());
    });
    assert!(dropped_rx.recv_timeout(PROMPT).is_ok());

    gate_tx.send(()).unwrap();
}

#[test]
fn test_send_does_not_wait_for_scheduler_released_mid_dispatch() {
    let bus = EventBus::new();
    let (started_tx, started_rx) = mpsc::channel();
    let (gate_tx, gate_rx) = mpsc::channel();
    let routed_handle: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

    // Registered first, so it runs before the routed subscriber in each dispatch.
    let victim = Arc::clone(&routed_handle);
    let _disposer = bus.on_receive(move |ping: &Ping| {
        if ping.value == 2 {
            drop(victim.lock().unwrap().take());
        }
    });
    *routed_handle.lock().unwrap() = Some(bus.on_receive_on(
        SerialScheduler::new("typebus-mid-dispatch").unwrap(),
        gated_callback(started_tx, gate_rx),
    ));

    bus.send(Ping::new(1));
    assert_eq!(started_rx.recv_timeout(WAIT).unwrap(), 1);

    // The dispatch snapshot holds the last reference to the routed slot and
    // its scheduler; releasing it must not join the blocked worker.
    let sender = bus.clone();
    let (sent_tx, sent_rx) = mpsc::channel();
    thread::spawn(move || {
        sender.send(Ping::new(2));
        let _ = sent_tx.send(());
    });
    assert!(sent_rx.recv_timeout(PROMPT).is_ok());
    assert_eq!(bus.subscriber_count::<Ping>(), 1);

    gate_tx.send(()).unwrap();
    assert!(started_rx.recv_timeout(PROMPT).is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_runtime_handle_delivers_on_runtime() {
    let bus = EventBus::new();
    let handle = runtime_handle().unwrap();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    let _subscription = bus.on_receive_on(handle, move |ping: &Ping| {
        let _ = tx.send((ping.value, thread::current().id()));
    });
    bus.send(Ping::new(5));

    let (value, delivered_on) = tokio::time::timeout(WAIT, rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(value, 5);
    assert_ne!(delivered_on, thread::current().id());
}

#[test]
fn test_runtime_handle_outside_runtime() {
    assert!(matches!(
        runtime_handle(),
        Err(typebus::SchedulerError::NoRuntime)
    ));
}
