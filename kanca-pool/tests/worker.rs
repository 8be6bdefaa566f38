use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crossbeam_channel::bounded;
use kanca_pool::{Worker, WorkerConfig};

fn ready_worker(capacity: usize) -> Worker {
    let worker = Worker::new(WorkerConfig {
        capacity,
        ..WorkerConfig::default()
    });
    let (tx, rx) = bounded(1);
    worker.schedule(move || {
        let _ = tx.send(());
    });
    rx.recv_timeout(Duration::from_secs(1))
        .expect("worker did not come up");
    worker
}

#[test]
#[cfg_attr(miri, ignore)]
fn worker_executes_instantaneous_task_promptly() {
    let worker = ready_worker(1);

    let (tx, rx) = bounded(1);
    worker.schedule(move || {
        let _ = tx.send(());
    });

    assert!(rx.recv_timeout(Duration::from_millis(100)).is_ok());
}

#[test]
#[cfg_attr(miri, ignore)]
fn worker_executes_delayed_task_on_time() {
    let worker = ready_worker(1);

    let done = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&done);
    worker.schedule_in(Duration::from_secs(1), move || {
        flag.store(true, Ordering::Release);
    });

    thread::sleep(Duration::from_millis(900));
    assert!(!done.load(Ordering::Acquire));

    thread::sleep(Duration::from_millis(200));
    assert!(done.load(Ordering::Acquire));
}

#[test]
#[cfg_attr(miri, ignore)]
fn worker_executes_in_correct_order() {
    let worker = ready_worker(3);

    let order = Arc::new(Mutex::new(Vec::new()));
    let (tx, rx) = bounded(1);

    let log = Arc::clone(&order);
    worker.schedule_in(Duration::from_millis(1), move || {
        log.lock().unwrap().push("delayed");
        let _ = tx.send(());
    });
    let log = Arc::clone(&order);
    worker.schedule(move || log.lock().unwrap().push("first"));
    let log = Arc::clone(&order);
    worker.schedule(move || log.lock().unwrap().push("second"));

    assert!(rx.recv_timeout(Duration::from_millis(100)).is_ok());
    assert_eq!(*order.lock().unwrap(), vec!["first", "second", "delayed"]);
}

#[test]
#[cfg_attr(miri, ignore)]
fn worker_respects_max_capacity() {
    let worker = ready_worker(1);

    let (unblock_tx, unblock_rx) = bounded::<()>(1);
    worker.schedule(move || {
        let _ = unblock_rx.recv();
    });
    thread::sleep(Duration::from_millis(100));

    // The blocking task was already dequeued: one slot is free.
    assert!(worker.try_schedule(|| {}));
    assert!(!worker.try_schedule(|| {}));

    let _ = unblock_tx.send(());
    thread::sleep(Duration::from_millis(100));
    assert!(worker.try_schedule(|| {}));
}

#[test]
#[cfg_attr(miri, ignore)]
fn worker_reports_uncaught_panics() {
    let (tx, rx) = bounded(1);
    let report = Arc::new(Mutex::new(None::<(String, String)>));

    let sink = Arc::clone(&report);
    let worker = Worker::new(WorkerConfig {
        name: "test worker".into(),
        capacity: 1,
        panic_handler: Some(Arc::new(move |name, what| {
            *sink.lock().unwrap() = Some((name.to_string(), what.to_string()));
            let _ = tx.send(());
        })),
    });

    worker.schedule(|| panic!("test exception"));
    assert!(rx.recv_timeout(Duration::from_secs(1)).is_ok());

    let report = report.lock().unwrap().clone().unwrap();
    assert_eq!(report.0, "test worker");
    assert_eq!(report.1, "test exception");
}

#[test]
#[cfg_attr(miri, ignore)]
fn dropping_the_worker_runs_already_scheduled_tasks() {
    let worker = ready_worker(4);
    let done = Arc::new(AtomicBool::new(false));

    let flag = Arc::clone(&done);
    worker.schedule(move || flag.store(true, Ordering::Release));
    drop(worker);

    assert!(done.load(Ordering::Acquire));
}
