mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use common::{CallLog, TaskQueue};
use kanca_promise::{and, embed_promise_into_task, or, Empty, Promise};

#[test]
fn and_future_becomes_inactive_iff_both_tasks_have_finished() {
    let queue = TaskQueue::new();

    let p1 = Promise::new(queue.executor());
    let p2 = Promise::new(queue.executor());
    let f1 = p1.get_future().unwrap();
    let f2 = p2.get_future().unwrap();

    queue.enqueue(embed_promise_into_task(p1, || true));
    queue.enqueue(embed_promise_into_task(p2, || true));

    let future = f1 & f2;
    assert!(future.is_active());

    queue.process(1);
    assert!(future.is_active());

    queue.process_all();
    assert!(!future.is_active());
}

#[test]
fn or_future_becomes_inactive_once_one_of_the_tasks_has_finished() {
    let queue = TaskQueue::new();

    let p1 = Promise::new(queue.executor());
    let p2 = Promise::<bool>::new(queue.executor());
    let f1 = p1.get_future().unwrap();
    let f2 = p2.get_future().unwrap();

    queue.enqueue(embed_promise_into_task(p1, || true));

    let future = f1 | f2;
    assert!(future.is_active());

    queue.process_all();
    assert!(!future.is_active());
    drop(p2);
}

#[test]
fn and_callback_is_executed_iff_both_tasks_have_finished() {
    let queue = TaskQueue::new();
    let log = CallLog::<Empty>::new();

    let p1 = Promise::new(queue.executor());
    let p2 = Promise::new(queue.executor());
    let f1 = p1.get_future().unwrap();
    let f2 = p2.get_future().unwrap();

    queue.enqueue(embed_promise_into_task(p1, || true));
    queue.enqueue(embed_promise_into_task(p2, || true));

    let future = and(f1, f2).then(log.sink()).unwrap();

    queue.process(1);
    assert_eq!(log.count(), 0);

    queue.process_all();
    assert_eq!(log.calls(), vec![Some(Empty)]);
    drop(future);
}

#[test]
fn or_callback_is_executed_once_one_of_the_tasks_has_finished() {
    let queue = TaskQueue::new();
    let log = CallLog::<Empty>::new();

    let p1 = Promise::new(queue.executor());
    let p2 = Promise::<bool>::new(queue.executor());
    let f1 = p1.get_future().unwrap();
    let f2 = p2.get_future().unwrap();

    queue.enqueue(embed_promise_into_task(p1, || true));

    let future = or(f1, f2).then(log.sink()).unwrap();

    queue.process_all();
    assert_eq!(log.calls(), vec![Some(Empty)]);
    drop(future);
    drop(p2);
}

#[test]
fn or_cancels_the_last_task() {
    let queue = TaskQueue::new();
    let done2 = Arc::new(AtomicBool::new(false));

    let p1 = Promise::new(queue.executor());
    let p2 = Promise::new(queue.executor());
    let f1 = p1.get_future().unwrap();
    let f2 = p2.get_future().unwrap();

    queue.enqueue(embed_promise_into_task(p1, || true));

    let future = or(f1, f2);
    queue.process_all();

    let flag = Arc::clone(&done2);
    queue.enqueue(embed_promise_into_task(p2, move || {
        flag.store(true, Ordering::SeqCst);
        true
    }));
    queue.process_all();
    assert!(!done2.load(Ordering::SeqCst));
    drop(future);
}

#[test]
fn and_of_already_completed_children_starts_inactive_and_never_fires() {
    let queue = TaskQueue::new();
    let log = CallLog::<Empty>::new();

    let p1 = Promise::new(queue.executor());
    let p2 = Promise::new(queue.executor());
    let f1 = p1.get_future().unwrap();
    let f2 = p2.get_future().unwrap();

    // Both deliveries land before either completion thunk runs.
    p1.finished(true).unwrap();
    p2.finished(false).unwrap();

    let future = and(f1, f2).then(log.sink()).unwrap();
    queue.process_all();

    assert_eq!(log.count(), 0);
    assert!(!future.is_active());
}

#[test]
fn or_fires_exactly_once_when_both_finish_in_the_same_turn() {
    let queue = TaskQueue::new();
    let log = CallLog::<Empty>::new();

    let p1 = Promise::new(queue.executor());
    let p2 = Promise::new(queue.executor());
    let f1 = p1.get_future().unwrap();
    let f2 = p2.get_future().unwrap();

    let future = or(f1, f2).then(log.sink()).unwrap();

    queue.enqueue(embed_promise_into_task(p1, || true));
    queue.enqueue(embed_promise_into_task(p2, || true));
    queue.process_all();

    assert_eq!(log.calls(), vec![Some(Empty)]);
    drop(future);
}

#[test]
fn cancelling_the_combination_cancels_both_children() {
    let queue = TaskQueue::new();
    let cancelled1 = Arc::new(AtomicBool::new(false));
    let cancelled2 = Arc::new(AtomicBool::new(false));

    let p1 = Promise::<bool>::new(queue.executor());
    let p2 = Promise::<bool>::new(queue.executor());

    let flag1 = Arc::clone(&cancelled1);
    let f1 = p1
        .get_future_with_canceller(move || flag1.store(true, Ordering::SeqCst))
        .unwrap();
    let flag2 = Arc::clone(&cancelled2);
    let f2 = p2
        .get_future_with_canceller(move || flag2.store(true, Ordering::SeqCst))
        .unwrap();

    let mut future = and(f1, f2);
    future.cancel();

    assert!(cancelled1.load(Ordering::SeqCst));
    assert!(cancelled2.load(Ordering::SeqCst));
    assert!(p1.is_cancelled());
    assert!(p2.is_cancelled());
}
