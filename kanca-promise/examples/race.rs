//! Two promised tasks race through `or`; the loser is cancelled and its
//! body never runs.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use kanca_promise::{embed_promise_into_task, or, Executor, Promise, Task};

fn drain(queue: &Mutex<VecDeque<Task>>) {
    loop {
        let task = queue.lock().unwrap().pop_front();
        match task {
            Some(task) => task(),
            None => break,
        }
    }
}

fn main() {
    let queue: Arc<Mutex<VecDeque<Task>>> = Arc::new(Mutex::new(VecDeque::new()));
    let executor: Executor = {
        let queue = Arc::clone(&queue);
        Arc::new(move |task| queue.lock().unwrap().push_back(task))
    };

    let fast = Promise::new(Arc::clone(&executor));
    let slow = Promise::new(Arc::clone(&executor));
    let f1 = fast.get_future().unwrap();
    let f2 = slow.get_future().unwrap();

    let _winner = or(f1, f2)
        .then(|r| println!("first one finished: {:?}", r.is_some()))
        .unwrap();

    (*executor)(Box::new(embed_promise_into_task(fast, || "fast")));
    drain(&queue);

    // The race is settled: the slow task finds its promise cancelled.
    (*executor)(Box::new(embed_promise_into_task(slow, || {
        println!("slow body ran (it should not)");
        "slow"
    })));
    drain(&queue);
}
