//! Watch the pool grow under load and shrink back after the linger timeout.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use kanca_pool::{PoolConfig, WorkerPool};

fn main() {
    let config = PoolConfig {
        min_size: 2,
        max_size: 4,
        max_linger: Duration::from_millis(500),
        ..PoolConfig::default()
    };
    let pool = WorkerPool::new(config, Arc::new(|line| eprintln!("{}", line)));
    thread::sleep(Duration::from_millis(100));
    println!("idle: {} workers", pool.worker_count());

    let gate = Arc::new(AtomicBool::new(false));
    for i in 0..4 {
        let gate = Arc::clone(&gate);
        pool.execute(move || {
            println!("task {} on {:?}", i, thread::current().id());
            while !gate.load(Ordering::Acquire) {
                thread::yield_now();
            }
        });
        thread::sleep(Duration::from_millis(50));
    }
    println!("saturated: {} workers", pool.worker_count());

    gate.store(true, Ordering::Release);
    thread::sleep(Duration::from_millis(800));
    println!("after linger: {} workers", pool.worker_count());
}
