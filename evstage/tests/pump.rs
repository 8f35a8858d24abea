#![cfg(feature = "pump")]

use evstage::{EventKind, pump::Pump};
use std::{sync::Arc, time::Duration};

mod common;
use common::Probe;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_pump_delivers_concurrent_pushes() {
    let probe = Probe::new();
    let engine = Arc::new(probe.shared(0));
    engine.start().unwrap();

    let pump = Pump::spawn(engine.clone(), Duration::from_millis(1));
    let producer = {
        let engine = engine.clone();
        std::thread::spawn(move || {
            for _ in 0..100 {
                engine.push(EventKind::Data, "p", &[]).unwrap();
            }
        })
    };
    producer.join().unwrap();

    while engine.queue_size() > 0 {
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    let dispatched = pump.shutdown().await;

    assert_eq!(dispatched, 100);
    assert_eq!(probe.handler.count(), 100);
}

#[tokio::test]
async fn test_pump_stops_after_close() {
    let probe = Probe::new();
    let engine = Arc::new(probe.shared(0));
    engine.start().unwrap();
    let pump = Pump::spawn(engine.clone(), Duration::from_millis(1));

    engine.close();
    while !pump.is_finished() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    assert_eq!(pump.shutdown().await, 0);
}
