use evstage::{
    BoxError, EngineConfig, EngineError, EventFilter, EventKind, EventRecord, LifecycleState, LogLevel,
    filters::{KindFilter, MaxPayload, SourceBlocklist},
    testing::{FailingHandler, ScriptedFilter},
};

mod common;
use common::Probe;

#[test]
fn test_end_to_end_scenario() {
    let probe = Probe::new();
    let mut engine = probe.engine(2);

    engine.push(EventKind::Data, "s1", b"A").unwrap();
    engine.push(EventKind::Error, "s2", b"B").unwrap();
    assert_eq!(
        engine.push(EventKind::Data, "s3", b"C"),
        Err(EngineError::QueueFull { capacity: 2 })
    );
    assert_eq!(engine.queue_size(), 2);

    engine.start();
    assert!(engine.process());
    assert_eq!(engine.events_processed(), 1);
    assert_eq!(engine.queue_size(), 1);

    assert_eq!(engine.process_all(), 1);
    assert_eq!(engine.events_processed(), 2);
    assert_eq!(engine.queue_size(), 0);

    let records = probe.handler.records();
    assert_eq!(records[0].kind(), EventKind::Data);
    assert_eq!(records[0].source(), "s1");
    assert_eq!(records[0].payload(), b"A");
    assert_eq!(records[1].kind(), EventKind::Error);
    assert_eq!(records[1].source(), "s2");
    assert_eq!(records[1].payload(), b"B");
}

#[test]
fn test_fifo_order_across_growth() {
    let probe = Probe::new();
    let mut engine = probe.engine(0);
    let sources: Vec<String> = (0..100).map(|i| format!("s{i}")).collect();
    for source in &sources {
        engine.push(EventKind::Data, source, &[]).unwrap();
    }

    engine.start();
    assert_eq!(engine.process_all(), 100);
    assert_eq!(probe.handler.sources(), sources);
}

#[test]
fn test_push_copies_caller_buffers() {
    let probe = Probe::new();
    let mut engine = probe.engine(0);
    let mut source = String::from("origin");
    let mut payload = vec![1u8, 2, 3];
    engine.push(EventKind::Connect, &source, &payload).unwrap();
    source.clear();
    payload.fill(0);

    engine.start();
    engine.process();
    let record = &probe.handler.records()[0];
    assert_eq!(record.source(), "origin");
    assert_eq!(record.payload(), [1, 2, 3]);
}

#[test]
fn test_empty_source_and_payload_are_accepted() {
    let probe = Probe::new();
    let mut engine = probe.engine(0);
    engine.push(EventKind::Disconnect, "", &[]).unwrap();
    engine.start();
    engine.process();
    assert_eq!(probe.handler.records()[0].payload_len(), 0);
}

#[test]
fn test_filtered_push_is_transparent() {
    let probe = Probe::new();
    let mut engine = probe
        .config("filtered", 1)
        .filter(SourceBlocklist::new(["blocked"]))
        .build()
        .unwrap();

    assert_eq!(engine.push(EventKind::Data, "blocked", &[]), Ok(()));
    assert_eq!(engine.queue_size(), 0);
    assert!(probe.log.contains("Event filtered out"));

    engine.push(EventKind::Data, "ok", &[]).unwrap();
    assert_eq!(
        engine.push(EventKind::Data, "blocked", &[]),
        Err(EngineError::QueueFull { capacity: 1 })
    );
}

#[test]
fn test_filter_failure_fails_open() {
    let probe = Probe::new();
    let filter = ScriptedFilter::rejecting();
    filter.set_fail(true);
    let mut engine = probe.config("open", 0).filter(filter).build().unwrap();

    engine.push(EventKind::Data, "s", &[]).unwrap();
    assert_eq!(engine.queue_size(), 1);
    assert_eq!(probe.log.at(LogLevel::Error).len(), 1);
}

#[test]
fn test_combined_filters() {
    let probe = Probe::new();
    let kinds = KindFilter::except(&[EventKind::Error]);
    let size = MaxPayload(4);
    let mut engine = probe
        .config("combined", 0)
        .filter(move |record: &EventRecord| {
            Ok::<_, BoxError>(kinds.allow(record)? && size.allow(record)?)
        })
        .build()
        .unwrap();

    engine.push(EventKind::Data, "a", b"1234").unwrap();
    engine.push(EventKind::Data, "b", b"12345").unwrap();
    engine.push(EventKind::Error, "c", b"1").unwrap();
    assert_eq!(engine.queue_size(), 1);
}

#[test]
fn test_dispatch_gated_by_state() {
    let probe = Probe::new();
    let mut engine = probe.engine(0);
    engine.push(EventKind::Data, "s", &[]).unwrap();

    assert!(!engine.process());
    assert_eq!(engine.process_all(), 0);
    assert_eq!(engine.queue_size(), 1);
    assert_eq!(probe.log.at(LogLevel::Warn).len(), 2);

    engine.start();
    engine.stop();
    assert!(!engine.process());
    assert_eq!(engine.state(), LifecycleState::Stopped);

    engine.start();
    assert!(engine.process());
    assert_eq!(probe.handler.count(), 1);
}

#[test]
fn test_idempotent_transitions_notify_once() {
    let probe = Probe::new();
    let mut engine = probe.engine(0);
    engine.start();
    engine.start();
    engine.stop();
    engine.stop();
    engine.start();

    assert_eq!(
        probe.states.transitions(),
        [
            (LifecycleState::Idle, LifecycleState::Running),
            (LifecycleState::Running, LifecycleState::Stopped),
            (LifecycleState::Stopped, LifecycleState::Running),
        ]
    );
}

#[test]
fn test_stop_between_dispatches_keeps_remainder() {
    let probe = Probe::new();
    let mut engine = probe.engine(0);
    for _ in 0..3 {
        engine.push(EventKind::Data, "s", &[]).unwrap();
    }
    engine.start();
    assert!(engine.process());
    engine.stop();
    assert_eq!(engine.process_all(), 0);
    assert_eq!(engine.queue_size(), 2);
}

#[test]
fn test_failed_deliveries_still_count() {
    for handler in [FailingHandler::error("refused"), FailingHandler::panic("crashed")] {
        let mut engine = EngineConfig::new("failing")
            .handler(handler.clone())
            .build()
            .unwrap();
        for _ in 0..3 {
            engine.push(EventKind::Data, "s", &[]).unwrap();
        }
        engine.start();

        assert_eq!(engine.process_all(), 3);
        assert_eq!(engine.events_processed(), 3);
        assert_eq!(handler.attempts(), 3);
    }
}

#[test]
fn test_counter_is_monotonic() {
    let probe = Probe::new();
    let mut engine = probe.engine(0);
    engine.start();
    let mut last = 0;
    for round in 0..5 {
        for _ in 0..round {
            engine.push(EventKind::Data, "s", &[]).unwrap();
        }
        engine.process_all();
        engine.clear_queue();
        assert!(engine.events_processed() >= last);
        last = engine.events_processed();
    }
    assert_eq!(last, 10);
}

#[test]
fn test_clear_queue_discards_without_dispatch() {
    let probe = Probe::new();
    let mut engine = probe.engine(0);
    engine.push(EventKind::Data, "a", &[]).unwrap();
    engine.push(EventKind::Data, "b", &[]).unwrap();

    assert_eq!(engine.clear_queue(), 2);
    assert_eq!(engine.clear_queue(), 0);
    engine.start();
    assert_eq!(engine.process_all(), 0);
    assert_eq!(probe.handler.count(), 0);
    assert!(probe.log.contains("Cleared 2 events from queue"));
}

#[test]
fn test_drop_discards_queued_records() {
    let probe = Probe::new();
    {
        let mut engine = probe.engine(0);
        engine.push(EventKind::Data, "a", &[]).unwrap();
        engine.start();
        engine.close();
    }
    assert_eq!(probe.handler.count(), 0);
    assert!(probe.log.contains("Destroying event processor 'probe'"));
}

#[test]
fn test_logging_disabled_is_silent() {
    let probe = Probe::new();
    let mut engine = probe.config("quiet", 1).enable_logging(false).build().unwrap();
    engine.push(EventKind::Data, "a", &[]).unwrap();
    let _ = engine.push(EventKind::Data, "b", &[]);
    engine.process();
    engine.start();
    engine.process_all();
    drop(engine);
    assert_eq!(probe.log.count(), 0);
}

#[test]
fn test_invalid_names_are_rejected() {
    assert!(EngineConfig::new("").build().is_err());
    assert!(EngineConfig::new("nul\0byte").build().is_err());
}
