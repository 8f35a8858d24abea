use evstage::{
    EventKind, EventRequest, HealthStatus, Service, ServiceMetrics, Settings, SharedEngine,
    TracingLog,
};
use std::sync::Arc;

mod common;
use common::Probe;

#[test]
fn test_batch_then_dispatch_all() {
    let probe = Probe::new();
    let service = Service::new(Arc::new(probe.shared(3)));

    let batch: Vec<_> = ["a", "b", "c", "d"]
        .into_iter()
        .map(|source| EventRequest::new(EventKind::Data, source, source.as_bytes()))
        .collect();
    let outcome = service.enqueue_batch(&batch);
    assert_eq!((outcome.queued, outcome.failed), (3, 1));

    service.engine().start().unwrap();
    let report = service.dispatch_all().unwrap();
    assert_eq!(report.processed, 3);
    assert_eq!(probe.handler.sources(), ["a", "b", "c"]);

    let status = service.status();
    assert_eq!(status.state, "RUNNING");
    assert_eq!(status.events_processed, 3);
    assert_eq!(status.queue_size, 0);
}

#[test]
fn test_json_requests() {
    let probe = Probe::new();
    let service = Service::new(Arc::new(probe.shared(0)));
    let batch: Vec<EventRequest> = serde_json::from_str(
        r#"[{"kind":0,"source":"s1","payload":[65]},{"kind":3,"source":"s2"},{"kind":7,"source":"bad"}]"#,
    )
    .unwrap();

    let outcome = service.enqueue_batch(&batch);
    assert_eq!(outcome.failed, 1);
    service.engine().start().unwrap();
    service.dispatch_all().unwrap();
    assert_eq!(probe.handler.kinds(), [EventKind::Data, EventKind::Error]);
}

#[test]
fn test_health_follows_lifecycle_and_depth() {
    let probe = Probe::new();
    let service = Service::new(Arc::new(probe.shared(4))).with_health_threshold(0.5);
    assert_eq!(service.health().status, HealthStatus::Unhealthy);

    service.engine().start().unwrap();
    assert!(service.health().is_healthy());

    for _ in 0..2 {
        service
            .enqueue(&EventRequest::new(EventKind::Data, "s", &[]))
            .unwrap();
    }
    assert!(!service.health().checks["queue"]);

    service.engine().close();
    assert!(!service.health().checks["processor"]);
    assert_eq!(service.status().state, "CLOSED");
}

#[test]
fn test_settings_build_a_working_engine() {
    let settings = Settings::from_lookup(|key| match key {
        "EVSTAGE_NAME" => Some("from-env".to_string()),
        "EVSTAGE_QUEUE_SIZE" => Some("2".to_string()),
        _ => None,
    })
    .unwrap();
    let engine = SharedEngine::new(
        settings
            .engine_config()
            .log_sink(TracingLog::named(settings.name.clone())),
    )
    .unwrap();
    let service = Service::new(Arc::new(engine)).with_health_threshold(settings.health_threshold);

    assert_eq!(service.engine().name(), "from-env");
    assert_eq!(service.engine().capacity(), Some(2));
}

#[test]
fn test_huge_queue_size_from_settings_builds() {
    let huge = usize::MAX.to_string();
    let settings = Settings::from_lookup(|key| (key == "EVSTAGE_QUEUE_SIZE").then(|| huge.clone()))
        .unwrap();
    let engine = SharedEngine::new(settings.engine_config()).unwrap();
    assert_eq!(engine.capacity(), Some(usize::MAX));
    engine.push(EventKind::Data, "s", &[]).unwrap();
    assert_eq!(engine.queue_size(), 1);
}

#[test]
fn test_metrics_snapshot_through_facade() {
    let probe = Probe::new();
    let metrics = Arc::new(ServiceMetrics::new());
    let engine = SharedEngine::new(
        evstage::EngineConfig::new("metered").handler(metrics.instrument(probe.handler.clone())),
    )
    .unwrap();
    let service = Service::new(Arc::new(engine)).with_metrics(metrics.clone());

    service
        .enqueue(&EventRequest::new(EventKind::Connect, "edge", &[]))
        .unwrap();
    service.engine().start().unwrap();
    service.dispatch_all().unwrap();

    let snapshot = service.metrics().snapshot();
    assert_eq!(snapshot.received[0].source, "edge");
    assert_eq!(snapshot.processed[0].kind, "CONNECT");
    assert_eq!(snapshot.processed[0].count, 1);
    assert_eq!(snapshot.queue_size, 0);
    assert_eq!(snapshot.dispatch_duration.count, 1);
    assert_eq!(probe.handler.count(), 1);
}
