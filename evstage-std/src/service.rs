//! Transport-free front door.
//!
//! [`Service`] implements the contracts a network or embedded front end owes
//! the engine: single and batch enqueue, manual dispatch with timing, status
//! and health. It speaks in serde-ready request/report types and leaves the
//! wire (HTTP, gRPC, a serial line) to the caller.
//!
//! Every call site also feeds [`ServiceMetrics`]: received counts on
//! enqueue, the duration histogram on dispatch and the queue gauge on
//! enqueue, dispatch and status.

use crate::{metrics::ServiceMetrics, shared::SharedEngine};
use chrono::{DateTime, Utc};
use evstage_core::{EngineError, EventKind, LifecycleState};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    sync::Arc,
    time::{Duration, Instant},
};

/// Default fraction of capacity at which the queue check fails.
pub const DEFAULT_HEALTH_THRESHOLD: f64 = 0.9;

/// One event as submitted by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRequest {
    /// Wire kind tag, see [`EventKind`].
    pub kind: i32,
    /// Source tag.
    pub source: String,
    /// Opaque payload.
    #[serde(default)]
    pub payload: Vec<u8>,
}

impl EventRequest {
    /// Build a request from typed parts.
    pub fn new(kind: EventKind, source: impl Into<String>, payload: &[u8]) -> Self {
        Self {
            kind: kind.as_i32(),
            source: source.into(),
            payload: payload.to_vec(),
        }
    }
}

/// Tally of a batch enqueue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Requests accepted (queued or filtered).
    pub queued: usize,
    /// Requests rejected.
    pub failed: usize,
}

/// Result of a manual dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
    /// Records handed to the handler.
    pub processed: usize,
    /// Wall time spent dispatching.
    pub elapsed: Duration,
}

/// Point-in-time engine status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    /// "IDLE", "RUNNING", "STOPPED" or "CLOSED".
    pub state: String,
    /// Records waiting for dispatch.
    pub queue_size: usize,
    /// Records dispatched so far.
    pub events_processed: u64,
    /// When the snapshot was taken.
    pub timestamp: DateTime<Utc>,
}

/// Overall health verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Every check passed.
    Healthy,
    /// At least one check failed.
    Unhealthy,
}

/// Health verdict with the individual checks behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Overall verdict.
    pub status: HealthStatus,
    /// Named checks: `processor` (engine running) and `queue` (below the
    /// high-water mark).
    pub checks: BTreeMap<String, bool>,
}

impl HealthReport {
    /// Whether every check passed.
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// Front-door operations over a shared engine.
#[derive(Debug, Clone)]
pub struct Service {
    engine: Arc<SharedEngine>,
    health_threshold: f64,
    metrics: Arc<ServiceMetrics>,
}

impl Service {
    /// Wrap `engine` with the default health threshold.
    pub fn new(engine: Arc<SharedEngine>) -> Self {
        Self {
            engine,
            health_threshold: DEFAULT_HEALTH_THRESHOLD,
            metrics: Arc::default(),
        }
    }

    /// Override the queue high-water fraction used by [`Service::health`].
    ///
    /// The value is clamped into `(0, 1]`; NaN falls back to
    /// [`DEFAULT_HEALTH_THRESHOLD`]. Use [`Settings::validate`] to reject
    /// such values instead.
    ///
    /// [`Settings::validate`]: crate::settings::Settings::validate
    pub fn with_health_threshold(mut self, threshold: f64) -> Self {
        self.health_threshold = if threshold.is_nan() {
            DEFAULT_HEALTH_THRESHOLD
        } else {
            threshold.clamp(f64::MIN_POSITIVE, 1.0)
        };
        self
    }

    /// Record into `metrics` instead of a private instance. Pass the same
    /// instance to [`ServiceMetrics::instrument`] for processed counts.
    pub fn with_metrics(mut self, metrics: Arc<ServiceMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// The effective health threshold.
    pub fn health_threshold(&self) -> f64 {
        self.health_threshold
    }

    /// The metrics this service records into.
    pub fn metrics(&self) -> &Arc<ServiceMetrics> {
        &self.metrics
    }

    /// The wrapped engine.
    pub fn engine(&self) -> &Arc<SharedEngine> {
        &self.engine
    }

    /// Push one request. A filtered request is reported as accepted.
    pub fn enqueue(&self, request: &EventRequest) -> Result<(), EngineError> {
        let kind = EventKind::try_from(request.kind)?;
        self.engine.push(kind, &request.source, &request.payload)?;
        self.metrics.record_received(kind, &request.source);
        self.metrics.set_queue_size(self.engine.queue_size());
        tracing::trace!(kind = %kind, source = %request.source, "event received");
        Ok(())
    }

    /// Push every request, tallying outcomes. One rejection never fails the
    /// batch.
    pub fn enqueue_batch(&self, requests: &[EventRequest]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for (index, request) in requests.iter().enumerate() {
            match self.enqueue(request) {
                Ok(()) => outcome.queued += 1,
                Err(err) => {
                    outcome.failed += 1;
                    tracing::warn!(index, error = %err, "failed to queue event in batch");
                }
            }
        }
        outcome
    }

    /// Dispatch at most one record.
    pub fn dispatch_one(&self) -> Result<DispatchReport, EngineError> {
        let started = Instant::now();
        let dispatched = self.engine.process()?;
        let elapsed = started.elapsed();
        self.record_dispatch(elapsed);
        Ok(DispatchReport {
            processed: usize::from(dispatched),
            elapsed,
        })
    }

    /// Dispatch until the queue is empty or the engine stops.
    pub fn dispatch_all(&self) -> Result<DispatchReport, EngineError> {
        let started = Instant::now();
        let processed = self.engine.process_all()?;
        let report = DispatchReport {
            processed,
            elapsed: started.elapsed(),
        };
        self.record_dispatch(report.elapsed);
        tracing::debug!(processed, elapsed = ?report.elapsed, "dispatch complete");
        Ok(report)
    }

    /// Snapshot the engine counters.
    pub fn status(&self) -> StatusReport {
        self.metrics.set_queue_size(self.engine.queue_size());
        StatusReport {
            state: self
                .engine
                .state()
                .map_or("CLOSED", LifecycleState::as_str)
                .to_string(),
            queue_size: self.engine.queue_size(),
            events_processed: self.engine.events_processed(),
            timestamp: Utc::now(),
        }
    }

    /// Derive health from the lifecycle state and queue depth.
    ///
    /// Unbounded queues always pass the queue check.
    pub fn health(&self) -> HealthReport {
        let running = self.engine.state() == Some(LifecycleState::Running);
        let below_high_water = match self.engine.capacity() {
            Some(capacity) => {
                (self.engine.queue_size() as f64) < capacity as f64 * self.health_threshold
            }
            None => true,
        };

        let checks = BTreeMap::from([
            ("processor".to_string(), running),
            ("queue".to_string(), below_high_water),
        ]);
        let status = if checks.values().all(|ok| *ok) {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        };
        HealthReport { status, checks }
    }

    fn record_dispatch(&self, elapsed: Duration) {
        self.metrics.observe_dispatch(elapsed);
        self.metrics.set_queue_size(self.engine.queue_size());
    }
}
