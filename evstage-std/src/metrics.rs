//! Front-door metrics.
//!
//! Four series, updated at the [`Service`](crate::service::Service) call
//! sites and, for deliveries, from the handler side:
//!
//! - events received, by kind and source (accepted pushes, filtered ones
//!   included)
//! - events processed, by kind and source (counted by [`MeteredHandler`])
//! - queue size gauge
//! - dispatch duration histogram, in seconds
//!
//! Export is left to the caller: [`ServiceMetrics::snapshot`] returns a
//! serde-ready view that any exporter can translate.

use evstage_core::{BoxError, EventHandler, EventKind, EventRecord};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};

/// Upper bounds (seconds) of the dispatch duration buckets.
pub const DURATION_BUCKETS: [f64; 11] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

type Labeled = Mutex<BTreeMap<(EventKind, String), u64>>;

/// Shared metric state for one engine's front door.
#[derive(Debug, Default)]
pub struct ServiceMetrics {
    received: Labeled,
    processed: Labeled,
    queue_size: AtomicUsize,
    durations: DurationHistogram,
}

impl ServiceMetrics {
    /// Fresh, zeroed metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one accepted push.
    pub fn record_received(&self, kind: EventKind, source: &str) {
        bump(&self.received, kind, source);
    }

    /// Count one delivery.
    pub fn record_processed(&self, kind: EventKind, source: &str) {
        bump(&self.processed, kind, source);
    }

    /// Set the queue size gauge.
    pub fn set_queue_size(&self, size: usize) {
        self.queue_size.store(size, Ordering::Relaxed);
    }

    /// Add one dispatch duration sample.
    pub fn observe_dispatch(&self, elapsed: Duration) {
        self.durations.observe(elapsed);
    }

    /// Received count for one label pair.
    pub fn received(&self, kind: EventKind, source: &str) -> u64 {
        lookup(&self.received, kind, source)
    }

    /// Processed count for one label pair.
    pub fn processed(&self, kind: EventKind, source: &str) -> u64 {
        lookup(&self.processed, kind, source)
    }

    /// Current queue size gauge.
    pub fn queue_size(&self) -> usize {
        self.queue_size.load(Ordering::Relaxed)
    }

    /// Wrap `handler` so every delivery is counted here first.
    pub fn instrument<H: EventHandler>(self: &Arc<Self>, handler: H) -> MeteredHandler<H> {
        MeteredHandler {
            metrics: self.clone(),
            inner: handler,
        }
    }

    /// Point-in-time copy of every series.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            received: labeled_counts(&self.received),
            processed: labeled_counts(&self.processed),
            queue_size: self.queue_size(),
            dispatch_duration: self.durations.snapshot(),
        }
    }
}

fn bump(series: &Labeled, kind: EventKind, source: &str) {
    let mut counts = series.lock().unwrap_or_else(PoisonError::into_inner);
    *counts.entry((kind, source.to_string())).or_default() += 1;
}

fn lookup(series: &Labeled, kind: EventKind, source: &str) -> u64 {
    series
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&(kind, source.to_string()))
        .copied()
        .unwrap_or(0)
}

fn labeled_counts(series: &Labeled) -> Vec<LabeledCount> {
    series
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .map(|((kind, source), count)| LabeledCount {
            kind: kind.as_str().to_string(),
            source: source.clone(),
            count: *count,
        })
        .collect()
}

// ============================================================================
// Histogram
// ============================================================================

#[derive(Debug, Default)]
struct DurationHistogram {
    buckets: [AtomicU64; DURATION_BUCKETS.len()],
    count: AtomicU64,
    sum_micros: AtomicU64,
}

impl DurationHistogram {
    fn observe(&self, elapsed: Duration) {
        let seconds = elapsed.as_secs_f64();
        for (bound, bucket) in DURATION_BUCKETS.iter().zip(&self.buckets) {
            if seconds <= *bound {
                bucket.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.count.fetch_add(1, Ordering::Relaxed);
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.sum_micros.fetch_add(micros, Ordering::Relaxed);
    }

    fn snapshot(&self) -> HistogramSnapshot {
        HistogramSnapshot {
            buckets: DURATION_BUCKETS
                .iter()
                .zip(&self.buckets)
                .map(|(bound, bucket)| (*bound, bucket.load(Ordering::Relaxed)))
                .collect(),
            count: self.count.load(Ordering::Relaxed),
            sum_seconds: self.sum_micros.load(Ordering::Relaxed) as f64 / 1_000_000.0,
        }
    }
}

// ============================================================================
// Snapshots
// ============================================================================

/// One counter of a kind/source labeled series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledCount {
    /// Kind name, e.g. "DATA".
    pub kind: String,
    /// Source tag.
    pub source: String,
    /// Count so far.
    pub count: u64,
}

/// Cumulative histogram buckets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramSnapshot {
    /// `(upper bound in seconds, samples at or below it)`.
    pub buckets: Vec<(f64, u64)>,
    /// Total samples.
    pub count: u64,
    /// Sum of all samples in seconds.
    pub sum_seconds: f64,
}

/// Serializable view of [`ServiceMetrics`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Accepted pushes by kind and source.
    pub received: Vec<LabeledCount>,
    /// Deliveries by kind and source.
    pub processed: Vec<LabeledCount>,
    /// Queue size gauge.
    pub queue_size: usize,
    /// Dispatch durations.
    pub dispatch_duration: HistogramSnapshot,
}

// ============================================================================
// Metered Handler
// ============================================================================

/// A handler wrapper counting each delivery before passing it on.
///
/// Failed deliveries are counted too; they count as processed in the engine
/// as well.
///
/// # Example
///
/// ```rust,ignore
/// let metrics = Arc::new(ServiceMetrics::new());
/// let engine = SharedEngine::new(
///     EngineConfig::new("api").handler(metrics.instrument(my_handler)),
/// )?;
/// let service = Service::new(Arc::new(engine)).with_metrics(metrics);
/// ```
#[derive(Debug)]
pub struct MeteredHandler<H> {
    metrics: Arc<ServiceMetrics>,
    inner: H,
}

impl<H: EventHandler> EventHandler for MeteredHandler<H> {
    fn on_event(&self, record: &EventRecord) -> Result<(), BoxError> {
        self.metrics.record_processed(record.kind(), record.source());
        self.inner.on_event(record)
    }
}
