//! Periodic dispatch driven by a tokio task.
//!
//! For embedded control-loop callers that want the queue drained on a fixed
//! cadence without writing the loop themselves.

use crate::shared::SharedEngine;
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};

/// A background task calling `process_all` on every tick.
///
/// Ticks while the engine is not running are skipped silently. The task ends
/// when [`Pump::shutdown`] is awaited or the engine is closed.
///
/// Handlers run on the tokio worker thread; keep them short or drive a
/// multi-threaded runtime.
///
/// # Example
///
/// ```rust,ignore
/// let pump = Pump::spawn(engine.clone(), Duration::from_millis(10));
/// // ...
/// let dispatched = pump.shutdown().await;
/// ```
#[derive(Debug)]
pub struct Pump {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<usize>,
}

impl Pump {
    /// Spawn the pump on the current tokio runtime.
    pub fn spawn(engine: Arc<SharedEngine>, interval: Duration) -> Self {
        let (shutdown, mut signal) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut dispatched = 0;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match engine.state() {
                            None => break,
                            Some(state) if state.is_running() => {
                                match engine.process_all() {
                                    Ok(count) => dispatched += count,
                                    Err(_) => break,
                                }
                            }
                            Some(_) => {}
                        }
                    }
                    changed = signal.changed() => {
                        if changed.is_err() || *signal.borrow() {
                            break;
                        }
                    }
                }
            }

            tracing::debug!(engine = %engine.name(), dispatched, "pump stopped");
            dispatched
        });

        Self { shutdown, task }
    }

    /// Whether the task has ended on its own (engine closed).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the pump and return how many records it dispatched.
    pub async fn shutdown(self) -> usize {
        // The task may already have exited, dropping the receiver.
        let _ = self.shutdown.send(true);
        match self.task.await {
            Ok(dispatched) => dispatched,
            Err(err) => {
                tracing::error!(error = %err, "pump task failed");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evstage_core::{EngineConfig, EventKind};

    fn engine() -> Arc<SharedEngine> {
        Arc::new(SharedEngine::new(EngineConfig::new("pumped")).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn test_pump_drains_running_engine() {
        let engine = engine();
        engine.start().unwrap();
        for _ in 0..3 {
            engine.push(EventKind::Data, "s", &[]).unwrap();
        }

        let pump = Pump::spawn(engine.clone(), Duration::from_millis(10));
        time::sleep(Duration::from_millis(25)).await;

        assert_eq!(engine.queue_size(), 0);
        assert_eq!(pump.shutdown().await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pump_skips_idle_engine() {
        let engine = engine();
        engine.push(EventKind::Data, "s", &[]).unwrap();

        let pump = Pump::spawn(engine.clone(), Duration::from_millis(10));
        time::sleep(Duration::from_millis(50)).await;

        assert_eq!(engine.queue_size(), 1);
        assert_eq!(pump.shutdown().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pump_ends_when_engine_closes() {
        let engine = engine();
        let pump = Pump::spawn(engine.clone(), Duration::from_millis(10));
        engine.close();
        time::sleep(Duration::from_millis(30)).await;

        assert!(pump.is_finished());
        assert_eq!(pump.shutdown().await, 0);
    }
}
