use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::asset::AssetPhase;

/// Progress notifications emitted by the importer.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportEvent {
    RunStarted {
        total: usize,
        batches: usize,
        resumed: usize,
    },
    BatchStarted {
        batch: usize,
        size: usize,
    },
    BatchUploaded {
        batch: usize,
        count: usize,
    },
    StatusPolled {
        asset_id: String,
        attempt: usize,
        phase: Option<AssetPhase>,
    },
    ItemSettled {
        asset_id: String,
        phase: AssetPhase,
        error_message: Option<String>,
        seconds: f64,
    },
    CheckpointWritten {
        path: PathBuf,
        results: usize,
    },
    RunFinished {
        total: usize,
        succeeded: usize,
        failed: usize,
    },
}

pub trait ImportObserver: Send + Sync {
    fn on_event(&self, event: &ImportEvent);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ImportObserver for NoopObserver {
    fn on_event(&self, _event: &ImportEvent) {}
}

/// Default observer: structured `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ImportObserver for TracingObserver {
    fn on_event(&self, event: &ImportEvent) {
        match event {
            ImportEvent::RunStarted {
                total,
                batches,
                resumed,
            } => {
                info!(total, batches, resumed, "import started");
            }
            ImportEvent::BatchStarted { batch, size } => {
                debug!(batch, size, "batch started");
            }
            ImportEvent::BatchUploaded { batch, count } => {
                info!(batch, count, "batch uploaded");
            }
            ImportEvent::StatusPolled {
                asset_id,
                attempt,
                phase,
            } => {
                let phase = phase.as_ref().map(AssetPhase::as_str).unwrap_or("unset");
                debug!(asset_id = %asset_id, attempt, phase, "status polled");
            }
            ImportEvent::ItemSettled {
                asset_id,
                phase,
                error_message,
                seconds,
            } => {
                let error = error_message.as_deref().unwrap_or("none");
                if matches!(phase, AssetPhase::Ready) {
                    info!(asset_id = %asset_id, phase = %phase, seconds, "asset settled");
                } else {
                    warn!(asset_id = %asset_id, phase = %phase, error, seconds, "asset settled");
                }
            }
            ImportEvent::CheckpointWritten { path, results } => {
                info!(path = %path.display(), results, "checkpoint written");
            }
            ImportEvent::RunFinished {
                total,
                succeeded,
                failed,
            } => {
                info!(total, succeeded, failed, "import finished");
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImportMetrics {
    pub batches_started: u64,
    pub assets_created: u64,
    pub status_polls: u64,
    pub assets_ready: u64,
    pub assets_failed: u64,
    pub checkpoints_written: u64,
    pub total_seconds: f64,
}

impl ImportMetrics {
    pub fn record_batch(&mut self) {
        self.batches_started = self.batches_started.saturating_add(1);
    }

    pub fn record_created(&mut self, count: u64) {
        self.assets_created = self.assets_created.saturating_add(count);
    }

    pub fn record_poll(&mut self) {
        self.status_polls = self.status_polls.saturating_add(1);
    }

    pub fn record_settled(&mut self, ready: bool, seconds: f64) {
        if ready {
            self.assets_ready = self.assets_ready.saturating_add(1);
        } else {
            self.assets_failed = self.assets_failed.saturating_add(1);
        }
        self.total_seconds += seconds;
    }

    pub fn record_checkpoint(&mut self) {
        self.checkpoints_written = self.checkpoints_written.saturating_add(1);
    }

    pub fn settled(&self) -> u64 {
        self.assets_ready + self.assets_failed
    }

    pub fn success_rate(&self) -> f64 {
        if self.settled() == 0 {
            0.0
        } else {
            (self.assets_ready as f64 / self.settled() as f64) * 100.0
        }
    }

    pub fn mean_seconds(&self) -> f64 {
        if self.settled() == 0 {
            0.0
        } else {
            self.total_seconds / self.settled() as f64
        }
    }
}

/// Folds events into [`ImportMetrics`].
#[derive(Debug, Default)]
pub struct MetricsObserver {
    metrics: Mutex<ImportMetrics>,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ImportMetrics {
        match self.metrics.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ImportObserver for MetricsObserver {
    fn on_event(&self, event: &ImportEvent) {
        let mut guard = match self.metrics.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match event {
            ImportEvent::BatchStarted { .. } => guard.record_batch(),
            ImportEvent::BatchUploaded { count, .. } => guard.record_created(*count as u64),
            ImportEvent::StatusPolled { .. } => guard.record_poll(),
            ImportEvent::ItemSettled { phase, seconds, .. } => {
                guard.record_settled(matches!(phase, AssetPhase::Ready), *seconds)
            }
            ImportEvent::CheckpointWritten { .. } => guard.record_checkpoint(),
            ImportEvent::RunStarted { .. } | ImportEvent::RunFinished { .. } => {}
        }
    }
}

/// Forwards every event to each inner observer in order.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn ImportObserver>>,
}

impl CompositeObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: Arc<dyn ImportObserver>) -> Self {
        self.observers.push(observer);
        self
    }
}

impl ImportObserver for CompositeObserver {
    fn on_event(&self, event: &ImportEvent) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }
}
