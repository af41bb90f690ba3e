use std::ops::Range;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use futures::stream::{FuturesUnordered, TryStreamExt};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::asset::AssetClient;
use crate::config::ImporterConfig;

use super::aggregate::append_batch;
use super::checkpoint::CheckpointWriter;
use super::error::{ImportError, ImportResult};
use super::models::{InFlightItem, MediaDescriptor, ResultOrdering, ResultSet, SettledItem};
use super::observer::{ImportEvent, ImportObserver, TracingObserver};
use super::poll::{poll_until_settled, PollPolicy};
use super::upload::upload_batch;

/// Splits `len` items into contiguous ranges of at most `size` items.
pub fn partition(len: usize, size: usize) -> ImportResult<Vec<Range<usize>>> {
    if size == 0 {
        return Err(ImportError::InvalidBatchSize);
    }
    Ok((0..len)
        .step_by(size)
        .map(|start| start..(start + size).min(len))
        .collect())
}

/// Number of leading input items already covered by a checkpoint.
///
/// Batches are checkpointed whole, so `k` recorded results always stand for
/// the first `k` inputs even though their order inside a batch may differ.
pub fn resume_point(descriptors: &[MediaDescriptor], recorded: &ResultSet) -> ImportResult<usize> {
    if recorded.len() > descriptors.len() {
        return Err(ImportError::ResumeMismatch {
            recorded: recorded.len(),
            available: descriptors.len(),
        });
    }
    Ok(recorded.len())
}

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub batch_size: usize,
    pub ordering: ResultOrdering,
    pub poll: PollPolicy,
    pub checkpoint_path: PathBuf,
}

impl ImportOptions {
    pub fn from_config(config: &ImporterConfig) -> Self {
        Self {
            batch_size: config.batch.size,
            ordering: config.batch.ordering,
            poll: PollPolicy::from(&config.poll),
            checkpoint_path: config.checkpoint_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub batches: usize,
    pub processed: usize,
    pub resumed: usize,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub checkpoint_path: PathBuf,
    #[serde(skip)]
    pub results: ResultSet,
}

/// Drives batches one after another: upload, poll, aggregate, checkpoint.
pub struct Importer<C: AssetClient + ?Sized> {
    client: Arc<C>,
    options: ImportOptions,
    checkpoint: CheckpointWriter,
    observer: Arc<dyn ImportObserver>,
    cancel: CancellationToken,
}

impl<C: AssetClient + ?Sized> Importer<C> {
    pub fn new(client: Arc<C>, options: ImportOptions) -> Self {
        let checkpoint = CheckpointWriter::new(options.checkpoint_path.clone());
        Self {
            client,
            options,
            checkpoint,
            observer: Arc::new(TracingObserver),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ImportObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// Imports every descriptor, starting from an empty result set.
    pub async fn run(&self, descriptors: Vec<MediaDescriptor>) -> ImportResult<ImportReport> {
        self.run_from(descriptors, ResultSet::new()).await
    }

    /// Imports the descriptors not yet covered by `recorded`, appending to it.
    pub async fn run_from(
        &self,
        mut descriptors: Vec<MediaDescriptor>,
        recorded: ResultSet,
    ) -> ImportResult<ImportReport> {
        let started_at = Utc::now();
        let skip = resume_point(&descriptors, &recorded)?;
        let total = descriptors.len();
        let pending: Vec<(usize, MediaDescriptor)> =
            descriptors.drain(..).enumerate().skip(skip).collect();
        let ranges = partition(pending.len(), self.options.batch_size)?;

        self.observer.on_event(&ImportEvent::RunStarted {
            total,
            batches: ranges.len(),
            resumed: skip,
        });

        let mut results = recorded;
        let mut remaining = pending.into_iter();
        for (batch_index, range) in ranges.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Err(ImportError::Cancelled);
            }
            let batch: Vec<_> = remaining.by_ref().take(range.len()).collect();
            results = self.run_batch(batch_index, batch, results).await?;
        }

        let report = ImportReport {
            started_at,
            finished_at: Utc::now(),
            batches: ranges.len(),
            processed: total - skip,
            resumed: skip,
            total: results.len(),
            succeeded: results.succeeded(),
            failed: results.failed(),
            checkpoint_path: self.checkpoint.path().to_path_buf(),
            results,
        };
        self.observer.on_event(&ImportEvent::RunFinished {
            total: report.total,
            succeeded: report.succeeded,
            failed: report.failed,
        });
        Ok(report)
    }

    async fn run_batch(
        &self,
        batch_index: usize,
        batch: Vec<(usize, MediaDescriptor)>,
        mut results: ResultSet,
    ) -> ImportResult<ResultSet> {
        self.observer.on_event(&ImportEvent::BatchStarted {
            batch: batch_index,
            size: batch.len(),
        });

        let in_flight = upload_batch(self.client.as_ref(), batch, &self.cancel).await?;
        self.observer.on_event(&ImportEvent::BatchUploaded {
            batch: batch_index,
            count: in_flight.len(),
        });

        let settled = self.poll_batch(in_flight).await?;
        append_batch(&mut results, settled);

        self.checkpoint.write(&results)?;
        self.observer.on_event(&ImportEvent::CheckpointWritten {
            path: self.checkpoint.path().to_path_buf(),
            results: results.len(),
        });
        Ok(results)
    }

    async fn poll_batch(&self, in_flight: Vec<InFlightItem>) -> ImportResult<Vec<SettledItem>> {
        let client = self.client.as_ref();
        let policy = &self.options.poll;
        let cancel = &self.cancel;
        let observer = self.observer.as_ref();
        let polls = in_flight
            .into_iter()
            .map(|item| poll_until_settled(client, item, policy, cancel, observer));

        match self.options.ordering {
            ResultOrdering::Input => try_join_all(polls).await,
            ResultOrdering::Completion => {
                polls
                    .collect::<FuturesUnordered<_>>()
                    .try_collect::<Vec<_>>()
                    .await
            }
        }
    }
}
