use std::future::Future;

use rand::Rng;
use tokio::time::{sleep, timeout, Duration};
use tokio_util::sync::CancellationToken;

use crate::asset::{AssetClient, AssetPhase, AssetStatus};
use crate::config::PollSection;

use super::error::{ImportError, ImportResult};
use super::models::{InFlightItem, SettledItem};
use super::observer::{ImportEvent, ImportObserver};

/// Jittered wait between status queries plus an optional per-item deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    min_interval: Duration,
    max_interval: Duration,
    deadline: Option<Duration>,
}

impl PollPolicy {
    pub fn new(min_interval: Duration, max_interval: Duration) -> Self {
        let max_interval = if max_interval <= min_interval {
            min_interval + Duration::from_millis(1)
        } else {
            max_interval
        };
        Self {
            min_interval,
            max_interval,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Uniform draw from `[min_interval, max_interval)`.
    pub fn next_delay(&self) -> Duration {
        rand::thread_rng().gen_range(self.min_interval..self.max_interval)
    }

    /// Time left before `item` runs past the deadline, `None` when unbounded.
    fn remaining(&self, item: &InFlightItem) -> ImportResult<Option<Duration>> {
        let Some(deadline) = self.deadline else {
            return Ok(None);
        };
        let elapsed = item.started_at.elapsed();
        if elapsed >= deadline {
            return Err(ImportError::PollDeadline {
                asset_id: item.handle.id.clone(),
                elapsed,
            });
        }
        Ok(Some(deadline - elapsed))
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy::from(&PollSection::default())
    }
}

impl From<&PollSection> for PollPolicy {
    fn from(config: &PollSection) -> Self {
        PollPolicy::new(
            Duration::from_millis(config.min_interval_ms),
            Duration::from_millis(config.max_interval_ms),
        )
        .with_deadline(config.item_deadline_seconds.map(Duration::from_secs))
    }
}

/// Where an item stands after its latest status query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Pending,
    Ready(AssetStatus),
    Failed(AssetStatus),
}

impl PollState {
    pub fn from_status(status: AssetStatus) -> Self {
        match status.phase {
            Some(AssetPhase::Ready) => PollState::Ready(status),
            Some(AssetPhase::Failed) => PollState::Failed(status),
            _ => PollState::Pending,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollState::Pending)
    }

    pub fn into_terminal(self) -> Option<AssetStatus> {
        match self {
            PollState::Ready(status) | PollState::Failed(status) => Some(status),
            PollState::Pending => None,
        }
    }
}

/// Queries the asset until it is `ready` or `failed`.
///
/// Without a deadline this never gives up on an asset that stays in a
/// non-terminal phase; cancellation is the only way out in that case.
pub async fn poll_until_settled<C>(
    client: &C,
    item: InFlightItem,
    policy: &PollPolicy,
    cancel: &CancellationToken,
    observer: &dyn ImportObserver,
) -> ImportResult<SettledItem>
where
    C: AssetClient + ?Sized,
{
    let asset_id = item.handle.id.clone();
    let mut attempts = 0usize;

    loop {
        let delay = match policy.remaining(&item)? {
            Some(left) => policy.next_delay().min(left),
            None => policy.next_delay(),
        };
        tokio::select! {
            _ = cancel.cancelled() => return Err(ImportError::Cancelled),
            _ = sleep(delay) => {}
        }

        let limit = policy.remaining(&item)?;
        let queried = tokio::select! {
            _ = cancel.cancelled() => return Err(ImportError::Cancelled),
            queried = within(limit, client.get_asset(&asset_id)) => queried,
        };
        let Some(result) = queried else {
            return Err(ImportError::PollDeadline {
                asset_id,
                elapsed: item.started_at.elapsed(),
            });
        };
        let status = result.map_err(|source| ImportError::Status {
            asset_id: asset_id.clone(),
            source,
        })?;
        attempts += 1;
        observer.on_event(&ImportEvent::StatusPolled {
            asset_id: asset_id.clone(),
            attempt: attempts,
            phase: status.phase.clone(),
        });

        let Some(status) = PollState::from_status(status).into_terminal() else {
            continue;
        };
        let elapsed = item.started_at.elapsed();
        observer.on_event(&ImportEvent::ItemSettled {
            asset_id: status.id.clone(),
            phase: status.phase.clone().unwrap_or(AssetPhase::Failed),
            error_message: status.non_empty_error().map(str::to_string),
            seconds: elapsed.as_secs_f64(),
        });
        return Ok(SettledItem {
            index: item.index,
            status,
            source: item.source,
            elapsed,
            attempts,
        });
    }
}

/// Runs `future` to completion, or gives up with `None` once `limit` passes.
async fn within<F: Future>(limit: Option<Duration>, future: F) -> Option<F::Output> {
    match limit {
        Some(limit) => timeout(limit, future).await.ok(),
        None => Some(future.await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_stays_inside_the_window() {
        let policy = PollPolicy::default();
        for _ in 0..500 {
            let delay = policy.next_delay();
            assert!(delay >= Duration::from_millis(200));
            assert!(delay < Duration::from_millis(500));
        }
    }

    #[test]
    fn degenerate_window_is_widened() {
        let policy = PollPolicy::new(Duration::from_millis(50), Duration::from_millis(50));
        let delay = policy.next_delay();
        assert!(delay >= Duration::from_millis(50));
        assert!(delay < Duration::from_millis(51));
    }

    #[test]
    fn sub_millisecond_window_is_honoured() {
        let policy = PollPolicy::new(Duration::from_micros(300), Duration::from_micros(800));
        for _ in 0..200 {
            let delay = policy.next_delay();
            assert!(delay >= Duration::from_micros(300));
            assert!(delay < Duration::from_micros(800));
        }
    }

    #[test]
    fn only_ready_and_failed_are_terminal() {
        assert_eq!(
            PollState::from_status(AssetStatus::new("x", AssetPhase::Processing)),
            PollState::Pending
        );
        assert_eq!(
            PollState::from_status(AssetStatus {
                id: "x".into(),
                phase: None,
                error_message: None,
            }),
            PollState::Pending
        );
        assert!(PollState::from_status(AssetStatus::new("x", AssetPhase::Ready)).is_terminal());
        assert!(PollState::from_status(AssetStatus::new("x", AssetPhase::Failed)).is_terminal());
        assert!(!PollState::from_status(AssetStatus::new("x", AssetPhase::from("queued"))).is_terminal());
    }

    #[test]
    fn policy_from_config_carries_deadline() {
        let section = PollSection {
            min_interval_ms: 10,
            max_interval_ms: 20,
            item_deadline_seconds: Some(90),
        };
        let policy = PollPolicy::from(&section);
        assert_eq!(policy.deadline(), Some(Duration::from_secs(90)));
    }
}
