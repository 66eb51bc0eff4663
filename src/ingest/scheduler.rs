use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::cycle::{run_once, CycleError};
use super::store::FeedStore;

/// Runs the ingestion cycle on a fixed period until cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheduler {
    period: Duration,
}

impl Scheduler {
    /// `period` must be non-zero; [`parse_interval`](super::parse_interval)
    /// never yields zero.
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    /// Loop until `cancel` fires, running one cycle per tick.
    ///
    /// The first cycle runs one full period after the call. Cycles run
    /// sequentially on this task, so a slow cycle delays the next tick
    /// rather than overlapping it; missed ticks fire back to back afterwards.
    /// Cycle errors are logged and never end the loop.
    ///
    /// Returns the number of cycles started.
    pub async fn run<S>(&self, store: &S, client: &reqwest::Client, cancel: &CancellationToken) -> u64
    where
        S: FeedStore + ?Sized,
    {
        tracing::info!(period = ?self.period, "Feed collector started");

        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

        let mut cycles: u64 = 0;
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            cycles += 1;
            match run_once(store, client, cancel).await {
                Ok(report) => {
                    tracing::info!(
                        feed_id = %report.feed_id,
                        feed = %report.feed_name,
                        items = report.items,
                        created = report.created,
                        failed = report.failed_inserts,
                        unparsed_dates = report.unparsed_dates,
                        "Collected feed"
                    );
                }
                Err(CycleError::NoFeeds) => {
                    tracing::info!("No feeds to collect");
                }
                Err(e @ CycleError::MarkFetched { .. }) => {
                    tracing::error!(error = %e, "Ingestion cycle failed");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Ingestion cycle failed");
                }
            }
        }

        tracing::info!(cycles = cycles, "Feed collector stopped");
        cycles
    }
}
