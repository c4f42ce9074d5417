use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

use super::pipeline::{ingest, IngestReport};
use super::selector::next_due;
use crate::config::FetchInterval;
use crate::feed::FeedFetcher;
use crate::storage::{PostStore, StoreError};

/// Run one ingestion cycle: claim the stalest feed and ingest it.
///
/// Returns `Ok(None)` when no feed is available. Only a failure to list or
/// claim feeds is an `Err`; fetch and insert failures are reported inside the
/// [`IngestReport`].
pub async fn run_once<S: PostStore + ?Sized>(
    store: &S,
    fetcher: &FeedFetcher,
) -> Result<Option<IngestReport>, StoreError> {
    let Some(feed) = next_due(store, Utc::now()).await? else {
        return Ok(None);
    };

    Ok(Some(ingest(&feed, fetcher, store).await))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Running,
    Stopped,
}

/// Tick counters returned when the scheduler stops.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSummary {
    pub ticks: u64,
    /// Cycles that ended in `IngestStatus::Success`
    pub ingested: u64,
    /// Ticks with no feed to claim
    pub idle: u64,
    /// Cycles with a fetch/store failure, or a failed selection
    pub failed: u64,
}

/// Recurring driver that ingests one feed per tick.
///
/// Ticks never overlap: each cycle runs to completion inside the loop, and
/// ticks missed while a slow fetch was in flight are skipped rather than
/// bunched up. The stop signal is only observed between cycles.
pub struct Scheduler<S> {
    store: S,
    fetcher: FeedFetcher,
    interval: FetchInterval,
    reports: Option<mpsc::Sender<IngestReport>>,
    max_ticks: Option<u64>,
    state: SchedulerState,
}

impl<S: PostStore> Scheduler<S> {
    pub fn new(store: S, fetcher: FeedFetcher, interval: FetchInterval) -> Self {
        Self {
            store,
            fetcher,
            interval,
            reports: None,
            max_ticks: None,
            state: SchedulerState::Stopped,
        }
    }

    /// Forward every [`IngestReport`] to `tx` in addition to logging it.
    pub fn with_reports(mut self, tx: mpsc::Sender<IngestReport>) -> Self {
        self.reports = Some(tx);
        self
    }

    /// Stop on its own after `ticks` ticks.
    pub fn with_max_ticks(mut self, ticks: u64) -> Self {
        self.max_ticks = Some(ticks);
        self
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Tick every interval (the first tick fires immediately) until `shutdown`
    /// turns `true`, its sender is dropped, or the tick limit is reached.
    ///
    /// An in-flight cycle always completes before the scheduler stops, so a
    /// claimed feed always gets its fetch attempt.
    pub async fn run_forever(&mut self, mut shutdown: watch::Receiver<bool>) -> SchedulerSummary {
        let mut summary = SchedulerSummary::default();
        let mut ticker = tokio::time::interval(self.interval.as_duration());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        self.state = SchedulerState::Running;
        tracing::info!(interval = %self.interval, "Scheduler started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                _ = ticker.tick() => {}
            }

            self.tick(&mut summary).await;

            if self.max_ticks.is_some_and(|max| summary.ticks >= max) {
                tracing::debug!(ticks = summary.ticks, "Tick limit reached");
                break;
            }
        }

        self.state = SchedulerState::Stopped;
        tracing::info!(
            ticks = summary.ticks,
            ingested = summary.ingested,
            idle = summary.idle,
            failed = summary.failed,
            "Scheduler stopped"
        );
        summary
    }

    async fn tick(&self, summary: &mut SchedulerSummary) {
        summary.ticks += 1;

        match run_once(&self.store, &self.fetcher).await {
            Ok(Some(report)) => {
                if report.status.is_success() {
                    summary.ingested += 1;
                    tracing::info!(
                        feed_id = report.feed_id,
                        feed = %report.feed_name,
                        items = report.items_seen,
                        created = report.created,
                        duplicates = report.duplicates,
                        "Feed ingested"
                    );
                } else {
                    summary.failed += 1;
                    tracing::warn!(feed_id = report.feed_id, report = %report, "Feed ingestion failed");
                }

                if let Some(tx) = &self.reports {
                    if tx.send(report).await.is_err() {
                        tracing::debug!("Report receiver dropped");
                    }
                }
            }
            Ok(None) => {
                summary.idle += 1;
                tracing::debug!("No feeds to fetch");
            }
            Err(e) => {
                summary.failed += 1;
                tracing::warn!(error = %e, "Feed selection failed");
            }
        }
    }
}
