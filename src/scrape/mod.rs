//! Feed ingestion: selection, per-feed pipeline and the recurring scheduler.
//!
//! - [`selector`] - picks and claims the stalest feed
//! - [`pipeline`] - fetches one feed and inserts its items as posts, deduplicated by URL
//! - [`scheduler`] - drives one cycle per interval until told to stop
//!
//! ```ignore
//! let interval: FetchInterval = "1m".parse()?;
//! let (tx, rx) = tokio::sync::watch::channel(false);
//! let mut scheduler = Scheduler::new(db, fetcher, interval);
//! let summary = scheduler.run_forever(rx).await;
//! ```

mod pipeline;
mod scheduler;
mod selector;

pub use pipeline::{ingest, IngestReport, IngestStatus};
pub use scheduler::{run_once, Scheduler, SchedulerState, SchedulerSummary};
pub use selector::next_due;
