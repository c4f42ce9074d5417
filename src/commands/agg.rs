use std::future::Future;
use std::io::Write;
use tokio::sync::{mpsc, watch};

use super::{CommandError, State};
use crate::config::FetchInterval;
use crate::feed::FeedFetcher;
use crate::scrape::Scheduler;

/// Run the scheduler until Ctrl-C, or for `ticks` ticks when given.
pub(super) async fn agg<W: Write>(
    state: &State,
    interval: &str,
    ticks: Option<u64>,
    out: &mut W,
) -> Result<(), CommandError> {
    let interval: FetchInterval = interval.parse()?;
    let fetcher = FeedFetcher::new(&state.config.user_agent, state.config.fetch_timeout())?;

    writeln!(out, "Collecting feeds every {}", interval)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let ctrl_c = tokio::spawn(forward_interrupt(tokio::signal::ctrl_c(), shutdown_tx));

    let (report_tx, mut report_rx) = mpsc::channel(16);
    let mut scheduler = Scheduler::new(state.db.clone(), fetcher, interval).with_reports(report_tx);
    if let Some(ticks) = ticks {
        scheduler = scheduler.with_max_ticks(ticks);
    }

    // The scheduler (and its report sender) is dropped when the run ends,
    // which closes the report channel
    let run = async move {
        let mut scheduler = scheduler;
        scheduler.run_forever(shutdown_rx).await
    };
    let print = async {
        while let Some(report) = report_rx.recv().await {
            writeln!(out, "* {}", report)?;
        }
        Ok::<_, std::io::Error>(())
    };

    let (summary, printed) = tokio::join!(run, print);
    ctrl_c.abort();
    printed?;

    writeln!(
        out,
        "Stopped feed collection after {} ticks: {} ingested, {} idle, {} failed",
        summary.ticks, summary.ingested, summary.idle, summary.failed
    )?;
    Ok(())
}

/// Turn `signal` into a stop request on `shutdown_tx`.
///
/// If the signal cannot be installed the sender is held forever: the
/// scheduler treats a dropped sender as a stop request.
async fn forward_interrupt<F>(signal: F, shutdown_tx: watch::Sender<bool>)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            tracing::info!("Interrupt received, stopping after the current cycle");
            let _ = shutdown_tx.send(true);
        }
        Err(e) => {
            tracing::warn!(error = %e, "Cannot listen for Ctrl-C, running until the tick limit");
            std::future::pending::<()>().await;
            drop(shutdown_tx);
        }
    }
}
