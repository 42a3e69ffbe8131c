use tokio::sync::watch;

use super::{AppState, CommandError, Output};
use crate::feed::FeedFetcher;
use crate::scheduler::{parse_interval, Aggregator};

/// Collect feeds every `time_between_reqs` until Ctrl-C.
///
/// A malformed or non-positive interval fails before anything runs.
pub async fn agg(state: &AppState, time_between_reqs: &str) -> Result<Output, CommandError> {
    let interval = parse_interval(time_between_reqs)?;
    let aggregator = Aggregator::new(state.db.clone(), FeedFetcher::new()?, interval);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let signal = tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            // Dropping the sender would stop the loop, so hold on to it
            tracing::warn!(error = %e, "Couldn't listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
        tracing::info!("Ctrl-C received, stopping after the current cycle");
        let _ = shutdown_tx.send(true);
    });

    aggregator.run(shutdown_rx).await;
    signal.abort();
    Ok(Vec::new())
}
