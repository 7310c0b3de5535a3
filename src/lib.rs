pub mod batch;
pub mod config;
pub mod images;
pub mod workflow;

use batch::{run_batch, BatchSummary};
use config::AppConfig;

pub async fn run(config: AppConfig) -> anyhow::Result<BatchSummary> {
    let summary = run_batch(&config).await?;

    tracing::info!(
        "batch finished: {} attempted, {} queued, {} rejected, {} failed",
        summary.attempted,
        summary.queued,
        summary.rejected,
        summary.failed
    );

    Ok(summary)
}
