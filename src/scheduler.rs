// src/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::pipeline::Pipeline;

pub const DAILY: Duration = Duration::from_secs(24 * 3600);

/// Run the pipeline now and then every `period`. Failures are logged, never fatal.
pub fn spawn_daily_flow(pipeline: Arc<Pipeline>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let today = chrono::Local::now().date_naive();
            match pipeline.run_and_persist(today).await {
                Ok((_, path)) => {
                    tracing::info!(
                        target: "scheduler",
                        %today,
                        path = %path.display(),
                        "daily flow tick"
                    );
                }
                Err(e) => {
                    tracing::warn!(target: "scheduler", error = ?e, %today, "daily flow failed");
                }
            }
        }
    })
}
