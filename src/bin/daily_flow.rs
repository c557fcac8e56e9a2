//! Scheduled variant: runs the pipeline now and then once a day until killed.

use std::sync::Arc;

use la_traffic_advisor::scheduler::{spawn_daily_flow, DAILY};
use la_traffic_advisor::{telemetry, AppConfig, Pipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    let pipeline = Arc::new(Pipeline::from_config(AppConfig::load_default()?)?);
    let flow = spawn_daily_flow(pipeline, DAILY);

    tokio::select! {
        res = flow => {
            if let Err(e) = res {
                tracing::warn!(error = ?e, "daily flow task ended");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown requested");
        }
    }
    Ok(())
}
