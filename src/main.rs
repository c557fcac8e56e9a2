//! LA traffic advisor: one-shot entrypoint.
//! Runs the pipeline once, prints the report and writes it under the reports dir.
//!
//! See `config/traffic.toml` for the origin, destinations and provider settings.

use anyhow::Result;
use la_traffic_advisor::{telemetry, AppConfig, Pipeline};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    let config = AppConfig::load_default()?;
    let pipeline = Pipeline::from_config(config)?;

    let today = chrono::Local::now().date_naive();
    let (report, path) = pipeline.run_and_persist(today).await?;

    println!("========== DAILY REPORT ==========");
    println!("{}", report.text);
    println!("\nReport written to {}", path.display());
    Ok(())
}
