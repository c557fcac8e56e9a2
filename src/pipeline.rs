// src/pipeline.rs
//! The advisory pipeline: fetch -> select -> enrich -> render.
//!
//! Each stage is callable on its own; `run` chains them. Orchestration (one-shot
//! CLI, daily scheduler) lives outside and only calls `run`/`run_and_persist`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use tracing::{info, warn};

use crate::advisory::providers::build_generator;
use crate::advisory::{DynTextGenerator, EnrichedEntry, Enricher, TextGenerator};
use crate::config::AppConfig;
use crate::rank::{select_top_k, RankedEntry};
use crate::report::{write_report, Report, ReportLayout};
use crate::route::tomtom::TomTomFetcher;
use crate::route::{build_route_record, RouteFetcher, RouteRecord};

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("route_fetch_total", "Routing fetches attempted.");
        describe_counter!(
            "route_fetch_errors_total",
            "Routing fetches that failed (transport, status, payload, timeout)."
        );
        describe_histogram!("route_fetch_ms", "Routing fetch latency in milliseconds.");
        describe_counter!("advisory_calls_total", "Advisory generations attempted.");
        describe_counter!(
            "advisory_unavailable_total",
            "Entries rendered with the unavailable sentinel."
        );
        describe_counter!("pipeline_runs_total", "Completed pipeline runs.");
        describe_gauge!("pipeline_last_run_ts", "Unix ts when the pipeline last ran.");
    });
}

pub struct Pipeline {
    config: AppConfig,
    fetcher: Arc<dyn RouteFetcher>,
    enricher: Enricher,
    layout: ReportLayout,
}

impl Pipeline {
    pub fn new(
        config: AppConfig,
        fetcher: Arc<dyn RouteFetcher>,
        generator: DynTextGenerator,
    ) -> Self {
        let enricher = Enricher::new(
            generator,
            config.prompt_template(),
            config.advisory.timeout(),
        );
        let layout = ReportLayout::new(config.report.title(), config.thresholds);
        Self {
            config,
            fetcher,
            enricher,
            layout,
        }
    }

    /// Production wiring: TomTom routing + configured advisory generator.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let fetcher = TomTomFetcher::new(config.routing.api_key.clone(), config.routing.timeout())?
            .with_base_url(config.routing.base_url());
        let generator = build_generator(&config.advisory)?;
        info!(
            target: "pipeline",
            routing = fetcher.name(),
            advisory = generator.provider_name(),
            "pipeline wired"
        );
        Ok(Self::new(config, Arc::new(fetcher), generator))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Fetch every destination concurrently. Failed destinations are logged and
    /// dropped; the rest come back in destination-list order.
    pub async fn fetch_records(&self) -> Vec<RouteRecord> {
        let origin = &self.config.origin;
        let timeout = self.config.routing.timeout();

        let handles: Vec<_> = self
            .config
            .destinations
            .iter()
            .map(|dest| {
                let fetcher = Arc::clone(&self.fetcher);
                let origin = origin.clone();
                let dest = dest.clone();
                tokio::spawn(async move {
                    build_route_record(fetcher.as_ref(), &origin, &dest, timeout).await
                })
            })
            .collect();

        let mut records = Vec::with_capacity(handles.len());
        for (dest, handle) in self.config.destinations.iter().zip(handles) {
            match handle.await {
                Ok(Ok(record)) => records.push(record),
                Ok(Err(e)) => {
                    warn!(target: "pipeline", error = %e, dest = %dest.name, "destination dropped");
                    counter!("route_fetch_errors_total").increment(1);
                }
                Err(e) => {
                    warn!(target: "pipeline", error = ?e, dest = %dest.name, "fetch task failed");
                    counter!("route_fetch_errors_total").increment(1);
                }
            }
        }
        records
    }

    pub fn select(&self, records: &[RouteRecord]) -> Vec<RankedEntry> {
        select_top_k(records, self.config.top_k, &self.config.thresholds)
    }

    pub async fn enrich(&self, ranked: Vec<RankedEntry>) -> Vec<EnrichedEntry> {
        self.enricher.enrich(ranked).await
    }

    pub fn render(&self, entries: &[EnrichedEntry], date: NaiveDate) -> Report {
        self.layout.build(entries, date)
    }

    /// Full run for `date`. Always yields a report, even with no route data.
    pub async fn run(&self, date: NaiveDate) -> Report {
        ensure_metrics_described();

        let records = self.fetch_records().await;
        let ranked = self.select(&records);
        info!(
            target: "pipeline",
            fetched = records.len(),
            destinations = self.config.destinations.len(),
            selected = ranked.len(),
            "destinations ranked"
        );

        let enriched = self.enrich(ranked).await;
        let report = self.render(&enriched, date);

        counter!("pipeline_runs_total").increment(1);
        gauge!("pipeline_last_run_ts").set(chrono::Utc::now().timestamp() as f64);
        report
    }

    /// Run and write the report to the configured reports dir.
    pub async fn run_and_persist(&self, date: NaiveDate) -> Result<(Report, PathBuf)> {
        let report = self.run(date).await;
        let path = write_report(&self.config.report.dir, &report)?;
        info!(target: "pipeline", path = %path.display(), "report written");
        Ok((report, path))
    }
}
