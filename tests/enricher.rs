// tests/enricher.rs
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use la_traffic_advisor::advisory::{PromptTemplate, ADVISORY_UNAVAILABLE};
use la_traffic_advisor::{
    render, select_top_k, Advisory, Coordinate, Enricher, Place, RouteRecord, TextGenerator,
    Thresholds,
};

/// Answers per destination name found in the prompt; "slow" sleeps past the timeout.
struct ScriptedGenerator;

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Option<String> {
        if prompt.contains("to B:") {
            // the best entry's call fails
            return None;
        }
        if prompt.contains("to Slow:") {
            tokio::time::sleep(Duration::from_secs(5)).await;
            return Some("too late".into());
        }
        if prompt.contains("to Blank:") {
            return Some("   \n".into());
        }
        Some("Recommend: roads are clear, go now.".into())
    }
    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

fn rec(name: &str, travel: f64, free_flow: f64) -> RouteRecord {
    let o = Place::new("Westwood (UCLA)", Coordinate::new(34.04, -118.26));
    let d = Place::new(name, Coordinate::new(34.07, -118.35));
    RouteRecord::from_minutes(&o, &d, travel, free_flow)
}

fn enricher(timeout: Duration) -> Enricher {
    Enricher::new(Arc::new(ScriptedGenerator), PromptTemplate::default(), timeout)
}

#[tokio::test]
async fn failed_best_call_does_not_affect_second_best() {
    let ranked = select_top_k(
        &[rec("A", 20.0, 18.0), rec("B", 15.0, 14.5)],
        2,
        &Thresholds::default(),
    );
    let enriched = enricher(Duration::from_secs(2)).enrich(ranked).await;

    assert_eq!(enriched[0].entry.record.dest_name, "B");
    assert_eq!(enriched[0].advisory, Advisory::Unavailable);
    assert_eq!(enriched[1].entry.record.dest_name, "A");
    assert_eq!(
        enriched[1].advisory,
        Advisory::Text("Recommend: roads are clear, go now.".into())
    );

    let date = NaiveDate::from_ymd_opt(2025, 11, 2).unwrap();
    let text = render(&enriched, date);
    assert!(text.contains(ADVISORY_UNAVAILABLE));
    assert!(text.contains("Recommend: roads are clear, go now."));
    assert!(text.contains("[Top choice] From Westwood (UCLA) to B:"));
    assert!(text.contains("[Second choice] From Westwood (UCLA) to A:"));
    assert_eq!(text.matches("(Nice!)").count(), 2);
}

#[tokio::test]
async fn timeout_and_blank_output_fall_back_to_sentinel() {
    let ranked = select_top_k(
        &[rec("Slow", 10.0, 10.0), rec("Blank", 11.0, 11.0), rec("C", 12.0, 12.0)],
        3,
        &Thresholds::default(),
    );
    let enriched = enricher(Duration::from_millis(100)).enrich(ranked).await;

    let names: Vec<_> = enriched
        .iter()
        .map(|e| e.entry.record.dest_name.as_str())
        .collect();
    assert_eq!(names, vec!["Slow", "Blank", "C"], "rank order preserved");
    assert_eq!(enriched[0].advisory, Advisory::Unavailable);
    assert_eq!(enriched[1].advisory, Advisory::Unavailable);
    assert!(enriched[2].advisory.is_available());
}

#[tokio::test]
async fn empty_ranking_enriches_to_nothing() {
    let out = enricher(Duration::from_secs(1)).enrich(Vec::new()).await;
    assert!(out.is_empty());
}
