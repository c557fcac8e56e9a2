//! Advisory enrichment: text-generation seam, prompt, and the enricher that
//! attaches one recommendation to every ranked entry.
//! A failed or empty generation never fails the run; the entry gets the
//! unavailable sentinel instead.

pub mod prompt;
pub mod providers;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use once_cell::sync::OnceCell;
use regex::Regex;
use tracing::{debug, warn};

use crate::rank::RankedEntry;

pub use prompt::PromptTemplate;

/// Rendered in place of the advisory text when generation failed.
pub const ADVISORY_UNAVAILABLE: &str = "<advisory unavailable: the travel advisor is offline>";

/// Text-generation capability. `None` means "no usable text".
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Option<String>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

/// Convenient alias used by callers.
pub type DynTextGenerator = Arc<dyn TextGenerator>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advisory {
    Text(String),
    Unavailable,
}

impl Advisory {
    /// Clean generated text; empty results count as unavailable.
    pub fn from_generated(raw: Option<String>) -> Self {
        match raw.map(|s| clean_advisory(&s)) {
            Some(text) if !text.is_empty() => Advisory::Text(text),
            _ => Advisory::Unavailable,
        }
    }

    pub fn as_text(&self) -> &str {
        match self {
            Advisory::Text(t) => t,
            Advisory::Unavailable => ADVISORY_UNAVAILABLE,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Advisory::Text(_))
    }
}

/// A ranked entry with its advisory attached.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedEntry {
    pub entry: RankedEntry,
    pub advisory: Advisory,
}

/// Normalize model output: unify line endings, strip trailing spaces per line,
/// collapse runs of blank lines, trim.
pub fn clean_advisory(s: &str) -> String {
    static RE_TRAILING_WS: OnceCell<Regex> = OnceCell::new();
    static RE_BLANK_RUNS: OnceCell<Regex> = OnceCell::new();
    let re_trailing = RE_TRAILING_WS.get_or_init(|| Regex::new(r"(?m)[ \t]+$").unwrap());
    let re_blank = RE_BLANK_RUNS.get_or_init(|| Regex::new(r"\n{3,}").unwrap());

    let unified = s.replace("\r\n", "\n").replace('\r', "\n");
    let out = re_trailing.replace_all(&unified, "");
    let out = re_blank.replace_all(&out, "\n\n");
    out.trim().to_string()
}

pub struct Enricher {
    generator: DynTextGenerator,
    prompt: PromptTemplate,
    timeout: Duration,
}

impl Enricher {
    pub fn new(generator: DynTextGenerator, prompt: PromptTemplate, timeout: Duration) -> Self {
        Self {
            generator,
            prompt,
            timeout,
        }
    }

    /// One generation per entry, issued concurrently; output stays in rank order.
    pub async fn enrich(&self, entries: Vec<RankedEntry>) -> Vec<EnrichedEntry> {
        let handles: Vec<_> = entries
            .iter()
            .map(|entry| {
                let generator = Arc::clone(&self.generator);
                let prompt = self.prompt.render(&entry.record);
                let timeout = self.timeout;
                let dest = entry.record.dest_name.clone();
                tokio::spawn(async move {
                    request_advisory(generator, prompt, timeout, dest).await
                })
            })
            .collect();

        let mut out = Vec::with_capacity(entries.len());
        for (entry, handle) in entries.into_iter().zip(handles) {
            let advisory = match handle.await {
                Ok(a) => a,
                Err(e) => {
                    warn!(target: "advisory", error = ?e, "advisory task failed");
                    Advisory::Unavailable
                }
            };
            if !advisory.is_available() {
                counter!("advisory_unavailable_total").increment(1);
            }
            out.push(EnrichedEntry { entry, advisory });
        }
        out
    }
}

async fn request_advisory(
    generator: DynTextGenerator,
    prompt: String,
    timeout: Duration,
    dest: String,
) -> Advisory {
    counter!("advisory_calls_total").increment(1);
    match tokio::time::timeout(timeout, generator.generate(&prompt)).await {
        Ok(raw) => {
            let advisory = Advisory::from_generated(raw);
            debug!(
                target: "advisory",
                provider = generator.provider_name(),
                %dest,
                available = advisory.is_available(),
                "advisory generated"
            );
            advisory
        }
        Err(_) => {
            warn!(
                target: "advisory",
                provider = generator.provider_name(),
                %dest,
                ?timeout,
                "advisory generation timed out"
            );
            Advisory::Unavailable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_collapses_blank_runs_and_trims() {
        let raw = "  Recommend!  \r\n\r\n\r\n\r\nTraffic is light.\t\n";
        assert_eq!(clean_advisory(raw), "Recommend!\n\nTraffic is light.");
    }

    #[test]
    fn empty_generation_is_unavailable() {
        assert_eq!(Advisory::from_generated(None), Advisory::Unavailable);
        assert_eq!(
            Advisory::from_generated(Some(" \n \n".into())),
            Advisory::Unavailable
        );
        assert_eq!(Advisory::Unavailable.as_text(), ADVISORY_UNAVAILABLE);
        assert_eq!(
            Advisory::from_generated(Some("Go now.".into())).as_text(),
            "Go now."
        );
    }
}
