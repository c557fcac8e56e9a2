// src/route/error.rs
use std::time::Duration;

/// Routing fetch failed for one destination. Local to that destination: the
/// pipeline drops it from the candidate set and keeps going.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("routing request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("routing provider returned HTTP {0}")]
    Status(u16),
    #[error("routing payload could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("no route found")]
    NoRoute,
    #[error("malformed route summary: {0}")]
    MalformedSummary(&'static str),
    #[error("routing request timed out after {0:?}")]
    Timeout(Duration),
    #[error("routing API key is not configured")]
    MissingCredential,
}
