// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod advisory;
pub mod config;
pub mod pipeline;
pub mod rank;
pub mod report;
pub mod route;
pub mod scheduler;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::advisory::{Advisory, EnrichedEntry, Enricher, TextGenerator};
pub use crate::config::AppConfig;
pub use crate::pipeline::Pipeline;
pub use crate::rank::{score, select_top_k, RankLabel, RankedEntry, Thresholds};
pub use crate::report::{render, Report};
pub use crate::route::{Coordinate, Place, ProviderError, RouteFetcher, RouteRecord};
