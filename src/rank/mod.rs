// src/rank/mod.rs
//! Destination ranking: score, congestion thresholds, top-k selection.

pub mod scoring;
pub mod select;

use serde::{Deserialize, Serialize};

use crate::route::RouteRecord;

pub use scoring::score;
pub use select::select_top_k;

/// Ratio below which a route is rendered as "Nice!".
pub const NICE_BELOW: f64 = 1.2;
/// Ratio at/above which a route counts as congested: excluded from the
/// preferred candidate pool and rendered as "Oh noooo".
pub const CONGESTED_AT: f64 = 1.5;

fn default_nice_below() -> f64 {
    NICE_BELOW
}
fn default_congested_at() -> f64 {
    CONGESTED_AT
}

/// Congestion thresholds shared by the selector and the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default = "default_nice_below")]
    pub nice_below: f64,
    #[serde(default = "default_congested_at")]
    pub congested_at: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            nice_below: NICE_BELOW,
            congested_at: CONGESTED_AT,
        }
    }
}

impl Thresholds {
    /// Replace non-positive/non-finite values with defaults and keep
    /// `nice_below <= congested_at`.
    pub fn sanitized(mut self) -> Self {
        if !self.nice_below.is_finite() || self.nice_below <= 0.0 {
            self.nice_below = NICE_BELOW;
        }
        if !self.congested_at.is_finite() || self.congested_at <= 0.0 {
            self.congested_at = CONGESTED_AT;
        }
        if self.nice_below > self.congested_at {
            std::mem::swap(&mut self.nice_below, &mut self.congested_at);
        }
        self
    }

    pub fn is_congested(&self, ratio: f64) -> bool {
        ratio >= self.congested_at
    }

    pub fn status(&self, ratio: f64) -> CongestionStatus {
        if ratio < self.nice_below {
            CongestionStatus::Nice
        } else if ratio < self.congested_at {
            CongestionStatus::Yikes
        } else {
            CongestionStatus::OhNo
        }
    }
}

/// Qualitative bucket for a congestion ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CongestionStatus {
    Nice,
    Yikes,
    OhNo,
}

impl CongestionStatus {
    pub fn label(self) -> &'static str {
        match self {
            CongestionStatus::Nice => "Nice!",
            CongestionStatus::Yikes => "Yikes",
            CongestionStatus::OhNo => "Oh noooo",
        }
    }
}

/// Rank label for the top of the ranking; anything past second place has none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankLabel {
    Best,
    SecondBest,
}

impl RankLabel {
    /// Label for a 0-based position in the ranking.
    pub fn for_index(idx: usize) -> Option<Self> {
        match idx {
            0 => Some(RankLabel::Best),
            1 => Some(RankLabel::SecondBest),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RankLabel::Best => "best",
            RankLabel::SecondBest => "second_best",
        }
    }

    /// Leading tag on the rendered summary line.
    pub fn tag(self) -> &'static str {
        match self {
            RankLabel::Best => "[Top choice] ",
            RankLabel::SecondBest => "[Second choice] ",
        }
    }
}

/// A selected record with its place in this run's ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub record: RouteRecord,
    pub label: Option<RankLabel>,
    /// 1-based rank.
    pub rank: usize,
    /// Index of the record in the slice handed to the selector. Follows
    /// destination-list order, but destinations whose fetch failed are not
    /// counted.
    pub position: usize,
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_buckets_follow_thresholds() {
        let t = Thresholds::default();
        assert_eq!(t.status(1.0), CongestionStatus::Nice);
        assert_eq!(t.status(1.19), CongestionStatus::Nice);
        assert_eq!(t.status(1.2), CongestionStatus::Yikes);
        assert_eq!(t.status(1.49), CongestionStatus::Yikes);
        assert_eq!(t.status(1.5), CongestionStatus::OhNo);
        assert_eq!(t.status(3.0).label(), "Oh noooo");
    }

    #[test]
    fn sanitize_restores_defaults_and_order() {
        let t = Thresholds {
            nice_below: -1.0,
            congested_at: f64::NAN,
        }
        .sanitized();
        assert_eq!(t, Thresholds::default());

        let swapped = Thresholds {
            nice_below: 2.0,
            congested_at: 1.3,
        }
        .sanitized();
        assert_eq!(swapped.nice_below, 1.3);
        assert_eq!(swapped.congested_at, 2.0);
    }

    #[test]
    fn labels_only_for_first_two() {
        assert_eq!(RankLabel::for_index(0), Some(RankLabel::Best));
        assert_eq!(RankLabel::for_index(1), Some(RankLabel::SecondBest));
        assert_eq!(RankLabel::for_index(2), None);
        assert_eq!(RankLabel::SecondBest.as_str(), "second_best");
    }
}
