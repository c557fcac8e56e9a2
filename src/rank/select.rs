// src/rank/select.rs
//! Top-k selection with a congestion filter.
//!
//! Policy:
//! 1) keep routes with `congestion_ratio < congested_at`
//! 2) if fewer than `k` survive, fall back to the full list
//! 3) stable sort by score ascending (ties keep input order)
//! 4) take `k`, label them best / second_best / none

use super::{score, RankLabel, RankedEntry, Thresholds};
use crate::route::RouteRecord;

pub fn select_top_k(
    records: &[RouteRecord],
    k: usize,
    thresholds: &Thresholds,
) -> Vec<RankedEntry> {
    let uncongested: Vec<(usize, &RouteRecord)> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| !thresholds.is_congested(r.congestion_ratio))
        .collect();

    let mut pool = if uncongested.len() >= k {
        uncongested
    } else {
        tracing::debug!(
            target: "rank",
            uncongested = uncongested.len(),
            k,
            "too few uncongested routes, ranking all"
        );
        records.iter().enumerate().collect()
    };

    // sort_by is stable; total_cmp keeps NaN from scrambling the order.
    pool.sort_by(|(_, a), (_, b)| score(a).total_cmp(&score(b)));

    pool.into_iter()
        .take(k)
        .enumerate()
        .map(|(idx, (position, record))| RankedEntry {
            record: record.clone(),
            label: RankLabel::for_index(idx),
            rank: idx + 1,
            position,
            score: score(record),
        })
        .collect()
}
