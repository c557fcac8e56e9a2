//! Route score: `travel_time_minutes * congestion_ratio`, lower is better.
//!
//! Penalizes absolute duration and relative congestion on one axis, so a short
//! but jammed route and a long but clear route stay comparable. Scores are only
//! compared within one run, where every record shares the same origin.

use crate::route::RouteRecord;

pub fn score(record: &RouteRecord) -> f64 {
    record.travel_time_minutes * record.congestion_ratio
}
