// src/route/mod.rs
//! Route metrics: the canonical `RouteRecord`, the routing-provider seam and the
//! normalizer that turns a provider payload into a record.
//!
//! Every record is built from a single origin/destination observation:
//! - `travel_time_minutes`    : current travel time under live traffic
//! - `free_flow_time_minutes` : travel time without the reported traffic delay
//! - `congestion_ratio`       : travel / free-flow, 1.0 means no congestion

pub mod error;
pub mod tomtom;

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context};
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};

pub use error::ProviderError;

/// Latitude/longitude pair in degrees. Serialized as `"lat,lon"`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lon)
    }
}

impl FromStr for Coordinate {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| anyhow!("coordinate must look like \"lat,lon\", got {s:?}"))?;
        let lat: f64 = lat
            .trim()
            .parse()
            .with_context(|| format!("invalid latitude in {s:?}"))?;
        let lon: f64 = lon
            .trim()
            .parse()
            .with_context(|| format!("invalid longitude in {s:?}"))?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(anyhow!("coordinate out of range: {s:?}"));
        }
        Ok(Self { lat, lon })
    }
}

impl TryFrom<String> for Coordinate {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Coordinate> for String {
    fn from(c: Coordinate) -> Self {
        c.to_string()
    }
}

/// A named point: the fixed origin or one candidate destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub coord: Coordinate,
}

impl Place {
    pub fn new(name: impl Into<String>, coord: Coordinate) -> Self {
        Self {
            name: name.into(),
            coord,
        }
    }
}

/// One directed origin -> destination observation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRecord {
    pub origin_name: String,
    pub origin_coord: Coordinate,
    pub dest_name: String,
    pub dest_coord: Coordinate,
    pub travel_time_minutes: f64,
    pub free_flow_time_minutes: f64,
    pub congestion_ratio: f64,
}

impl RouteRecord {
    /// Build a record from travel and free-flow durations in seconds.
    ///
    /// A non-positive free-flow time only shows up in malformed provider data
    /// (delay >= travel time). The record then falls back to
    /// `free_flow = travel` and `congestion_ratio = 1.0`.
    pub fn from_seconds(
        origin: &Place,
        dest: &Place,
        travel_secs: f64,
        free_flow_secs: f64,
    ) -> Self {
        let travel_time_minutes = travel_secs / 60.0;
        let (free_flow_time_minutes, congestion_ratio) = if free_flow_secs > 0.0 {
            (free_flow_secs / 60.0, travel_secs / free_flow_secs)
        } else {
            (travel_time_minutes, 1.0)
        };

        Self {
            origin_name: origin.name.clone(),
            origin_coord: origin.coord,
            dest_name: dest.name.clone(),
            dest_coord: dest.coord,
            travel_time_minutes,
            free_flow_time_minutes,
            congestion_ratio,
        }
    }

    /// Same as [`RouteRecord::from_seconds`] with minute inputs.
    pub fn from_minutes(
        origin: &Place,
        dest: &Place,
        travel_min: f64,
        free_flow_min: f64,
    ) -> Self {
        Self::from_seconds(origin, dest, travel_min * 60.0, free_flow_min * 60.0)
    }
}

// ------------------------------------------------------------
// Provider payload (TomTom Routing API shape)
// ------------------------------------------------------------

/// Raw routing response. Only the fields the normalizer reads are modelled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingResponse {
    #[serde(default)]
    pub routes: Vec<RoutingRoute>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingRoute {
    #[serde(default)]
    pub summary: Option<RoutingSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingSummary {
    #[serde(default)]
    pub travel_time_in_seconds: Option<f64>,
    #[serde(default)]
    pub traffic_delay_in_seconds: Option<f64>,
}

impl RoutingResponse {
    /// Parse a provider body.
    pub fn from_json(body: &str) -> Result<Self, ProviderError> {
        Ok(serde_json::from_str(body)?)
    }

    /// Single-route payload, handy for fakes and fixtures.
    pub fn single(travel_secs: f64, traffic_delay_secs: Option<f64>) -> Self {
        Self {
            routes: vec![RoutingRoute {
                summary: Some(RoutingSummary {
                    travel_time_in_seconds: Some(travel_secs),
                    traffic_delay_in_seconds: traffic_delay_secs,
                }),
            }],
        }
    }
}

/// Normalize one provider payload into a `RouteRecord`.
///
/// Reads `routes[0].summary`; the traffic delay defaults to 0 when absent.
pub fn normalize(
    origin: &Place,
    dest: &Place,
    payload: &RoutingResponse,
) -> Result<RouteRecord, ProviderError> {
    let route = payload.routes.first().ok_or(ProviderError::NoRoute)?;
    let summary = route
        .summary
        .as_ref()
        .ok_or(ProviderError::MalformedSummary("missing summary"))?;

    let travel = summary
        .travel_time_in_seconds
        .ok_or(ProviderError::MalformedSummary("missing travelTimeInSeconds"))?;
    if !travel.is_finite() || travel <= 0.0 {
        return Err(ProviderError::MalformedSummary(
            "travelTimeInSeconds must be positive",
        ));
    }

    let delay = summary.traffic_delay_in_seconds.unwrap_or(0.0);
    if !delay.is_finite() || delay < 0.0 {
        return Err(ProviderError::MalformedSummary(
            "trafficDelayInSeconds must be >= 0",
        ));
    }

    Ok(RouteRecord::from_seconds(origin, dest, travel, travel - delay))
}

// ------------------------------------------------------------
// Provider seam
// ------------------------------------------------------------

/// Routing capability: current travel time + traffic delay between two points.
#[async_trait::async_trait]
pub trait RouteFetcher: Send + Sync {
    async fn fetch_route(
        &self,
        origin: Coordinate,
        dest: Coordinate,
    ) -> Result<RoutingResponse, ProviderError>;
    fn name(&self) -> &'static str;
}

/// Fetch + normalize one destination, bounded by `timeout`.
pub async fn build_route_record(
    fetcher: &dyn RouteFetcher,
    origin: &Place,
    dest: &Place,
    timeout: Duration,
) -> Result<RouteRecord, ProviderError> {
    let t0 = Instant::now();
    counter!("route_fetch_total").increment(1);

    let payload = tokio::time::timeout(timeout, fetcher.fetch_route(origin.coord, dest.coord))
        .await
        .map_err(|_| ProviderError::Timeout(timeout))??;

    histogram!("route_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    let record = normalize(origin, dest, &payload)?;

    tracing::debug!(
        target: "route",
        provider = fetcher.name(),
        dest = %dest.name,
        travel_min = record.travel_time_minutes,
        ratio = record.congestion_ratio,
        "route normalized"
    );
    Ok(record)
}
