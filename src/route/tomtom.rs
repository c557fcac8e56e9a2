// src/route/tomtom.rs
//! TomTom Routing API client (`calculateRoute` with live traffic).

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;

use super::{Coordinate, ProviderError, RouteFetcher, RoutingResponse};

pub const DEFAULT_BASE_URL: &str = "https://api.tomtom.com/routing/1/calculateRoute";

pub struct TomTomFetcher {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl TomTomFetcher {
    pub fn new(api_key: impl Into<String>, request_timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("la-traffic-advisor/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(request_timeout)
            .build()
            .context("building routing http client")?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the client at another host (self-hosted proxy, test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn route_url(&self, origin: Coordinate, dest: Coordinate) -> String {
        format!("{}/{origin}:{dest}/json", self.base_url)
    }
}

#[async_trait]
impl RouteFetcher for TomTomFetcher {
    async fn fetch_route(
        &self,
        origin: Coordinate,
        dest: Coordinate,
    ) -> Result<RoutingResponse, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::MissingCredential);
        }

        let resp = self
            .http
            .get(self.route_url(origin, dest))
            .query(&[("key", self.api_key.as_str()), ("traffic", "true")])
            .send()
            .await
            .inspect_err(|e| {
                tracing::debug!(
                    target: "route",
                    error = ?e,
                    provider = "tomtom",
                    "routing http error"
                );
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        let body = resp.text().await?;
        RoutingResponse::from_json(&body)
    }

    fn name(&self) -> &'static str {
        "tomtom"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_embeds_both_coordinates() {
        let f = TomTomFetcher::new("k", Duration::from_secs(1))
            .unwrap()
            .with_base_url("http://localhost:9000/routing/");
        let url = f.route_url(Coordinate::new(34.04, -118.26), Coordinate::new(34.0729, -118.3574));
        assert_eq!(
            url,
            "http://localhost:9000/routing/34.04,-118.26:34.0729,-118.3574/json"
        );
    }

    #[tokio::test]
    async fn empty_key_is_rejected_before_any_request() {
        let f = TomTomFetcher::new("", Duration::from_secs(1)).unwrap();
        let err = f
            .fetch_route(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredential));
    }
}
