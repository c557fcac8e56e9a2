//! Concrete text generators + factory.
//!
//! * `TRAFFIC_ADVISORY_MODE=mock` -> fixed-text generator (local dry runs).
//! * advisory disabled or no key  -> disabled generator (every entry gets the sentinel).
//! * otherwise                    -> Groq chat completions.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{DynTextGenerator, TextGenerator};
use crate::config::AdvisoryConfig;

pub const ENV_ADVISORY_MODE: &str = "TRAFFIC_ADVISORY_MODE";

/// Build a generator according to config and environment variables.
pub fn build_generator(config: &AdvisoryConfig) -> anyhow::Result<DynTextGenerator> {
    if std::env::var(ENV_ADVISORY_MODE)
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Ok(Arc::new(FixedGenerator::new(
            "Neutral: traffic looks manageable right now (mock advisor).",
        )));
    }

    if !config.enabled || config.api_key.trim().is_empty() {
        return Ok(Arc::new(DisabledGenerator));
    }

    let groq = GroqGenerator::new(config.api_key.clone(), config.model(), config.timeout())?
        .with_temperature(config.temperature)
        .with_endpoint(config.base_url());
    Ok(Arc::new(groq))
}

/// Groq (OpenAI-compatible) chat completions client.
pub struct GroqGenerator {
    http: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f32,
    endpoint: String,
}

impl GroqGenerator {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        request_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("la-traffic-advisor/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(request_timeout)
            .build()
            .context("building advisory http client")?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
            temperature: 1.2,
            endpoint: crate::config::app::DEFAULT_GROQ_URL.to_string(),
        })
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}
#[derive(Serialize)]
struct ChatReq<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
}
#[derive(Deserialize)]
struct ChatResp {
    #[serde(default)]
    choices: Vec<Choice>,
}
#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}
#[derive(Deserialize)]
struct ChoiceMsg {
    #[serde(default)]
    content: Option<String>,
}

/// First choice's content, trimmed; `None` when missing or blank.
fn first_content(resp: ChatResp) -> Option<String> {
    resp.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[async_trait]
impl TextGenerator for GroqGenerator {
    async fn generate(&self, prompt: &str) -> Option<String> {
        if self.api_key.is_empty() {
            return None;
        }

        let req = ChatReq {
            model: &self.model,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let resp = match self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(
                    target: "advisory",
                    error = ?e,
                    provider = "groq",
                    "advisory http error"
                );
                return None;
            }
        };

        if !resp.status().is_success() {
            tracing::warn!(
                target: "advisory",
                status = resp.status().as_u16(),
                provider = "groq",
                "advisory non-2xx"
            );
            return None;
        }
        let body: ChatResp = match resp.json().await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(
                    target: "advisory",
                    error = ?e,
                    provider = "groq",
                    "advisory decode error"
                );
                return None;
            }
        };
        first_content(body)
    }

    fn provider_name(&self) -> &'static str {
        "groq"
    }
}

/// Returns `None` always; used when advisories are disabled.
pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    async fn generate(&self, _prompt: &str) -> Option<String> {
        None
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Returns the same text for every prompt.
#[derive(Clone)]
pub struct FixedGenerator {
    pub fixed: String,
}

impl FixedGenerator {
    pub fn new(text: impl Into<String>) -> Self {
        Self { fixed: text.into() }
    }
}

#[async_trait]
impl TextGenerator for FixedGenerator {
    async fn generate(&self, _prompt: &str) -> Option<String> {
        Some(self.fixed.clone())
    }
    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
