// src/config/app.rs
//! Application config: origin, destinations, ranking knobs, provider settings.
//!
//! Lookup order for the file:
//! 1) $TRAFFIC_CONFIG_PATH
//! 2) config/traffic.toml
//! 3) built-in defaults (UCLA origin, four LA destinations)
//!
//! `api_key = "ENV"` reads the key from TOMTOM_API_KEY / GROQ_API_KEY.

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};
use tracing::{info, warn};

use crate::advisory::prompt::{DEFAULT_AUDIENCE, DEFAULT_LANGUAGE};
use crate::advisory::PromptTemplate;
use crate::rank::Thresholds;
use crate::route::{tomtom, Coordinate, Place};

pub const DEFAULT_CONFIG_PATH: &str = "config/traffic.toml";

pub const ENV_CONFIG_PATH: &str = "TRAFFIC_CONFIG_PATH";
pub const ENV_TOP_K: &str = "TRAFFIC_TOP_K";
pub const ENV_REPORTS_DIR: &str = "TRAFFIC_REPORTS_DIR";
pub const ENV_TOMTOM_API_KEY: &str = "TOMTOM_API_KEY";
pub const ENV_GROQ_API_KEY: &str = "GROQ_API_KEY";

pub const DEFAULT_GROQ_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_REPORT_TITLE: &str = "Where to go for UCLA students - daily travel guide";

fn default_origin() -> Place {
    Place::new("Westwood (UCLA)", Coordinate::new(34.04, -118.26))
}

fn default_destinations() -> Vec<Place> {
    vec![
        Place::new("Santa Monica Pier", Coordinate::new(34.0094, -118.4973)),
        Place::new("Griffith Observatory", Coordinate::new(34.1184, -118.3004)),
        Place::new("The Grove", Coordinate::new(34.0729, -118.3574)),
        Place::new("LACMA", Coordinate::new(34.0638, -118.3592)),
    ]
}

fn default_top_k() -> usize {
    2
}
fn default_env_key() -> String {
    "ENV".to_string()
}
fn default_routing_timeout() -> u64 {
    10
}
fn default_advisory_timeout() -> u64 {
    20
}
fn default_temperature() -> f32 {
    1.2
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoutingConfig {
    #[serde(default = "default_env_key")]
    pub api_key: String,
    #[serde(default = "default_routing_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            api_key: default_env_key(),
            timeout_secs: default_routing_timeout(),
            base_url: None,
        }
    }
}

impl RoutingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(tomtom::DEFAULT_BASE_URL)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdvisoryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_env_key")]
    pub api_key: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default = "default_advisory_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: default_env_key(),
            model: None,
            temperature: default_temperature(),
            audience: None,
            language: None,
            timeout_secs: default_advisory_timeout(),
            base_url: None,
        }
    }
}

impl AdvisoryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_GROQ_MODEL)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_GROQ_URL)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_reports_dir")]
    pub dir: PathBuf,
    #[serde(default)]
    pub title: Option<String>,
}

fn default_reports_dir() -> PathBuf {
    PathBuf::from("reports")
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            dir: default_reports_dir(),
            title: None,
        }
    }
}

impl ReportConfig {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(DEFAULT_REPORT_TITLE)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_origin")]
    pub origin: Place,
    #[serde(default = "default_destinations")]
    pub destinations: Vec<Place>,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub advisory: AdvisoryConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            destinations: default_destinations(),
            top_k: default_top_k(),
            thresholds: Thresholds::default(),
            routing: RoutingConfig::default(),
            advisory: AdvisoryConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl AppConfig {
    /// Parse TOML and validate. Credentials are left untouched.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: AppConfig = toml::from_str(s).context("parsing traffic config")?;
        cfg.validated()
    }

    /// Load from an explicit path, then apply env overrides and resolve keys.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading traffic config from {}", path.display()))?;
        let cfg = Self::from_toml_str(&data)?;
        info!(target: "config", path = %path.display(), "traffic config loaded");
        cfg.finish()
    }

    /// Load using env var + fallbacks (see module docs).
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from_file(&pb);
            }
            bail!("{ENV_CONFIG_PATH} points to non-existent path {}", pb.display());
        }
        let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_path.exists() {
            return Self::load_from_file(&default_path);
        }
        info!(target: "config", "no config file found, using built-in defaults");
        Self::default().validated()?.finish()
    }

    fn finish(self) -> Result<Self> {
        let mut cfg = self.with_env_overrides()?;
        cfg.resolve_credentials()?;
        // Safe diagnostics: key lengths only
        info!(
            target: "config",
            destinations = cfg.destinations.len(),
            top_k = cfg.top_k,
            routing_key_len = cfg.routing.api_key.len(),
            advisory_enabled = cfg.advisory.enabled,
            advisory_key_len = cfg.advisory.api_key.len(),
            "traffic config ready"
        );
        Ok(cfg)
    }

    /// TRAFFIC_TOP_K and TRAFFIC_REPORTS_DIR take precedence over the file.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(raw) = env::var(ENV_TOP_K) {
            self.top_k = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_TOP_K} must be a positive integer, got {raw:?}"))?;
        }
        if let Ok(dir) = env::var(ENV_REPORTS_DIR) {
            if !dir.trim().is_empty() {
                self.report.dir = PathBuf::from(dir);
            }
        }
        self.validated()
    }

    /// Resolve "ENV" keys. A missing routing key is fatal; a missing advisory
    /// key only disables advisories.
    pub fn resolve_credentials(&mut self) -> Result<()> {
        if self.routing.api_key.trim().eq_ignore_ascii_case("env") {
            self.routing.api_key = env::var(ENV_TOMTOM_API_KEY)
                .map_err(|_| anyhow!("Missing {ENV_TOMTOM_API_KEY} env var"))?;
        }
        if self.routing.api_key.trim().is_empty() {
            bail!("routing api_key is empty");
        }

        if self.advisory.api_key.trim().eq_ignore_ascii_case("env") {
            self.advisory.api_key = env::var(ENV_GROQ_API_KEY).unwrap_or_default();
        }
        if self.advisory.enabled && self.advisory.api_key.trim().is_empty() {
            warn!(
                target: "config",
                "no {ENV_GROQ_API_KEY}; advisories disabled for this run"
            );
            self.advisory.enabled = false;
        }
        Ok(())
    }

    fn validated(mut self) -> Result<Self> {
        if self.top_k == 0 {
            bail!("top_k must be at least 1");
        }
        if self.destinations.is_empty() {
            bail!("at least one destination is required");
        }
        for d in &self.destinations {
            if d.name.trim().is_empty() {
                bail!("destination at {} has an empty name", d.coord);
            }
        }
        if self.routing.timeout_secs == 0 {
            bail!("routing.timeout_secs must be at least 1");
        }
        if self.advisory.timeout_secs == 0 {
            bail!("advisory.timeout_secs must be at least 1");
        }
        self.thresholds = self.thresholds.sanitized();
        if !self.advisory.temperature.is_finite() || self.advisory.temperature < 0.0 {
            self.advisory.temperature = default_temperature();
        }
        Ok(self)
    }

    pub fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            audience: self
                .advisory
                .audience
                .clone()
                .unwrap_or_else(|| DEFAULT_AUDIENCE.to_string()),
            language: self
                .advisory
                .language
                .clone()
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            delay_above: self.thresholds.congested_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_builtin_defaults() {
        let cfg = AppConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.origin.name, "Westwood (UCLA)");
        assert_eq!(cfg.destinations.len(), 4);
        assert_eq!(cfg.top_k, 2);
        assert_eq!(cfg.thresholds, Thresholds::default());
        assert_eq!(cfg.advisory.model(), DEFAULT_GROQ_MODEL);
        assert_eq!(cfg.advisory.temperature, 1.2);
        assert_eq!(cfg.report.dir, PathBuf::from("reports"));
    }

    #[test]
    fn full_toml_overrides_everything() {
        let toml = r#"
top_k = 3

[origin]
name = "Downtown"
coord = "34.05,-118.25"

[[destinations]]
name = "Venice Beach"
coord = "33.985,-118.4695"

[thresholds]
nice_below = 1.1
congested_at = 1.4

[routing]
api_key = "abc"
timeout_secs = 3

[advisory]
enabled = false
language = "Chinese"

[report]
dir = "out"
title = "Downtown guide"
"#;
        let cfg = AppConfig::from_toml_str(toml).unwrap();
        assert_eq!(cfg.top_k, 3);
        assert_eq!(cfg.origin.coord, Coordinate::new(34.05, -118.25));
        assert_eq!(cfg.destinations[0].name, "Venice Beach");
        assert_eq!(cfg.thresholds.congested_at, 1.4);
        assert_eq!(cfg.routing.timeout(), Duration::from_secs(3));
        assert!(!cfg.advisory.enabled);
        assert_eq!(cfg.prompt_template().language, "Chinese");
        assert_eq!(cfg.prompt_template().delay_above, 1.4);
        assert_eq!(cfg.report.title(), "Downtown guide");
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(AppConfig::from_toml_str("top_k = 0").is_err());
        assert!(AppConfig::from_toml_str("destinations = []").is_err());
        let bad_coord = r#"
[[destinations]]
name = "Nowhere"
coord = "north,west"
"#;
        assert!(AppConfig::from_toml_str(bad_coord).is_err());
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        let err = AppConfig::from_toml_str("[routing]\ntimeout_secs = 0\n").unwrap_err();
        assert!(err.to_string().contains("routing.timeout_secs"));
        let err = AppConfig::from_toml_str("[advisory]\ntimeout_secs = 0\n").unwrap_err();
        assert!(err.to_string().contains("advisory.timeout_secs"));
    }
}
