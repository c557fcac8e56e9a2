// src/advisory/prompt.rs
use crate::rank::CONGESTED_AT;
use crate::route::RouteRecord;

pub const DEFAULT_AUDIENCE: &str = "UCLA students";
pub const DEFAULT_LANGUAGE: &str = "English";

/// Instructions wrapped around one serialized `RouteRecord`.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    pub audience: String,
    pub language: String,
    /// Above this ratio the model is asked to suggest leaving later.
    pub delay_above: f64,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            audience: DEFAULT_AUDIENCE.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            delay_above: CONGESTED_AT,
        }
    }
}

impl PromptTemplate {
    pub fn render(&self, record: &RouteRecord) -> String {
        let route_json =
            serde_json::to_string_pretty(record).unwrap_or_else(|_| "{}".to_string());
        let origin = &record.origin_name;
        let dest = &record.dest_name;
        let audience = &self.audience;

        format!(
            "You are a travel assistant who knows Los Angeles traffic well and mainly helps {audience}.\n\
             \n\
             Here is the live traffic data for the drive from {origin} to {dest}:\n\
             \n\
             {route_json}\n\
             \n\
             Using this data:\n\
             1. Decide whether now is a good time to head to {dest}. Give a verdict of \"recommend\", \"neutral\" or \"discourage\" and explain why.\n\
             2. Write it as 3-5 casual, relaxed sentences aimed at {audience}.\n\
             3. If the congestion index (congestion_ratio) is above {delay}, add a reminder to avoid the current time window and consider leaving later.\n\
             \n\
             Do not repeat the JSON data; output only the final text. Answer in {language}.\n",
            delay = self.delay_above,
            language = self.language,
        )
    }
}
