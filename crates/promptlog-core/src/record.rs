use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Upstream API that served a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Gemini,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Gemini => "gemini",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "gemini" => Ok(Provider::Gemini),
            _ => Err(ParseError::Provider(s.to_string())),
        }
    }
}

/// A single logged model invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRecord {
    pub id: String,
    pub model: String,
    pub provider: Provider,
    pub input: String,
    pub output: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost: f64,
    pub timestamp: DateTime<Utc>,
    /// Latency in milliseconds.
    pub response_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
}

impl QueryRecord {
    /// Input plus output tokens, saturating at `u64::MAX`.
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }

    /// Output tokens per input token. The denominator is floored at 1.
    pub fn token_ratio(&self) -> f64 {
        self.output_tokens as f64 / self.input_tokens.max(1) as f64
    }
}

/// Baseline record for tests; callers overwrite the fields they care about.
#[cfg(test)]
pub(crate) fn sample_record(id: &str, model: &str) -> QueryRecord {
    QueryRecord {
        id: id.to_string(),
        model: model.to_string(),
        provider: Provider::OpenAi,
        input: String::new(),
        output: String::new(),
        input_tokens: 100,
        output_tokens: 50,
        cost: 0.01,
        timestamp: "2024-03-01T12:00:00Z".parse().unwrap(),
        response_time: 500.0,
        model_version: None,
    }
}
