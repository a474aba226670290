//! Chat results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::Usage;

/// Rate-limit state reported by the provider alongside a response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RateLimit {
    pub requests_limit: Option<u64>,
    pub requests_remaining: Option<u64>,
    #[serde(default, with = "duration_millis_option")]
    pub requests_reset: Option<std::time::Duration>,
    pub tokens_limit: Option<u64>,
    pub tokens_remaining: Option<u64>,
    #[serde(default, with = "duration_millis_option")]
    pub tokens_reset: Option<std::time::Duration>,
}

mod duration_millis_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration
            .map(|d| d.as_millis() as u64)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis: Option<u64> = Option::deserialize(deserializer)?;
        Ok(millis.map(Duration::from_millis))
    }
}

/// Per-generation metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GenerationMetadata {
    /// Id of the response the generation came from.
    pub id: String,
    /// Wire name of the role, e.g. `"assistant"`.
    pub role: Option<String>,
    /// Wire name of the finish reason, e.g. `"stop"`.
    pub finish_reason: Option<String>,
}

/// One candidate answer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Generation {
    pub text: Option<String>,
    pub metadata: GenerationMetadata,
}

impl Generation {
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }
}

/// Response-level metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChatResultMetadata {
    pub id: Option<String>,
    pub model: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub usage: Option<Usage>,
    pub rate_limit: Option<RateLimit>,
}

/// Output of a chat call, or one element of a result stream.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChatResult {
    pub generations: Vec<Generation>,
    pub metadata: ChatResultMetadata,
}

impl ChatResult {
    /// Result with no generations.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.generations.is_empty()
    }

    /// First generation, if any.
    pub fn generation(&self) -> Option<&Generation> {
        self.generations.first()
    }

    /// Text of the first generation, or `""`.
    pub fn text(&self) -> &str {
        self.generation().map(Generation::text).unwrap_or_default()
    }
}
