//! HTTP configuration types.
//!
//! `HttpConfig` configures the reqwest client behind the default transport.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::defaults;

/// HTTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout
    #[serde(with = "duration_option_serde")]
    pub timeout: Option<Duration>,
    /// Connection timeout
    #[serde(with = "duration_option_serde")]
    pub connect_timeout: Option<Duration>,
    /// Extra headers sent with every request
    pub headers: HashMap<String, String>,
    /// Proxy URL
    pub proxy: Option<String>,
    pub user_agent: Option<String>,
    /// When `true`, streaming requests send `Accept-Encoding: identity` so
    /// intermediaries do not buffer compressed SSE.
    pub stream_disable_compression: bool,
}

/// Builder for [`HttpConfig`].
#[derive(Debug, Clone, Default)]
pub struct HttpConfigBuilder {
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    headers: HashMap<String, String>,
    proxy: Option<String>,
    user_agent: Option<String>,
    stream_disable_compression: Option<bool>,
}

impl HttpConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, connect_timeout: Option<Duration>) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn user_agent<S: Into<String>>(mut self, user_agent: Option<S>) -> Self {
        self.user_agent = user_agent.map(|s| s.into());
        self
    }

    pub fn proxy<S: Into<String>>(mut self, proxy: Option<S>) -> Self {
        self.proxy = proxy.map(|s| s.into());
        self
    }

    pub fn header<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn stream_disable_compression(mut self, val: bool) -> Self {
        self.stream_disable_compression = Some(val);
        self
    }

    /// Build the configuration. Unset timeouts stay unset.
    pub fn build(self) -> HttpConfig {
        let default_sdc = stream_disable_compression_from_env();
        HttpConfig {
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            headers: self.headers,
            proxy: self.proxy,
            user_agent: self.user_agent,
            stream_disable_compression: self.stream_disable_compression.unwrap_or(default_sdc),
        }
    }
}

impl HttpConfig {
    pub fn builder() -> HttpConfigBuilder {
        HttpConfigBuilder::new()
    }
}

fn stream_disable_compression_from_env() -> bool {
    match std::env::var(defaults::http::STREAM_DISABLE_COMPRESSION_ENV_VAR) {
        Ok(val) => {
            let v = val.trim().to_lowercase();
            !(v == "false" || v == "0" || v == "off" || v == "no")
        }
        Err(_) => true,
    }
}

// Durations travel as whole seconds.
mod duration_option_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => d.as_secs().serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs: Option<u64> = Option::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Some(defaults::http::REQUEST_TIMEOUT),
            connect_timeout: Some(defaults::http::CONNECT_TIMEOUT),
            headers: HashMap::new(),
            proxy: None,
            user_agent: Some(defaults::http::USER_AGENT.to_string()),
            stream_disable_compression: stream_disable_compression_from_env(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_crate_timeouts() {
        let config = HttpConfig::default();
        assert_eq!(config.timeout, Some(defaults::http::REQUEST_TIMEOUT));
        assert_eq!(config.connect_timeout, Some(defaults::http::CONNECT_TIMEOUT));
        assert!(config.user_agent.unwrap().starts_with("chat-adapter/"));
    }

    #[test]
    fn builder_collects_headers_and_flags() {
        let config = HttpConfig::builder()
            .timeout(Some(Duration::from_secs(5)))
            .header("x-team", "search")
            .stream_disable_compression(false)
            .build();
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.connect_timeout, None);
        assert_eq!(config.headers.get("x-team").map(String::as_str), Some("search"));
        assert!(!config.stream_disable_compression);
    }

    #[test]
    fn durations_serialize_as_seconds() {
        let config = HttpConfig::builder()
            .timeout(Some(Duration::from_secs(30)))
            .build();
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["timeout"], 30);
        assert!(value["connect_timeout"].is_null());
    }
}
