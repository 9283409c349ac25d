//! Gateway process configuration.
//!
//! All configuration is driven by environment variables. The CouchDB
//! connection is configured separately through
//! [`CouchDbConfig::from_env`](docgate_couchdb::CouchDbConfig::from_env).

use std::time::Duration;

use docgate_http::DataHttpConfig;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Parse a `LOG_FORMAT` value; anything but `json` means text.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// Global configuration for the gateway process.
#[derive(Debug, Clone)]
pub struct DocGateConfig {
    /// Bind address for the gateway.
    pub gateway_listen: String,
    /// Log level.
    pub log_level: String,
    /// Log output format.
    pub log_format: LogFormat,
    /// Deadline for a whole inbound request; `None` disables it.
    pub request_timeout: Option<Duration>,
    /// Largest accepted request body, in bytes.
    pub max_body_bytes: usize,
}

impl Default for DocGateConfig {
    fn default() -> Self {
        Self {
            gateway_listen: "0.0.0.0:8080".to_owned(),
            log_level: "info".to_owned(),
            log_format: LogFormat::Text,
            request_timeout: Some(Duration::from_secs(30)),
            max_body_bytes: 8 * 1024 * 1024,
        }
    }
}

impl DocGateConfig {
    /// Load configuration from environment variables.
    ///
    /// Unparseable numeric values keep their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Ok(v) = std::env::var("LOG_FORMAT") {
            config.log_format = LogFormat::parse(&v);
        }
        if let Some(secs) = env_parse::<u64>("REQUEST_TIMEOUT_SECS") {
            config.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(bytes) = env_parse::<usize>("MAX_BODY_BYTES") {
            config.max_body_bytes = bytes;
        }

        config
    }

    /// Settings for the HTTP service layer.
    #[must_use]
    pub fn http_config(&self) -> DataHttpConfig {
        DataHttpConfig {
            request_timeout: self.request_timeout,
            max_body_bytes: self.max_body_bytes,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_create_default_config() {
        let config = DocGateConfig::default();
        assert_eq!(config.gateway_listen, "0.0.0.0:8080");
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.max_body_bytes, 8 * 1024 * 1024);
    }

    #[test]
    fn test_should_parse_log_format() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse(" JSON "), LogFormat::Json);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Text);
    }

    #[test]
    fn test_should_carry_limits_into_http_config() {
        let config = DocGateConfig {
            request_timeout: None,
            max_body_bytes: 1024,
            ..DocGateConfig::default()
        };
        let http = config.http_config();
        assert_eq!(http.request_timeout, None);
        assert_eq!(http.max_body_bytes, 1024);
    }
}
