//! Typed configuration models.
//!
//! # Design
//! - `ConfigDocument` mirrors the optional JSON file: every field may be absent.
//! - `ClientConfig` is the validated, fully-populated result handed to callers.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::defaults;

/// Requested log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormatChoice {
    /// Pick based on the build profile.
    Auto,
    /// Human-readable output.
    Pretty,
    /// Structured JSON lines.
    Json,
}

impl LogFormatChoice {
    /// Parse a format name (`auto`, `pretty`, `json`).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "pretty" | "text" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Raw configuration document; absent fields fall back to defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigDocument {
    /// API endpoint base URL.
    pub api_base_url: Option<String>,
    /// Rows per list page.
    pub page_size: Option<u32>,
    /// Seconds between freshness checks.
    pub poll_interval_secs: Option<u64>,
    /// Native HTTP request timeout in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Tracing filter directive.
    pub log_level: Option<String>,
    /// Log output format.
    pub log_format: Option<LogFormatChoice>,
}

/// Validated client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API endpoint base URL without a trailing slash.
    pub api_base_url: String,
    /// Rows per list page.
    pub page_size: u32,
    /// Delay between two freshness checks.
    pub poll_interval: Duration,
    /// Native HTTP request timeout.
    pub request_timeout: Duration,
    /// Tracing filter directive.
    pub log_level: String,
    /// Log output format.
    pub log_format: LogFormatChoice,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: defaults::API_BASE_URL.to_string(),
            page_size: defaults::PAGE_SIZE,
            poll_interval: Duration::from_secs(defaults::POLL_INTERVAL_SECS),
            request_timeout: Duration::from_secs(defaults::REQUEST_TIMEOUT_SECS),
            log_level: defaults::LOG_LEVEL.to_string(),
            log_format: LogFormatChoice::Auto,
        }
    }
}

impl ClientConfig {
    /// Join an API action path onto the base URL.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let config = ClientConfig {
            api_base_url: "http://host/main.php".into(),
            ..ClientConfig::default()
        };
        assert_eq!(config.endpoint("/auth/login"), "http://host/main.php/auth/login");
        assert_eq!(config.endpoint("user/info"), "http://host/main.php/user/info");
    }

    #[test]
    fn log_format_parse_accepts_aliases() {
        assert_eq!(LogFormatChoice::parse("JSON"), Some(LogFormatChoice::Json));
        assert_eq!(LogFormatChoice::parse("text"), Some(LogFormatChoice::Pretty));
        assert_eq!(LogFormatChoice::parse("xml"), None);
    }
}
