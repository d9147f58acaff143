//! Configuration layering and validation.
//!
//! # Design
//! - Precedence: defaults, then the optional JSON document, then environment.
//! - Environment lookups go through a closure so tests never touch the process env.
//! - Validation runs once on the merged result.

use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::defaults;
use crate::error::{ConfigError, ConfigResult};
use crate::model::{ClientConfig, ConfigDocument, LogFormatChoice};

/// Prefix shared by every environment variable.
pub const ENV_PREFIX: &str = "PATCHFLOW_";

/// Load configuration from an optional JSON document and the process environment.
///
/// # Errors
///
/// Returns [`ConfigError`] when the document is malformed or a merged value
/// fails validation.
pub fn load_from_env(document: Option<&str>) -> ConfigResult<ClientConfig> {
    load(document, |key| std::env::var(key).ok())
}

/// Load configuration using `lookup` for environment overrides.
///
/// # Errors
///
/// Returns [`ConfigError`] when the document is malformed or a merged value
/// fails validation.
pub fn load<F>(document: Option<&str>, lookup: F) -> ConfigResult<ClientConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut merged = match document {
        Some(raw) if !raw.trim().is_empty() => serde_json::from_str::<ConfigDocument>(raw)
            .map_err(|source| ConfigError::Document { source })?,
        _ => ConfigDocument::default(),
    };
    apply_env(&mut merged, &lookup)?;
    let config = resolve(merged)?;
    debug!(
        api_base_url = %config.api_base_url,
        page_size = config.page_size,
        poll_interval_secs = config.poll_interval.as_secs(),
        "client configuration loaded"
    );
    Ok(config)
}

fn env_key(name: &str) -> String {
    format!("{ENV_PREFIX}{name}")
}

fn apply_env<F>(document: &mut ConfigDocument, lookup: &F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(&env_key("API_URL")) {
        document.api_base_url = Some(value);
    }
    if let Some(value) = lookup(&env_key("PAGE_SIZE")) {
        document.page_size = Some(parse_number("page_size", &value)?);
    }
    if let Some(value) = lookup(&env_key("POLL_INTERVAL_SECS")) {
        document.poll_interval_secs = Some(parse_number("poll_interval_secs", &value)?);
    }
    if let Some(value) = lookup(&env_key("REQUEST_TIMEOUT_SECS")) {
        document.request_timeout_secs = Some(parse_number("request_timeout_secs", &value)?);
    }
    if let Some(value) = lookup(&env_key("LOG_LEVEL")) {
        document.log_level = Some(value);
    }
    if let Some(value) = lookup(&env_key("LOG_FORMAT")) {
        let format = LogFormatChoice::parse(&value)
            .ok_or_else(|| ConfigError::invalid("log_format", &value, "unknown log format"))?;
        document.log_format = Some(format);
    }
    Ok(())
}

fn parse_number<T: std::str::FromStr>(field: &'static str, value: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::invalid(field, value, "must be a non-negative integer"))
}

fn resolve(document: ConfigDocument) -> ConfigResult<ClientConfig> {
    let api_base_url = validate_base_url(
        document
            .api_base_url
            .as_deref()
            .unwrap_or(defaults::API_BASE_URL),
    )?;

    let page_size = document.page_size.unwrap_or(defaults::PAGE_SIZE);
    if page_size == 0 || page_size > defaults::MAX_PAGE_SIZE {
        return Err(ConfigError::invalid(
            "page_size",
            page_size,
            "must be between 1 and 100",
        ));
    }

    let poll_secs = document
        .poll_interval_secs
        .unwrap_or(defaults::POLL_INTERVAL_SECS);
    if !(defaults::MIN_POLL_INTERVAL_SECS..=defaults::MAX_POLL_INTERVAL_SECS).contains(&poll_secs)
    {
        return Err(ConfigError::invalid(
            "poll_interval_secs",
            poll_secs,
            "must be between 1 and 3600 seconds",
        ));
    }

    let timeout_secs = document
        .request_timeout_secs
        .unwrap_or(defaults::REQUEST_TIMEOUT_SECS);
    if timeout_secs == 0 || timeout_secs > defaults::MAX_REQUEST_TIMEOUT_SECS {
        return Err(ConfigError::invalid(
            "request_timeout_secs",
            timeout_secs,
            "must be between 1 and 300 seconds",
        ));
    }

    let log_level = document
        .log_level
        .filter(|level| !level.trim().is_empty())
        .unwrap_or_else(|| defaults::LOG_LEVEL.to_string());

    Ok(ClientConfig {
        api_base_url,
        page_size,
        poll_interval: Duration::from_secs(poll_secs),
        request_timeout: Duration::from_secs(timeout_secs),
        log_level,
        log_format: document.log_format.unwrap_or(LogFormatChoice::Auto),
    })
}

fn validate_base_url(raw: &str) -> ConfigResult<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed)
        .map_err(|_| ConfigError::invalid("api_base_url", raw, "must be an absolute URL"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::invalid(
            "api_base_url",
            raw,
            "scheme must be http or https",
        ));
    }
    Ok(trimmed.to_string())
}
