//! Error types for configuration loading.

use thiserror::Error;

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON configuration document could not be parsed.
    #[error("invalid configuration document")]
    Document {
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
    /// Field contained an invalid value.
    #[error("invalid value for '{field}': {reason}")]
    InvalidField {
        /// Field that failed validation.
        field: &'static str,
        /// Offending value when available.
        value: Option<String>,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, value: impl ToString, reason: &'static str) -> Self {
        Self::InvalidField {
            field,
            value: Some(value.to_string()),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_field_renders_field_and_reason() {
        let err = ConfigError::invalid("page_size", 0, "must be positive");
        assert_eq!(err.to_string(), "invalid value for 'page_size': must be positive");
        assert!(matches!(
            err,
            ConfigError::InvalidField { value: Some(ref value), .. } if value == "0"
        ));
    }
}
