//! HTTP collaborator seam.
//!
//! # Design
//! - The core never performs network IO itself; it hands requests to an [`HttpTransport`].
//! - Futures are `?Send` because the client runs on one thread (browser event loop or a
//!   current-thread runtime).
//! - Bodies and responses are JSON values; typed decoding happens in the API client.

use std::rc::Rc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// HTTP verbs used by the API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    /// `GET` request.
    Get,
    /// `POST` request.
    Post,
}

impl HttpMethod {
    /// Verb as sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// Outbound request handed to the transport.
#[derive(Clone, Debug, PartialEq)]
pub struct HttpRequest {
    /// Request verb.
    pub method: HttpMethod,
    /// Header name/value pairs.
    pub headers: Vec<(String, String)>,
    /// JSON body, when any.
    pub body: Option<Value>,
}

impl HttpRequest {
    /// JSON `POST` request.
    #[must_use]
    pub fn post(body: Value) -> Self {
        Self {
            method: HttpMethod::Post,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Some(body),
        }
    }

    /// Append a header.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Response returned by the transport.
#[derive(Clone, Debug, PartialEq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Decoded JSON body (`Null` when the body was empty).
    pub json: Value,
}

impl HttpResponse {
    /// Whether the status is in the 2xx range.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Failure raised before a response was obtained.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request could not be sent or the connection failed.
    #[error("request to '{path}' failed: {message}")]
    Request {
        /// Action path that was requested.
        path: String,
        /// Transport-specific description.
        message: String,
    },
    /// The response body was not valid JSON.
    #[error("response from '{path}' was not valid JSON: {message}")]
    Body {
        /// Action path that was requested.
        path: String,
        /// Parser description.
        message: String,
    },
}

/// Generic fetch-like HTTP client.
#[async_trait(?Send)]
pub trait HttpTransport {
    /// Send `request` to the API action at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when no HTTP response could be obtained or
    /// its body was not JSON. Non-2xx statuses are not errors at this layer.
    async fn request(&self, path: &str, request: HttpRequest)
    -> Result<HttpResponse, TransportError>;
}

#[async_trait(?Send)]
impl<T: HttpTransport + ?Sized> HttpTransport for Rc<T> {
    async fn request(
        &self,
        path: &str,
        request: HttpRequest,
    ) -> Result<HttpResponse, TransportError> {
        (**self).request(path, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn post_sets_json_content_type() {
        let request =
            HttpRequest::post(json!({"request_data": {}})).with_header("X-Auth-Header", "t");
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.header("x-auth-header"), Some("t"));
        assert_eq!(request.header("missing"), None);
    }

    #[test]
    fn success_range_is_2xx() {
        let ok = HttpResponse {
            status: 204,
            json: Value::Null,
        };
        let denied = HttpResponse {
            status: 401,
            json: Value::Null,
        };
        assert!(ok.is_success());
        assert!(!denied.is_success());
    }
}
