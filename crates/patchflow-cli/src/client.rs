//! Shared HTTP transport, application context, and error types for the CLI.

use std::fmt::{self, Display, Formatter};
use std::rc::Rc;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use patchflow_config::ClientConfig;
use patchflow_ui::core::api::{ApiClient, ApiError};
use patchflow_ui::core::transport::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError,
};
use patchflow_ui::features::lists::checker::Sleeper;
use patchflow_ui::features::lists::controller::ControllerError;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;
use url::Url;

use crate::cli::OutputFormat;

pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";

/// CLI-level error type separating bad input, operational failures and session problems.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
    Session(String),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) fn session(message: impl Into<String>) -> Self {
        Self::Session(message.into())
    }

    pub(crate) fn session_expired() -> Self {
        Self::session(
            "session expired or missing; run `patchflow login` and export PATCHFLOW_TOKEN",
        )
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
            Self::Session(_) => 4,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) | Self::Session(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        if err.is_unauthorized() {
            Self::session_expired()
        } else {
            Self::failure(err)
        }
    }
}

impl From<ControllerError> for CliError {
    fn from(err: ControllerError) -> Self {
        match err {
            ControllerError::Api(err) => err.into(),
            other => Self::validation(other.to_string()),
        }
    }
}

/// [`HttpTransport`] backed by a `reqwest` client.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: Client,
    base_url: Url,
}

impl ReqwestTransport {
    /// Transport sending requests to `<base_url>/<path>`.
    #[must_use]
    pub const fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// Transport with a fresh client honouring `timeout`.
    ///
    /// # Errors
    ///
    /// Fails when `base_url` does not parse or the client cannot be built.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = parse_url(base_url).map_err(|message| anyhow!(message))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| anyhow!("failed to build HTTP client: {err}"))?;
        Ok(Self::new(client, base_url))
    }

    /// Absolute URL of an action path.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[async_trait(?Send)]
impl HttpTransport for ReqwestTransport {
    async fn request(
        &self,
        path: &str,
        request: HttpRequest,
    ) -> Result<HttpResponse, TransportError> {
        let url = self.endpoint(path);
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let response = builder.send().await.map_err(|err| TransportError::Request {
            path: path.to_string(),
            message: err.to_string(),
        })?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|err| TransportError::Body {
            path: path.to_string(),
            message: err.to_string(),
        })?;
        let json = match serde_json::from_str(&text) {
            Ok(json) => json,
            Err(_) if text.trim().is_empty() || !(200..300).contains(&status) => Value::Null,
            Err(err) => {
                return Err(TransportError::Body {
                    path: path.to_string(),
                    message: err.to_string(),
                });
            }
        };
        Ok(HttpResponse { status, json })
    }
}

/// Poll timer on the tokio clock.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct TokioSleeper;

#[async_trait(?Send)]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

pub(crate) type CliApi = ApiClient<ReqwestTransport>;

/// Application context passed to command handlers.
#[derive(Clone, Debug)]
pub(crate) struct AppContext {
    pub(crate) config: ClientConfig,
    pub(crate) transport: ReqwestTransport,
    pub(crate) token: Option<String>,
    pub(crate) output: OutputFormat,
}

impl AppContext {
    /// Build the shared client, tagging every request with `trace_id`.
    pub(crate) fn new(
        config: ClientConfig,
        token: Option<String>,
        output: OutputFormat,
        trace_id: &str,
    ) -> CliResult<Self> {
        let base_url = parse_url(&config.api_base_url).map_err(CliError::validation)?;
        let mut default_headers = HeaderMap::new();
        let request_id = HeaderValue::from_str(trace_id).map_err(|_| {
            CliError::failure(anyhow!("trace identifier contains invalid characters"))
        })?;
        default_headers.insert(HEADER_REQUEST_ID, request_id);
        let client = Client::builder()
            .timeout(config.request_timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            config,
            transport: ReqwestTransport::new(client, base_url),
            token: token.filter(|token| !token.trim().is_empty()),
            output,
        })
    }

    /// Client without credentials.
    pub(crate) fn anonymous_api(&self) -> Rc<CliApi> {
        Rc::new(ApiClient::new(self.transport.clone()))
    }

    /// Client carrying the session token.
    pub(crate) fn api(&self) -> CliResult<Rc<CliApi>> {
        let token = self.token.clone().ok_or_else(CliError::session_expired)?;
        Ok(Rc::new(ApiClient::with_token(
            self.transport.clone(),
            Some(token),
        )))
    }
}

/// Parse the API URL provided to the CLI.
pub(crate) fn parse_url(input: &str) -> Result<Url, String> {
    input
        .parse::<Url>()
        .map_err(|err| format!("invalid URL '{input}': {err}"))
}
