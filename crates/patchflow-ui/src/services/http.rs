//! `fetch`-backed [`HttpTransport`].

use async_trait::async_trait;
use gloo_net::http::Request;
use serde_json::Value;

use crate::core::transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError};

/// Transport sending requests to `<base_url>/<path>` through `fetch`.
#[derive(Clone, Debug)]
pub struct GlooTransport {
    base_url: String,
}

impl GlooTransport {
    /// Transport for the API at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait(?Send)]
impl HttpTransport for GlooTransport {
    async fn request(
        &self,
        path: &str,
        request: HttpRequest,
    ) -> Result<HttpResponse, TransportError> {
        let url = format!("{}/{path}", self.base_url);
        let mut req = match request.method {
            HttpMethod::Get => Request::get(&url),
            HttpMethod::Post => Request::post(&url),
        };
        for (name, value) in &request.headers {
            req = req.header(name, value);
        }
        let req = match &request.body {
            Some(body) => req.json(body).map_err(|err| TransportError::Request {
                path: path.to_string(),
                message: err.to_string(),
            })?,
            None => req,
        };
        let response = req.send().await.map_err(|err| TransportError::Request {
            path: path.to_string(),
            message: err.to_string(),
        })?;
        let status = response.status();
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
