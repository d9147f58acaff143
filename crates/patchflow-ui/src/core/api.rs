//! Typed API client over an [`HttpTransport`].
//!
//! # Design
//! - Every action is a JSON `POST` wrapped in `{request_data}`; login and logout use the
//!   legacy `{module, action, request_data}` envelope.
//! - The access token lives behind interior mutability so callers can share one client.
//! - 401/403 map to [`ApiError::Unauthorized`] so callers can expire the session.

use std::cell::RefCell;

use patchflow_api_models::{
    ApprovalStatus, Commit, ElementKind, ElementRef, Empty, FeedbackData, FreshnessResponse,
    InstallStatus, ItemId, LegacyEnvelope, ListItem, LoginData, LoginResponse, NewSendRequestData,
    PageResponse, RequestEnvelope, ReviewData, SendRequest, UserInfo,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::auth::hash_password;
use crate::core::transport::{HttpRequest, HttpTransport, TransportError};
use crate::features::lists::query::{FilterDescriptor, PageRequest, SortDescriptor};

/// Header carrying the access token.
pub const AUTH_HEADER: &str = "X-Auth-Header";

/// Fixed action paths.
pub mod paths {
    /// Login (legacy envelope).
    pub const LOGIN: &str = "auth/login";
    /// Logout (legacy envelope).
    pub const LOGOUT: &str = "auth/logout";
    /// Profile of the current user.
    pub const USER_INFO: &str = "user/info";
    /// Installation feedback on a send request.
    pub const SEND_REQUEST_FEEDBACK: &str = "sendRequests/feedback";
    /// Create a send request.
    pub const SEND_REQUEST_CREATE: &str = "sendRequests/create";
}

/// Path of a per-list action such as `commits/list`.
#[must_use]
pub fn list_path(kind: ElementKind, action: &str) -> String {
    format!("{}/{action}", kind.as_str())
}

/// Failures surfaced by [`ApiClient`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response could be obtained.
    #[error("transport failure")]
    Transport(#[from] TransportError),
    /// The server rejected the credentials or token.
    #[error("request rejected: not authenticated")]
    Unauthorized,
    /// The server answered with a non-success status.
    #[error("server responded with status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },
    /// The response payload did not match the expected shape.
    #[error("unexpected response payload")]
    Decode {
        /// Underlying decode failure.
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// Whether the failure means the session is no longer valid.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

/// Body of a page request.
#[derive(Debug, Serialize)]
struct PageRequestData<'a> {
    page_number: u32,
    limit: u32,
    sorting: &'a SortDescriptor,
    filter: &'a FilterDescriptor,
}

/// Client for the Patchflow API.
#[derive(Debug)]
pub struct ApiClient<T> {
    transport: T,
    access_token: RefCell<Option<String>>,
}

impl<T: HttpTransport> ApiClient<T> {
    /// Client without a token.
    #[must_use]
    pub const fn new(transport: T) -> Self {
        Self {
            transport,
            access_token: RefCell::new(None),
        }
    }

    /// Client reusing an existing token.
    #[must_use]
    pub fn with_token(transport: T, access_token: Option<String>) -> Self {
        let client = Self::new(transport);
        client.set_access_token(access_token);
        client
    }

    /// Underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Current token.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.access_token.borrow().clone()
    }

    /// Replace the token sent with authenticated requests.
    pub fn set_access_token(&self, access_token: Option<String>) {
        *self.access_token.borrow_mut() = access_token;
    }

    async fn send<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        authenticated: bool,
    ) -> Result<Value, ApiError> {
        let body = serde_json::to_value(body).map_err(|source| ApiError::Decode { source })?;
        let mut request = HttpRequest::post(body);
        if authenticated {
            let Some(token) = self.access_token() else {
                return Err(ApiError::Unauthorized);
            };
            request = request.with_header(AUTH_HEADER, &token);
        }
        debug!(path, authenticated, "api request");
        let response = self.transport.request(path, request).await?;
        match response.status {
            401 | 403 => {
                warn!(path, status = response.status, "api request unauthorized");
                Err(ApiError::Unauthorized)
            }
            status if !response.is_success() => {
                warn!(path, status, "api request failed");
                Err(ApiError::Status { status })
            }
            _ => Ok(response.json),
        }
    }

    async fn send_envelope<B: Serialize>(
        &self,
        path: &str,
        request_data: B,
    ) -> Result<Value, ApiError> {
        self.send(path, &RequestEnvelope::new(request_data), true).await
    }

    /// Log in and keep the issued token.
    ///
    /// # Errors
    ///
    /// [`ApiError::Unauthorized`] when the credentials are rejected.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = LegacyEnvelope {
            module: "login".to_string(),
            action: "access".to_string(),
            request_data: LoginData {
                username: username.to_string(),
                hash_pass: hash_password(password),
            },
        };
        let response: LoginResponse = decode(self.send(paths::LOGIN, &body, false).await?)?;
        self.set_access_token(Some(response.access_token.clone()));
        Ok(response)
    }

    /// Close the server session; the local token is dropped either way.
    ///
    /// # Errors
    ///
    /// Any failure from the logout request.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let body = LegacyEnvelope {
            module: "login".to_string(),
            action: "signout".to_string(),
            request_data: Empty {},
        };
        let result = self.send(paths::LOGOUT, &body, true).await.map(|_| ());
        self.set_access_token(None);
        result
    }

    /// Profile of the logged-in user.
    ///
    /// # Errors
    ///
    /// Transport, status, auth or decode failures.
    pub async fn user_info(&self) -> Result<UserInfo, ApiError> {
        decode(self.send_envelope(paths::USER_INFO, Empty {}).await?)
    }

    /// Fetch one page of `kind`.
    ///
    /// # Errors
    ///
    /// Transport, status, auth or decode failures.
    pub async fn fetch_page(
        &self,
        kind: ElementKind,
        request: &PageRequest,
        limit: u32,
    ) -> Result<PageResponse<ListItem>, ApiError> {
        let data = PageRequestData {
            page_number: request.page,
            limit,
            sorting: &request.query.sorting,
            filter: &request.query.filter,
        };
        let json = self.send_envelope(&list_path(kind, "list"), data).await?;
        match kind {
            ElementKind::Commits => {
                decode::<PageResponse<Commit>>(json).map(|page| page.map_items(ListItem::from))
            }
            ElementKind::SendRequests => {
                decode::<PageResponse<SendRequest>>(json).map(|page| page.map_items(ListItem::from))
            }
        }
    }

    /// Freshness token of `kind`.
    ///
    /// # Errors
    ///
    /// Transport, status, auth or decode failures.
    pub async fn latest_update(&self, kind: ElementKind) -> Result<u64, ApiError> {
        let json = self
            .send_envelope(&list_path(kind, "latestUpdate"), Empty {})
            .await?;
        decode::<FreshnessResponse>(json).map(|freshness| freshness.latest_update_timestamp)
    }

    /// Approve or reject an item; returns the updated row when the server sends one.
    ///
    /// # Errors
    ///
    /// Transport, status, auth or decode failures.
    pub async fn review(
        &self,
        kind: ElementKind,
        id: ItemId,
        approval_status: ApprovalStatus,
    ) -> Result<Option<ListItem>, ApiError> {
        let json = self
            .send_envelope(&list_path(kind, "review"), ReviewData { id, approval_status })
            .await?;
        decode_optional_item(kind, json)
    }

    /// Report installation feedback on a send request.
    ///
    /// # Errors
    ///
    /// Transport, status, auth or decode failures.
    pub async fn send_feedback(
        &self,
        id: ItemId,
        install_status: InstallStatus,
        install_feedback: &str,
    ) -> Result<Option<ListItem>, ApiError> {
        let data = FeedbackData {
            id,
            install_status,
            install_feedback: install_feedback.to_string(),
        };
        let json = self.send_envelope(paths::SEND_REQUEST_FEEDBACK, data).await?;
        decode_optional_item(ElementKind::SendRequests, json)
    }

    /// Create a send request.
    ///
    /// # Errors
    ///
    /// Transport, status or auth failures.
    pub async fn create_send_request(&self, data: NewSendRequestData) -> Result<(), ApiError> {
        self.send_envelope(paths::SEND_REQUEST_CREATE, data)
            .await
            .map(|_| ())
    }

    /// Remove an element.
    ///
    /// # Errors
    ///
    /// Transport, status or auth failures.
    pub async fn remove(&self, kind: ElementKind, id: ItemId) -> Result<(), ApiError> {
        self.send_envelope(&list_path(kind, "remove"), ElementRef { id })
            .await
            .map(|_| ())
    }
}

fn decode<R: DeserializeOwned>(json: Value) -> Result<R, ApiError> {
    serde_json::from_value(json).map_err(|source| ApiError::Decode { source })
}

fn decode_optional_item(kind: ElementKind, json: Value) -> Result<Option<ListItem>, ApiError> {
    let empty = match &json {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if empty {
        return Ok(None);
    }
    let item = match kind {
        ElementKind::Commits => decode::<Commit>(json).map(ListItem::from)?,
        ElementKind::SendRequests => decode::<SendRequest>(json).map(ListItem::from)?,
    };
    Ok(Some(item))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_paths_use_kind_segment() {
        assert_eq!(list_path(ElementKind::Commits, "list"), "commits/list");
        assert_eq!(
            list_path(ElementKind::SendRequests, "latestUpdate"),
            "sendRequests/latestUpdate"
        );
    }

    #[test]
    fn empty_review_payload_means_no_replacement() {
        assert!(matches!(
            decode_optional_item(ElementKind::Commits, Value::Null),
            Ok(None)
        ));
        assert!(matches!(
            decode_optional_item(ElementKind::Commits, serde_json::json!({})),
            Ok(None)
        ));
        assert!(matches!(
            decode_optional_item(ElementKind::Commits, serde_json::json!({"id": "x"})),
            Err(ApiError::Decode { .. })
        ));
    }

    #[test]
    fn only_auth_failures_expire_the_session() {
        assert!(ApiError::Unauthorized.is_unauthorized());
        assert!(!ApiError::Status { status: 500 }.is_unauthorized());
    }
}
