//! Login, logout and profile flows.
//!
//! # Design
//! - Each flow emits request/outcome [`AuthEvent`]s around one API call.
//! - The API client's token follows the session slice: set on login, dropped on logout
//!   and on expiry.

use std::rc::Rc;

use patchflow_api_models::UserInfo;
use tracing::{info, warn};

use crate::core::api::{ApiClient, ApiError};
use crate::core::auth::AuthEvent;
use crate::core::store::StoreHandle;
use crate::core::transport::HttpTransport;

/// Session flows bound to a client and a store.
pub struct SessionService<T, S> {
    api: Rc<ApiClient<T>>,
    store: S,
}

impl<T: HttpTransport, S: StoreHandle> SessionService<T, S> {
    /// Bind the flows.
    #[must_use]
    pub const fn new(api: Rc<ApiClient<T>>, store: S) -> Self {
        Self { api, store }
    }

    /// Log in with `username` and `password`.
    ///
    /// # Errors
    ///
    /// The login failure; the session records it as `login_failed`.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ApiError> {
        self.store.dispatch_auth(&AuthEvent::LoginRequested);
        match self.api.login(username, password).await {
            Ok(response) => {
                info!(username, "logged in");
                self.store.dispatch_auth(&AuthEvent::LoginSucceeded {
                    access_token: response.access_token,
                });
                Ok(())
            }
            Err(err) => {
                warn!(username, error = %err, "login failed");
                self.store.dispatch_auth(&AuthEvent::LoginFailed);
                Err(err)
            }
        }
    }

    /// Log out; the local session is cleared whatever the server answers.
    ///
    /// # Errors
    ///
    /// The logout failure.
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.store.dispatch_auth(&AuthEvent::LogoutRequested);
        let result = self.api.logout().await;
        match &result {
            Ok(()) => self.store.dispatch_auth(&AuthEvent::LogoutSucceeded),
            Err(err) => {
                warn!(error = %err, "logout failed");
                self.store.dispatch_auth(&AuthEvent::LogoutFailed);
            }
        }
        result
    }

    /// Fetch the profile of the logged-in user.
    ///
    /// # Errors
    ///
    /// The request failure; the user slice records `server_error` so the view can retry.
    pub async fn fetch_user_info(&self) -> Result<UserInfo, ApiError> {
        self.store.dispatch_auth(&AuthEvent::UserInfoRequested);
        match self.api.user_info().await {
            Ok(user) => {
                self.store
                    .dispatch_auth(&AuthEvent::UserInfoObtained(user.clone()));
                Ok(user)
            }
            Err(err) if err.is_unauthorized() => {
                self.expire();
                Err(err)
            }
            Err(err) => {
                warn!(error = %err, "user info request failed");
                self.store.dispatch_auth(&AuthEvent::UserInfoFailed);
                Err(err)
            }
        }
    }

    /// Drop the token after the server rejected it.
    pub fn expire(&self) {
        self.api.set_access_token(None);
        self.store.dispatch_auth(&AuthEvent::SessionExpired);
    }
}
