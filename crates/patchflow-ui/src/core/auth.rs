//! Session and user-profile slices.
//!
//! # Design
//! - Keep auth state as plain data with pure reducers so it can be stored and cleared
//!   without side effects.
//! - A blank token counts as logged out.
//! - Passwords are hashed before they leave this module; plaintext is never stored.

use patchflow_api_models::UserInfo;
use sha2::{Digest, Sha256};

/// Login/logout progress and the access token.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SessionState {
    /// Token sent with authenticated requests.
    pub access_token: Option<String>,
    /// A login request is in flight.
    pub is_logging_in: bool,
    /// The last login attempt was rejected.
    pub login_failed: bool,
    /// A logout request is in flight.
    pub is_logging_out: bool,
    /// The server rejected the token; the user must log in again.
    pub is_session_expired: bool,
}

impl SessionState {
    /// Whether a usable token is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        !self.is_session_expired
            && self
                .access_token
                .as_deref()
                .is_some_and(|token| !token.trim().is_empty())
    }
}

/// Profile of the logged-in user and its retrieval status.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct UserState {
    /// Profile, once obtained.
    pub info: Option<UserInfo>,
    /// The profile request succeeded.
    pub info_obtained: bool,
    /// The profile request failed; the view offers a retry.
    pub server_error: bool,
}

/// Session and profile transitions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthEvent {
    /// Credentials were submitted.
    LoginRequested,
    /// The server issued a token.
    LoginSucceeded {
        /// Issued token.
        access_token: String,
    },
    /// The server rejected the credentials.
    LoginFailed,
    /// A logout was requested.
    LogoutRequested,
    /// The server closed the session.
    LogoutSucceeded,
    /// The logout request failed; the local session is dropped anyway.
    LogoutFailed,
    /// The profile was requested.
    UserInfoRequested,
    /// The profile was obtained.
    UserInfoObtained(UserInfo),
    /// The profile request failed.
    UserInfoFailed,
    /// An authenticated request was rejected with 401.
    SessionExpired,
}

/// Apply `event` to the session slice.
#[must_use]
pub fn reduce_session(state: &SessionState, event: &AuthEvent) -> SessionState {
    let mut next = state.clone();
    match event {
        AuthEvent::LoginRequested => {
            next.is_logging_in = true;
            next.login_failed = false;
        }
        AuthEvent::LoginSucceeded { access_token } => {
            next.access_token = Some(access_token.clone());
            next.is_logging_in = false;
            next.login_failed = false;
            next.is_session_expired = false;
        }
        AuthEvent::LoginFailed => {
            next.is_logging_in = false;
            next.login_failed = true;
        }
        AuthEvent::LogoutRequested => {
            next.is_logging_out = true;
        }
        AuthEvent::LogoutSucceeded | AuthEvent::LogoutFailed => {
            next = SessionState::default();
        }
        AuthEvent::SessionExpired => {
            next.access_token = None;
            next.is_session_expired = true;
        }
        AuthEvent::UserInfoRequested
        | AuthEvent::UserInfoObtained(_)
        | AuthEvent::UserInfoFailed => {}
    }
    next
}

/// Apply `event` to the profile slice.
#[must_use]
pub fn reduce_user(state: &UserState, event: &AuthEvent) -> UserState {
    match event {
        AuthEvent::UserInfoRequested => UserState {
            server_error: false,
            ..state.clone()
        },
        AuthEvent::UserInfoObtained(info) => UserState {
            info: Some(info.clone()),
            info_obtained: true,
            server_error: false,
        },
        AuthEvent::UserInfoFailed => UserState {
            info_obtained: false,
            server_error: true,
            ..state.clone()
        },
        AuthEvent::LogoutSucceeded | AuthEvent::LogoutFailed | AuthEvent::SessionExpired => {
            UserState::default()
        }
        AuthEvent::LoginRequested
        | AuthEvent::LoginSucceeded { .. }
        | AuthEvent::LoginFailed
        | AuthEvent::LogoutRequested => state.clone(),
    }
}

/// Uppercase hex SHA-256 digest of `password`.
#[must_use]
pub fn hash_password(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    digest.iter().map(|byte| format!("{byte:02X}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchflow_api_models::UserRole;

    fn profile() -> UserInfo {
        UserInfo {
            id: 4,
            name: "Ada".to_string(),
            roles: vec![UserRole::Programmer],
        }
    }

    #[test]
    fn password_hash_is_uppercase_sha256() {
        assert_eq!(
            hash_password("password"),
            "5E884898DA28047151D0E56F8DC6292773603D0D6AABBDD62A11EF721D1542D8"
        );
        assert_eq!(hash_password("").len(), 64);
    }

    #[test]
    fn login_flow_stores_token() {
        let requested = reduce_session(&SessionState::default(), &AuthEvent::LoginRequested);
        assert!(requested.is_logging_in);
        let ok = reduce_session(
            &requested,
            &AuthEvent::LoginSucceeded {
                access_token: "tok".to_string(),
            },
        );
        assert!(ok.is_authenticated());
        assert!(!ok.is_logging_in);

        let failed = reduce_session(&requested, &AuthEvent::LoginFailed);
        assert!(failed.login_failed);
        assert!(!failed.is_authenticated());
    }

    #[test]
    fn blank_token_is_not_authenticated() {
        let state = SessionState {
            access_token: Some("  ".to_string()),
            ..SessionState::default()
        };
        assert!(!state.is_authenticated());
    }

    #[test]
    fn expiry_drops_token_and_profile() {
        let session = SessionState {
            access_token: Some("tok".to_string()),
            ..SessionState::default()
        };
        let expired = reduce_session(&session, &AuthEvent::SessionExpired);
        assert!(expired.is_session_expired);
        assert!(expired.access_token.is_none());

        let user = reduce_user(&UserState::default(), &AuthEvent::UserInfoObtained(profile()));
        assert!(user.info_obtained);
        assert_eq!(reduce_user(&user, &AuthEvent::SessionExpired), UserState::default());
    }

    #[test]
    fn failed_profile_request_can_be_retried() {
        let failed = reduce_user(&UserState::default(), &AuthEvent::UserInfoFailed);
        assert!(failed.server_error);
        let retry = reduce_user(&failed, &AuthEvent::UserInfoRequested);
        assert!(!retry.server_error);
        assert!(!retry.info_obtained);
    }

    #[test]
    fn logout_resets_session_even_on_failure() {
        let session = SessionState {
            access_token: Some("tok".to_string()),
            is_logging_out: true,
            ..SessionState::default()
        };
        assert_eq!(
            reduce_session(&session, &AuthEvent::LogoutFailed),
            SessionState::default()
        );
    }
}
