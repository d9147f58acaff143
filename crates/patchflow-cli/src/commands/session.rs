//! `login`, `whoami` and `logout`.

use std::rc::Rc;

use anyhow::anyhow;
use patchflow_ui::core::navigation::visible_sections;
use patchflow_ui::core::store::LocalStore;
use patchflow_ui::features::session::SessionService;

use crate::cli::{LoginArgs, require_text};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{render_message, render_token, render_user};

pub(crate) async fn handle_login(ctx: &AppContext, args: LoginArgs) -> CliResult<()> {
    let username = require_text("username", &args.username)?;
    let password = match args.password {
        Some(password) => password,
        None => rpassword::prompt_password("password: ")
            .map_err(|err| CliError::failure(anyhow!("failed to read password: {err}")))?,
    };
    let api = ctx.anonymous_api();
    let service = SessionService::new(Rc::clone(&api), LocalStore::default());
    service.login(username, &password).await.map_err(|err| {
        if err.is_unauthorized() {
            CliError::session("invalid username or password")
        } else {
            err.into()
        }
    })?;
    let token = api
        .access_token()
        .ok_or_else(|| CliError::failure(anyhow!("server issued no access token")))?;
    render_token(&token, ctx.output)
}

pub(crate) async fn handle_whoami(ctx: &AppContext) -> CliResult<()> {
    let service = SessionService::new(ctx.api()?, LocalStore::default());
    let user = service.fetch_user_info().await?;
    render_user(&user, &visible_sections(&user), ctx.output)
}

pub(crate) async fn handle_logout(ctx: &AppContext) -> CliResult<()> {
    let service = SessionService::new(ctx.api()?, LocalStore::default());
    service.logout().await?;
    render_message("logged out", ctx.output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use crate::client::ReqwestTransport;
    use httpmock::MockServer;
    use httpmock::prelude::*;
    use patchflow_config::ClientConfig;
    use reqwest::Client;
    use serde_json::json;

    fn context_with(server: &MockServer, token: Option<&str>) -> AppContext {
        let config = ClientConfig {
            api_base_url: format!("{}/main.php", server.base_url()),
            ..ClientConfig::default()
        };
        AppContext {
            transport: ReqwestTransport::new(
                Client::new(),
                config.api_base_url.parse().expect("valid URL"),
            ),
            config,
            token: token.map(str::to_string),
            output: OutputFormat::Json,
        }
    }

    #[tokio::test]
    async fn login_posts_legacy_envelope() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/main.php/auth/login")
                .json_body(json!({
                    "module": "login",
                    "action": "access",
                    "request_data": {
                        "username": "ada",
                        "hash_pass": "5E884898DA28047151D0E56F8DC6292773603D0D6AABBDD62A11EF721D1542D8"
                    }
                }));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"access_token": "abc"}));
        });

        handle_login(
            &context_with(&server, None),
            LoginArgs {
                username: " ada ".to_string(),
                password: Some("password".to_string()),
            },
        )
        .await
        .expect("login should succeed");
        mock.assert();
    }

    #[tokio::test]
    async fn rejected_login_is_a_session_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/main.php/auth/login");
            then.status(401);
        });

        let err = handle_login(
            &context_with(&server, None),
            LoginArgs {
                username: "ada".to_string(),
                password: Some("nope".to_string()),
            },
        )
        .await
        .expect_err("credentials rejected");
        assert_eq!(err.exit_code(), 4);
    }

    #[tokio::test]
    async fn whoami_requires_a_token() {
        let server = MockServer::start_async().await;
        let err = handle_whoami(&context_with(&server, None))
            .await
            .expect_err("token missing");
        assert!(matches!(err, CliError::Session(_)));
    }

    #[tokio::test]
    async fn whoami_sends_the_auth_header() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/main.php/user/info")
                .header("X-Auth-Header", "abc")
                .json_body(json!({"request_data": {}}));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"id": 1, "name": "ada", "roles": ["programmer"]}));
        });

        handle_whoami(&context_with(&server, Some("abc")))
            .await
            .expect("whoami should succeed");
        mock.assert();
    }

    #[tokio::test]
    async fn logout_sends_signout() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/main.php/auth/logout")
                .header("X-Auth-Header", "abc")
                .json_body(json!({"module": "login", "action": "signout", "request_data": {}}));
            then.status(200);
        });

        handle_logout(&context_with(&server, Some("abc")))
            .await
            .expect("logout should succeed");
        mock.assert();
    }
}
