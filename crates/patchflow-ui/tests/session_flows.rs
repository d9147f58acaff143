use std::rc::Rc;
use std::time::Duration;

use patchflow_api_models::{ApprovalStatus, ElementKind, InstallStatus, InstallType, UserRole};
use patchflow_test_support::fixtures::{
    commit, commit_page, login, send_request, send_request_page, user,
};
use patchflow_test_support::mocks::{FakeTransport, TickSleeper};
use patchflow_ui::core::api::{ApiClient, ApiError};
use patchflow_ui::core::auth::AuthEvent;
use patchflow_ui::core::store::{LocalStore, StoreHandle};
use patchflow_ui::features::lists::controller::{ControllerError, ViewController};
use patchflow_ui::features::lists::dispatcher::{ListDispatcher, LoadOutcome};
use patchflow_ui::features::lists::review::ItemStatus;
use patchflow_ui::features::send_requests::{DraftError, SendRequestDraft};
use patchflow_ui::features::session::SessionService;
use serde_json::{Value, json};

type Api = ApiClient<Rc<FakeTransport>>;
type Session = SessionService<Rc<FakeTransport>, LocalStore>;
type Controller = ViewController<Rc<FakeTransport>, LocalStore>;

fn session() -> (Rc<FakeTransport>, Rc<Api>, LocalStore, Session) {
    let transport = FakeTransport::new();
    let api = Rc::new(ApiClient::new(Rc::clone(&transport)));
    let store = LocalStore::default();
    let service = SessionService::new(Rc::clone(&api), store.clone());
    (transport, api, store, service)
}

fn view(role: UserRole) -> (Rc<FakeTransport>, LocalStore, Controller) {
    let transport = FakeTransport::new();
    let api = Rc::new(ApiClient::with_token(
        Rc::clone(&transport),
        Some("tok".to_string()),
    ));
    let store = LocalStore::default();
    store.dispatch_auth(&AuthEvent::LoginSucceeded {
        access_token: "tok".to_string(),
    });
    store.dispatch_auth(&AuthEvent::UserInfoObtained(user(1, &[role])));
    let dispatcher = Rc::new(ListDispatcher::new(api, store.clone(), 10));
    let controller = ViewController::new(role, dispatcher, Duration::from_secs(15));
    (transport, store, controller)
}

#[tokio::test]
async fn login_posts_hashed_credentials_in_the_legacy_envelope() {
    let (transport, api, store, service) = session();
    transport.ok("auth/login", login("abc"));

    service.login("ada", "password").await.unwrap();

    let sent = transport.requests_to("auth/login");
    assert_eq!(
        sent[0].request.body,
        Some(json!({
            "module": "login",
            "action": "access",
            "request_data": {
                "username": "ada",
                "hash_pass": "5E884898DA28047151D0E56F8DC6292773603D0D6AABBDD62A11EF721D1542D8"
            }
        }))
    );
    assert_eq!(sent[0].request.header("X-Auth-Header"), None);
    assert_eq!(api.access_token().as_deref(), Some("abc"));
    let state = store.snapshot();
    assert!(state.session.is_authenticated());
    assert!(!state.session.is_logging_in);
}

#[tokio::test]
async fn rejected_login_is_recorded() {
    let (transport, api, store, service) = session();
    transport.respond("auth/login", 401, Value::Null);

    let err = service.login("ada", "wrong").await.unwrap_err();

    assert!(err.is_unauthorized());
    assert!(api.access_token().is_none());
    let state = store.snapshot();
    assert!(state.session.login_failed);
    assert!(!state.session.is_authenticated());
}

#[tokio::test]
async fn logout_clears_the_session_even_when_the_server_fails() {
    let (transport, api, store, service) = session();
    transport
        .ok("auth/login", login("abc"))
        .respond("auth/logout", 500, Value::Null);
    service.login("ada", "password").await.unwrap();

    let result = service.logout().await;

    assert!(matches!(result, Err(ApiError::Status { status: 500 })));
    let sent = transport.requests_to("auth/logout");
    assert_eq!(sent[0].request.header("x-auth-header"), Some("abc"));
    assert_eq!(sent[0].request.body.as_ref().unwrap()["action"], json!("signout"));
    assert!(api.access_token().is_none());
    assert!(!store.snapshot().session.is_authenticated());
}

#[tokio::test]
async fn profile_failure_can_be_retried() {
    let (transport, _api, store, service) = session();
    transport
        .ok("auth/login", login("abc"))
        .respond("user/info", 500, Value::Null)
        .ok(
            "user/info",
            json!({"id": 4, "name": "ada", "roles": ["programmer", "client"]}),
        );
    service.login("ada", "password").await.unwrap();

    assert!(service.fetch_user_info().await.is_err());
    assert!(store.snapshot().user.server_error);

    let profile = service.fetch_user_info().await.unwrap();
    assert!(profile.has_role(UserRole::Client));
    let state = store.snapshot();
    assert!(state.user.info_obtained);
    assert!(!state.user.server_error);
    assert_eq!(state.user.info.as_ref().map(|info| info.id), Some(4));
}

#[tokio::test]
async fn rejected_profile_request_expires_the_session() {
    let (transport, api, store, service) = session();
    transport
        .ok("auth/login", login("abc"))
        .respond("user/info", 403, Value::Null);
    service.login("ada", "password").await.unwrap();

    assert!(service.fetch_user_info().await.unwrap_err().is_unauthorized());

    assert!(api.access_token().is_none());
    assert!(store.snapshot().session.is_session_expired);
}

#[tokio::test]
async fn unauthorized_list_fetch_expires_the_session() {
    let (transport, store, controller) = view(UserRole::Client);
    transport.respond("sendRequests/list", 401, Value::Null);

    let _tasks = controller.mount(TickSleeper::new(0)).await;

    let state = store.snapshot();
    assert!(state.session.is_session_expired);
    assert!(!state.session.is_authenticated());
    assert!(
        controller
            .presentation(ElementKind::SendRequests)
            .unwrap()
            .display_error
    );
}

#[tokio::test]
async fn only_own_pending_elements_are_removable() {
    let (transport, _store, controller) = view(UserRole::Programmer);
    let mut approved = commit(2, 900);
    approved.approval_status = ApprovalStatus::Approved;
    let mut foreign = commit(3, 800);
    foreign.author.id = 9;
    transport.ok(
        "commits/list",
        commit_page(3, &[commit(1, 1000), approved, foreign]),
    );
    transport.ok("sendRequests/list", send_request_page(0, &[]));
    transport.ok("commits/remove", json!({}));
    let _tasks = controller.mount(TickSleeper::new(0)).await;

    for id in [2, 3, 99] {
        let err = controller
            .remove_element(ElementKind::Commits, id)
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::NotRemovable { id: rejected } if rejected == id));
    }
    assert!(transport.requests_to("commits/remove").is_empty());

    let outcome = controller
        .remove_element(ElementKind::Commits, 1)
        .await
        .unwrap();

    assert_eq!(outcome, LoadOutcome::Fetched);
    let sent = transport.requests_to("commits/remove");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].request_data(), json!({"id": 1}));
    assert_eq!(transport.requests_to("commits/list").len(), 2);
}

#[tokio::test]
async fn new_send_request_is_validated_then_submitted() {
    let (transport, _store, controller) = view(UserRole::Programmer);
    transport.ok("commits/list", commit_page(0, &[]));
    transport.ok("sendRequests/list", send_request_page(0, &[]));
    transport.ok("sendRequests/create", Value::Null);
    let _tasks = controller.mount(TickSleeper::new(0)).await;

    let mut draft = SendRequestDraft {
        title: "Release 2.0".to_string(),
        branch: "main".to_string(),
        ..SendRequestDraft::default()
    };
    let err = controller.create_send_request(&draft).await.unwrap_err();
    assert!(matches!(
        err,
        ControllerError::Draft(DraftError::MissingInstallType)
    ));
    assert!(transport.requests_to("sendRequests/create").is_empty());

    draft.install_type = Some(InstallType::NeedsShutdown);
    draft.toggle_client(5);
    draft.toggle_commit(11);
    let outcome = controller.create_send_request(&draft).await.unwrap();

    assert_eq!(outcome, LoadOutcome::Fetched);
    let created = transport.requests_to("sendRequests/create");
    assert_eq!(created[0].request_data()["title"], json!("Release 2.0"));
    assert_eq!(created[0].request_data()["dest_clients"], json!([5]));
    assert_eq!(created[0].request_data()["commits"], json!([11]));
    let lists = transport.requests_to("sendRequests/list");
    assert_eq!(lists.len(), 2);
    assert_eq!(lists[1].request_data()["page_number"], json!(0));
    let view = controller.presentation(ElementKind::SendRequests).unwrap();
    assert!(!view.is_loading);
}

#[tokio::test]
async fn client_feedback_is_tracked_like_a_review() {
    let (transport, _store, controller) = view(UserRole::Client);
    transport.ok(
        "sendRequests/list",
        send_request_page(1, &[send_request(6, 600)]),
    );
    transport.ok("sendRequests/feedback", Value::Null);
    let _tasks = controller.mount(TickSleeper::new(0)).await;

    let status = controller
        .send_feedback(6, InstallStatus::Succeeded, "installed fine")
        .await
        .unwrap();

    assert_eq!(status, ItemStatus::Succeeded);
    assert_eq!(
        controller.item_status(ElementKind::SendRequests, 6),
        ItemStatus::Succeeded
    );
    let sent = transport.requests_to("sendRequests/feedback");
    assert_eq!(
        sent[0].request_data(),
        json!({"id": 6, "install_status": 1, "install_feedback": "installed fine"})
    );
}
