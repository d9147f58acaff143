use std::rc::Rc;
use std::time::Duration;

use patchflow_api_models::{ApprovalStatus, ElementKind, UserRole};
use patchflow_test_support::assert::{assert_review_sets_disjoint, assert_stamps_not_ahead};
use patchflow_test_support::fixtures::{
    commit, commit_page, freshness, send_request, send_request_page,
};
use patchflow_test_support::mocks::{FakeTransport, TickSleeper};
use patchflow_ui::core::api::ApiClient;
use patchflow_ui::core::store::{LocalStore, StoreHandle};
use patchflow_ui::features::lists::checker::CheckOutcome;
use patchflow_ui::features::lists::controller::ViewController;
use patchflow_ui::features::lists::dispatcher::{ListDispatcher, LoadOutcome};
use patchflow_ui::features::lists::query::FilterDescriptor;
use patchflow_ui::features::lists::registry::ListSlot;
use patchflow_ui::features::lists::review::{ItemStatus, ReviewTracker};
use serde_json::{Value, json};

type Controller = ViewController<Rc<FakeTransport>, LocalStore>;

fn harness(role: UserRole) -> (Rc<FakeTransport>, LocalStore, Controller) {
    let transport = FakeTransport::new();
    let api = Rc::new(ApiClient::with_token(
        Rc::clone(&transport),
        Some("tok".to_string()),
    ));
    let store = LocalStore::default();
    let dispatcher = Rc::new(ListDispatcher::new(api, store.clone(), 10));
    let controller = ViewController::new(role, dispatcher, Duration::from_secs(15));
    (transport, store, controller)
}

#[tokio::test]
async fn mounting_a_reviewer_view_seeds_the_cache() {
    let (transport, store, controller) = harness(UserRole::TechnicalAreaManager);
    transport.ok(
        "commits/list",
        commit_page(42, &[commit(1, 1000), commit(2, 900)]),
    );
    let untouched = Rc::clone(store.snapshot().lists.get(ListSlot::ProgrammerCommits));

    let tasks = controller.mount(TickSleeper::new(0)).await;

    assert_eq!(tasks.len(), 1);
    let view = controller.presentation(ElementKind::Commits).unwrap();
    assert_eq!(view.items_count, 42);
    assert_eq!(view.latest_update_timestamp, 1000);
    assert_eq!(view.page_count, 5);
    assert!(view.is_review_mode);
    assert!(!view.is_loading);
    assert!(!view.show_updates_badge);

    let state = store.snapshot();
    let cache = state.lists.get(ListSlot::ManagerCommits);
    assert_eq!(cache.page(0).map(|entry| entry.update_timestamp), Some(1000));
    assert!(cache.is_auto_checking);
    assert_stamps_not_ahead(cache);
    assert!(Rc::ptr_eq(
        &untouched,
        state.lists.get(ListSlot::ProgrammerCommits)
    ));

    let sent = transport.requests_to("commits/list");
    assert_eq!(sent[0].request.header("X-Auth-Header"), Some("tok"));
    assert_eq!(
        sent[0].request_data()["filter"],
        json!({"attribute": "approval_status", "value_matches": {"kind": "equals", "value": 0}})
    );
    assert_eq!(sent[0].request_data()["page_number"], json!(0));
    assert_eq!(sent[0].request_data()["limit"], json!(10));

    controller.unmount();
    assert!(tasks[0].handle().is_stopped());
    assert!(!store.snapshot().lists.get(ListSlot::ManagerCommits).is_auto_checking);
}

#[tokio::test]
async fn failed_page_keeps_previous_pages() {
    let (transport, store, controller) = harness(UserRole::Programmer);
    transport
        .ok("commits/list", commit_page(30, &[commit(30, 3000)]))
        .ok("commits/list", commit_page(30, &[commit(20, 2000)]))
        .fail("commits/list");
    transport.ok("sendRequests/list", send_request_page(0, &[]));
    let _tasks = controller.mount(TickSleeper::new(0)).await;

    assert_eq!(
        controller.change_page(ElementKind::Commits, 1).await.unwrap(),
        LoadOutcome::Fetched
    );
    assert_eq!(
        controller.change_page(ElementKind::Commits, 2).await.unwrap(),
        LoadOutcome::Failed
    );

    let view = controller.presentation(ElementKind::Commits).unwrap();
    assert!(view.display_error);
    assert!(!view.is_loading);
    assert!(view.table_data.is_empty());
    let state = store.snapshot();
    let cache = state.lists.get(ListSlot::ProgrammerCommits);
    assert_eq!(cache.rows(1)[0].id(), 20);
    assert_eq!(cache.rows(0)[0].id(), 30);
}

#[tokio::test]
async fn cached_fresh_pages_skip_the_network() {
    let (transport, _store, controller) = harness(UserRole::Client);
    transport.ok(
        "sendRequests/list",
        send_request_page(1, &[send_request(4, 500)]),
    );
    let tasks = controller.mount(TickSleeper::new(0)).await;

    assert_eq!(
        controller
            .change_page(ElementKind::SendRequests, 0)
            .await
            .unwrap(),
        LoadOutcome::Cached
    );
    assert_eq!(transport.requests_to("sendRequests/list").len(), 1);

    transport.ok("sendRequests/latestUpdate", freshness(900));
    assert_eq!(
        tasks[0].check_once().await,
        CheckOutcome::Updated {
            previous: 500,
            latest: 900
        }
    );
    assert!(
        controller
            .presentation(ElementKind::SendRequests)
            .unwrap()
            .show_updates_badge
    );
    assert_eq!(
        controller
            .change_page(ElementKind::SendRequests, 0)
            .await
            .unwrap(),
        LoadOutcome::Fetched
    );
    assert_eq!(transport.requests_to("sendRequests/list").len(), 2);

    assert_eq!(
        controller.reload(ElementKind::SendRequests).await.unwrap(),
        LoadOutcome::Fetched
    );
    assert_eq!(transport.requests_to("sendRequests/list").len(), 3);
}

#[tokio::test]
async fn one_review_completes_while_another_is_in_flight() {
    let (transport, _store, controller) = harness(UserRole::TechnicalAreaManager);
    transport.ok(
        "commits/list",
        commit_page(2, &[commit(9, 200), commit(7, 100)]),
    );
    let _tasks = controller.mount(TickSleeper::new(0)).await;

    let release = transport.hold("commits/review", Value::Null);
    transport.ok("commits/review", Value::Null);

    let controller = &controller;
    let nine = controller.review_item(ElementKind::Commits, 9, ApprovalStatus::Approved);
    let seven = async move {
        let status = controller
            .review_item(ElementKind::Commits, 7, ApprovalStatus::Rejected)
            .await;
        let seen = controller.presentation(ElementKind::Commits);
        release.release();
        (status, seen)
    };
    let (nine, (seven, seen)) = tokio::join!(nine, seven);

    let seen = seen.unwrap();
    assert_eq!(seven.unwrap(), ItemStatus::Succeeded);
    assert_eq!(seen.in_progress, vec![9]);
    assert_eq!(seen.succeeded, vec![7]);
    assert_eq!(nine.unwrap(), ItemStatus::Succeeded);

    let sent = transport.requests_to("commits/review");
    assert_eq!(sent[0].request_data(), json!({"id": 9, "approval_status": 1}));
    assert_eq!(sent[1].request_data(), json!({"id": 7, "approval_status": -1}));
}

#[tokio::test]
async fn filter_switch_clears_outcomes_but_not_in_flight_reviews() {
    let (transport, _store, controller) = harness(UserRole::TechnicalAreaManager);
    transport.ok(
        "commits/list",
        commit_page(3, &[commit(3, 300), commit(4, 200)]),
    );
    let _tasks = controller.mount(TickSleeper::new(0)).await;

    transport.respond("commits/review", 500, Value::Null);
    let release = transport.hold("commits/review", Value::Null);

    let failed = controller
        .review_item(ElementKind::Commits, 3, ApprovalStatus::Approved)
        .await;
    assert_eq!(failed.unwrap(), ItemStatus::Failed);
    assert!(
        controller
            .review_item(ElementKind::Commits, 3, ApprovalStatus::Approved)
            .await
            .is_err()
    );

    let controller = &controller;
    let four = controller.review_item(ElementKind::Commits, 4, ApprovalStatus::Approved);
    let switch = async move {
        controller
            .set_filter(ElementKind::Commits, FilterDescriptor::history())
            .await
            .unwrap();
        let seen = controller.presentation(ElementKind::Commits);
        release.release();
        seen
    };
    let (four, seen) = tokio::join!(four, switch);

    let seen = seen.unwrap();
    assert!(seen.failed.is_empty());
    assert_eq!(seen.in_progress, vec![4]);
    assert!(!seen.is_review_mode);
    assert_eq!(seen.current_page, 0);
    assert_eq!(four.unwrap(), ItemStatus::Succeeded);
    assert_eq!(controller.item_status(ElementKind::Commits, 3), ItemStatus::Idle);
}

#[tokio::test]
async fn failed_review_can_be_retried_after_acknowledgement() {
    let (transport, _store, controller) = harness(UserRole::TechnicalAreaManager);
    transport.ok("commits/list", commit_page(1, &[commit(5, 50)]));
    let _tasks = controller.mount(TickSleeper::new(0)).await;
    transport
        .respond("commits/review", 500, Value::Null)
        .ok("commits/review", Value::Null);

    let first = controller
        .review_item(ElementKind::Commits, 5, ApprovalStatus::Approved)
        .await;
    assert_eq!(first.unwrap(), ItemStatus::Failed);
    assert!(controller.acknowledge_failure(ElementKind::Commits, 5).unwrap());
    let second = controller
        .review_item(ElementKind::Commits, 5, ApprovalStatus::Approved)
        .await;
    assert_eq!(second.unwrap(), ItemStatus::Succeeded);
}

#[tokio::test]
async fn empty_search_shows_history() {
    let (transport, _store, controller) = harness(UserRole::RevisionOfficeManager);
    transport.ok("sendRequests/list", send_request_page(0, &[]));
    let _tasks = controller.mount(TickSleeper::new(0)).await;

    controller
        .search(ElementKind::SendRequests, "hotfix")
        .await
        .unwrap();
    let searching = controller.presentation(ElementKind::SendRequests).unwrap();
    assert!(searching.is_searching);
    assert!(!searching.is_review_mode);

    controller
        .search(ElementKind::SendRequests, "")
        .await
        .unwrap();
    let view = controller.presentation(ElementKind::SendRequests).unwrap();
    assert_eq!(view.filter, FilterDescriptor::history());
    assert!(!view.is_searching);

    let sent = transport.requests_to("sendRequests/list");
    let last = sent.last().unwrap();
    assert_eq!(
        last.request_data()["filter"]["value_matches"],
        json!({"kind": "not_equals", "value": 0})
    );
    assert_eq!(
        sent[1].request_data()["filter"]["value_matches"],
        json!({"kind": "contains", "value": "hotfix"})
    );
}

#[tokio::test]
async fn sort_toggles_and_refetches_the_current_page() {
    let (transport, _store, controller) = harness(UserRole::Client);
    transport.ok("sendRequests/list", send_request_page(0, &[]));
    let _tasks = controller.mount(TickSleeper::new(0)).await;

    controller
        .sort(ElementKind::SendRequests, "timestamp")
        .await
        .unwrap();
    controller
        .sort(ElementKind::SendRequests, "timestamp")
        .await
        .unwrap();

    let sent = transport.requests_to("sendRequests/list");
    assert_eq!(sent.len(), 3);
    assert_eq!(
        sent[1].request_data()["sorting"],
        json!({"column_key": "timestamp", "direction": "desc"})
    );
    assert_eq!(
        sent[2].request_data()["sorting"],
        json!({"column_key": "timestamp", "direction": "asc"})
    );
}

#[tokio::test]
async fn lists_outside_the_role_are_rejected() {
    let (_transport, _store, controller) = harness(UserRole::Client);
    assert!(controller.change_page(ElementKind::Commits, 0).await.is_err());
    assert!(controller.presentation(ElementKind::Commits).is_none());
    assert_eq!(controller.kinds(), vec![ElementKind::SendRequests]);
}

#[test]
fn tracker_sets_stay_disjoint() {
    let mut tracker = ReviewTracker::default();
    for id in 1..=6 {
        tracker.begin(id).unwrap();
    }
    for id in 1..=6 {
        tracker.complete(id, id % 2 == 0).unwrap();
        assert_review_sets_disjoint(&tracker);
    }
    tracker.clear_outcomes();
    assert!(tracker.is_empty());
}
