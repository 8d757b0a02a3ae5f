//! Entity store behaviour observed through the recording gateway: paging
//! policy, stale-but-valid failures, refresh after mutation.

mod support;

use std::time::Duration;

use backoffice_core::entities::{jobs, timesheets};
use backoffice_core::FetchOutcome;
use backoffice_domain::constants::MSG_NO_ACCESS_TOKEN;
use backoffice_domain::{RecordId, RequestErrorKind};
use serde_json::json;
use support::{page, query_param, Harness};

#[tokio::test]
async fn search_and_filter_reset_to_first_page() {
    let harness = Harness::signed_in();
    harness.gateway.set_fallback_body(page(&[1, 2], 1, 50));
    let store = harness.store("candidates.list");

    store.go_to_page(4).await.unwrap();
    store.search("x").await.unwrap();
    let request = harness.gateway.last_request().unwrap();
    assert_eq!(query_param(&request, "page").as_deref(), Some("1"));

    store.go_to_page(3).await.unwrap();
    store.filter_by("isActive", true).await.unwrap();
    let request = harness.gateway.last_request().unwrap();
    assert_eq!(query_param(&request, "page").as_deref(), Some("1"));
    assert_eq!(query_param(&request, "isActive").as_deref(), Some("true"));
    assert_eq!(query_param(&request, "search").as_deref(), Some("x"));
}

#[tokio::test]
async fn successful_mutation_triggers_exactly_one_refetch() {
    let harness = Harness::signed_in();
    harness.gateway.push_body(page(&[1, 2, 3], 2, 23));
    let store = harness.store("timesheets.list");
    store.go_to_page(2).await.unwrap();
    let before = store.filters();

    harness.gateway.push_body(json!({"success": true, "statusCode": 200, "message": "Timesheet approved"}));
    harness.gateway.push_body(page(&[1, 3], 2, 22));
    let outcome = store.mutate(timesheets::approve(2_i64)).await;

    assert!(outcome.success);
    assert_eq!(outcome.message, "Timesheet approved");
    let lists = harness.gateway.requests_to("timesheets.list");
    assert_eq!(lists.len(), 2);
    assert_eq!(query_param(&lists[1], "page").as_deref(), Some("2"));
    assert_eq!(store.filters(), before);
    assert_eq!(store.state().pagination.total_count, 22);
}

#[tokio::test]
async fn failed_fetch_keeps_items_and_pagination() {
    let harness = Harness::signed_in();
    harness.gateway.push_body(page(&[1, 2], 1, 12));
    let store = harness.store("clients.list");
    store.fetch(None).await.unwrap();
    let before = store.state();

    harness.gateway.push_body(json!({"success": false, "statusCode": 503, "message": "Maintenance"}));
    let err = store.go_to_page(2).await.unwrap_err();
    assert_eq!(err.http_status, Some(503));

    let after = store.state();
    assert_eq!(after.items, before.items);
    assert_eq!(after.pagination, before.pagination);
    assert_eq!(after.error.as_deref(), Some("Maintenance"));
    assert!(!after.loading);
}

#[tokio::test]
async fn go_to_page_adopts_server_page() {
    let harness = Harness::signed_in();
    harness.gateway.push_body(json!({"success": true, "data": {"items": [{"id": 1}], "page": 2}}));
    harness.gateway.push_body(json!({
        "success": true,
        "data": {"items": [{"id": 9}], "currentPage": 3, "totalPages": 5}
    }));
    let store = harness.store("jobs.posted.list");
    store.go_to_page(2).await.unwrap();

    store.go_to_page(3).await.unwrap();
    let state = store.state();
    assert_eq!(state.items.len(), 1);
    assert_eq!(state.items[0].id, RecordId::Number(9));
    assert_eq!(state.pagination.page, 3);
    assert_eq!(state.pagination.total_pages, 5);
}

#[tokio::test]
async fn fetch_without_token_reports_missing_token() {
    let harness = Harness::signed_out();
    harness.session.initialize();
    let store = harness.store("jobs.permanent.list");

    let err = store.fetch(None).await.unwrap_err();
    assert_eq!(err.kind, RequestErrorKind::Unauthenticated);

    let state = store.state();
    assert_eq!(state.error.as_deref(), Some(MSG_NO_ACCESS_TOKEN));
    assert!(state.items.is_empty());
    assert!(!state.loading);
    assert_eq!(harness.gateway.request_count(), 0);
}

#[tokio::test]
async fn rejected_create_reports_server_message_without_refetch() {
    let harness = Harness::signed_in();
    let store = harness.store("jobs.permanent.list");
    harness.gateway.push_body(json!({"success": false, "message": "Validation failed"}));

    let outcome = store.mutate(jobs::create_permanent(json!({"title": ""}))).await;

    assert!(!outcome.success);
    assert_eq!(outcome.message, "Validation failed");
    let state = store.state();
    assert_eq!(state.error.as_deref(), Some("Validation failed"));
    assert!(!state.loading);
    assert!(harness.gateway.requests_to("jobs.permanent.list").is_empty());
}

#[tokio::test]
async fn rapid_paging_applies_only_the_last_response() {
    let harness = Harness::signed_in();
    harness.gateway.push_delayed(Duration::from_millis(150), page(&[1], 1, 30));
    harness.gateway.push_delayed(Duration::from_millis(100), page(&[11], 2, 30));
    harness.gateway.push_delayed(Duration::from_millis(5), page(&[21], 3, 30));
    let store = std::sync::Arc::new(harness.store("bookings.list"));

    let mut handles = Vec::new();
    for target in 1..=3 {
        let store = store.clone();
        handles.push(tokio::spawn(async move { store.go_to_page(target).await }));
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let outcomes: Vec<FetchOutcome> =
        join_in_order(handles).await.into_iter().map(Result::unwrap).collect();

    assert_eq!(
        outcomes,
        vec![FetchOutcome::Superseded, FetchOutcome::Superseded, FetchOutcome::Applied]
    );
    let state = store.state();
    assert_eq!(state.items[0].id, RecordId::Number(21));
    assert_eq!(state.pagination.page, 3);
    assert!(!state.loading);
}

async fn join_in_order(
    handles: Vec<tokio::task::JoinHandle<Result<FetchOutcome, backoffice_domain::RequestError>>>,
) -> Vec<Result<FetchOutcome, backoffice_domain::RequestError>> {
    futures::future::join_all(handles).await.into_iter().map(|joined| joined.unwrap()).collect()
}
