//! Integration tests for AppContext lifecycle
//!
//! Drive the fully wired context (real `ApiClient`, in-memory storage)
//! against a wiremock admin API.

use std::sync::Arc;
use std::time::Duration;

use backoffice_app::AppContext;
use backoffice_core::testing::token_expiring_at;
use backoffice_core::{FetchOutcome, MemorySessionStorage};
use backoffice_domain::constants::{KEY_ACCESS_TOKEN, MSG_NO_ACCESS_TOKEN};
use backoffice_domain::{
    ApiConfig, Config, LogoutReason, RecordId, SessionConfig, SessionStatus, StorageBackend,
};
use chrono::Utc;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(server: &MockServer, expiry_check_interval_secs: u64) -> Config {
    Config {
        api: ApiConfig { base_url: server.uri(), ..ApiConfig::default() },
        session: SessionConfig { storage: StorageBackend::Memory, expiry_check_interval_secs },
        ..Config::default()
    }
}

fn valid_token() -> String {
    token_expiring_at(Utc::now() + chrono::Duration::hours(1))
}

fn signed_in_context(server: &MockServer, token: &str) -> (AppContext, Arc<MemorySessionStorage>) {
    let storage = Arc::new(MemorySessionStorage::with_entries([(KEY_ACCESS_TOKEN, token)]));
    let ctx = AppContext::with_storage(test_config(server, 0), storage.clone())
        .expect("context should build");
    (ctx, storage)
}

fn candidates_page() -> serde_json::Value {
    json!({
        "success": true,
        "statusCode": 200,
        "data": {
            "items": [{"id": 1, "name": "Ada"}, {"id": 2, "name": "Grace"}],
            "page": 1,
            "pageSize": 10,
            "totalCount": 2,
            "totalPages": 1
        }
    })
}

async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

#[tokio::test]
async fn start_without_stored_session_is_unauthenticated() {
    let server = MockServer::start().await;
    let ctx = AppContext::with_config(test_config(&server, 60)).expect("context should build");

    let status = ctx.start().await;
    assert_eq!(status, SessionStatus::Unauthenticated);
    assert_eq!(ctx.session.state().last_logout, Some(LogoutReason::MissingToken));
    assert!(ctx.watchdog_running().await);

    ctx.shutdown().await.expect("shutdown should succeed");
    assert!(!ctx.watchdog_running().await);
}

#[tokio::test]
async fn watchdog_is_disabled_with_zero_interval() {
    let server = MockServer::start().await;
    let (ctx, _) = signed_in_context(&server, &valid_token());

    assert_eq!(ctx.start().await, SessionStatus::Authenticated);
    assert!(!ctx.watchdog_running().await);
    ctx.shutdown().await.unwrap();
}

#[tokio::test]
async fn expired_stored_token_is_discarded_on_start() {
    let server = MockServer::start().await;
    let expired = token_expiring_at(Utc::now() - chrono::Duration::seconds(1));
    let (ctx, storage) = signed_in_context(&server, &expired);

    assert_eq!(ctx.start().await, SessionStatus::Unauthenticated);
    assert!(!storage.contains(KEY_ACCESS_TOKEN));
    ctx.shutdown().await.unwrap();
}

#[tokio::test]
async fn list_fetch_without_session_never_reaches_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

    let ctx = AppContext::with_config(test_config(&server, 0)).unwrap();
    ctx.start().await;

    let err = ctx.stores.clients.fetch(None).await.unwrap_err();
    assert_eq!(err.user_message(), MSG_NO_ACCESS_TOKEN);
    assert_eq!(ctx.stores.clients.state().error.as_deref(), Some(MSG_NO_ACCESS_TOKEN));
    ctx.shutdown().await.unwrap();
}

#[tokio::test]
async fn login_then_fetch_uses_new_token() {
    let server = MockServer::start().await;
    let token = valid_token();

    Mock::given(method("POST"))
        .and(path("/admin/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Login successful",
            "data": {
                "access_token": token,
                "admin_details": {"id": 1, "username": "admin", "full_name": "Admin", "email": "a@x.test", "role_id": 1},
                "access": {"id": 1, "role_name": "Super Admin", "role_description": "", "access": ["candidates"]}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/get-all-candidate"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .and(query_param("page", "1"))
        .and(query_param("pageSize", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidates_page()))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = AppContext::with_config(test_config(&server, 0)).unwrap();
    assert_eq!(ctx.start().await, SessionStatus::Unauthenticated);

    let outcome = ctx.login("a@x.test", "secret").await;
    assert!(outcome.success, "login failed: {}", outcome.message);
    assert!(ctx.session.has_permission("candidates"));

    let fetched = ctx.stores.candidates.fetch(None).await.unwrap();
    assert_eq!(fetched, FetchOutcome::Applied);

    let state = ctx.stores.candidates.state();
    assert_eq!(state.items.len(), 2);
    assert_eq!(state.pagination.total_count, 2);
    assert!(!state.loading);
    ctx.shutdown().await.unwrap();
}

#[tokio::test]
async fn server_401_ends_session_and_clears_stores() {
    let server = MockServer::start().await;
    let token = valid_token();

    Mock::given(method("GET"))
        .and(path("/get-all-candidate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidates_page()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/get-all-candidate"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let (ctx, storage) = signed_in_context(&server, &token);
    ctx.start().await;

    ctx.stores.candidates.fetch(None).await.unwrap();
    assert!(ctx.stores.candidates.select(&RecordId::Number(2)));

    assert!(ctx.stores.candidates.refresh().await.is_err());
    assert!(!ctx.session.is_authenticated());
    assert_eq!(ctx.session.state().last_logout, Some(LogoutReason::Unauthorized));
    assert!(!storage.contains(KEY_ACCESS_TOKEN));

    let stores = Arc::clone(&ctx.stores);
    let cleared = wait_until(move || {
        let state = stores.candidates.state();
        state.items.is_empty() && state.selected.is_none()
    })
    .await;
    assert!(cleared, "stores should be reset after forced logout");
    ctx.shutdown().await.unwrap();
}

#[tokio::test]
async fn logout_resets_stores_immediately() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Client"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{"id": "c-1", "companyName": "Acme"}],
            "totalCount": 1
        })))
        .mount(&server)
        .await;

    let (ctx, _) = signed_in_context(&server, &valid_token());
    ctx.start().await;
    ctx.stores.clients.fetch(None).await.unwrap();
    assert_eq!(ctx.stores.clients.items().len(), 1);

    ctx.logout();
    assert!(ctx.stores.clients.items().is_empty());
    assert_eq!(ctx.session.state().last_logout, Some(LogoutReason::UserRequested));
    ctx.shutdown().await.unwrap();
}

#[tokio::test]
async fn sign_out_followed_at_once_by_sign_in_still_clears_stores() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get-all-candidate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidates_page()))
        .mount(&server)
        .await;

    let (ctx, _) = signed_in_context(&server, &valid_token());
    ctx.start().await;
    ctx.stores.candidates.fetch(None).await.unwrap();
    assert_eq!(ctx.stores.candidates.items().len(), 2);

    // no await in between: the listener only ever sees the final state
    ctx.session.logout();
    ctx.session.set_token(valid_token(), None).unwrap();
    assert!(ctx.session.state().is_authenticated());
    assert_eq!(ctx.session.state().sign_outs, 1);

    let stores = Arc::clone(&ctx.stores);
    let cleared = wait_until(move || stores.candidates.items().is_empty()).await;
    assert!(cleared, "rows of the previous session should be cleared");
    ctx.shutdown().await.unwrap();
}

#[tokio::test]
async fn client_scoped_internal_jobs_store_targets_client_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/internal-jobs/clients/77"))
        .and(query_param("searchTerm", "nurse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jobs": [{"id": 5, "title": "Night nurse"}],
            "totalCount": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (ctx, _) = signed_in_context(&server, &valid_token());
    ctx.start().await;

    let store = ctx.stores.internal_jobs_for_client(77_i64);
    store.search("nurse").await.unwrap();
    assert_eq!(store.items()[0].id, RecordId::Number(5));
    ctx.shutdown().await.unwrap();
}
