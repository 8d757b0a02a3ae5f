//! Generic entity query store
//!
//! One `QueryStore` per entity type holds `{items, loading, error,
//! pagination, filters}` behind a `watch` channel the UI subscribes to.
//!
//! Overlapping fetches follow a supersession policy: every fetch takes the
//! next sequence number and cancels the fetch before it, and only the
//! response carrying the latest sequence number may touch state. There is
//! therefore at most one live fetch per store, and a slow response can never
//! overwrite a newer one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use backoffice_domain::constants::{DEFAULT_PAGE, DEFAULT_SEARCH_DEBOUNCE_MS};
use backoffice_domain::{
    ApiRequest, FilterPatch, Identifiable, ListFilters, MutationOutcome, Page, QueryFilters,
    QueryState, RecordId, RequestError,
};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::endpoint::ListEndpoint;
use super::mutation::Mutation;
use super::page::into_page;
use crate::ports::{ApiGateway, ApiGatewayExt};

/// What happened to a fetch that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response replaced items, pagination and filters
    Applied,
    /// A newer fetch (or a reset) took over; state was left alone
    Superseded,
}

/// Reactive list container for one entity type
pub struct QueryStore<T, F = ListFilters> {
    name: String,
    gateway: Arc<dyn ApiGateway>,
    endpoint: ListEndpoint,
    initial_filters: F,
    state: watch::Sender<QueryState<T, F>>,
    sequence: AtomicU64,
    in_flight: Mutex<Option<CancellationToken>>,
    pending_search: Mutex<Option<CancellationToken>>,
    search_debounce: Duration,
}

impl<T, F> QueryStore<T, F>
where
    T: DeserializeOwned + Identifiable + Clone + Send + Sync + 'static,
    F: QueryFilters,
{
    pub fn new(name: impl Into<String>, gateway: Arc<dyn ApiGateway>, endpoint: ListEndpoint) -> Self {
        let initial_filters = F::default();
        let (state, _) = watch::channel(QueryState::initial(initial_filters.clone()));
        Self {
            name: name.into(),
            gateway,
            endpoint,
            initial_filters,
            state,
            sequence: AtomicU64::new(0),
            in_flight: Mutex::new(None),
            pending_search: Mutex::new(None),
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
        }
    }

    /// Filters the store starts from, and returns to on [`reset`].
    ///
    /// [`reset`]: QueryStore::reset
    #[must_use]
    pub fn with_filters(mut self, filters: F) -> Self {
        self.initial_filters = filters;
        self.state.send_replace(QueryState::initial(self.initial_filters.clone()));
        self
    }

    #[must_use]
    pub fn with_page_size(self, page_size: u32) -> Self {
        let mut filters = self.initial_filters.clone();
        filters.apply(&FilterPatch::new().page_size(page_size));
        self.with_filters(filters)
    }

    #[must_use]
    pub const fn with_search_debounce(mut self, delay: Duration) -> Self {
        self.search_debounce = delay;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn endpoint(&self) -> &ListEndpoint {
        &self.endpoint
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> QueryState<T, F> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryState<T, F>> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn items(&self) -> Vec<T> {
        self.state.borrow().items.clone()
    }

    #[must_use]
    pub fn filters(&self) -> F {
        self.state.borrow().filters.clone()
    }

    /// Fetch one page with `patch` merged over the remembered filters.
    ///
    /// On success items, pagination and filters are replaced together. On
    /// failure only `error` and `loading` change, so the last good page
    /// stays visible.
    ///
    /// # Errors
    /// Returns the gateway or decoding error after storing its message in
    /// the state.
    #[instrument(skip(self, patch), fields(store = %self.name))]
    pub async fn fetch(&self, patch: Option<FilterPatch>) -> Result<FetchOutcome, RequestError> {
        let mut filters = self.filters();
        if let Some(patch) = &patch {
            filters.apply(patch);
        }

        let (seq, cancel) = self.begin();
        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });
        debug!(seq, page = filters.base().page, page_size = filters.base().page_size, "Fetching");

        let request = self.endpoint.request(&filters);
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(seq, "Fetch cancelled by a newer one");
                return Ok(FetchOutcome::Superseded);
            }
            result = self.gateway.request(request) => result,
        };
        let page: Result<Page<T>, RequestError> = result.and_then(|envelope| {
            into_page(envelope, self.endpoint.items_key.as_deref(), filters.base())
        });

        let mut applied = Ok(FetchOutcome::Superseded);
        self.state.send_if_modified(|state| {
            if !self.is_latest(seq) {
                return false;
            }
            state.loading = false;
            applied = match page {
                Ok(page) => {
                    state.items = page.items;
                    state.pagination = page.pagination;
                    state.filters = filters;
                    state.error = None;
                    refresh_selection(state);
                    Ok(FetchOutcome::Applied)
                }
                Err(err) => {
                    state.error = Some(err.user_message());
                    Err(err)
                }
            };
            true
        });
        self.finish(seq);

        match &applied {
            Ok(FetchOutcome::Applied) => debug!(seq, "Fetch applied"),
            Ok(FetchOutcome::Superseded) => debug!(seq, "Stale response discarded"),
            Err(err) => warn!(seq, kind = %err.kind, status = ?err.http_status, "Fetch failed"),
        }
        applied
    }

    /// Re-fetch with the current filters.
    ///
    /// # Errors
    /// See [`fetch`](QueryStore::fetch).
    pub async fn refresh(&self) -> Result<FetchOutcome, RequestError> {
        self.fetch(None).await
    }

    /// # Errors
    /// See [`fetch`](QueryStore::fetch).
    pub async fn go_to_page(&self, page: u32) -> Result<FetchOutcome, RequestError> {
        self.fetch(Some(FilterPatch::new().page(page))).await
    }

    /// Change the page size; the page goes back to the first one.
    ///
    /// # Errors
    /// See [`fetch`](QueryStore::fetch).
    pub async fn change_page_size(&self, page_size: u32) -> Result<FetchOutcome, RequestError> {
        self.fetch(Some(FilterPatch::new().page_size(page_size).page(DEFAULT_PAGE))).await
    }

    /// Search from the first page; a blank term clears the search.
    ///
    /// # Errors
    /// See [`fetch`](QueryStore::fetch).
    pub async fn search(&self, term: impl Into<String> + Send) -> Result<FetchOutcome, RequestError> {
        self.fetch(Some(FilterPatch::new().search(term).page(DEFAULT_PAGE))).await
    }

    /// [`search`](QueryStore::search) after the debounce delay, unless a
    /// newer debounced search arrives first.
    ///
    /// # Errors
    /// See [`fetch`](QueryStore::fetch).
    pub async fn search_debounced(
        &self,
        term: impl Into<String> + Send,
    ) -> Result<FetchOutcome, RequestError> {
        let term = term.into();
        let cancel = CancellationToken::new();
        if let Some(previous) = self.pending_search.lock().replace(cancel.clone()) {
            previous.cancel();
        }

        tokio::select! {
            () = cancel.cancelled() => return Ok(FetchOutcome::Superseded),
            () = tokio::time::sleep(self.search_debounce) => {}
        }
        self.search(term).await
    }

    /// Filter on `field` from the first page; `Value::Null` removes the
    /// filter.
    ///
    /// # Errors
    /// See [`fetch`](QueryStore::fetch).
    pub async fn filter_by(
        &self,
        field: impl Into<String> + Send,
        value: impl Into<Value> + Send,
    ) -> Result<FetchOutcome, RequestError> {
        self.fetch(Some(FilterPatch::new().field(field, value).page(DEFAULT_PAGE))).await
    }

    /// Run a state-changing request, then refetch on success.
    ///
    /// Never raises: the outcome carries the server's message either way.
    #[instrument(skip(self, mutation), fields(store = %self.name))]
    pub async fn mutate(&self, mutation: impl Into<Mutation> + Send) -> MutationOutcome {
        let mutation = mutation.into();
        self.state.send_if_modified(|state| state.error.take().is_some());

        match self.gateway.request(mutation.request.clone()).await {
            Ok(envelope) => {
                let message = mutation.success_text(&envelope);
                info!(endpoint = %mutation.request.endpoint, "Mutation succeeded; refreshing");
                if let Err(err) = self.refresh().await {
                    debug!(kind = %err.kind, "Refresh after mutation failed");
                }
                MutationOutcome::ok(message)
            }
            Err(err) => {
                let message = err.user_message();
                warn!(
                    endpoint = %mutation.request.endpoint,
                    kind = %err.kind,
                    status = ?err.http_status,
                    "Mutation failed"
                );
                self.state.send_modify(|state| state.error = Some(message.clone()));
                MutationOutcome::failed(message)
            }
        }
    }

    /// One-off typed read through the same gateway; list state is untouched.
    ///
    /// # Errors
    /// Gateway errors, or `MalformedResponse` when `data` is not an `R`.
    pub async fn fetch_one<R: DeserializeOwned + Send>(
        &self,
        request: ApiRequest,
    ) -> Result<R, RequestError> {
        self.gateway.request_data(request).await
    }

    /// Select the item with `id` from the current page.
    ///
    /// Returns false (and leaves the selection alone) when no such item is
    /// loaded.
    pub fn select(&self, id: &RecordId) -> bool {
        self.state.send_if_modified(|state| {
            match state.items.iter().find(|item| &item.record_id() == id).cloned() {
                Some(item) => {
                    state.selected = Some(item);
                    true
                }
                None => false,
            }
        })
    }

    pub fn clear_selection(&self) {
        self.state.send_if_modified(|state| state.selected.take().is_some());
    }

    /// Back to the initial empty state. Outstanding fetches and debounced
    /// searches are cancelled and their responses ignored.
    pub fn reset(&self) {
        {
            let mut slot = self.in_flight.lock();
            self.sequence.fetch_add(1, Ordering::SeqCst);
            if let Some(token) = slot.take() {
                token.cancel();
            }
        }
        if let Some(token) = self.pending_search.lock().take() {
            token.cancel();
        }
        self.state.send_replace(QueryState::initial(self.initial_filters.clone()));
        debug!(store = %self.name, "Store reset");
    }

    /// Claim the next sequence number and cancel the previous fetch.
    fn begin(&self) -> (u64, CancellationToken) {
        let token = CancellationToken::new();
        let mut slot = self.in_flight.lock();
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(previous) = slot.replace(token.clone()) {
            previous.cancel();
        }
        (seq, token)
    }

    fn finish(&self, seq: u64) {
        let mut slot = self.in_flight.lock();
        if self.is_latest(seq) {
            slot.take();
        }
    }

    fn is_latest(&self, seq: u64) -> bool {
        self.sequence.load(Ordering::SeqCst) == seq
    }
}

/// Point the selection at the freshly loaded copy of the same item.
fn refresh_selection<T: Identifiable + Clone, F>(state: &mut QueryState<T, F>) {
    let Some(selected) = &state.selected else {
        return;
    };
    let id = selected.record_id();
    if let Some(fresh) = state.items.iter().find(|item| item.record_id() == id) {
        state.selected = Some(fresh.clone());
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use backoffice_domain::{Record, RequestBody, RequestErrorKind};
    use serde_json::json;

    use super::*;
    use crate::testing::RecordingGateway;

    fn store(gateway: &Arc<RecordingGateway>) -> QueryStore<Record> {
        QueryStore::new("jobs", gateway.clone(), ListEndpoint::get("jobs.permanent.list"))
    }

    fn page_body(ids: &[i64], page: u32, total: u64) -> Value {
        let items: Vec<Value> = ids.iter().map(|id| json!({"id": id, "title": format!("Job {id}")})).collect();
        json!({
            "success": true,
            "statusCode": 200,
            "data": {"items": items, "page": page, "pageSize": 10, "totalCount": total}
        })
    }

    fn query_of(request: &ApiRequest, name: &str) -> Option<String> {
        request.query.iter().find(|(key, _)| key == name).map(|(_, value)| value.clone())
    }

    #[tokio::test]
    async fn fetch_replaces_items_and_pagination() {
        let gateway = Arc::new(RecordingGateway::new());
        gateway.push_body(page_body(&[1, 2, 3], 1, 23));
        let store = store(&gateway);

        let outcome = store.fetch(None).await.unwrap();
        assert_eq!(outcome, FetchOutcome::Applied);

        let state = store.state();
        assert_eq!(state.items.len(), 3);
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert_eq!(state.pagination.total_count, 23);
        assert_eq!(state.pagination.total_pages, 3);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_items() {
        let gateway = Arc::new(RecordingGateway::new());
        gateway.push_body(page_body(&[1, 2], 1, 2));
        gateway.push_body(json!({"success": false, "statusCode": 500, "message": "Database offline"}));
        let store = store(&gateway);

        store.fetch(None).await.unwrap();
        let err = store.go_to_page(2).await.unwrap_err();
        assert_eq!(err.kind, RequestErrorKind::ServerRejected);

        let state = store.state();
        assert_eq!(state.items.len(), 2);
        assert_eq!(state.error.as_deref(), Some("Database offline"));
        assert!(!state.loading);
        // filters only move on success
        assert_eq!(state.filters.page, 1);
    }

    #[tokio::test]
    async fn filter_changes_return_to_first_page() {
        let gateway = Arc::new(RecordingGateway::new());
        gateway.set_fallback_body(page_body(&[1], 1, 40));
        let store = store(&gateway);

        store.go_to_page(3).await.unwrap();
        assert_eq!(query_of(&gateway.last_request().unwrap(), "page").as_deref(), Some("3"));

        store.search("welder").await.unwrap();
        let request = gateway.last_request().unwrap();
        assert_eq!(query_of(&request, "page").as_deref(), Some("1"));
        assert_eq!(query_of(&request, "search").as_deref(), Some("welder"));

        store.go_to_page(2).await.unwrap();
        store.change_page_size(25).await.unwrap();
        let request = gateway.last_request().unwrap();
        assert_eq!(query_of(&request, "page").as_deref(), Some("1"));
        assert_eq!(query_of(&request, "pageSize").as_deref(), Some("25"));
        // search survives unrelated filter changes
        assert_eq!(query_of(&request, "search").as_deref(), Some("welder"));

        store.filter_by("status", "open").await.unwrap();
        assert_eq!(query_of(&gateway.last_request().unwrap(), "status").as_deref(), Some("open"));
        store.filter_by("status", Value::Null).await.unwrap();
        assert_eq!(query_of(&gateway.last_request().unwrap(), "status"), None);
    }

    #[tokio::test]
    async fn newer_fetch_supersedes_slower_one() {
        let gateway = Arc::new(RecordingGateway::new());
        gateway.push_delayed(Duration::from_millis(200), page_body(&[1], 1, 1));
        gateway.push_delayed(Duration::from_millis(10), page_body(&[7, 8], 2, 12));
        let store = Arc::new(store(&gateway));

        let slow = {
            let store = store.clone();
            tokio::spawn(async move { store.fetch(None).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        let fast = store.go_to_page(2).await.unwrap();

        assert_eq!(fast, FetchOutcome::Applied);
        assert_eq!(slow.await.unwrap().unwrap(), FetchOutcome::Superseded);

        let state = store.state();
        let ids: Vec<RecordId> = state.items.iter().map(|item| item.id.clone()).collect();
        assert_eq!(ids, vec![RecordId::Number(7), RecordId::Number(8)]);
        assert_eq!(state.filters.page, 2);
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn mutation_refreshes_with_current_filters() {
        let gateway = Arc::new(RecordingGateway::new());
        gateway.push_body(page_body(&[1, 2], 2, 14));
        gateway.push_body(json!({"success": true, "message": "Job deleted"}));
        gateway.push_body(page_body(&[2], 2, 13));
        let store = store(&gateway);
        store.go_to_page(2).await.unwrap();

        let outcome = store.mutate(ApiRequest::delete("jobs.delete").segment(1)).await;
        assert!(outcome.success);
        assert_eq!(outcome.message, "Job deleted");

        let lists = gateway.requests_to("jobs.permanent.list");
        assert_eq!(lists.len(), 2);
        assert_eq!(query_of(&lists[1], "page").as_deref(), Some("2"));
        assert_eq!(store.items().len(), 1);
    }

    #[tokio::test]
    async fn failed_mutation_sets_error_without_refresh() {
        let gateway = Arc::new(RecordingGateway::new());
        gateway.push_body(json!({
            "success": false,
            "statusCode": 422,
            "errors": {"email": ["Email already taken"]}
        }));
        let store = store(&gateway);

        let body = json!({"email": "ops@example.com"});
        let outcome = store
            .mutate(Mutation::new(ApiRequest::post("clients.create").json(body)).with_message("Client created"))
            .await;

        assert!(!outcome.success);
        assert_eq!(outcome.message, "Email already taken");
        assert_eq!(store.state().error.as_deref(), Some("Email already taken"));
        assert_eq!(gateway.request_count(), 1);
        assert!(matches!(gateway.requests()[0].body, RequestBody::Json(_)));
    }

    #[tokio::test]
    async fn mutation_clears_previous_error() {
        let gateway = Arc::new(RecordingGateway::new());
        gateway.push_error(RequestError::network("connection reset"));
        gateway.set_fallback_body(page_body(&[4], 1, 1));
        let store = store(&gateway);
        assert!(store.fetch(None).await.is_err());
        assert!(store.state().error.is_some());

        let outcome = store.mutate(ApiRequest::patch("clients.update").segment(4)).await;
        assert!(outcome.success);
        assert_eq!(outcome.message, backoffice_domain::constants::MSG_OPERATION_SUCCEEDED);
        assert!(store.state().error.is_none());
    }

    #[tokio::test]
    async fn selection_follows_reloaded_items() {
        let gateway = Arc::new(RecordingGateway::new());
        gateway.push_body(page_body(&[1, 2], 1, 2));
        gateway.push_body(json!({"success": true, "data": {"items": [{"id": 2, "title": "Renamed"}]}}));
        let store = store(&gateway);
        store.fetch(None).await.unwrap();

        assert!(!store.select(&RecordId::Number(9)));
        assert!(store.select(&RecordId::Number(2)));
        store.refresh().await.unwrap();

        let selected = store.state().selected.unwrap();
        assert_eq!(selected.get_str("title"), Some("Renamed"));

        store.clear_selection();
        assert!(store.state().selected.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn debounced_search_only_sends_last_term() {
        let gateway = Arc::new(RecordingGateway::new());
        gateway.set_fallback_body(page_body(&[1], 1, 1));
        let store = Arc::new(store(&gateway).with_search_debounce(Duration::from_millis(300)));

        let first = {
            let store = store.clone();
            tokio::spawn(async move { store.search_debounced("we").await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        let second = store.search_debounced("welder").await.unwrap();

        assert_eq!(first.await.unwrap().unwrap(), FetchOutcome::Superseded);
        assert_eq!(second, FetchOutcome::Applied);
        assert_eq!(gateway.request_count(), 1);
        assert_eq!(query_of(&gateway.requests()[0], "search").as_deref(), Some("welder"));
    }

    #[tokio::test]
    async fn reset_discards_in_flight_response() {
        let gateway = Arc::new(RecordingGateway::new());
        gateway.push_delayed(Duration::from_millis(100), page_body(&[1], 1, 1));
        let store = Arc::new(store(&gateway).with_page_size(25));

        let pending = {
            let store = store.clone();
            tokio::spawn(async move { store.fetch(None).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        store.reset();

        assert_eq!(pending.await.unwrap().unwrap(), FetchOutcome::Superseded);
        let state = store.state();
        assert!(state.items.is_empty());
        assert!(!state.loading);
        assert_eq!(state.filters.page_size, 25);
    }

    #[tokio::test]
    async fn fetch_one_returns_typed_data() {
        let gateway = Arc::new(RecordingGateway::new());
        gateway.push_data(json!({"id": 5, "name": "Dana"}));
        let store = store(&gateway);

        let record: Record = store.fetch_one(ApiRequest::post("candidates.details").segment(5)).await.unwrap();
        assert_eq!(record.get_str("name"), Some("Dana"));
        assert!(store.items().is_empty());
    }

    #[tokio::test]
    async fn subscribers_see_loading_then_result() {
        let gateway = Arc::new(RecordingGateway::new());
        gateway.push_delayed(Duration::from_millis(50), page_body(&[1], 1, 1));
        let store = Arc::new(store(&gateway));
        let mut rx = store.subscribe();

        let task = {
            let store = store.clone();
            tokio::spawn(async move { store.fetch(None).await })
        };
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().loading);

        task.await.unwrap().unwrap();
        assert!(!rx.borrow().loading);
        assert_eq!(rx.borrow().items.len(), 1);
    }
}
