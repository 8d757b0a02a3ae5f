//! Shared fixtures for `backoffice-core` integration tests.
//!
//! A harness wires a session over in-memory storage and a fixed clock to a
//! recording gateway that refuses to "send" without a valid token, which is
//! the same short-circuit the HTTP gateway performs.

#![allow(dead_code)]

use std::sync::Arc;

use backoffice_core::entities::EntityStore;
use backoffice_core::testing::{token_expiring_at, FixedClock, RecordingGateway};
use backoffice_core::{ListEndpoint, MemorySessionStorage, SessionContext};
use backoffice_domain::constants::KEY_ACCESS_TOKEN;
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};

pub fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_800_000_000, 0).unwrap()
}

pub struct Harness {
    pub clock: Arc<FixedClock>,
    pub storage: Arc<MemorySessionStorage>,
    pub session: Arc<SessionContext>,
    pub gateway: Arc<RecordingGateway>,
}

impl Harness {
    /// Session without any stored token.
    pub fn signed_out() -> Self {
        Self::with_storage(MemorySessionStorage::new())
    }

    /// Session restored from storage holding a token valid for an hour.
    pub fn signed_in() -> Self {
        let token = token_expiring_at(epoch() + Duration::hours(1));
        let harness = Self::with_storage(MemorySessionStorage::with_entries([(KEY_ACCESS_TOKEN, token)]));
        harness.session.initialize();
        harness
    }

    pub fn with_storage(storage: MemorySessionStorage) -> Self {
        let clock = Arc::new(FixedClock::new(epoch()));
        let storage = Arc::new(storage);
        let session = Arc::new(SessionContext::with_clock(storage.clone(), clock.clone()));
        let gateway = Arc::new(RecordingGateway::new().with_token_provider(session.clone()));
        Self { clock, storage, session, gateway }
    }

    pub fn store(&self, endpoint: &str) -> EntityStore {
        EntityStore::new(endpoint, self.gateway.clone(), ListEndpoint::get(endpoint))
    }
}

pub fn items(ids: &[i64]) -> Vec<Value> {
    ids.iter().map(|id| json!({ "id": id })).collect()
}

/// Canonical list envelope.
pub fn page(ids: &[i64], page: u32, total_count: u64) -> Value {
    json!({
        "success": true,
        "statusCode": 200,
        "data": {
            "items": items(ids),
            "page": page,
            "pageSize": 10,
            "totalCount": total_count,
            "totalPages": total_count.div_ceil(10)
        },
        "timestamp": "2027-01-15T08:00:00Z"
    })
}

pub fn query_param(request: &backoffice_domain::ApiRequest, name: &str) -> Option<String> {
    request.query.iter().find(|(key, _)| key == name).map(|(_, value)| value.clone())
}
