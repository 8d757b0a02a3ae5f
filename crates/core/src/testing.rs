//! Test doubles for the core ports
//!
//! Available to other crates through the `test-utils` feature.

#![allow(clippy::missing_panics_doc)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backoffice_domain::{ApiRequest, Envelope, RequestError};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::ports::{AccessTokenProvider, ApiGateway, Clock};

/// Clock that only moves when told to
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Unsigned JWT-shaped token carrying `claims`.
pub fn token_with_claims(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}

/// Token whose `exp` claim is `expires_at`.
pub fn token_expiring_at(expires_at: DateTime<Utc>) -> String {
    token_with_claims(&json!({"sub": "1", "exp": expires_at.timestamp()}))
}

#[derive(Debug, Clone)]
struct Scripted {
    delay: Option<Duration>,
    reply: Result<Envelope, RequestError>,
}

/// [`ApiGateway`] that replays scripted replies and records every request
/// it receives.
///
/// Replies are consumed in order; once the script runs out the fallback
/// reply (an empty success by default) is returned. With a token provider
/// attached, requests without a valid token fail before being recorded,
/// mirroring the real gateway's short-circuit.
pub struct RecordingGateway {
    script: Mutex<VecDeque<Scripted>>,
    fallback: Mutex<Result<Envelope, RequestError>>,
    requests: Mutex<Vec<ApiRequest>>,
    tokens: Option<Arc<dyn AccessTokenProvider>>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(Ok(Envelope::empty(200))),
            requests: Mutex::new(Vec::new()),
            tokens: None,
        }
    }

    /// Require a token from `provider` before a request counts as sent.
    #[must_use]
    pub fn with_token_provider(mut self, provider: Arc<dyn AccessTokenProvider>) -> Self {
        self.tokens = Some(provider);
        self
    }

    /// Queue a reply built from a raw response body.
    ///
    /// Bodies are classified like the HTTP gateway does: `success: false`
    /// becomes a `ServerRejected` error, a body that is not an envelope
    /// becomes the `data` of a successful one.
    pub fn push_body(&self, body: Value) {
        self.push(None, classify(body));
    }

    /// Queue a successful envelope whose `data` is `data`.
    pub fn push_data(&self, data: Value) {
        self.push(None, Ok(Envelope { data: Some(data), ..Envelope::empty(200) }));
    }

    pub fn push_error(&self, error: RequestError) {
        self.push(None, Err(error));
    }

    /// Queue a body that is only answered after `delay`.
    pub fn push_delayed(&self, delay: Duration, body: Value) {
        self.push(Some(delay), classify(body));
    }

    /// Reply used once the script is exhausted.
    pub fn set_fallback_body(&self, body: Value) {
        *self.fallback.lock() = classify(body);
    }

    #[must_use]
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Requests made against the logical `endpoint` key.
    #[must_use]
    pub fn requests_to(&self, endpoint: &str) -> Vec<ApiRequest> {
        self.requests.lock().iter().filter(|r| r.endpoint == endpoint).cloned().collect()
    }

    #[must_use]
    pub fn last_request(&self) -> Option<ApiRequest> {
        self.requests.lock().last().cloned()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().clear();
    }

    fn push(&self, delay: Option<Duration>, reply: Result<Envelope, RequestError>) {
        self.script.lock().push_back(Scripted { delay, reply });
    }
}

impl Default for RecordingGateway {
    fn default() -> Self {
        Self::new()
    }
}

fn classify(body: Value) -> Result<Envelope, RequestError> {
    Envelope::from_body(body, 200)
        .map_err(|e| RequestError::malformed(e.to_string()))
        .and_then(Envelope::into_result)
}

#[async_trait]
impl ApiGateway for RecordingGateway {
    async fn request(&self, request: ApiRequest) -> Result<Envelope, RequestError> {
        if let Some(tokens) = &self.tokens {
            tokens.access_token().await?;
        }
        self.requests.lock().push(request);

        let next = self.script.lock().pop_front();
        let Scripted { delay, reply } = next.unwrap_or_else(|| Scripted {
            delay: None,
            reply: self.fallback.lock().clone(),
        });
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        reply
    }
}
