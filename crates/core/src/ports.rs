//! Port interfaces for the data-access layer
//!
//! These traits define the boundaries between core logic and the
//! infrastructure adapters (HTTP client, durable storage, system clock).

use async_trait::async_trait;
use backoffice_domain::{ApiRequest, Envelope, RequestError, StorageError};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// The authenticated request gateway.
///
/// Implementations attach the bearer token, issue the call and classify the
/// response: a returned `Ok` envelope always has `success == true`.
#[async_trait]
pub trait ApiGateway: Send + Sync {
    /// Issue `request` and return the parsed envelope.
    async fn request(&self, request: ApiRequest) -> Result<Envelope<Value>, RequestError>;
}

/// Typed helpers over [`ApiGateway`]
#[async_trait]
pub trait ApiGatewayExt: ApiGateway {
    /// Issue `request` and decode its `data` member as `R`.
    ///
    /// # Errors
    /// Gateway errors pass through; a missing or mistyped `data` member is
    /// `MalformedResponse`.
    async fn request_data<R: DeserializeOwned + Send>(
        &self,
        request: ApiRequest,
    ) -> Result<R, RequestError> {
        let envelope = self.request(request).await?;
        let data = envelope
            .data
            .filter(|data| !data.is_null())
            .ok_or_else(|| RequestError::malformed("response has no data"))?;
        serde_json::from_value(data)
            .map_err(|e| RequestError::malformed(format!("unexpected data shape: {e}")))
    }
}

impl<G: ApiGateway + ?Sized> ApiGatewayExt for G {}

/// Source of the bearer token for authenticated requests
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// A token that is present and not provably expired.
    ///
    /// # Errors
    /// `Unauthenticated` when no token is held, `SessionExpired` when the
    /// token had to be discarded (which also logs the session out).
    async fn access_token(&self) -> Result<String, RequestError>;

    /// Called when the server rejected `token` with 401. Only ends the
    /// session if `token` is still the current one.
    async fn on_unauthorized(&self, token: &str);
}

/// Durable key-value storage for the session.
///
/// Synchronous: every backend is local (file, keychain, memory) and writes
/// must complete before the credential swap they accompany.
pub trait SessionStorage: Send + Sync {
    /// # Errors
    /// Returns a [`StorageError`] when the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// # Errors
    /// Returns a [`StorageError`] when the value cannot be persisted.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing an absent key is not an error.
    ///
    /// # Errors
    /// Returns a [`StorageError`] when the backend rejects the removal.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Wall clock used for token expiry decisions
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// [`Clock`] backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
