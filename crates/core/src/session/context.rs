//! Session context: the credential store and the session monitor
//!
//! One `SessionContext` is constructed at startup and shared (`Arc`) with the
//! gateway and every store. Credentials are replaced wholesale under a write
//! lock, so a reader never observes a half-written set. Every mutation is
//! written to durable storage before the in-memory swap.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use backoffice_domain::constants::{
    KEY_ACCESS_TOKEN, KEY_PERMISSIONS, KEY_REFRESH_TOKEN, KEY_ROLES, KEY_USER, SESSION_KEYS,
};
use backoffice_domain::{
    Credentials, LogoutReason, RequestError, SessionState, SessionStatus, StorageError, UserProfile,
};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::token::{self, TokenValidity};
use crate::ports::{AccessTokenProvider, Clock, SessionStorage, SystemClock};

/// Process-wide session: credential store plus expiry monitor
pub struct SessionContext {
    storage: Arc<dyn SessionStorage>,
    clock: Arc<dyn Clock>,
    credentials: RwLock<Option<Credentials>>,
    state: watch::Sender<SessionState>,
}

impl SessionContext {
    /// Create an unauthenticated context; call [`initialize`] to restore a
    /// persisted session.
    ///
    /// [`initialize`]: SessionContext::initialize
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self::with_clock(storage, Arc::new(SystemClock))
    }

    pub fn with_clock(storage: Arc<dyn SessionStorage>, clock: Arc<dyn Clock>) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self { storage, clock, credentials: RwLock::new(None), state }
    }

    /// Restore the persisted session and validate it.
    ///
    /// Never fails: unreadable storage, a missing token and an invalid token
    /// all end in `Unauthenticated`.
    pub fn initialize(&self) -> SessionStatus {
        let Some(access_token) = self.read_key(KEY_ACCESS_TOKEN).filter(|t| !t.trim().is_empty())
        else {
            *self.credentials.write() = None;
            self.clear_storage();
            self.announce_logout(LogoutReason::MissingToken);
            info!("No stored session; starting unauthenticated");
            return SessionStatus::Unauthenticated;
        };

        let principal = self.restore_profile();
        let credentials = Credentials {
            expires_at: token::decode_expiry(&access_token).ok(),
            refresh_token: self.read_key(KEY_REFRESH_TOKEN),
            principal: principal.clone(),
            access_token,
        };
        *self.credentials.write() = Some(credentials);

        if self.check_expiration() {
            return SessionStatus::Unauthenticated;
        }

        self.announce_session(principal);
        info!("Stored session restored");
        SessionStatus::Authenticated
    }

    /// Persist the token pair and mark the session authenticated.
    ///
    /// The token's shape is not validated here. The cached profile survives
    /// only when the new token names the same subject as the old one;
    /// otherwise it is dropped (in memory and in storage) so the new session
    /// never shows the previous user.
    ///
    /// # Errors
    /// Returns the storage error; in-memory state is unchanged in that case.
    pub fn set_token(
        &self,
        access_token: impl Into<String>,
        refresh_token: Option<String>,
    ) -> Result<(), StorageError> {
        let access_token = access_token.into();
        let kept = self.credentials.read().as_ref().and_then(|current| {
            same_subject(&current.access_token, &access_token)
                .then(|| current.principal.clone())
                .flatten()
        });
        if kept.is_none() {
            for key in PROFILE_KEYS {
                self.storage.remove(key)?;
            }
        }
        self.persist_tokens(&access_token, refresh_token.as_deref())?;

        let expires_at = token::decode_expiry(&access_token).ok();
        *self.credentials.write() =
            Some(Credentials { access_token, refresh_token, expires_at, principal: kept.clone() });

        self.announce_session(kept);
        info!(expires_at = ?expires_at, "Access token stored");
        Ok(())
    }

    /// Persist a token pair together with its profile and announce the new
    /// session once, with the profile already in place.
    ///
    /// # Errors
    /// Returns the storage error; in-memory state is unchanged in that case.
    pub fn establish(
        &self,
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        profile: UserProfile,
    ) -> Result<(), StorageError> {
        let access_token = access_token.into();
        self.persist_tokens(&access_token, refresh_token.as_deref())?;
        self.persist_profile(&profile)?;

        let expires_at = token::decode_expiry(&access_token).ok();
        *self.credentials.write() = Some(Credentials {
            access_token,
            refresh_token,
            expires_at,
            principal: Some(profile.clone()),
        });

        info!(user_id = profile.id, expires_at = ?expires_at, "Session established");
        self.announce_session(Some(profile));
        Ok(())
    }

    /// Persist `profile` with its roles and permissions as one replacement.
    ///
    /// # Errors
    /// Returns the storage error; in-memory state is unchanged in that case.
    pub fn set_profile(&self, profile: UserProfile) -> Result<(), StorageError> {
        self.persist_profile(&profile)?;

        let replaced = {
            let mut guard = self.credentials.write();
            match guard.as_ref() {
                Some(current) => {
                    *guard = Some(Credentials { principal: Some(profile.clone()), ..current.clone() });
                    true
                }
                None => false,
            }
        };

        if replaced {
            debug!(user_id = profile.id, roles = profile.roles.len(), "Profile replaced");
            self.announce_session(Some(profile));
        } else {
            debug!(user_id = profile.id, "Profile persisted without an active token");
        }
        Ok(())
    }

    /// Snapshot of the current credentials.
    #[must_use]
    pub fn credentials(&self) -> Option<Credentials> {
        self.credentials.read().clone()
    }

    #[must_use]
    pub fn profile(&self) -> Option<UserProfile> {
        self.credentials.read().as_ref().and_then(|c| c.principal.clone())
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.credentials.read().is_some()
    }

    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.credentials
            .read()
            .as_ref()
            .and_then(|c| c.principal.as_ref())
            .is_some_and(|p| p.has_role(role))
    }

    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.credentials
            .read()
            .as_ref()
            .and_then(|c| c.principal.as_ref())
            .is_some_and(|p| p.has_permission(permission))
    }

    /// Current session snapshot.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Subscribe to session transitions.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Clear every persisted key and drop to `Unauthenticated`.
    ///
    /// State is cleared before this returns; storage failures are logged
    /// and do not keep the session alive.
    pub fn logout(&self) {
        self.credentials.write().take();
        self.clear_storage();
        self.announce_logout(LogoutReason::UserRequested);
        info!("Logged out");
    }

    /// Returns true when the token had expired (or could not be validated)
    /// and the session was logged out. Without a token there is nothing to
    /// log out, so the answer is false.
    pub fn check_expiration(&self) -> bool {
        let Some(token) = self.current_token() else {
            return false;
        };
        !self.verify(&token)
    }

    /// Ends the session held with `token`, if it is still current.
    pub(crate) fn end_session(&self, token: &str, reason: LogoutReason) -> bool {
        let taken = {
            let mut guard = self.credentials.write();
            if guard.as_ref().is_some_and(|c| c.access_token == token) {
                guard.take();
                true
            } else {
                false
            }
        };
        if taken {
            self.clear_storage();
            self.announce_logout(reason);
            info!(reason = %reason, "Session ended");
        }
        taken
    }

    fn current_token(&self) -> Option<String> {
        self.credentials.read().as_ref().map(|c| c.access_token.clone())
    }

    /// True when `token` is provably valid now; otherwise logs out.
    fn verify(&self, token: &str) -> bool {
        match token::assess(token, self.clock.now()) {
            TokenValidity::Valid { .. } => true,
            TokenValidity::Expired { expires_at } => {
                warn!(%expires_at, "Access token expired");
                self.end_session(token, LogoutReason::Expired);
                false
            }
            TokenValidity::Invalid(defect) => {
                warn!(defect = defect.as_str(), "Access token cannot be validated");
                self.end_session(token, LogoutReason::Expired);
                false
            }
        }
    }

    fn announce_session(&self, profile: Option<UserProfile>) {
        self.state.send_modify(|state| *state = state.signed_in(profile));
    }

    fn announce_logout(&self, reason: LogoutReason) {
        self.state.send_modify(|state| *state = state.signed_out(reason));
    }

    fn persist_tokens(&self, access_token: &str, refresh_token: Option<&str>) -> Result<(), StorageError> {
        self.storage.set(KEY_ACCESS_TOKEN, access_token)?;
        match refresh_token {
            Some(refresh) => self.storage.set(KEY_REFRESH_TOKEN, refresh),
            None => self.storage.remove(KEY_REFRESH_TOKEN),
        }
    }

    fn persist_profile(&self, profile: &UserProfile) -> Result<(), StorageError> {
        let user = encode(KEY_USER, profile)?;
        let roles = encode(KEY_ROLES, &profile.roles)?;
        let permissions = encode(KEY_PERMISSIONS, &profile.permissions)?;
        self.storage.set(KEY_USER, &user)?;
        self.storage.set(KEY_ROLES, &roles)?;
        self.storage.set(KEY_PERMISSIONS, &permissions)
    }

    fn clear_storage(&self) {
        for key in SESSION_KEYS {
            if let Err(err) = self.storage.remove(key) {
                warn!(key, error = %err, "Failed to clear session key");
            }
        }
    }

    fn read_key(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value,
            Err(err) => {
                warn!(key, error = %err, "Session storage unreadable");
                None
            }
        }
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.read_key(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key, error = %err, "Ignoring corrupt session value");
                None
            }
        }
    }

    fn restore_profile(&self) -> Option<UserProfile> {
        let mut profile: UserProfile = self.read_json(KEY_USER)?;
        if let Some(roles) = self.read_json::<BTreeSet<String>>(KEY_ROLES) {
            profile.roles = roles;
        }
        if let Some(permissions) = self.read_json::<BTreeSet<String>>(KEY_PERMISSIONS) {
            profile.permissions = permissions;
        }
        Some(profile)
    }
}

const PROFILE_KEYS: [&str; 3] = [KEY_USER, KEY_ROLES, KEY_PERMISSIONS];

/// Both tokens carry a `sub` claim and it is the same.
fn same_subject(current: &str, next: &str) -> bool {
    matches!((token::subject(current), token::subject(next)), (Some(a), Some(b)) if a == b)
}

fn encode<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value)
        .map_err(|e| StorageError::Write { key: key.to_string(), message: e.to_string() })
}

#[async_trait]
impl AccessTokenProvider for SessionContext {
    async fn access_token(&self) -> Result<String, RequestError> {
        let token = self.current_token().ok_or_else(RequestError::unauthenticated)?;
        if self.verify(&token) {
            Ok(token)
        } else {
            Err(RequestError::session_expired())
        }
    }

    async fn on_unauthorized(&self, token: &str) {
        if self.end_session(token, LogoutReason::Unauthorized) {
            warn!("Server rejected the access token; session ended");
        }
    }
}
