//! Session types: credentials, principal profile and the observable session
//! state.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::impl_domain_status_conversions;

/// Authenticated principal.
///
/// Replaced wholesale on each login; never patched field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: BTreeSet<String>,
    #[serde(default)]
    pub permissions: BTreeSet<String>,
    /// Any additional attributes the server sends about the principal
    #[serde(default, flatten)]
    pub flags: BTreeMap<String, Value>,
}

impl UserProfile {
    pub fn new(id: i64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            full_name: None,
            email: None,
            roles: BTreeSet::new(),
            permissions: BTreeSet::new(),
            flags: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

/// Credentials held by the credential store.
///
/// `Debug` redacts both tokens.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Expiration decoded from the token's `exp` claim, when decodable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<UserProfile>,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self { access_token: access_token.into(), refresh_token: None, expires_at: None, principal: None }
    }

    /// Seconds until `expires_at`, negative once expired.
    #[must_use]
    pub fn seconds_until_expiry(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expires_at.map(|exp| (exp - now).num_seconds())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .field("principal", &self.principal)
            .finish()
    }
}

/// The session state machine has exactly two states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Authenticated,
    #[default]
    Unauthenticated,
}

impl_domain_status_conversions!(SessionStatus {
    Authenticated => "authenticated",
    Unauthenticated => "unauthenticated",
});

/// Why the last transition to `Unauthenticated` happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoutReason {
    /// Explicit logout from the UI
    UserRequested,
    /// Token expired, undecodable or without an expiration claim
    Expired,
    /// Server answered 401 to an authenticated request
    Unauthorized,
    /// No stored token at startup
    MissingToken,
}

impl_domain_status_conversions!(LogoutReason {
    UserRequested => "user_requested",
    Expired => "expired",
    Unauthorized => "unauthorized",
    MissingToken => "missing_token",
});

/// Reactive session snapshot handed to subscribers
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionState {
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_logout: Option<LogoutReason>,
    /// Sign-outs announced so far. Subscribers that only see the latest
    /// value compare it to detect a sign-out they did not observe.
    #[serde(default)]
    pub sign_outs: u64,
}

impl SessionState {
    pub fn authenticated(profile: Option<UserProfile>) -> Self {
        Self { status: SessionStatus::Authenticated, profile, last_logout: None, sign_outs: 0 }
    }

    pub fn logged_out(reason: LogoutReason) -> Self {
        Self {
            status: SessionStatus::Unauthenticated,
            profile: None,
            last_logout: Some(reason),
            sign_outs: 1,
        }
    }

    /// Next state after signing in; the sign-out count carries over.
    #[must_use]
    pub fn signed_in(&self, profile: Option<UserProfile>) -> Self {
        Self { sign_outs: self.sign_outs, ..Self::authenticated(profile) }
    }

    /// Next state after signing out for `reason`.
    #[must_use]
    pub fn signed_out(&self, reason: LogoutReason) -> Self {
        Self { sign_outs: self.sign_outs.saturating_add(1), ..Self::logged_out(reason) }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }
}
