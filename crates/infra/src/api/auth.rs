//! Admin login
//!
//! Exchanges credentials for an access token and establishes the session
//! with the profile built from the admin details and the role's access list.
//! Subscribers see the new session once, profile included.

use std::sync::Arc;

use backoffice_core::SessionContext;
use backoffice_domain::constants::{MSG_LOGIN_ERROR, MSG_LOGIN_FAILED, MSG_LOGIN_SUCCEEDED};
use backoffice_domain::{ApiRequest, RequestError, RequestErrorKind, StorageError, UserProfile};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use super::client::ApiClient;

const LOGIN_ENDPOINT: &str = "auth.login";

/// Result of a login attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub success: bool,
    pub message: String,
}

impl LoginOutcome {
    fn succeeded(message: String) -> Self {
        Self { success: true, message }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into() }
    }
}

#[derive(Debug, Deserialize)]
struct LoginData {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    admin_details: AdminDetails,
    #[serde(default)]
    access: Option<AccessRole>,
}

#[derive(Debug, Deserialize)]
struct AdminDetails {
    id: i64,
    username: String,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct AccessRole {
    role_name: String,
    #[serde(default)]
    access: Vec<String>,
}

impl LoginData {
    fn profile(&self) -> UserProfile {
        let details = &self.admin_details;
        let mut profile = UserProfile::new(details.id, details.username.clone());
        profile.full_name.clone_from(&details.full_name);
        profile.email.clone_from(&details.email);
        if let Some(role_id) = details.role_id {
            profile.flags.insert("role_id".to_string(), Value::from(role_id));
        }
        match &self.access {
            Some(role) => profile
                .with_roles([role.role_name.clone()])
                .with_permissions(role.access.iter().cloned()),
            None => profile,
        }
    }
}

/// Login and logout against the admin API
pub struct AuthService {
    client: Arc<ApiClient>,
    session: Arc<SessionContext>,
}

impl AuthService {
    pub fn new(client: Arc<ApiClient>, session: Arc<SessionContext>) -> Self {
        Self { client, session }
    }

    /// Authenticate with `email` and `password`.
    ///
    /// On success the token and profile are stored. On any failure nothing
    /// is stored and the outcome carries the server's message, or a generic
    /// one when the server could not be reached.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> LoginOutcome {
        let request =
            ApiRequest::post(LOGIN_ENDPOINT).json(json!({"email": email, "password": password}));

        let envelope = match self.client.send_unauthenticated(request).await {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(error = %err, "Login rejected");
                return LoginOutcome::failed(failure_message(&err));
            }
        };

        let message = envelope.server_message().unwrap_or_else(|| MSG_LOGIN_SUCCEEDED.to_string());
        let data = match envelope.data.map(serde_json::from_value::<LoginData>) {
            Some(Ok(data)) => data,
            Some(Err(err)) => {
                warn!(error = %err, "Login response has an unexpected shape");
                return LoginOutcome::failed(MSG_LOGIN_FAILED);
            }
            None => {
                warn!("Login response has no data");
                return LoginOutcome::failed(MSG_LOGIN_FAILED);
            }
        };

        if let Err(err) = self.establish(&data) {
            warn!(error = %err, "Could not persist session after login");
            self.session.logout();
            return LoginOutcome::failed(MSG_LOGIN_ERROR);
        }

        info!(user_id = data.admin_details.id, "Logged in");
        LoginOutcome::succeeded(message)
    }

    /// End the session locally; the admin API has no logout endpoint.
    pub fn logout(&self) {
        self.session.logout();
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    fn establish(&self, data: &LoginData) -> Result<(), StorageError> {
        self.session.establish(data.access_token.clone(), data.refresh_token.clone(), data.profile())
    }
}

fn failure_message(err: &RequestError) -> String {
    match err.kind {
        RequestErrorKind::ServerRejected => err
            .server_message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(MSG_LOGIN_FAILED)
            .to_string(),
        _ => MSG_LOGIN_ERROR.to_string(),
    }
}
