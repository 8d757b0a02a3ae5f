//! Application context - dependency injection container
//!
//! Wires configuration, session storage, the session context, the API
//! client and one store per entity, and owns the background tasks that
//! keep them consistent:
//! - the expiry watchdog, which logs out once the token expires
//! - the session listener, which resets every store on logout

mod stores;

use std::sync::Arc;
use std::time::Duration;

use backoffice_core::{ApiGateway, ExpiryWatchdog, SessionContext, SessionStorage};
use backoffice_domain::{Config, Result, SessionStatus};
use backoffice_infra::{open_storage, ApiClient, AuthService, LoginOutcome};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use stores::EntityStores;

const LISTENER_STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Application context - holds all services and stores
pub struct AppContext {
    pub config: Config,
    pub session: Arc<SessionContext>,
    pub api: Arc<ApiClient>,
    pub auth: AuthService,
    pub stores: Arc<EntityStores>,

    watchdog: Mutex<Option<ExpiryWatchdog>>,
    listener: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

impl AppContext {
    /// Context from configuration found by the loader.
    ///
    /// # Errors
    /// Returns `BackofficeError::Config` when no configuration is found, or
    /// a storage error when the session backend cannot be opened.
    pub fn new() -> Result<Self> {
        Self::with_config(backoffice_infra::config::load()?)
    }

    /// # Errors
    /// Returns a storage error when the session backend cannot be opened,
    /// or `BackofficeError::Config` for an invalid API configuration.
    pub fn with_config(config: Config) -> Result<Self> {
        let storage = open_storage(&config.session.storage)?;
        Self::with_storage(config, storage)
    }

    /// Context over an existing storage backend.
    ///
    /// # Errors
    /// Returns `BackofficeError::Config` for an invalid API configuration.
    pub fn with_storage(config: Config, storage: Arc<dyn SessionStorage>) -> Result<Self> {
        Self::with_session(config, Arc::new(SessionContext::new(storage)))
    }

    /// Context over an existing session, e.g. one with a test clock.
    ///
    /// # Errors
    /// Returns `BackofficeError::Config` for an invalid API configuration.
    pub fn with_session(config: Config, session: Arc<SessionContext>) -> Result<Self> {
        let api = Arc::new(ApiClient::new(&config.api, session.clone())?);
        let auth = AuthService::new(Arc::clone(&api), Arc::clone(&session));
        let gateway: Arc<dyn ApiGateway> = api.clone();
        let stores = Arc::new(EntityStores::new(gateway, config.stores));

        info!(base_url = %api.base_url(), "Application context created");

        Ok(Self {
            config,
            session,
            api,
            auth,
            stores,
            watchdog: Mutex::new(None),
            listener: Mutex::new(None),
        })
    }

    /// Restore the stored session and start the background tasks.
    ///
    /// Must be called within a Tokio runtime. Calling it again restarts the
    /// tasks.
    pub async fn start(&self) -> SessionStatus {
        let status = self.session.initialize();
        self.stop_tasks().await;

        *self.listener.lock().await = Some(spawn_session_listener(&self.session, &self.stores));

        let interval = self.config.session.expiry_check_interval_secs;
        if interval > 0 {
            let watchdog = self.session.spawn_expiry_watchdog(Duration::from_secs(interval));
            *self.watchdog.lock().await = Some(watchdog);
        } else {
            debug!("Expiry watchdog disabled");
        }

        info!(status = %status, "Application context started");
        status
    }

    pub async fn login(&self, email: &str, password: &str) -> LoginOutcome {
        self.auth.login(email, password).await
    }

    /// End the session and clear every store.
    pub fn logout(&self) {
        self.auth.logout();
        self.stores.reset_all();
    }

    /// Stop the background tasks.
    ///
    /// # Errors
    /// Does not fail at present.
    pub async fn shutdown(&self) -> Result<()> {
        info!("shutdown called on AppContext");
        self.stop_tasks().await;
        Ok(())
    }

    /// Whether the expiry watchdog is currently running.
    pub async fn watchdog_running(&self) -> bool {
        self.watchdog.lock().await.as_ref().is_some_and(ExpiryWatchdog::is_running)
    }

    async fn stop_tasks(&self) {
        if let Some(mut watchdog) = self.watchdog.lock().await.take() {
            watchdog.stop().await;
        }

        if let Some((cancel, handle)) = self.listener.lock().await.take() {
            cancel.cancel();
            match tokio::time::timeout(LISTENER_STOP_TIMEOUT, handle).await {
                Ok(Ok(())) => debug!("Session listener stopped"),
                Ok(Err(e)) => warn!(error = %e, "Session listener task failed"),
                Err(_) => warn!("Session listener did not stop within timeout"),
            }
        }
    }
}

/// Resets every store after each sign-out, so no data from the previous
/// session stays visible. The watch channel only keeps the latest state, so
/// sign-outs are detected by their count rather than by the status seen: a
/// logout followed at once by a new login still counts.
fn spawn_session_listener(
    session: &Arc<SessionContext>,
    stores: &Arc<EntityStores>,
) -> (CancellationToken, JoinHandle<()>) {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let mut updates = session.subscribe();
    let stores = Arc::clone(stores);

    let handle = tokio::spawn(async move {
        let mut seen_sign_outs = updates.borrow_and_update().sign_outs;
        loop {
            tokio::select! {
                biased;
                () = token.cancelled() => break,
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = updates.borrow_and_update().clone();
                    if state.sign_outs != seen_sign_outs {
                        info!(reason = ?state.last_logout, "Session ended; clearing stores");
                        stores.reset_all();
                        seen_sign_outs = state.sign_outs;
                    }
                }
            }
        }
    });

    (cancel, handle)
}
