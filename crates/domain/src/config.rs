//! Configuration management

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_API_TIMEOUT_SECS, DEFAULT_EXPIRY_CHECK_INTERVAL_SECS,
    DEFAULT_KEYCHAIN_SERVICE, DEFAULT_PAGE_SIZE, DEFAULT_SEARCH_DEBOUNCE_MS, DEFAULT_SESSION_FILE,
    DEFAULT_USER_AGENT,
};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub stores: StoreConfig,
    pub logging: LoggingConfig,
}

/// Remote API configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Endpoint table; entries given in a config file override the defaults
    pub endpoints: EndpointRegistry,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: DEFAULT_API_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            endpoints: EndpointRegistry::default(),
        }
    }
}

/// Default endpoint table of the admin API: logical key and relative path.
const DEFAULT_ENDPOINTS: &[(&str, &str)] = &[
    ("auth.login", "admin/auth/login"),
    ("admins.create", "create-admin"),
    ("admins.update", "update-admin"),
    ("admins.list", "get-all-admins"),
    ("roles.create", "add-role"),
    ("roles.update", "update-role"),
    ("roles.delete", "delete-role"),
    ("roles.list", "fetch-roles"),
    ("clients.list", "Client"),
    ("clients.create", "Client/register"),
    ("clients.update", "update-new-client"),
    ("clients.details", "Client"),
    ("clients.unarchive", "un-achieve-client"),
    ("jobs.create", "post-job"),
    ("jobs.update", "update-job"),
    ("jobs.delete", "delete-job"),
    ("jobs.publish", "update-job-status"),
    ("jobs.permanent.create", "Job"),
    ("jobs.permanent.list", "Job/my-jobs"),
    ("jobs.temporary.list", "get-all-temporary-jobs"),
    ("jobs.posted.list", "get-all-posted_jobs"),
    ("internal_jobs.list", "internal-jobs"),
    ("internal_jobs.by_client", "internal-jobs/clients"),
    ("internal_jobs.item", "internal-jobs"),
    ("internal_jobs.weekly_timesheets", "internal-jobs/weekly-timesheets"),
    ("bookings.create", "create-booking"),
    ("bookings.delete", "delete-booking"),
    ("bookings.list", "get-all-bookings"),
    ("applications.list", "get-all"),
    ("applications.accept", "accept"),
    ("applications.decline", "decline"),
    ("applications.interview", "set-interview"),
    ("candidates.list", "get-all-candidate"),
    ("candidates.details", "fetch-single-candidate"),
    ("candidates.verify", "verify-candidate"),
    ("timesheets.list", "get-all-tms"),
    ("timesheets.approve", "approve-tsm"),
    ("timesheets.update", "update-tsm"),
    ("timesheets.reject", "reject-tsm"),
    ("invoices.list", "get-report"),
    ("invoices.generate", "fetch-report"),
    ("payslips.generate", "store-payslip"),
];

/// Logical endpoint key to relative path.
///
/// Deserializes from a plain map that is merged over the default table, so a
/// config file only lists the endpoints it moves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct EndpointRegistry {
    paths: BTreeMap<String, String>,
}

impl EndpointRegistry {
    /// Registry without any endpoints.
    pub fn empty() -> Self {
        Self { paths: BTreeMap::new() }
    }

    /// Default table with `overrides` applied on top.
    pub fn with_overrides<I, K, V>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut registry = Self::default();
        for (key, path) in overrides {
            registry.insert(key, path);
        }
        registry
    }

    pub fn insert(&mut self, key: impl Into<String>, path: impl Into<String>) {
        self.paths.insert(key.into(), path.into());
    }

    /// Relative path for `key`, if registered.
    #[must_use]
    pub fn resolve(&self, key: &str) -> Option<&str> {
        self.paths.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl Default for EndpointRegistry {
    fn default() -> Self {
        let paths = DEFAULT_ENDPOINTS
            .iter()
            .map(|(key, path)| ((*key).to_string(), (*path).to_string()))
            .collect();
        Self { paths }
    }
}

impl From<BTreeMap<String, String>> for EndpointRegistry {
    fn from(overrides: BTreeMap<String, String>) -> Self {
        Self::with_overrides(overrides)
    }
}

impl From<EndpointRegistry> for BTreeMap<String, String> {
    fn from(registry: EndpointRegistry) -> Self {
        registry.paths
    }
}

/// Where the credential store persists the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StorageBackend {
    /// JSON file holding every session key
    File { path: PathBuf },
    /// OS keychain, one entry per key under `service`
    Keychain { service: String },
    /// Process memory only; nothing survives a restart
    Memory,
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::File { path: PathBuf::from(DEFAULT_SESSION_FILE) }
    }
}

impl StorageBackend {
    pub fn keychain() -> Self {
        Self::Keychain { service: DEFAULT_KEYCHAIN_SERVICE.to_string() }
    }
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub storage: StorageBackend,
    /// Period of the background expiry check; 0 disables the watchdog
    pub expiry_check_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage: StorageBackend::default(),
            expiry_check_interval_secs: DEFAULT_EXPIRY_CHECK_INTERVAL_SECS,
        }
    }
}

/// Entity store configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub default_page_size: u32,
    pub search_debounce_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { default_page_size: DEFAULT_PAGE_SIZE, search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE_MS }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG`
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}
