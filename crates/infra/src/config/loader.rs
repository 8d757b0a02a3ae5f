//! Configuration loader
//!
//! ## Loading Strategy
//! 1. Environment variables, when `BACKOFFICE_API_BASE_URL` is set
//! 2. Otherwise the first config file found by [`probe_config_paths`]
//! 3. JSON or TOML, chosen by file extension
//!
//! ## Environment Variables
//! - `BACKOFFICE_API_BASE_URL`: API base URL (required)
//! - `BACKOFFICE_API_TIMEOUT_SECS`: Request timeout in seconds
//! - `BACKOFFICE_SESSION_FILE`: Session file path (file storage)
//! - `BACKOFFICE_KEYCHAIN_SERVICE`: Keychain service (keychain storage, wins
//!   over the session file)
//! - `BACKOFFICE_EXPIRY_CHECK_SECS`: Expiry watchdog period, `0` disables it
//! - `BACKOFFICE_PAGE_SIZE`: Default page size of every store
//! - `BACKOFFICE_LOG_LEVEL`: Log filter directive
//! - `BACKOFFICE_LOG_JSON`: JSON log output (true/false)
//!
//! Variables that are not set keep their defaults.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use backoffice_domain::{BackofficeError, Config, Result, StorageBackend};

const CONFIG_FILE_NAMES: [&str; 4] =
    ["backoffice.json", "backoffice.toml", "config.json", "config.toml"];

/// Load configuration from the environment, falling back to a config file.
///
/// # Errors
/// Returns `BackofficeError::Config` when neither source yields a valid
/// configuration.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Environment configuration unavailable, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from `BACKOFFICE_*` environment variables.
///
/// # Errors
/// Returns `BackofficeError::Config` if `BACKOFFICE_API_BASE_URL` is missing
/// or a numeric variable does not parse.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();
    config.api.base_url = env_var("BACKOFFICE_API_BASE_URL")?;

    if let Some(timeout) = env_parse("BACKOFFICE_API_TIMEOUT_SECS")? {
        config.api.timeout_secs = timeout;
    }

    if let Ok(service) = std::env::var("BACKOFFICE_KEYCHAIN_SERVICE") {
        config.session.storage = StorageBackend::Keychain { service };
    } else if let Ok(path) = std::env::var("BACKOFFICE_SESSION_FILE") {
        config.session.storage = StorageBackend::File { path: PathBuf::from(path) };
    }

    if let Some(interval) = env_parse("BACKOFFICE_EXPIRY_CHECK_SECS")? {
        config.session.expiry_check_interval_secs = interval;
    }

    if let Some(page_size) = env_parse::<u32>("BACKOFFICE_PAGE_SIZE")? {
        if page_size == 0 {
            return Err(BackofficeError::Config("BACKOFFICE_PAGE_SIZE must be positive".into()));
        }
        config.stores.default_page_size = page_size;
    }

    if let Ok(level) = std::env::var("BACKOFFICE_LOG_LEVEL") {
        config.logging.level = level;
    }
    config.logging.json = env_bool("BACKOFFICE_LOG_JSON", config.logging.json);

    Ok(config)
}

/// Load configuration from a file.
///
/// If `path` is `None`, probes the standard locations.
///
/// # Errors
/// Returns `BackofficeError::Config` if the file is missing, unreadable, or
/// not valid JSON/TOML for [`Config`].
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(BackofficeError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            BackofficeError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| BackofficeError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| BackofficeError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| BackofficeError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(BackofficeError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file in the working directory, its parent, or the
/// executable's directory.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd.join(".."));
        dirs.insert(0, cwd);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.is_file())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| BackofficeError::Config(format!("Missing required environment variable: {key}")))
}

/// `Ok(None)` when unset.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| BackofficeError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(None),
    }
}

/// Accepts `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive).
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map_or(default, |s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}
