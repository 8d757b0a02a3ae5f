//! Domain constants
//!
//! Storage keys are part of the persisted session format: changing one
//! orphans sessions written by earlier builds.

// Durable session storage keys
pub const KEY_ACCESS_TOKEN: &str = "access_token";
pub const KEY_REFRESH_TOKEN: &str = "refresh_token";
pub const KEY_USER: &str = "user";
pub const KEY_ROLES: &str = "roles";
pub const KEY_PERMISSIONS: &str = "permissions";

/// Every key written by the credential store, in write order.
pub const SESSION_KEYS: [&str; 5] =
    [KEY_ACCESS_TOKEN, KEY_REFRESH_TOKEN, KEY_USER, KEY_ROLES, KEY_PERMISSIONS];

// User-facing messages
pub const MSG_NO_ACCESS_TOKEN: &str = "No access token found";
pub const MSG_SESSION_EXPIRED: &str = "Session expired, please log in again";
pub const MSG_LOGIN_FAILED: &str = "Login failed";
pub const MSG_LOGIN_ERROR: &str = "An error occurred. Please try again.";
pub const MSG_LOGIN_SUCCEEDED: &str = "Login successful";
pub const MSG_OPERATION_SUCCEEDED: &str = "Operation completed successfully";
pub const MSG_OPERATION_FAILED: &str = "Operation failed";

// Store defaults
pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;

// Session defaults
pub const DEFAULT_EXPIRY_CHECK_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_KEYCHAIN_SERVICE: &str = "Backoffice.session";
pub const DEFAULT_SESSION_FILE: &str = "backoffice-session.json";

// API defaults
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api/";
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = "backoffice-client";
