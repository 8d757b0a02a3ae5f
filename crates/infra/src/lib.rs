//! # Backoffice Infrastructure
//!
//! Infrastructure implementations of the core ports.
//!
//! This crate contains:
//! - The reqwest-based HTTP transport and the authenticated API client
//! - Login against the admin API
//! - Session storage backends (JSON file, OS keychain, memory)
//! - Configuration loading and tracing initialisation
//!
//! ## Architecture
//! - Implements traits defined in `backoffice-core`
//! - Contains all "impure" code (network, filesystem, keychain)

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;
pub mod storage;

// Re-export commonly used items
pub use api::{ApiClient, AuthService, LoginOutcome};
pub use http::HttpClient;
pub use observability::init_tracing;
pub use storage::{open_storage, FileSessionStorage, KeychainSessionStorage};
