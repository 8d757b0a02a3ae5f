//! # Backoffice Domain
//!
//! Data types for the back-office data-access layer.
//!
//! This crate contains:
//! - Session types (credentials, profile, session state)
//! - Query state, pagination and filters shared by every entity store
//! - The response envelope and gateway request description
//! - Error types, configuration structures and constants
//!
//! ## Architecture
//! - No dependencies on other backoffice crates
//! - No I/O

pub mod config;
pub mod constants;
pub mod envelope;
pub mod errors;
pub mod macros;
pub mod request;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use envelope::Envelope;
pub use errors::*;
pub use request::{ApiRequest, FormPart, HttpMethod, RequestBody};
pub use types::*;
