//! Admin API adapters
//!
//! [`ApiClient`] is the authenticated request gateway used by every entity
//! store; [`AuthService`] performs the unauthenticated login exchange.

pub mod auth;
pub mod client;

pub use auth::{AuthService, LoginOutcome};
pub use client::ApiClient;
