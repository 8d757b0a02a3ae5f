//! # Backoffice Core
//!
//! Business logic of the data-access layer, free of HTTP and storage code.
//!
//! This crate contains:
//! - The session context: credential store, expiry monitor, watchdog
//! - The generic entity query store and its mutation discipline
//! - Page and envelope adapters
//! - The entity catalog (endpoints, filters, mutation builders)
//!
//! ## Architecture Principles
//! - Only depends on `backoffice-domain`
//! - All I/O through the traits in [`ports`]
//! - Everything testable with the doubles in `testing`

pub mod entities;
pub mod ports;
pub mod query;
pub mod session;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use entities::EntityStore;
pub use ports::{AccessTokenProvider, ApiGateway, ApiGatewayExt, Clock, SessionStorage, SystemClock};
pub use query::{FetchOutcome, ListEndpoint, Mutation, QueryStore};
pub use session::{ExpiryWatchdog, MemorySessionStorage, SessionContext, TokenValidity};
