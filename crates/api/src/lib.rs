//! # Backoffice App
//!
//! Composition root of the back-office data-access layer.
//!
//! This crate contains:
//! - Application context (dependency injection)
//! - Startup and shutdown of the session background tasks
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture
//! - Exposes the session and entity stores a UI layer binds to

pub mod context;

pub use context::{AppContext, EntityStores};
