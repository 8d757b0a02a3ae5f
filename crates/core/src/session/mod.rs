//! Session lifecycle: credential store, expiry monitor, token inspection

mod context;
mod memory;
pub mod token;
mod watchdog;

pub use context::SessionContext;
pub use memory::MemorySessionStorage;
pub use token::{TokenDefect, TokenValidity};
pub use watchdog::ExpiryWatchdog;
