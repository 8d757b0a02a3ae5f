//! Infrastructure error conversions

mod conversions;

pub use conversions::{keyring_to_storage, transport_error};
