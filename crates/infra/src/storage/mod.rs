//! Durable session storage backends
//!
//! Implementations of [`SessionStorage`] selected by
//! [`StorageBackend`]: a JSON file, the OS keychain, or process memory.

mod file;
mod keychain;

use std::sync::Arc;

use backoffice_core::{MemorySessionStorage, SessionStorage};
use backoffice_domain::{StorageBackend, StorageError};
use tracing::info;

pub use file::FileSessionStorage;
pub use keychain::KeychainSessionStorage;

/// Open the backend described by `backend`.
///
/// # Errors
/// Returns the storage error when an existing session file is unreadable,
/// or `StorageError::Unavailable` for the keychain backend in a build
/// without the `native-keychain` feature.
pub fn open_storage(backend: &StorageBackend) -> Result<Arc<dyn SessionStorage>, StorageError> {
    let storage: Arc<dyn SessionStorage> = match backend {
        StorageBackend::File { path } => {
            info!(path = %path.display(), "Using file session storage");
            Arc::new(FileSessionStorage::open(path)?)
        }
        StorageBackend::Keychain { service } => {
            if !KeychainSessionStorage::is_native() {
                return Err(StorageError::Unavailable(format!(
                    "keychain service '{service}' requested but this build has no OS keychain \
                     support (enable the native-keychain feature)"
                )));
            }
            info!(%service, "Using keychain session storage");
            Arc::new(KeychainSessionStorage::new(service.clone()))
        }
        StorageBackend::Memory => {
            info!("Using in-memory session storage");
            Arc::new(MemorySessionStorage::new())
        }
    };
    Ok(storage)
}
