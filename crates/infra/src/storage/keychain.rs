use backoffice_core::SessionStorage;
use backoffice_domain::StorageError;
use keyring::Entry;
use tracing::debug;

use crate::errors::keyring_to_storage;

/// Session keys stored as individual OS keychain entries under one service.
pub struct KeychainSessionStorage {
    service: String,
}

impl KeychainSessionStorage {
    pub fn new(service: impl Into<String>) -> Self {
        Self { service: service.into() }
    }

    /// Whether entries reach the OS credential store. Without the
    /// `native-keychain` feature keyring falls back to a mock in which every
    /// `Entry` is a separate in-memory credential, so nothing written can be
    /// read back.
    #[must_use]
    pub const fn is_native() -> bool {
        cfg!(feature = "native-keychain")
    }

    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    fn entry(&self, key: &str) -> Result<Entry, StorageError> {
        Entry::new(&self.service, key).map_err(|e| keyring_to_storage(key, e))
    }
}

impl SessionStorage for KeychainSessionStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(keyring_to_storage(key, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        debug!(service = %self.service, key, "Storing session key in keychain");
        self.entry(key)?.set_password(value).map_err(|e| keyring_to_storage(key, e))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(keyring_to_storage(key, e)),
        }
    }
}
