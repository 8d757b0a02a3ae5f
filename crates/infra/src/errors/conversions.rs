//! Conversions from external infrastructure errors into domain errors.
//!
//! Transport failures become [`RequestError`]s of kind `NetworkFailure`
//! (or `InvalidRequest` when reqwest refused to build the request); keychain
//! failures become [`StorageError`]s tagged with the key involved.

use backoffice_domain::{RequestError, StorageError};
use keyring::Error as KeyringError;
use reqwest::Error as HttpError;

/* -------------------------------------------------------------------------- */
/* reqwest::Error → RequestError */
/* -------------------------------------------------------------------------- */

/// Classifies a reqwest failure. Status errors never reach here: the
/// gateway reads every response itself.
pub fn transport_error(err: &HttpError) -> RequestError {
    if err.is_builder() {
        return RequestError::invalid_request(format!("request could not be built: {err}"));
    }

    if err.is_timeout() {
        return RequestError::network("HTTP request timed out");
    }

    #[cfg(not(target_arch = "wasm32"))]
    if err.is_connect() {
        return RequestError::network("HTTP connection failure");
    }

    if err.is_body() || err.is_decode() {
        return RequestError::network(format!("failed to read response body: {err}"));
    }

    RequestError::network(err.to_string())
}

/* -------------------------------------------------------------------------- */
/* keyring::Error → StorageError */
/* -------------------------------------------------------------------------- */

/// Maps a keychain failure for `key`. `NoEntry` is not an error for the
/// session store and is handled before this is called.
pub fn keyring_to_storage(key: &str, err: KeyringError) -> StorageError {
    let key = key.to_string();
    match err {
        KeyringError::BadEncoding(_) => {
            StorageError::Corrupt { key, message: "keychain value is not valid UTF-8".into() }
        }
        KeyringError::TooLong(name, limit) => StorageError::Write {
            key,
            message: format!("keychain attribute '{name}' exceeds platform limit ({limit})"),
        },
        KeyringError::Invalid(attr, reason) => StorageError::Write {
            key,
            message: format!("keychain attribute '{attr}' is invalid: {reason}"),
        },
        KeyringError::Ambiguous(entries) => StorageError::Read {
            key,
            message: format!("multiple keychain entries matched ({} results)", entries.len()),
        },
        KeyringError::PlatformFailure(err) => {
            StorageError::Unavailable(format!("keychain platform error: {err}"))
        }
        KeyringError::NoStorageAccess(err) => {
            StorageError::Unavailable(format!("unable to access secure storage: {err}"))
        }
        other => StorageError::Read { key, message: other.to_string() },
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use backoffice_domain::RequestErrorKind;
    use reqwest::Client;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn keyring_encoding_error_is_corruption() {
        let err = keyring_to_storage("user", KeyringError::BadEncoding(vec![0xff]));
        assert!(matches!(err, StorageError::Corrupt { ref key, .. } if key == "user"));
    }

    #[test]
    fn keyring_platform_failure_is_unavailable() {
        let err = keyring_to_storage(
            "access_token",
            KeyringError::PlatformFailure("locked".to_string().into()),
        );
        assert!(matches!(err, StorageError::Unavailable(_)));
    }

    #[tokio::test]
    async fn timeout_maps_to_network_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
            .mount(&server)
            .await;

        let client =
            Client::builder().no_proxy().timeout(Duration::from_millis(50)).build().unwrap();
        let err = client.get(server.uri()).send().await.unwrap_err();

        let mapped = transport_error(&err);
        assert_eq!(mapped.kind, RequestErrorKind::NetworkFailure);
        assert_eq!(mapped.user_message(), "HTTP request timed out");
    }
}
