//! Macro for implementing Display and FromStr for small string-backed enums
//!
//! Used for status and style enums that cross the storage or configuration
//! boundary as plain strings. Parsing is case-insensitive; output is the
//! lowercase form given in the mapping.
//!
//! # Example
//!
//! ```rust
//! use backoffice_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum SyncState {
//!     Idle,
//!     Loading,
//! }
//!
//! impl_domain_status_conversions!(SyncState {
//!     Idle => "idle",
//!     Loading => "loading",
//! });
//!
//! assert_eq!(SyncState::Loading.to_string(), "loading");
//! assert_eq!("IDLE".parse::<SyncState>(), Ok(SyncState::Idle));
//! ```

/// Implements Display and FromStr traits for string-backed enums
///
/// # Arguments
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their lowercase string
///   representations
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
