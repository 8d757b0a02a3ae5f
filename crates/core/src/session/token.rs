//! Bearer token inspection
//!
//! Only the payload's `exp` and `sub` claims are read; signatures are the
//! server's concern. Anything that prevents proving validity (wrong shape, bad
//! base64, non-JSON payload, missing or out-of-range `exp`) yields a
//! [`TokenDefect`] instead of an error.

use base64::alphabet;
use base64::engine::general_purpose::GeneralPurposeConfig;
use base64::engine::{DecodePaddingMode, GeneralPurpose};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// URL-safe alphabet, padding optional
const JWT_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Why a token's validity cannot be established
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenDefect {
    /// Not three dot-separated, non-empty header/payload parts
    Shape,
    /// Payload is not base64url
    Encoding,
    /// Payload is not a JSON object
    Payload,
    /// No numeric `exp` claim
    MissingExpiry,
    /// `exp` is not a representable instant
    ExpiryOutOfRange,
}

impl TokenDefect {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shape => "not a three-part token",
            Self::Encoding => "payload is not base64url",
            Self::Payload => "payload is not a JSON object",
            Self::MissingExpiry => "no exp claim",
            Self::ExpiryOutOfRange => "exp claim out of range",
        }
    }
}

/// Outcome of checking a token against the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenValidity {
    Valid { expires_at: DateTime<Utc> },
    Expired { expires_at: DateTime<Utc> },
    Invalid(TokenDefect),
}

impl TokenValidity {
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }
}

#[derive(Deserialize)]
struct Claims {
    exp: Option<Value>,
    sub: Option<Value>,
}

fn decode_claims(token: &str) -> Result<Claims, TokenDefect> {
    let mut parts = token.trim().split('.');
    let (Some(header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TokenDefect::Shape);
    };
    if header.is_empty() || payload.is_empty() {
        return Err(TokenDefect::Shape);
    }

    let bytes = JWT_ENGINE.decode(payload).map_err(|_| TokenDefect::Encoding)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenDefect::Payload)
}

/// Decodes the `exp` claim of `token`.
///
/// # Errors
/// Returns the [`TokenDefect`] that prevented decoding.
pub fn decode_expiry(token: &str) -> Result<DateTime<Utc>, TokenDefect> {
    let claims = decode_claims(token)?;

    // Numeric date: seconds since the epoch, possibly fractional
    let exp = match claims.exp {
        Some(Value::Number(n)) => {
            n.as_i64().or_else(|| n.as_f64().filter(|f| f.is_finite()).map(float_seconds))
        }
        _ => None,
    }
    .ok_or(TokenDefect::MissingExpiry)?;

    DateTime::<Utc>::from_timestamp(exp, 0).ok_or(TokenDefect::ExpiryOutOfRange)
}

/// The `sub` claim of `token`, numeric subjects rendered as strings.
#[must_use]
pub fn subject(token: &str) -> Option<String> {
    match decode_claims(token).ok()?.sub? {
        Value::String(sub) => Some(sub),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn float_seconds(value: f64) -> i64 {
    // Saturating cast; out-of-range values fail the timestamp conversion
    value.floor() as i64
}

/// Checks `token` against `now`.
///
/// Expired means `exp` strictly before `now`.
#[must_use]
pub fn assess(token: &str, now: DateTime<Utc>) -> TokenValidity {
    match decode_expiry(token) {
        Ok(expires_at) if expires_at < now => TokenValidity::Expired { expires_at },
        Ok(expires_at) => TokenValidity::Valid { expires_at },
        Err(defect) => TokenValidity::Invalid(defect),
    }
}
