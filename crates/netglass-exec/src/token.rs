//! Signed token envelope for the REST transport
//!
//! Commands and responses cross the wire as `{"encoded": <jwt>}`. The JWT
//! is HS256-signed with the target device's credential secret and carries
//! the plaintext in a `payload` claim whose expiry equals the remaining
//! request budget at encode time. Verification checks signature and expiry
//! with zero leeway; a token that fails either check yields an error, never
//! its contents.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Wire body for both requests and responses
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope {
    /// Signed serialization of the plaintext payload
    pub encoded: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    payload: String,
    iat: i64,
    exp: i64,
}

/// Token encode/decode failures
#[derive(Debug, Error)]
pub enum TokenError {
    /// Signing failed
    #[error("failed to sign token: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),

    /// Verification failed; covers bad signatures, expired tokens and
    /// malformed input alike
    #[error("failed to verify token: {0}")]
    Decode(#[source] jsonwebtoken::errors::Error),
}

/// Sign `payload` with `secret`, valid for `duration`
///
/// # Errors
/// Returns [`TokenError::Encode`] if signing fails.
pub fn encode_payload(
    payload: &str,
    secret: &str,
    duration: Duration,
) -> Result<String, TokenError> {
    let now = Utc::now().timestamp();
    let lifetime = i64::try_from(duration.as_secs()).unwrap_or(i64::MAX);
    let claims = Claims {
        payload: payload.to_string(),
        iat: now,
        exp: now.saturating_add(lifetime),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(TokenError::Encode)
}

/// Verify `token` with `secret` and return the plaintext payload
///
/// # Errors
/// Returns [`TokenError::Decode`] on signature mismatch, expiry or
/// malformed tokens; content whose authenticity cannot be confirmed is
/// never returned.
pub fn decode_payload(token: &str, secret: &str) -> Result<String, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(TokenError::Decode)?;
    Ok(data.claims.payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "s3cr3t";

    #[test]
    fn test_round_trip() {
        let token = encode_payload("show version", SECRET, Duration::from_secs(60)).unwrap();
        let payload = decode_payload(&token, SECRET).unwrap();
        assert_eq!(payload, "show version");
    }

    #[test]
    fn test_round_trip_preserves_multiline_payload() {
        let raw = "line one\n\nline two";
        let token = encode_payload(raw, SECRET, Duration::from_secs(60)).unwrap();
        assert_eq!(decode_payload(&token, SECRET).unwrap(), raw);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = encode_payload("show version", SECRET, Duration::from_secs(60)).unwrap();
        let result = decode_payload(&token, "wrong");
        assert!(matches!(result, Err(TokenError::Decode(_))));
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let token = encode_payload("show version", SECRET, Duration::from_secs(60)).unwrap();
        // flip a character in the payload segment
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        assert_eq!(parts.len(), 3);
        let mid = parts[1].len() / 2;
        let replacement = if parts[1].as_bytes()[mid] == b'A' { "B" } else { "A" };
        parts[1].replace_range(mid..=mid, replacement);
        let tampered = parts.join(".");

        let result = decode_payload(&tampered, SECRET);
        assert!(matches!(result, Err(TokenError::Decode(_))));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let token = encode_payload("show version", SECRET, Duration::ZERO).unwrap();
        std::thread::sleep(Duration::from_millis(1100));
        let result = decode_payload(&token, SECRET);
        assert!(matches!(result, Err(TokenError::Decode(_))));
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        assert!(decode_payload("not-a-token", SECRET).is_err());
    }
}
