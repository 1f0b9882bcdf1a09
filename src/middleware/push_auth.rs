// SPDX-License-Identifier: MIT

//! Shared-secret authentication for the internal push endpoint.
//!
//! The sidecar signs the request body with HMAC-SHA256 and sends the hex
//! signature in `X-Push-Signature`. Verification uses a constant-time
//! comparison.

use crate::config::PUSH_SIGNATURE_HEADER;
use crate::error::AppError;
use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Compute the hex HMAC-SHA256 signature for a request body.
pub fn sign_push_body(secret: &[u8], body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify the `X-Push-Signature` header against the request body.
pub fn verify_push_signature(
    secret: &[u8],
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(), AppError> {
    let provided = headers
        .get(PUSH_SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Forbidden)?;

    let provided = hex::decode(provided).map_err(|_| AppError::Forbidden)?;

    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(body);
    let expected = mac.finalize().into_bytes();

    if expected.ct_eq(provided.as_slice()).into() {
        Ok(())
    } else {
        tracing::warn!("Rejected push request with bad signature");
        Err(AppError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_round_trip() {
        let secret = b"push_secret";
        let body = br#"{"user_ids":[1],"event":"x"}"#;
        let sig = sign_push_body(secret, body);

        let mut headers = HeaderMap::new();
        headers.insert(PUSH_SIGNATURE_HEADER, HeaderValue::from_str(&sig).unwrap());
        assert!(verify_push_signature(secret, &headers, body).is_ok());
    }

    #[test]
    fn test_rejects_wrong_secret() {
        let body = b"payload";
        let sig = sign_push_body(b"secret_a", body);

        let mut headers = HeaderMap::new();
        headers.insert(PUSH_SIGNATURE_HEADER, HeaderValue::from_str(&sig).unwrap());
        assert!(verify_push_signature(b"secret_b", &headers, body).is_err());
    }

    #[test]
    fn test_rejects_missing_header() {
        let headers = HeaderMap::new();
        assert!(verify_push_signature(b"secret", &headers, b"payload").is_err());
    }

    #[test]
    fn test_rejects_tampered_body() {
        let secret = b"push_secret";
        let sig = sign_push_body(secret, b"original");

        let mut headers = HeaderMap::new();
        headers.insert(PUSH_SIGNATURE_HEADER, HeaderValue::from_str(&sig).unwrap());
        assert!(verify_push_signature(secret, &headers, b"tampered").is_err());
    }
}
