//! Cryptographic utilities for webhook verification.
//!
//! MercadoPago signs webhook deliveries with HMAC-SHA256 over a manifest
//! built from the notification; these helpers compute and compare that
//! signature.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute HMAC-SHA256 and return the hex-encoded result.
///
/// # Panics
///
/// This function will never panic in practice. The `expect` call is guarded
/// by the invariant that HMAC-SHA256 accepts keys of any size per RFC 2104.
#[must_use]
pub fn hmac_sha256_hex(secret: &str, message: &str) -> String {
    // INVARIANT: HMAC-SHA256 accepts keys of any size per RFC 2104, so
    // `new_from_slice` only fails if the Hmac implementation is broken.
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC-SHA256 accepts any key size");
    mac.update(message.as_bytes());
    let result = mac.finalize();

    hex::encode(result.into_bytes())
}

/// Constant-time string comparison to prevent timing attacks when
/// verifying signatures and API keys.
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hmac_sha256_produces_hex_digest() {
        let result = hmac_sha256_hex("key", "id:123;request-id:req-1;ts:1704908010;");
        assert_eq!(result.len(), 64); // SHA256 = 32 bytes = 64 hex chars
    }

    #[test]
    fn hmac_sha256_is_deterministic() {
        let a = hmac_sha256_hex("secret", "message");
        let b = hmac_sha256_hex("secret", "message");
        assert_eq!(a, b);
    }

    #[test]
    fn hmac_sha256_differs_per_secret() {
        let a = hmac_sha256_hex("secret-a", "message");
        let b = hmac_sha256_hex("secret-b", "message");
        assert_ne!(a, b);
    }

    #[test]
    fn constant_time_eq_basics() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(constant_time_eq("", ""));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "ab"));
    }
}
