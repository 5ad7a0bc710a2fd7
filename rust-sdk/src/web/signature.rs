//! Webhook signature signing and verification.
//!
//! The coordinator signs every forwarded query with HMAC-SHA256 over the raw
//! request body, keyed by the shared webhook secret, and sends the lowercase
//! hex digest in the `x-mt-signature` header.
//!
//! Verification must run against the exact bytes received, before any JSON
//! parsing: re-serializing a parsed body can reorder keys or change
//! whitespace and break an otherwise valid signature.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::{Choice, ConstantTimeEq};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex-encoded webhook signature.
pub const SIGNATURE_HEADER: &str = "x-mt-signature";

/// Length in bytes of an HMAC-SHA256 digest.
const DIGEST_LEN: usize = 32;

fn digest(payload: &[u8], secret: &str) -> [u8; DIGEST_LEN] {
    // HMAC accepts keys of any length, so this cannot fail.
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC key of any length is valid"));
    mac.update(payload);

    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

/// Compute the lowercase hex HMAC-SHA256 of `payload` keyed by `secret`.
///
/// The result is always 64 characters long and deterministic for a given
/// payload and secret.
pub fn sign(payload: &[u8], secret: &str) -> String {
    hex::encode(digest(payload, secret))
}

/// Verify a hex-encoded signature over `payload`.
///
/// Returns `false` for a wrong signature, for a signature that is not valid
/// hex, and for one whose decoded length is not 32 bytes. Never panics, so
/// callers can treat "malformed" and "wrong" identically.
pub fn verify(payload: &[u8], provided_hex: &str, secret: &str) -> bool {
    let expected = digest(payload, secret);
    let provided = hex::decode(provided_hex.trim()).unwrap_or_default();

    constant_time_eq(&expected, &provided)
}

/// Constant-time comparison of a digest against untrusted bytes.
///
/// `provided` is copied into a fixed 32-byte buffer so the comparison always
/// covers a full digest; a length mismatch is folded into the result.
fn constant_time_eq(expected: &[u8; DIGEST_LEN], provided: &[u8]) -> bool {
    let mut buf = [0u8; DIGEST_LEN];
    let n = provided.len().min(DIGEST_LEN);
    buf[..n].copy_from_slice(&provided[..n]);

    let len_ok = Choice::from((provided.len() == DIGEST_LEN) as u8);
    (expected[..].ct_eq(&buf[..]) & len_ok).into()
}

/// Check if webhook signature verification can be performed.
pub fn is_signature_verification_enabled(secret: &Option<String>) -> bool {
    secret
        .as_ref()
        .map(|s| !s.trim().is_empty())
        .unwrap_or(false)
}
