use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Hex-encoded HMAC-SHA256 of `payload` under `secret`. Webhook senders sign the raw request body
/// with this scheme and put the digest in their signature header.
pub fn calculate_hmac(secret: &str, payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time comparison of a presented signature against the expected digest for `payload`.
/// The length check leaks nothing useful since the digest length is not secret.
pub fn verify_hmac(secret: &str, payload: &[u8], provided: &str) -> bool {
    let expected = calculate_hmac(secret, payload);
    if expected.len() != provided.len() {
        return false;
    }
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}
