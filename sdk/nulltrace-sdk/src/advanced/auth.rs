//! One-time codes for the `x-null-client-secret` header.
//!
//! Standard HOTP (HMAC-SHA1, dynamic truncation) over a 180-second time
//! counter, six digits, zero padded.

use crate::core::constants::{AUTH_TOKEN_DIGITS, AUTH_TOKEN_STEP_SECS};
use crate::error::{NullTraceError, Result};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use std::time::{SystemTime, UNIX_EPOCH};

type HmacSha1 = Hmac<Sha1>;

/// Code for the current wall-clock window
pub fn auth_token(secret: &str) -> Result<String> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    auth_token_at(secret, now)
}

/// Code for the window containing `unix_secs`
pub fn auth_token_at(secret: &str, unix_secs: u64) -> Result<String> {
    hotp(secret.as_bytes(), unix_secs / AUTH_TOKEN_STEP_SECS)
}

fn hotp(secret: &[u8], counter: u64) -> Result<String> {
    let mut mac = HmacSha1::new_from_slice(secret)
        .map_err(|e| NullTraceError::InvalidArgument(format!("auth secret: {}", e)))?;
    mac.update(&counter.to_be_bytes());
    let hash = mac.finalize().into_bytes();

    let offset = (hash[hash.len() - 1] & 0x0f) as usize;
    let code = ((hash[offset] as u32 & 0x7f) << 24)
        | ((hash[offset + 1] as u32) << 16)
        | ((hash[offset + 2] as u32) << 8)
        | (hash[offset + 3] as u32);

    let modulus = 10u32.pow(AUTH_TOKEN_DIGITS);
    Ok(format!(
        "{:0width$}",
        code % modulus,
        width = AUTH_TOKEN_DIGITS as usize
    ))
}
