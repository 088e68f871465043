use crate::core::constants::COMPRESSED_TOKEN_PROGRAM_ID;
use crate::error::{NullTraceError, Result};
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

//=============================================================================
// PDA Derivation Helpers
//=============================================================================

/// Derive the compression pool PDA of a token mint
pub fn derive_token_pool_pda(mint: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[b"pool", mint.as_ref()], &COMPRESSED_TOKEN_PROGRAM_ID)
}

/// Associated holding account of `owner` for `mint` under `token_program`
pub fn derive_holding_address(owner: &Pubkey, mint: &Pubkey, token_program: &Pubkey) -> Pubkey {
    spl_associated_token_account::get_associated_token_address_with_program_id(
        owner,
        mint,
        token_program,
    )
}

//=============================================================================
// Amounts
//=============================================================================

/// Convert a human decimal string to raw units, dropping digits beyond
/// `decimals`. Zero and malformed input are rejected.
pub fn parse_amount(amount: &str, decimals: u8) -> Result<u64> {
    let invalid = |reason: &str| {
        NullTraceError::InvalidArgument(format!("invalid amount {:?}: {}", amount, reason))
    };

    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(invalid("empty"));
    }
    let (whole, fraction) = match trimmed.split_once('.') {
        Some((w, f)) => (w, f),
        None => (trimmed, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid("no digits"));
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return Err(invalid("expected an unsigned decimal number"));
    }

    let scale = 10u128
        .checked_pow(decimals as u32)
        .ok_or_else(|| invalid("too many decimals"))?;
    let whole_units = if whole.is_empty() {
        0
    } else {
        u128::from_str(whole).map_err(|_| invalid("out of range"))?
    };

    let kept: String = fraction.chars().take(decimals as usize).collect();
    let fraction_units = if kept.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", kept, width = decimals as usize);
        u128::from_str(&padded).map_err(|_| invalid("out of range"))?
    };

    let raw = whole_units
        .checked_mul(scale)
        .and_then(|v| v.checked_add(fraction_units))
        .ok_or_else(|| invalid("out of range"))?;
    let raw = u64::try_from(raw).map_err(|_| invalid("out of range"))?;
    if raw == 0 {
        return Err(invalid("must be greater than zero"));
    }
    Ok(raw)
}

/// Render raw units as a decimal string without trailing zeros.
///
/// Works on the digit string so any `u8` precision is accepted.
pub fn format_amount(raw: u64, decimals: u8) -> String {
    let decimals = decimals as usize;
    if decimals == 0 {
        return raw.to_string();
    }
    let digits = format!("{:0>width$}", raw, width = decimals + 1);
    let (whole, fraction) = digits.split_at(digits.len() - decimals);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, fraction)
    }
}

pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
