use crate::core::connection::LedgerClient;
use crate::error::{NullTraceError, Result};
use crate::types::{Asset, AssetKind};
use solana_sdk::pubkey::Pubkey;
use spl_token::solana_program::program_pack::Pack;
use spl_token::state::Mint;
use std::str::FromStr;

/// Parse a base58 mint identifier
pub fn parse_mint(mint: &str) -> Result<Pubkey> {
    Pubkey::from_str(mint.trim())
        .map_err(|e| NullTraceError::InvalidArgument(format!("invalid mint {}: {}", mint, e)))
}

/// Resolve decimals and owning program of a mint.
///
/// The native mint is answered locally; anything else is looked up on chain
/// and decoded with the base SPL mint layout, which token-2022 shares.
pub async fn resolve_asset(ledger: &dyn LedgerClient, mint: &str) -> Result<Asset> {
    let mint = parse_mint(mint)?;
    if mint == spl_token::native_mint::ID {
        return Ok(Asset::native());
    }

    let account = ledger
        .get_account(&mint)
        .await
        .map_err(|e| NullTraceError::Connection(e.to_string()))?
        .ok_or(NullTraceError::AssetNotFound(mint))?;

    let kind = AssetKind::from_token_program(&account.owner).ok_or_else(|| {
        NullTraceError::InvalidArgument(format!(
            "{} is owned by {}, not a token program",
            mint, account.owner
        ))
    })?;

    if account.data.len() < Mint::LEN {
        return Err(NullTraceError::AssetNotFound(mint));
    }
    let state = Mint::unpack_from_slice(&account.data[..Mint::LEN])
        .map_err(|_| NullTraceError::AssetNotFound(mint))?;
    if !state.is_initialized {
        return Err(NullTraceError::AssetNotFound(mint));
    }

    Ok(Asset {
        mint,
        decimals: state.decimals,
        kind,
    })
}
