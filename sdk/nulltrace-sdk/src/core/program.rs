use crate::types::{Asset, StateTreeInfo, ValidityProof, ValueRecord};
use async_trait::async_trait;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use std::error::Error;

/// Public value moved into compressed records.
///
/// Native assets take a single output per instruction; token assets accept
/// several outputs in one instruction.
#[derive(Debug, Clone)]
pub struct CompressRequest<'a> {
    pub payer: Pubkey,
    pub owner: Pubkey,
    pub asset: &'a Asset,
    /// Public holding account to debit (token assets only)
    pub source: Option<Pubkey>,
    /// Token pool receiving the public side (token assets only)
    pub token_pool: Option<Pubkey>,
    /// Recipient and raw amount pairs
    pub outputs: Vec<(Pubkey, u64)>,
    pub output_tree: StateTreeInfo,
}

/// Compressed records moved back to a public account
#[derive(Debug, Clone)]
pub struct DecompressRequest<'a> {
    pub payer: Pubkey,
    pub asset: &'a Asset,
    pub inputs: &'a [ValueRecord],
    /// Owner for native assets, holding account for token assets
    pub destination: Pubkey,
    pub amount: u64,
    pub proof: ValidityProof,
}

/// Compressed records moved to another owner without leaving the compressed domain
#[derive(Debug, Clone)]
pub struct TransferRequest<'a> {
    pub payer: Pubkey,
    pub asset: &'a Asset,
    pub inputs: &'a [ValueRecord],
    pub recipient: Pubkey,
    pub amount: u64,
    pub proof: ValidityProof,
}

/// Instruction construction for the compression programs.
///
/// The cryptographic side (proof layout, tree bookkeeping) stays behind this
/// seam; the orchestrators only decide *what* to move and *where*.
#[async_trait]
pub trait CompressionProgram: Send + Sync {
    async fn compress(
        &self,
        request: CompressRequest<'_>,
    ) -> Result<Instruction, Box<dyn Error + Send + Sync>>;

    async fn decompress(
        &self,
        request: DecompressRequest<'_>,
    ) -> Result<Instruction, Box<dyn Error + Send + Sync>>;

    async fn transfer(
        &self,
        request: TransferRequest<'_>,
    ) -> Result<Instruction, Box<dyn Error + Send + Sync>>;

    /// Register the compression pool of a token mint
    async fn create_token_pool(
        &self,
        payer: &Pubkey,
        mint: &Pubkey,
        token_program: &Pubkey,
    ) -> Result<Instruction, Box<dyn Error + Send + Sync>>;
}
