// Example: Reading public and private balances
//
// This example demonstrates how to:
// 1. Connect to a compression-capable RPC endpoint
// 2. Load a signer from a base58 private key
// 3. List public, private and merged balances
//
// Balance queries never build instructions, so the compression program
// capability is a placeholder here.

use async_trait::async_trait;
use nulltrace_sdk::core::program::{
    CompressRequest, CompressionProgram, DecompressRequest, TransferRequest,
};
use nulltrace_sdk::{format_amount, KeypairSigner, NullTrace, NullTraceConfig, RpcLedger};
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use std::error::Error;
use std::sync::Arc;

struct ReadOnly;

#[async_trait]
impl CompressionProgram for ReadOnly {
    async fn compress(&self, _: CompressRequest<'_>) -> Result<Instruction, Box<dyn Error + Send + Sync>> {
        Err("read-only client".into())
    }

    async fn decompress(&self, _: DecompressRequest<'_>) -> Result<Instruction, Box<dyn Error + Send + Sync>> {
        Err("read-only client".into())
    }

    async fn transfer(&self, _: TransferRequest<'_>) -> Result<Instruction, Box<dyn Error + Send + Sync>> {
        Err("read-only client".into())
    }

    async fn create_token_pool(
        &self,
        _: &Pubkey,
        _: &Pubkey,
        _: &Pubkey,
    ) -> Result<Instruction, Box<dyn Error + Send + Sync>> {
        Err("read-only client".into())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "logging")]
    nulltrace_sdk::init_logging();

    // 1. RPC endpoint with the compression indexer methods enabled
    let rpc_url = std::env::var("NULLTRACE_RPC_URL")
        .unwrap_or_else(|_| "https://mainnet.helius-rpc.com/?api-key=YOUR_KEY".to_string());
    let ledger = RpcLedger::new(rpc_url)?;

    // 2. Signer (replace with your own key)
    let private_key = std::env::var("NULLTRACE_PRIVATE_KEY")?;
    let signer = KeypairSigner::from_private_key(&private_key)?;

    let client = NullTrace::builder()
        .with_ledger(Arc::new(ledger))
        .with_program(Arc::new(ReadOnly))
        .with_signer(Arc::new(signer))
        .with_config(NullTraceConfig::from_env()?)
        .build()?;

    // 3. Balances
    println!("Public balances of {}:", client.owner());
    for balance in client.public_balances().await? {
        println!("  {}: {}", balance.mint, balance.ui_amount());
    }

    println!("\nMerged balances:");
    for balance in client.balances().await? {
        println!(
            "  {}: public {} / private {}",
            balance.mint,
            format_amount(balance.public_amount, balance.decimals),
            format_amount(balance.private_amount, balance.decimals)
        );
    }

    Ok(())
}
