use crate::types::{RecordRef, StateTreeInfo, TokenHolding, ValidityProof, ValueRecord};
use async_trait::async_trait;
use solana_sdk::account::Account;
use solana_sdk::address_lookup_table::AddressLookupTableAccount;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;
use std::error::Error;

/// Ledger and compression-indexer access used by every operation.
///
/// Implemented by [`crate::core::rpc::RpcLedger`] for live endpoints and by
/// in-memory fakes in tests.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn get_account(
        &self,
        pubkey: &Pubkey,
    ) -> Result<Option<Account>, Box<dyn Error + Send + Sync>>;

    /// Public lamport balance
    async fn get_balance(&self, owner: &Pubkey) -> Result<u64, Box<dyn Error + Send + Sync>>;

    /// Public token holdings of `owner` under one token program, optionally
    /// narrowed to a single mint
    async fn get_token_holdings(
        &self,
        owner: &Pubkey,
        token_program: &Pubkey,
        mint: Option<&Pubkey>,
    ) -> Result<Vec<TokenHolding>, Box<dyn Error + Send + Sync>>;

    /// Compressed lamport balance
    async fn get_compressed_balance(
        &self,
        owner: &Pubkey,
    ) -> Result<u64, Box<dyn Error + Send + Sync>>;

    /// Compressed native records, in discovery order
    async fn get_compressed_accounts(
        &self,
        owner: &Pubkey,
    ) -> Result<Vec<ValueRecord>, Box<dyn Error + Send + Sync>>;

    /// Compressed token records, in discovery order; all mints when `mint` is `None`
    async fn get_compressed_token_accounts(
        &self,
        owner: &Pubkey,
        mint: Option<&Pubkey>,
    ) -> Result<Vec<ValueRecord>, Box<dyn Error + Send + Sync>>;

    /// Freshness proof for exactly the given records
    async fn get_validity_proof(
        &self,
        records: &[RecordRef],
    ) -> Result<ValidityProof, Box<dyn Error + Send + Sync>>;

    async fn get_state_tree_info(&self) -> Result<StateTreeInfo, Box<dyn Error + Send + Sync>>;

    async fn get_latest_blockhash(&self) -> Result<Hash, Box<dyn Error + Send + Sync>>;

    async fn get_address_lookup_table(
        &self,
        address: &Pubkey,
    ) -> Result<Option<AddressLookupTableAccount>, Box<dyn Error + Send + Sync>>;

    async fn send_transaction(
        &self,
        tx: &VersionedTransaction,
    ) -> Result<Signature, Box<dyn Error + Send + Sync>>;

    /// Resolves once `signature` is confirmed; errors if it failed or timed out
    async fn confirm_transaction(
        &self,
        signature: &Signature,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;
}
