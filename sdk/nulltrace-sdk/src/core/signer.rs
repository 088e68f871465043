use crate::error::{NullTraceError, Result};
use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::transaction::VersionedTransaction;

/// Abstraction for an entity that can sign messages/transactions.
/// This allows the SDK to work with:
/// 1. Local Keypairs (Backend/CLI)
/// 2. Wallet Adapters (Frontend - batch signing flows)
#[async_trait]
pub trait NullSigner: Send + Sync {
    fn pubkey(&self) -> Pubkey;

    /// Sign every transaction in one request. The output must keep the input order.
    async fn sign_transactions(
        &self,
        txs: Vec<VersionedTransaction>,
    ) -> std::result::Result<Vec<VersionedTransaction>, String>;

    /// Sign a raw message.
    /// Not all signers support this (e.g. some wallet adapters only sign transactions).
    async fn sign_message(&self, _message: &[u8]) -> std::result::Result<Signature, String> {
        Err("message signing is not supported by this signer".to_string())
    }
}

/// Signs locally with an in-memory keypair.
pub struct KeypairSigner {
    keypair: Keypair,
}

impl KeypairSigner {
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }

    /// Build from a 64-byte ed25519 secret key
    pub fn from_secret_key(secret_key: &[u8]) -> Result<Self> {
        if secret_key.len() != 64 {
            return Err(NullTraceError::InvalidArgument(format!(
                "expected a 64-byte secret key, got {} bytes",
                secret_key.len()
            )));
        }
        let keypair = Keypair::from_bytes(secret_key)
            .map_err(|e| NullTraceError::InvalidArgument(format!("invalid secret key: {}", e)))?;
        Ok(Self::new(keypair))
    }

    /// Build from a base58 private key as exported by browser wallets
    pub fn from_private_key(base58_key: &str) -> Result<Self> {
        if base58_key.len() < 32 {
            return Err(NullTraceError::InvalidArgument(
                "expected a base58-encoded private key string".to_string(),
            ));
        }
        let bytes = bs58::decode(base58_key)
            .into_vec()
            .map_err(|e| NullTraceError::InvalidArgument(format!("invalid base58 key: {}", e)))?;
        Self::from_secret_key(&bytes)
    }
}

#[async_trait]
impl NullSigner for KeypairSigner {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn sign_transactions(
        &self,
        txs: Vec<VersionedTransaction>,
    ) -> std::result::Result<Vec<VersionedTransaction>, String> {
        txs.into_iter()
            .map(|tx| {
                VersionedTransaction::try_new(tx.message, &[&self.keypair])
                    .map_err(|e| e.to_string())
            })
            .collect()
    }

    async fn sign_message(&self, message: &[u8]) -> std::result::Result<Signature, String> {
        Ok(self.keypair.sign_message(message))
    }
}
