use crate::core::connection::LedgerClient;
use crate::core::constants::{
    CONFIRM_POLL_INTERVAL_MS, CONFIRM_TIMEOUT_MS, DEFAULT_STATE_QUEUE, DEFAULT_STATE_TREE,
};
use crate::error::{NullTraceError, Result};
use crate::types::{
    CompressedProof, RecordRef, StateTreeInfo, TokenAmount, TokenHolding, ValidityProof,
    ValueRecord,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_request::TokenAccountsFilter;
use solana_sdk::account::Account;
use solana_sdk::address_lookup_table::state::AddressLookupTable;
use solana_sdk::address_lookup_table::AddressLookupTableAccount;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;
use std::error::Error;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

/// `LedgerClient` over a compression-capable Solana JSON-RPC endpoint.
///
/// Standard calls go through `solana-client`; the compression indexer
/// methods are plain JSON-RPC posts against the same URL.
pub struct RpcLedger {
    rpc: RpcClient,
    http: reqwest::Client,
    url: String,
    state_tree: StateTreeInfo,
    confirm_timeout: Duration,
    confirm_poll_interval: Duration,
}

impl RpcLedger {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(NullTraceError::InvalidArgument("rpc url is required".to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(NullTraceError::InvalidArgument(format!(
                "rpc url must be http(s): {}",
                url
            )));
        }
        Ok(Self {
            rpc: RpcClient::new_with_commitment(url.clone(), CommitmentConfig::confirmed()),
            http: reqwest::Client::new(),
            url,
            state_tree: StateTreeInfo {
                tree: DEFAULT_STATE_TREE,
                queue: DEFAULT_STATE_QUEUE,
            },
            confirm_timeout: Duration::from_millis(CONFIRM_TIMEOUT_MS),
            confirm_poll_interval: Duration::from_millis(CONFIRM_POLL_INTERVAL_MS),
        })
    }

    /// How long `confirm_transaction` waits for `confirmed`, and how often it asks
    pub fn with_confirmation(mut self, timeout: Duration, poll_interval: Duration) -> Self {
        self.confirm_timeout = timeout;
        self.confirm_poll_interval = poll_interval.max(Duration::from_millis(1));
        self
    }

    /// Output tree used for newly compressed value
    pub fn with_state_tree(mut self, tree: Pubkey, queue: Pubkey) -> Self {
        self.state_tree = StateTreeInfo { tree, queue };
        self
    }

    /// Access the underlying RpcClient if callers need lower-level queries.
    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    async fn indexer_call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> std::result::Result<T, Box<dyn Error + Send + Sync>> {
        debug!(method, "indexer request");
        let body = json!({
            "jsonrpc": "2.0",
            "id": "nulltrace",
            "method": method,
            "params": params,
        });
        let response: Value = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = response.get("error") {
            let message = err
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown indexer error");
            return Err(format!("{} failed: {}", method, message).into());
        }
        let value = response
            .get("result")
            .and_then(|r| r.get("value"))
            .cloned()
            .ok_or_else(|| format!("{} returned no value", method))?;
        Ok(serde_json::from_value(value)?)
    }
}

#[async_trait]
impl LedgerClient for RpcLedger {
    async fn get_account(
        &self,
        pubkey: &Pubkey,
    ) -> std::result::Result<Option<Account>, Box<dyn Error + Send + Sync>> {
        Ok(self
            .rpc
            .get_account_with_commitment(pubkey, self.rpc.commitment())
            .await?
            .value)
    }

    async fn get_balance(
        &self,
        owner: &Pubkey,
    ) -> std::result::Result<u64, Box<dyn Error + Send + Sync>> {
        Ok(self.rpc.get_balance(owner).await?)
    }

    async fn get_token_holdings(
        &self,
        owner: &Pubkey,
        token_program: &Pubkey,
        mint: Option<&Pubkey>,
    ) -> std::result::Result<Vec<TokenHolding>, Box<dyn Error + Send + Sync>> {
        let keyed = self
            .rpc
            .get_token_accounts_by_owner(owner, TokenAccountsFilter::ProgramId(*token_program))
            .await?;

        let mut holdings = Vec::with_capacity(keyed.len());
        for account in keyed {
            let holding = parse_token_holding(&serde_json::to_value(&account.account)?)?;
            if mint.map_or(true, |m| *m == holding.mint) {
                holdings.push(holding);
            }
        }
        Ok(holdings)
    }

    async fn get_compressed_balance(
        &self,
        owner: &Pubkey,
    ) -> std::result::Result<u64, Box<dyn Error + Send + Sync>> {
        let balance: Value = self
            .indexer_call("getCompressedBalanceByOwner", json!({ "owner": owner.to_string() }))
            .await?;
        Ok(value_as_u64(&balance).unwrap_or(0))
    }

    async fn get_compressed_accounts(
        &self,
        owner: &Pubkey,
    ) -> std::result::Result<Vec<ValueRecord>, Box<dyn Error + Send + Sync>> {
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page: Page<IndexerAccount> = self
                .indexer_call(
                    "getCompressedAccountsByOwner",
                    json!({ "owner": owner.to_string(), "cursor": cursor }),
                )
                .await?;
            for item in page.items {
                records.push(item.into_record(None)?);
            }
            match page.cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }
        Ok(records)
    }

    async fn get_compressed_token_accounts(
        &self,
        owner: &Pubkey,
        mint: Option<&Pubkey>,
    ) -> std::result::Result<Vec<ValueRecord>, Box<dyn Error + Send + Sync>> {
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page: Page<IndexerTokenAccount> = self
                .indexer_call(
                    "getCompressedTokenAccountsByOwner",
                    json!({
                        "owner": owner.to_string(),
                        "mint": mint.map(|m| m.to_string()),
                        "cursor": cursor,
                    }),
                )
                .await?;
            for item in page.items {
                let token = TokenAmount {
                    mint: Pubkey::from_str(&item.token_data.mint)?,
                    amount: item.token_data.amount,
                };
                records.push(item.account.into_record(Some(token))?);
            }
            match page.cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }
        Ok(records)
    }

    async fn get_validity_proof(
        &self,
        records: &[RecordRef],
    ) -> std::result::Result<ValidityProof, Box<dyn Error + Send + Sync>> {
        let hashes: Vec<String> = records
            .iter()
            .map(|r| bs58::encode(r.hash).into_string())
            .collect();
        let proof: IndexerProof = self
            .indexer_call("getValidityProof", json!({ "hashes": hashes }))
            .await?;
        Ok(ValidityProof {
            compressed_proof: proof.compressed_proof,
            root_indices: proof.root_indices,
        })
    }

    async fn get_state_tree_info(
        &self,
    ) -> std::result::Result<StateTreeInfo, Box<dyn Error + Send + Sync>> {
        Ok(self.state_tree)
    }

    async fn get_latest_blockhash(&self) -> std::result::Result<Hash, Box<dyn Error + Send + Sync>> {
        Ok(self.rpc.get_latest_blockhash().await?)
    }

    async fn get_address_lookup_table(
        &self,
        address: &Pubkey,
    ) -> std::result::Result<Option<AddressLookupTableAccount>, Box<dyn Error + Send + Sync>> {
        let Some(account) = self.get_account(address).await? else {
            return Ok(None);
        };
        let table = AddressLookupTable::deserialize(&account.data)?;
        Ok(Some(AddressLookupTableAccount {
            key: *address,
            addresses: table.addresses.to_vec(),
        }))
    }

    async fn send_transaction(
        &self,
        tx: &VersionedTransaction,
    ) -> std::result::Result<Signature, Box<dyn Error + Send + Sync>> {
        Ok(self.rpc.send_transaction(tx).await?)
    }

    async fn confirm_transaction(
        &self,
        signature: &Signature,
    ) -> std::result::Result<(), Box<dyn Error + Send + Sync>> {
        // A landed transaction can still carry an execution error
        let deadline = Instant::now() + self.confirm_timeout;
        loop {
            let status = self
                .rpc
                .get_signature_status_with_commitment(signature, CommitmentConfig::confirmed())
                .await?;
            match status {
                Some(Ok(())) => return Ok(()),
                Some(Err(e)) => {
                    warn!(%signature, error = %e, "transaction failed on chain");
                    return Err(format!("transaction failed: {}", e).into());
                },
                None if Instant::now() >= deadline => {
                    return Err(format!(
                        "not confirmed within {} ms",
                        self.confirm_timeout.as_millis()
                    )
                    .into());
                },
                None => sleep(self.confirm_poll_interval).await,
            }
        }
    }
}

//=============================================================================
// Indexer wire types
//=============================================================================

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(default)]
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexerMerkleContext {
    tree: String,
    #[serde(default)]
    queue: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexerAccount {
    hash: String,
    #[serde(default, deserialize_with = "u64_string_or_number")]
    lamports: u64,
    #[serde(default)]
    tree: Option<String>,
    #[serde(default)]
    queue: Option<String>,
    #[serde(default)]
    merkle_context: Option<IndexerMerkleContext>,
}

impl IndexerAccount {
    fn into_record(
        self,
        token: Option<TokenAmount>,
    ) -> std::result::Result<ValueRecord, Box<dyn Error + Send + Sync>> {
        let hash_bytes = bs58::decode(&self.hash).into_vec()?;
        let hash: [u8; 32] = hash_bytes
            .try_into()
            .map_err(|_| format!("record hash {} is not 32 bytes", self.hash))?;

        let (tree, queue) = match self.merkle_context {
            Some(ctx) => (Some(ctx.tree), ctx.queue),
            None => (self.tree, self.queue),
        };
        let tree = tree
            .ok_or_else(|| format!("record {} has no tree", self.hash))
            .and_then(|t| Pubkey::from_str(&t).map_err(|e| e.to_string()))?;
        let queue = match queue {
            Some(q) => Pubkey::from_str(&q)?,
            None if tree == DEFAULT_STATE_TREE => DEFAULT_STATE_QUEUE,
            None => Pubkey::default(),
        };

        Ok(ValueRecord {
            hash,
            tree,
            queue,
            lamports: self.lamports,
            token,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexerTokenData {
    mint: String,
    #[serde(deserialize_with = "u64_string_or_number")]
    amount: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexerTokenAccount {
    account: IndexerAccount,
    token_data: IndexerTokenData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexerProof {
    #[serde(default)]
    compressed_proof: Option<CompressedProof>,
    #[serde(default)]
    root_indices: Vec<u16>,
}

fn value_as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn u64_string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<u64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    value_as_u64(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("expected an unsigned integer, got {}", value)))
}

/// Pull mint, raw amount and decimals out of a `jsonParsed` token account
fn parse_token_holding(account: &Value) -> std::result::Result<TokenHolding, Box<dyn Error + Send + Sync>> {
    let info = account
        .pointer("/data/parsed/info")
        .ok_or("token account is not jsonParsed")?;
    let mint = info
        .get("mint")
        .and_then(|m| m.as_str())
        .ok_or("token account has no mint")?;
    let amount = info
        .pointer("/tokenAmount/amount")
        .and_then(value_as_u64)
        .ok_or("token account has no amount")?;
    let decimals = info
        .pointer("/tokenAmount/decimals")
        .and_then(|d| d.as_u64())
        .unwrap_or(0);
    Ok(TokenHolding {
        mint: Pubkey::from_str(mint)?,
        amount,
        decimals: decimals as u8,
    })
}
