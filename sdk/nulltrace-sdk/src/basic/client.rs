use crate::advanced::fee::{split_fee, FeeSplit};
use crate::advanced::mint::resolve_asset;
use crate::advanced::packer::{TransactionBundle, TransactionPacker};
use crate::advanced::selection::{batch_amounts, batch_records};
use crate::core::config::NullTraceConfig;
use crate::core::connection::LedgerClient;
use crate::core::operator::{HttpOperator, SwapOperator};
use crate::core::program::{CompressRequest, CompressionProgram, DecompressRequest, TransferRequest};
use crate::core::signer::NullSigner;
use crate::error::{NullTraceError, Result};
use crate::types::{Asset, RecordRef, ValueRecord};
use crate::utils::{derive_holding_address, derive_token_pool_pda, parse_amount};
use solana_sdk::address_lookup_table::AddressLookupTableAccount;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Bundles produced by one operation, in broadcast order.
#[derive(Debug, Clone, Default)]
pub struct OperationPlan {
    /// Public value compressed to cover a private shortfall. Always sent first.
    pub top_up: Vec<TransactionBundle>,

    /// Bundles that carry the operation itself
    pub bundles: Vec<TransactionBundle>,
}

impl OperationPlan {
    /// Every bundle, top-up first
    pub fn ordered(&self) -> Vec<TransactionBundle> {
        self.top_up
            .iter()
            .chain(self.bundles.iter())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.top_up.len() + self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Where spent records end up
#[derive(Debug, Clone, Copy)]
pub(crate) enum SpendTarget {
    /// Back to public state at this address
    Decompress(Pubkey),
    /// To another owner, still compressed
    Transfer(Pubkey),
}

/// Client for private balances.
///
/// Holds the injected capabilities plus three per-instance caches: the
/// lookup table (loaded once), the ownership signature used for private
/// balance queries (dropped by [`NullTrace::clear_signature_cache`]), and
/// the set of accounts already seen to exist (token pools, holding
/// accounts). Only positive existence results are cached. Concurrent
/// operations that may create the same pool must be serialized by the
/// caller.
pub struct NullTrace {
    pub(crate) ledger: Arc<dyn LedgerClient>,
    pub(crate) program: Arc<dyn CompressionProgram>,
    pub(crate) signer: Arc<dyn NullSigner>,
    pub(crate) operator: Arc<dyn SwapOperator>,
    pub(crate) config: NullTraceConfig,
    lookup_table: Mutex<Option<AddressLookupTableAccount>>,
    pub(crate) ownership_signature: Mutex<Option<Signature>>,
    known_accounts: Mutex<HashSet<Pubkey>>,
}

impl NullTrace {
    pub fn builder() -> NullTraceBuilder {
        NullTraceBuilder::new()
    }

    /// Address that owns, pays and signs for every operation
    pub fn owner(&self) -> Pubkey {
        self.signer.pubkey()
    }

    pub fn config(&self) -> &NullTraceConfig {
        &self.config
    }

    pub fn ledger(&self) -> &dyn LedgerClient {
        self.ledger.as_ref()
    }

    pub(crate) async fn resolve(&self, mint: &str) -> Result<Asset> {
        if mint.trim().is_empty() {
            return Err(NullTraceError::InvalidArgument("mint is required".to_string()));
        }
        resolve_asset(self.ledger.as_ref(), mint).await
    }

    pub(crate) fn raw_amount(&self, amount: &str, asset: &Asset) -> Result<u64> {
        parse_amount(amount, asset.decimals)
    }

    pub(crate) fn fee_split(&self, amount: u64) -> FeeSplit {
        split_fee(amount, self.config.fee_bps)
    }

    /// Lookup table, loaded once per instance. A missing table is not
    /// cached and packing proceeds without it.
    pub(crate) async fn lookup_table(&self) -> Result<Option<AddressLookupTableAccount>> {
        let mut cached = self.lookup_table.lock().await;
        if let Some(table) = cached.as_ref() {
            return Ok(Some(table.clone()));
        }
        let table = self
            .ledger
            .get_address_lookup_table(&self.config.lookup_table)
            .await
            .map_err(|e| NullTraceError::Connection(e.to_string()))?;
        match &table {
            Some(t) => {
                debug!(table = %t.key, addresses = t.addresses.len(), "loaded lookup table");
                *cached = Some(t.clone());
            },
            None => debug!(table = %self.config.lookup_table, "lookup table not found"),
        }
        Ok(table)
    }

    pub(crate) async fn account_exists(&self, address: &Pubkey) -> Result<bool> {
        if self.known_accounts.lock().await.contains(address) {
            return Ok(true);
        }
        let exists = self
            .ledger
            .get_account(address)
            .await
            .map_err(|e| NullTraceError::Connection(e.to_string()))?
            .is_some();
        if exists {
            self.known_accounts.lock().await.insert(*address);
        }
        Ok(exists)
    }

    /// Packer seeded with a fresh blockhash, the lookup table and the
    /// configured compute budget
    pub(crate) async fn packer(&self) -> Result<TransactionPacker> {
        let blockhash = self
            .ledger
            .get_latest_blockhash()
            .await
            .map_err(|e| NullTraceError::Connection(e.to_string()))?;
        let mut packer = TransactionPacker::new(self.owner(), blockhash)
            .with_compute_budget(self.config.compute_unit_limit, self.config.compute_unit_price)
            .with_max_size(self.config.max_transaction_size);
        if let Some(table) = self.lookup_table().await? {
            packer = packer.with_lookup_table(table);
        }
        Ok(packer)
    }

    /// Instructions moving public value into compressed records for each
    /// `(recipient, amount)` output. Zero outputs are skipped.
    ///
    /// Native value takes one instruction per output. Token value goes out
    /// in a single instruction, preceded by pool registration when the
    /// mint has no pool yet.
    pub(crate) async fn compress_to(
        &self,
        asset: &Asset,
        outputs: Vec<(Pubkey, u64)>,
    ) -> Result<Vec<Instruction>> {
        let outputs: Vec<(Pubkey, u64)> = outputs.into_iter().filter(|(_, a)| *a > 0).collect();
        if outputs.is_empty() {
            return Ok(Vec::new());
        }

        let owner = self.owner();
        let output_tree = self
            .ledger
            .get_state_tree_info()
            .await
            .map_err(|e| NullTraceError::Connection(e.to_string()))?;
        let program_err = |e: Box<dyn std::error::Error + Send + Sync>| {
            NullTraceError::Program(e.to_string())
        };

        let mut ixs = Vec::new();
        if asset.kind.is_native() {
            for output in outputs {
                let ix = self
                    .program
                    .compress(CompressRequest {
                        payer: owner,
                        owner,
                        asset,
                        source: None,
                        token_pool: None,
                        outputs: vec![output],
                        output_tree,
                    })
                    .await
                    .map_err(program_err)?;
                ixs.push(ix);
            }
            return Ok(ixs);
        }

        let token_program = asset.kind.token_program();
        let (token_pool, _) = derive_token_pool_pda(&asset.mint);
        if !self.account_exists(&token_pool).await? {
            debug!(mint = %asset.mint, pool = %token_pool, "token pool missing, registering");
            ixs.push(
                self.program
                    .create_token_pool(&owner, &asset.mint, &token_program)
                    .await
                    .map_err(program_err)?,
            );
        }
        ixs.push(
            self.program
                .compress(CompressRequest {
                    payer: owner,
                    owner,
                    asset,
                    source: Some(derive_holding_address(&owner, &asset.mint, &token_program)),
                    token_pool: Some(token_pool),
                    outputs,
                    output_tree,
                })
                .await
                .map_err(program_err)?,
        );
        Ok(ixs)
    }

    /// One instruction per batch of `records`, each backed by a proof for
    /// exactly that batch. Together they move `min(target, total)`.
    pub(crate) async fn spend_records(
        &self,
        asset: &Asset,
        records: &[ValueRecord],
        target: u64,
        destination: SpendTarget,
    ) -> Result<Vec<Instruction>> {
        let owner = self.owner();
        let batches = batch_records(records);
        let shares = batch_amounts(&batches, target, asset.kind);

        let mut ixs = Vec::with_capacity(batches.len());
        for (batch, share) in batches.iter().zip(shares) {
            if share == 0 {
                continue;
            }
            let refs: Vec<RecordRef> = batch.iter().map(ValueRecord::reference).collect();
            let proof = self
                .ledger
                .get_validity_proof(&refs)
                .await
                .map_err(|e| NullTraceError::Connection(e.to_string()))?;
            debug!(records = batch.len(), amount = share, "proved batch");

            let ix = match destination {
                SpendTarget::Decompress(to) => {
                    self.program
                        .decompress(DecompressRequest {
                            payer: owner,
                            asset,
                            inputs: batch,
                            destination: to,
                            amount: share,
                            proof,
                        })
                        .await
                },
                SpendTarget::Transfer(to) => {
                    self.program
                        .transfer(TransferRequest {
                            payer: owner,
                            asset,
                            inputs: batch,
                            recipient: to,
                            amount: share,
                            proof,
                        })
                        .await
                },
            }
            .map_err(|e| NullTraceError::Program(e.to_string()))?;
            ixs.push(ix);
        }
        Ok(ixs)
    }
}

/// Assembles a [`NullTrace`] from its capabilities.
///
/// Ledger, compression program and signer are required. The operator
/// defaults to [`HttpOperator`] built from the config.
#[derive(Default)]
pub struct NullTraceBuilder {
    ledger: Option<Arc<dyn LedgerClient>>,
    program: Option<Arc<dyn CompressionProgram>>,
    signer: Option<Arc<dyn NullSigner>>,
    operator: Option<Arc<dyn SwapOperator>>,
    config: Option<NullTraceConfig>,
}

impl NullTraceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ledger(mut self, ledger: Arc<dyn LedgerClient>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn with_program(mut self, program: Arc<dyn CompressionProgram>) -> Self {
        self.program = Some(program);
        self
    }

    pub fn with_signer(mut self, signer: Arc<dyn NullSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn with_operator(mut self, operator: Arc<dyn SwapOperator>) -> Self {
        self.operator = Some(operator);
        self
    }

    pub fn with_config(mut self, config: NullTraceConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Result<NullTrace> {
        let missing = |what: &str| NullTraceError::InvalidArgument(format!("{} is required", what));
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let operator = match self.operator {
            Some(operator) => operator,
            None => Arc::new(HttpOperator::from_config(&config)?),
        };

        Ok(NullTrace {
            ledger: self.ledger.ok_or_else(|| missing("ledger"))?,
            program: self.program.ok_or_else(|| missing("compression program"))?,
            signer: self.signer.ok_or_else(|| missing("signer"))?,
            operator,
            config,
            lookup_table: Mutex::new(None),
            ownership_signature: Mutex::new(None),
            known_accounts: Mutex::new(HashSet::new()),
        })
    }
}
