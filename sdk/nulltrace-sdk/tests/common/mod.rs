#![allow(dead_code)]

use async_trait::async_trait;
use borsh::{BorshDeserialize, BorshSerialize};
use nulltrace_sdk::advanced::packer::TransactionBundle;
use nulltrace_sdk::core::connection::LedgerClient;
use nulltrace_sdk::core::operator::{
    ProcessSwapRequest, ProcessSwapResponse, QuoteRequest, SwapOperator, SwapQuote,
};
use nulltrace_sdk::core::program::{
    CompressRequest, CompressionProgram, DecompressRequest, TransferRequest,
};
use nulltrace_sdk::core::signer::{KeypairSigner, NullSigner};
use nulltrace_sdk::types::{
    RecordRef, StateTreeInfo, SwapStatus, TokenAmount, TokenHolding, ValidityProof, ValueRecord,
};
use nulltrace_sdk::{NullTrace, NullTraceConfig, NullTraceError};
use solana_sdk::account::Account;
use solana_sdk::address_lookup_table::AddressLookupTableAccount;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::transaction::VersionedTransaction;
use spl_token::solana_program::program_option::COption;
use spl_token::solana_program::program_pack::Pack;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type BoxError = Box<dyn Error + Send + Sync>;

pub const FAKE_PROGRAM_ID: Pubkey = Pubkey::new_from_array([42; 32]);
pub const TREE: Pubkey = Pubkey::new_from_array([11; 32]);
pub const QUEUE: Pubkey = Pubkey::new_from_array([12; 32]);

//=============================================================================
// Fake ledger
//=============================================================================

#[derive(Default)]
pub struct LedgerState {
    pub accounts: HashMap<Pubkey, Account>,
    pub balances: HashMap<Pubkey, u64>,
    /// (owner, token program, holding)
    pub holdings: Vec<(Pubkey, Pubkey, TokenHolding)>,
    pub records: HashMap<Pubkey, Vec<ValueRecord>>,
    pub stale: HashSet<[u8; 32]>,
    pub lookup_table: Option<AddressLookupTableAccount>,

    pub proof_requests: Vec<Vec<RecordRef>>,
    pub account_lookups: Vec<Pubkey>,
    pub lookup_table_loads: usize,
    pub sent: Vec<VersionedTransaction>,
    pub confirmed: Vec<Signature>,
    pub fail_send_at: Option<usize>,
    pub fail_confirm_at: Option<usize>,
}

pub struct FakeLedger {
    pub state: Mutex<LedgerState>,
    pub blockhash: Hash,
}

impl FakeLedger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            blockhash: Hash::new_unique(),
        }
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap()
    }

    pub fn set_balance(&self, owner: Pubkey, lamports: u64) {
        self.state().balances.insert(owner, lamports);
    }

    pub fn add_records(&self, owner: Pubkey, records: Vec<ValueRecord>) {
        self.state().records.entry(owner).or_default().extend(records);
    }

    pub fn add_holding(&self, owner: Pubkey, token_program: Pubkey, mint: Pubkey, amount: u64, decimals: u8) {
        self.state().holdings.push((
            owner,
            token_program,
            TokenHolding {
                mint,
                amount,
                decimals,
            },
        ));
    }

    pub fn add_account(&self, address: Pubkey, owner: Pubkey) {
        self.state().accounts.insert(
            address,
            Account {
                lamports: 1,
                data: vec![],
                owner,
                executable: false,
                rent_epoch: 0,
            },
        );
    }

    /// Register an initialized SPL mint owned by `token_program`
    pub fn add_mint(&self, mint: Pubkey, decimals: u8, token_program: Pubkey) {
        let state = spl_token::state::Mint {
            mint_authority: COption::None,
            supply: 0,
            decimals,
            is_initialized: true,
            freeze_authority: COption::None,
        };
        let mut data = vec![0u8; spl_token::state::Mint::LEN];
        spl_token::state::Mint::pack(state, &mut data).unwrap();
        self.state().accounts.insert(
            mint,
            Account {
                lamports: 1_461_600,
                data,
                owner: token_program,
                executable: false,
                rent_epoch: 0,
            },
        );
    }

    pub fn sent(&self) -> Vec<VersionedTransaction> {
        self.state().sent.clone()
    }
}

#[async_trait]
impl LedgerClient for FakeLedger {
    async fn get_account(&self, pubkey: &Pubkey) -> Result<Option<Account>, BoxError> {
        let mut state = self.state();
        state.account_lookups.push(*pubkey);
        Ok(state.accounts.get(pubkey).cloned())
    }

    async fn get_balance(&self, owner: &Pubkey) -> Result<u64, BoxError> {
        Ok(self.state().balances.get(owner).copied().unwrap_or(0))
    }

    async fn get_token_holdings(
        &self,
        owner: &Pubkey,
        token_program: &Pubkey,
        mint: Option<&Pubkey>,
    ) -> Result<Vec<TokenHolding>, BoxError> {
        Ok(self
            .state()
            .holdings
            .iter()
            .filter(|(o, p, h)| o == owner && p == token_program && mint.map_or(true, |m| *m == h.mint))
            .map(|(_, _, h)| h.clone())
            .collect())
    }

    async fn get_compressed_balance(&self, owner: &Pubkey) -> Result<u64, BoxError> {
        Ok(self
            .state()
            .records
            .get(owner)
            .map(|rs| rs.iter().filter(|r| r.token.is_none()).map(|r| r.lamports).sum())
            .unwrap_or(0))
    }

    async fn get_compressed_accounts(&self, owner: &Pubkey) -> Result<Vec<ValueRecord>, BoxError> {
        Ok(self
            .state()
            .records
            .get(owner)
            .map(|rs| rs.iter().filter(|r| r.token.is_none()).cloned().collect())
            .unwrap_or_default())
    }

    async fn get_compressed_token_accounts(
        &self,
        owner: &Pubkey,
        mint: Option<&Pubkey>,
    ) -> Result<Vec<ValueRecord>, BoxError> {
        Ok(self
            .state()
            .records
            .get(owner)
            .map(|rs| {
                rs.iter()
                    .filter(|r| match (r.token, mint) {
                        (Some(t), Some(m)) => t.mint == *m,
                        (Some(_), None) => true,
                        (None, _) => false,
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_validity_proof(&self, records: &[RecordRef]) -> Result<ValidityProof, BoxError> {
        let mut state = self.state();
        state.proof_requests.push(records.to_vec());
        if let Some(stale) = records.iter().find(|r| state.stale.contains(&r.hash)) {
            return Err(format!("record {} not found", bs58::encode(stale.hash).into_string()).into());
        }
        Ok(ValidityProof {
            compressed_proof: Some(Default::default()),
            root_indices: vec![0; records.len()],
        })
    }

    async fn get_state_tree_info(&self) -> Result<StateTreeInfo, BoxError> {
        Ok(StateTreeInfo {
            tree: TREE,
            queue: QUEUE,
        })
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, BoxError> {
        Ok(self.blockhash)
    }

    async fn get_address_lookup_table(
        &self,
        _address: &Pubkey,
    ) -> Result<Option<AddressLookupTableAccount>, BoxError> {
        let mut state = self.state();
        state.lookup_table_loads += 1;
        Ok(state.lookup_table.clone())
    }

    async fn send_transaction(&self, tx: &VersionedTransaction) -> Result<Signature, BoxError> {
        let mut state = self.state();
        if state.fail_send_at == Some(state.sent.len()) {
            return Err("Blockhash not found".into());
        }
        state.sent.push(tx.clone());
        Ok(tx.signatures[0])
    }

    async fn confirm_transaction(&self, signature: &Signature) -> Result<(), BoxError> {
        let mut state = self.state();
        if state.fail_confirm_at == Some(state.confirmed.len()) {
            return Err("transaction expired".into());
        }
        state.confirmed.push(*signature);
        Ok(())
    }
}

//=============================================================================
// Fake compression program
//=============================================================================

/// Payload of every instruction the fake program builds
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum FakeIx {
    CreatePool {
        mint: [u8; 32],
    },
    Compress {
        mint: [u8; 32],
        source: Option<[u8; 32]>,
        outputs: Vec<([u8; 32], u64)>,
    },
    Decompress {
        inputs: Vec<[u8; 32]>,
        destination: [u8; 32],
        amount: u64,
    },
    Transfer {
        inputs: Vec<[u8; 32]>,
        recipient: [u8; 32],
        amount: u64,
    },
}

impl FakeIx {
    pub fn compress_outputs(&self) -> Vec<(Pubkey, u64)> {
        match self {
            FakeIx::Compress { outputs, .. } => outputs
                .iter()
                .map(|(k, a)| (Pubkey::new_from_array(*k), *a))
                .collect(),
            _ => vec![],
        }
    }
}

pub struct FakeProgram;

impl FakeProgram {
    fn instruction(payer: &Pubkey, extra: Vec<Pubkey>, payload: FakeIx) -> Instruction {
        let mut accounts = vec![AccountMeta::new(*payer, true)];
        for key in extra {
            if !accounts.iter().any(|m| m.pubkey == key) {
                accounts.push(AccountMeta::new(key, false));
            }
        }
        Instruction {
            program_id: FAKE_PROGRAM_ID,
            accounts,
            data: borsh::to_vec(&payload).unwrap(),
        }
    }

    fn input_accounts(inputs: &[ValueRecord]) -> Vec<Pubkey> {
        inputs.iter().flat_map(|r| [r.tree, r.queue]).collect()
    }
}

#[async_trait]
impl CompressionProgram for FakeProgram {
    async fn compress(&self, request: CompressRequest<'_>) -> Result<Instruction, BoxError> {
        let mut extra: Vec<Pubkey> = request.outputs.iter().map(|(k, _)| *k).collect();
        extra.push(request.output_tree.tree);
        extra.extend(request.source);
        extra.extend(request.token_pool);
        Ok(Self::instruction(
            &request.payer,
            extra,
            FakeIx::Compress {
                mint: request.asset.mint.to_bytes(),
                source: request.source.map(|s| s.to_bytes()),
                outputs: request
                    .outputs
                    .iter()
                    .map(|(k, a)| (k.to_bytes(), *a))
                    .collect(),
            },
        ))
    }

    async fn decompress(&self, request: DecompressRequest<'_>) -> Result<Instruction, BoxError> {
        let mut extra = vec![request.destination];
        extra.extend(Self::input_accounts(request.inputs));
        Ok(Self::instruction(
            &request.payer,
            extra,
            FakeIx::Decompress {
                inputs: request.inputs.iter().map(|r| r.hash).collect(),
                destination: request.destination.to_bytes(),
                amount: request.amount,
            },
        ))
    }

    async fn transfer(&self, request: TransferRequest<'_>) -> Result<Instruction, BoxError> {
        let mut extra = vec![request.recipient];
        extra.extend(Self::input_accounts(request.inputs));
        Ok(Self::instruction(
            &request.payer,
            extra,
            FakeIx::Transfer {
                inputs: request.inputs.iter().map(|r| r.hash).collect(),
                recipient: request.recipient.to_bytes(),
                amount: request.amount,
            },
        ))
    }

    async fn create_token_pool(
        &self,
        payer: &Pubkey,
        mint: &Pubkey,
        _token_program: &Pubkey,
    ) -> Result<Instruction, BoxError> {
        Ok(Self::instruction(
            payer,
            vec![*mint],
            FakeIx::CreatePool {
                mint: mint.to_bytes(),
            },
        ))
    }
}

/// Fake-program payloads of a bundle list, in order
pub fn planned_ixs(bundles: &[TransactionBundle]) -> Vec<FakeIx> {
    bundles
        .iter()
        .flat_map(|b| b.instructions.iter())
        .filter(|ix| ix.program_id == FAKE_PROGRAM_ID)
        .map(|ix| FakeIx::try_from_slice(&ix.data).unwrap())
        .collect()
}

/// Fake-program payloads of a compiled transaction
pub fn sent_ixs(tx: &VersionedTransaction) -> Vec<FakeIx> {
    let keys = tx.message.static_account_keys();
    tx.message
        .instructions()
        .iter()
        .filter(|ix| keys[ix.program_id_index as usize] == FAKE_PROGRAM_ID)
        .map(|ix| FakeIx::try_from_slice(&ix.data).unwrap())
        .collect()
}

//=============================================================================
// Fake operator and signers
//=============================================================================

pub struct FakeOperator {
    pub response: Mutex<Result<ProcessSwapResponse, String>>,
    pub requests: Mutex<Vec<ProcessSwapRequest>>,
    pub quotes: Mutex<Vec<QuoteRequest>>,
}

impl FakeOperator {
    pub fn answering(status: SwapStatus) -> Self {
        Self {
            response: Mutex::new(Ok(response(status, None))),
            requests: Mutex::new(Vec::new()),
            quotes: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        let operator = Self::answering(SwapStatus::Processing);
        *operator.response.lock().unwrap() = Err(message.to_string());
        operator
    }

    pub fn requests(&self) -> Vec<ProcessSwapRequest> {
        self.requests.lock().unwrap().clone()
    }
}

pub fn response(status: SwapStatus, error: Option<&str>) -> ProcessSwapResponse {
    ProcessSwapResponse {
        status,
        error: error.map(str::to_string),
        extra: Default::default(),
    }
}

#[async_trait]
impl SwapOperator for FakeOperator {
    async fn quote_swap(&self, request: &QuoteRequest) -> nulltrace_sdk::Result<SwapQuote> {
        self.quotes.lock().unwrap().push(request.clone());
        Ok(SwapQuote {
            in_amount: request.amount.to_string(),
            out_amount: (request.amount * 2).to_string(),
            price_impact: 0.001,
            extra: Default::default(),
        })
    }

    async fn process_swap(&self, request: &ProcessSwapRequest) -> nulltrace_sdk::Result<ProcessSwapResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.response
            .lock()
            .unwrap()
            .clone()
            .map_err(NullTraceError::SubmissionRejected)
    }
}

/// Keypair signer that counts message signatures
pub struct CountingSigner {
    inner: KeypairSigner,
    pub messages_signed: AtomicUsize,
}

impl CountingSigner {
    pub fn new(keypair: Keypair) -> Self {
        Self {
            inner: KeypairSigner::new(keypair),
            messages_signed: AtomicUsize::new(0),
        }
    }

    pub fn count(&self) -> usize {
        self.messages_signed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NullSigner for CountingSigner {
    fn pubkey(&self) -> Pubkey {
        self.inner.pubkey()
    }

    async fn sign_transactions(
        &self,
        txs: Vec<VersionedTransaction>,
    ) -> Result<Vec<VersionedTransaction>, String> {
        self.inner.sign_transactions(txs).await
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Signature, String> {
        self.messages_signed.fetch_add(1, Ordering::SeqCst);
        self.inner.sign_message(message).await
    }
}

/// Signer that can only sign transactions
pub struct TransactionOnlySigner(pub Keypair);

#[async_trait]
impl NullSigner for TransactionOnlySigner {
    fn pubkey(&self) -> Pubkey {
        self.0.pubkey()
    }

    async fn sign_transactions(
        &self,
        txs: Vec<VersionedTransaction>,
    ) -> Result<Vec<VersionedTransaction>, String> {
        txs.into_iter()
            .map(|tx| VersionedTransaction::try_new(tx.message, &[&self.0]).map_err(|e| e.to_string()))
            .collect()
    }
}

//=============================================================================
// Harness
//=============================================================================

pub struct TestContext {
    pub ledger: Arc<FakeLedger>,
    pub operator: Arc<FakeOperator>,
    pub signer: Arc<CountingSigner>,
    pub owner: Pubkey,
    pub client: NullTrace,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_operator(FakeOperator::answering(SwapStatus::Completed))
    }

    pub fn with_operator(operator: FakeOperator) -> Self {
        let ledger = Arc::new(FakeLedger::new());
        let operator = Arc::new(operator);
        let signer = Arc::new(CountingSigner::new(Keypair::new()));
        let owner = signer.pubkey();
        let client = NullTrace::builder()
            .with_ledger(ledger.clone())
            .with_program(Arc::new(FakeProgram))
            .with_signer(signer.clone())
            .with_operator(operator.clone())
            .with_config(NullTraceConfig::default())
            .build()
            .unwrap();
        Self {
            ledger,
            operator,
            signer,
            owner,
            client,
        }
    }

    pub fn operator_address(&self) -> Pubkey {
        self.client.config().operator_address
    }
}

pub fn native_record(lamports: u64, tag: u8) -> ValueRecord {
    ValueRecord {
        hash: [tag; 32],
        tree: TREE,
        queue: QUEUE,
        lamports,
        token: None,
    }
}

pub fn token_record(mint: Pubkey, amount: u64, tag: u8) -> ValueRecord {
    ValueRecord {
        hash: [tag; 32],
        tree: TREE,
        queue: QUEUE,
        lamports: 0,
        token: Some(TokenAmount { mint, amount }),
    }
}

pub const NATIVE_MINT: &str = "So11111111111111111111111111111111111111112";

//=============================================================================
// Local HTTP stubs
//=============================================================================

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn spawn_server(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    format!("http://{}", addr)
}
