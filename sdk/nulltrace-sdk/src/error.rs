use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

/// SDK-specific error types for NullTrace operations
#[derive(Debug, Error)]
pub enum NullTraceError {
    /// Missing or malformed required input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Mint could not be resolved on-chain
    #[error("Asset not found: {0}")]
    AssetNotFound(Pubkey),

    /// Private (and, where allowed, public) funds do not cover the request
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: u64, available: u64 },

    /// The network or the remote operator refused a submission
    #[error("Submission rejected: {0}")]
    SubmissionRejected(String),

    /// Broadcast went through but the transaction never confirmed
    #[error("Confirmation failed for {signature}: {reason}")]
    ConfirmationFailure { signature: String, reason: String },

    /// A single instruction does not fit in a transaction on its own
    #[error("Instruction #{index} exceeds the {limit}-byte transaction limit")]
    TransactionTooLarge { index: usize, limit: usize },

    /// Connection or RPC error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Signer refused or failed to sign
    #[error("Signer error: {0}")]
    Signer(String),

    /// Compression program could not build an instruction
    #[error("Program error: {0}")]
    Program(String),

    /// Wire encoding error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// HTTP transport error talking to the operator or indexer
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<bincode::Error> for NullTraceError {
    fn from(err: bincode::Error) -> Self {
        NullTraceError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for NullTraceError {
    fn from(err: serde_json::Error) -> Self {
        NullTraceError::Serialization(err.to_string())
    }
}

/// Result type alias for SDK operations
pub type Result<T> = std::result::Result<T, NullTraceError>;
