use solana_sdk::pubkey;
use solana_sdk::pubkey::Pubkey;

// Operator that receives fees and swap inputs on mainnet
pub const OPERATOR_ADDRESS: Pubkey = pubkey!("5STUuhrL8kJ4up9spEY39VJ6ibQCFrg8x8cRV5UeEcfv");

// Shared address lookup table for compression program accounts
pub const LOOKUP_TABLE_ADDRESS: Pubkey = pubkey!("9NYFyEqPkyXUhkerbGHXUXkvb4qpzeEdHuGpgbgpH1NJ");

pub const COMPRESSED_TOKEN_PROGRAM_ID: Pubkey =
    pubkey!("cTokenmWW8bLPjZEBAUgYy3zKxQZW6VKi7bqNFEVv3m");

pub const TOKEN_2022_PROGRAM_ID: Pubkey = pubkey!("TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb");

// Default v1 state tree and its nullifier queue
pub const DEFAULT_STATE_TREE: Pubkey = pubkey!("smt1NamzXdq4AMqS2fS2F1i5KTYPZRhoHgWx38d8WsT");
pub const DEFAULT_STATE_QUEUE: Pubkey = pubkey!("nfq1NvQDJ2GEgnS8zt9prAe8rjjpAW1zFkrvZoBR148");

pub const DEFAULT_OPERATOR_URL: &str = "http://34.68.76.183:3333/operator";
pub const DEFAULT_OPERATOR_SECRET: &str = "NULL_TRACE_OPERATOR_SECRET_BASE_V1";

/// Operator fee in basis points (0.1%)
pub const FEE_BPS: u64 = 10;
pub const BPS_DENOMINATOR: u64 = 10_000;

pub const COMPUTE_UNIT_LIMIT: u32 = 1_400_000;
pub const COMPUTE_UNIT_PRICE: u64 = 5_000;

/// Hard ceiling on a serialized transaction
pub const MAX_TRANSACTION_SIZE: usize = 1232;

/// Proof batching only accepts these input counts
pub const ALLOWED_BATCH_SIZES: [usize; 4] = [8, 4, 2, 1];

pub const NATIVE_DECIMALS: u8 = 9;

/// Lamports left untouched when reporting a spendable public SOL balance
pub const NATIVE_FEE_RESERVE: u64 = 10_000_000;

/// Extra lamports a native top-up must leave for network fees
pub const TOP_UP_FEE_HEADROOM: u64 = 100_000;

pub const AUTH_TOKEN_STEP_SECS: u64 = 180;
pub const AUTH_TOKEN_DIGITS: u32 = 6;
pub const AUTH_HEADER: &str = "x-null-client-secret";

pub const SWAP_POLL_INTERVAL_MS: u64 = 2_000;
pub const SWAP_TIMEOUT_MS: u64 = 120_000;

/// How long a broadcast bundle may take to reach `confirmed`
pub const CONFIRM_TIMEOUT_MS: u64 = 60_000;
pub const CONFIRM_POLL_INTERVAL_MS: u64 = 500;

pub const OWNERSHIP_MESSAGE: &[u8] = b"Reveal Private Balances";
