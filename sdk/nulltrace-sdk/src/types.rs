use crate::core::constants::TOKEN_2022_PROGRAM_ID;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

/// Owning program category of an asset, resolved once per operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// Native lamports (wrapped-SOL mint identifier)
    Native,
    /// Mint owned by the original SPL token program
    StandardA,
    /// Mint owned by the token-2022 program
    StandardB,
}

impl AssetKind {
    /// Token program that owns holding accounts of this kind
    pub fn token_program(&self) -> Pubkey {
        match self {
            AssetKind::Native | AssetKind::StandardA => spl_token::ID,
            AssetKind::StandardB => TOKEN_2022_PROGRAM_ID,
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, AssetKind::Native)
    }

    /// Map an account owner to a token kind
    pub fn from_token_program(owner: &Pubkey) -> Option<Self> {
        if *owner == spl_token::ID {
            Some(AssetKind::StandardA)
        } else if *owner == TOKEN_2022_PROGRAM_ID {
            Some(AssetKind::StandardB)
        } else {
            None
        }
    }
}

/// A resolved mint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub mint: Pubkey,
    pub decimals: u8,
    pub kind: AssetKind,
}

impl Asset {
    pub fn native() -> Self {
        Self {
            mint: spl_token::native_mint::ID,
            decimals: crate::core::constants::NATIVE_DECIMALS,
            kind: AssetKind::Native,
        }
    }
}

/// Token payload of a compressed record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAmount {
    pub mint: Pubkey,
    pub amount: u64,
}

/// A compressed value record owned by a single address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueRecord {
    /// Leaf hash
    pub hash: [u8; 32],

    /// State tree holding the leaf
    pub tree: Pubkey,

    /// Nullifier queue of the tree
    pub queue: Pubkey,

    /// Lamports attached to the record
    pub lamports: u64,

    /// Parsed token data for non-native records
    pub token: Option<TokenAmount>,
}

impl ValueRecord {
    /// Value of the record in raw units of the given asset kind
    pub fn value(&self, kind: AssetKind) -> u64 {
        match kind {
            AssetKind::Native => self.lamports,
            AssetKind::StandardA | AssetKind::StandardB => {
                self.token.map(|t| t.amount).unwrap_or(0)
            },
        }
    }

    pub fn reference(&self) -> RecordRef {
        RecordRef {
            hash: self.hash,
            tree: self.tree,
            queue: self.queue,
        }
    }
}

/// Identifies a record for proof retrieval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordRef {
    pub hash: [u8; 32],
    pub tree: Pubkey,
    pub queue: Pubkey,
}

/// Groth16 proof points as returned by the indexer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressedProof {
    pub a: Vec<u8>,
    pub b: Vec<u8>,
    pub c: Vec<u8>,
}

/// Freshness proof for a specific set of records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidityProof {
    pub compressed_proof: Option<CompressedProof>,
    pub root_indices: Vec<u16>,
}

/// Output state tree for newly compressed value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTreeInfo {
    pub tree: Pubkey,
    pub queue: Pubkey,
}

/// A public token holding as reported by the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenHolding {
    pub mint: Pubkey,
    pub amount: u64,
    pub decimals: u8,
}

/// Balance of one mint in one domain (public or private)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBalance {
    pub mint: Pubkey,
    pub raw_amount: u64,

    /// Zero when the decimals were not known to the ledger
    pub decimals: u8,
}

impl TokenBalance {
    pub fn ui_amount(&self) -> String {
        crate::utils::format_amount(self.raw_amount, self.decimals)
    }
}

/// Public and private balance of one mint side by side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedBalance {
    pub mint: Pubkey,
    pub decimals: u8,
    pub public_amount: u64,
    pub private_amount: u64,
}

impl MergedBalance {
    pub fn total(&self) -> u64 {
        self.public_amount.saturating_add(self.private_amount)
    }
}

/// Lifecycle of a swap as seen by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapStatus {
    Initialized,
    Signing,
    Processing,
    Completed,
    Pending,
    Rejected,
}

/// Swap descriptor handed to the remote operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapSession {
    pub id: String,

    #[serde(rename = "fromToken")]
    pub from_mint: String,

    #[serde(rename = "toToken")]
    pub to_mint: String,

    /// Amount as the caller typed it
    pub amount: String,

    /// Amount in raw units of the source mint
    pub amount_value: u64,

    #[serde(rename = "fromTokenDecimals")]
    pub from_decimals: u8,

    #[serde(rename = "userPublicKey")]
    pub owner: String,

    /// Operator address receiving the swap input
    pub recipient: String,

    pub status: SwapStatus,

    /// Unix milliseconds
    pub created: u64,
}
