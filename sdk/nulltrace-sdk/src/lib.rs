pub mod advanced;
pub mod basic;
pub mod core;
pub mod error;
pub mod types;
pub mod utils;

pub use crate::basic::client::{NullTrace, NullTraceBuilder, OperationPlan};
pub use crate::basic::swap::{StatusCallback, SwapOptions, SwapOutcome};
pub use crate::core::config::NullTraceConfig;
pub use crate::core::connection::LedgerClient;
pub use crate::core::operator::{HttpOperator, SwapOperator, SwapQuote};
pub use crate::core::program::CompressionProgram;
pub use crate::core::rpc::RpcLedger;
pub use crate::core::signer::{KeypairSigner, NullSigner};
pub use crate::error::{NullTraceError, Result};
pub use crate::types::{
    Asset, AssetKind, MergedBalance, SwapSession, SwapStatus, TokenBalance, ValueRecord,
};
pub use crate::utils::{format_amount, parse_amount};

/// Install a plain `fmt` subscriber at INFO. A subscriber that is already
/// installed wins.
#[cfg(feature = "logging")]
pub fn init_logging() {
    use tracing_subscriber::fmt::Subscriber;
    let subscriber = Subscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
