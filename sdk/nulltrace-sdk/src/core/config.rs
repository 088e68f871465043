use crate::core::constants::*;
use crate::error::{NullTraceError, Result};
use config::{Config, Environment, Map};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::time::Duration;

const ENV_PREFIX: &str = "NULLTRACE";

/// Runtime settings for a [`crate::NullTrace`] client.
///
/// Every field has a mainnet default; `from_env` overlays `NULLTRACE_*`
/// variables on top of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NullTraceConfig {
    /// Receives operator fees and swap inputs
    #[serde(with = "pubkey_string")]
    pub operator_address: Pubkey,

    /// Lookup table compiled into every bundle
    #[serde(with = "pubkey_string")]
    pub lookup_table: Pubkey,

    /// Base URL of the remote swap operator
    pub operator_url: String,

    /// Shared secret for the operator auth header
    pub operator_secret: String,

    pub fee_bps: u64,
    pub compute_unit_limit: u32,
    pub compute_unit_price: u64,
    pub max_transaction_size: usize,
    pub swap_poll_interval_ms: u64,
    pub swap_timeout_ms: u64,
}

impl Default for NullTraceConfig {
    fn default() -> Self {
        Self {
            operator_address: OPERATOR_ADDRESS,
            lookup_table: LOOKUP_TABLE_ADDRESS,
            operator_url: DEFAULT_OPERATOR_URL.to_string(),
            operator_secret: DEFAULT_OPERATOR_SECRET.to_string(),
            fee_bps: FEE_BPS,
            compute_unit_limit: COMPUTE_UNIT_LIMIT,
            compute_unit_price: COMPUTE_UNIT_PRICE,
            max_transaction_size: MAX_TRANSACTION_SIZE,
            swap_poll_interval_ms: SWAP_POLL_INTERVAL_MS,
            swap_timeout_ms: SWAP_TIMEOUT_MS,
        }
    }
}

impl NullTraceConfig {
    /// Defaults overlaid with `NULLTRACE_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::load(Environment::with_prefix(ENV_PREFIX))
    }

    /// Defaults overlaid with `NULLTRACE_*` entries from `vars` instead of
    /// the process environment
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: Map<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::load(Environment::with_prefix(ENV_PREFIX).source(Some(vars)))
    }

    fn load(environment: Environment) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(environment)
            .build()
            .and_then(Config::try_deserialize)
            .map_err(|e| NullTraceError::InvalidArgument(format!("config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fee_bps > BPS_DENOMINATOR {
            return Err(NullTraceError::InvalidArgument(format!(
                "fee_bps must be at most {}, got {}",
                BPS_DENOMINATOR, self.fee_bps
            )));
        }
        if self.operator_url.is_empty() {
            return Err(NullTraceError::InvalidArgument(
                "operator_url must not be empty".to_string(),
            ));
        }
        if self.swap_poll_interval_ms == 0 {
            return Err(NullTraceError::InvalidArgument(
                "swap_poll_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn swap_poll_interval(&self) -> Duration {
        Duration::from_millis(self.swap_poll_interval_ms)
    }

    pub fn swap_timeout(&self) -> Duration {
        Duration::from_millis(self.swap_timeout_ms)
    }
}

mod pubkey_string {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use solana_sdk::pubkey::Pubkey;
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(key: &Pubkey, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&key.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Pubkey, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Pubkey::from_str(&raw).map_err(de::Error::custom)
    }
}
