use crate::advanced::auth::auth_token;
use crate::core::config::NullTraceConfig;
use crate::core::constants::AUTH_HEADER;
use crate::error::{NullTraceError, Result};
use crate::types::{SwapSession, SwapStatus};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Body of `POST /quote-swap`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub input_mint: String,
    pub output_mint: String,
    /// Raw units of the input mint
    pub amount: u64,
}

/// Quote returned by the operator. Unknown fields are preserved in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapQuote {
    #[serde(default, deserialize_with = "string_or_number")]
    pub in_amount: String,

    #[serde(default, deserialize_with = "string_or_number")]
    pub out_amount: String,

    #[serde(default)]
    pub price_impact: f64,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Body of `POST /process-swap`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSwapRequest {
    #[serde(rename = "swapData")]
    pub session: SwapSession,

    /// Base64 wire bytes of the signed transfer bundles, in order
    #[serde(rename = "signedTransferData")]
    pub signed_transfers: Vec<String>,
}

/// Operator answer to a swap submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessSwapResponse {
    pub status: SwapStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The remote party that executes swaps on behalf of the user
#[async_trait]
pub trait SwapOperator: Send + Sync {
    async fn quote_swap(&self, request: &QuoteRequest) -> Result<SwapQuote>;

    async fn process_swap(&self, request: &ProcessSwapRequest) -> Result<ProcessSwapResponse>;
}

/// `SwapOperator` over the operator's HTTP API.
///
/// Every request carries a fresh one-time code in the auth header.
#[derive(Debug, Clone)]
pub struct HttpOperator {
    client: Client,
    base_url: String,
    secret: String,
}

impl HttpOperator {
    pub fn new(base_url: impl Into<String>, secret: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(NullTraceError::InvalidArgument(format!(
                "operator url must be http(s): {}",
                base_url
            )));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret: secret.into(),
        })
    }

    pub fn from_config(config: &NullTraceConfig) -> Result<Self> {
        Self::new(config.operator_url.clone(), config.operator_secret.clone())
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn post<B, T>(&self, path: &str, body: &B, context: &str) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path);
        debug!(%url, "calling operator");
        let response = self
            .client
            .post(&url)
            .header(AUTH_HEADER, auth_token(&self.secret)?)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            let message = body
                .get("error")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| format!("{} failed: {}", context, status.as_u16()));
            warn!(%url, status = status.as_u16(), %message, "operator rejected request");
            return Err(NullTraceError::SubmissionRejected(message));
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl SwapOperator for HttpOperator {
    async fn quote_swap(&self, request: &QuoteRequest) -> Result<SwapQuote> {
        self.post("quote-swap", request, "Quote").await
    }

    async fn process_swap(&self, request: &ProcessSwapRequest) -> Result<ProcessSwapResponse> {
        self.post("process-swap", request, "Swap submission").await
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}
