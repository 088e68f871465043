use crate::advanced::mint::parse_mint;
use crate::advanced::pipeline::{send_and_confirm, sign_bundles};
use crate::basic::client::{NullTrace, OperationPlan};
use crate::core::operator::{ProcessSwapRequest, ProcessSwapResponse, QuoteRequest, SwapQuote};
use crate::error::{NullTraceError, Result};
use crate::types::{SwapSession, SwapStatus};
use crate::utils::unix_millis;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use solana_sdk::signature::{Keypair, Signer};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

pub type StatusCallback = Arc<dyn Fn(SwapStatus) + Send + Sync>;

/// Per-call swap settings. Unset durations fall back to the client config.
#[derive(Clone, Default)]
pub struct SwapOptions {
    /// How long to wait for the operator before returning `Pending`
    pub timeout: Option<Duration>,
    pub poll_interval: Option<Duration>,
    pub on_status_change: Option<StatusCallback>,
}

impl SwapOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn on_status_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(SwapStatus) + Send + Sync + 'static,
    {
        self.on_status_change = Some(Arc::new(callback));
        self
    }

    fn validate(&self) -> Result<()> {
        if self.poll_interval == Some(Duration::ZERO) {
            return Err(NullTraceError::InvalidArgument(
                "poll_interval must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn emit(&self, status: SwapStatus) {
        if let Some(callback) = &self.on_status_change {
            callback(status);
        }
    }
}

impl fmt::Debug for SwapOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwapOptions")
            .field("timeout", &self.timeout)
            .field("poll_interval", &self.poll_interval)
            .field("on_status_change", &self.on_status_change.is_some())
            .finish()
    }
}

/// How a swap ended from the caller's point of view
#[derive(Debug, Clone, PartialEq)]
pub enum SwapOutcome {
    /// The operator finished the swap during submission
    Completed { result: ProcessSwapResponse },

    /// Still running when the timeout elapsed. Follow up with `session_id`.
    Pending {
        session_id: String,
        result: ProcessSwapResponse,
    },
}

impl SwapOutcome {
    pub fn status(&self) -> SwapStatus {
        match self {
            SwapOutcome::Completed { .. } => SwapStatus::Completed,
            SwapOutcome::Pending { .. } => SwapStatus::Pending,
        }
    }

    pub fn result(&self) -> &ProcessSwapResponse {
        match self {
            SwapOutcome::Completed { result } | SwapOutcome::Pending { result, .. } => result,
        }
    }
}

impl NullTrace {
    /// Price `amount` of `from_mint` in `to_mint`. Nothing is signed.
    pub async fn quote_swap(&self, from_mint: &str, to_mint: &str, amount: &str) -> Result<SwapQuote> {
        let to = parse_required_mint(to_mint)?;
        let asset = self.resolve(from_mint).await?;
        let raw = self.raw_amount(amount, &asset)?;
        self.operator
            .quote_swap(&QuoteRequest {
                input_mint: asset.mint.to_string(),
                output_mint: to.to_string(),
                amount: raw,
            })
            .await
    }

    /// Bundles for a swap: private value of `from_mint` sent to the
    /// operator, topped up from public balance when short.
    pub async fn plan_swap(&self, from_mint: &str, to_mint: &str, amount: &str) -> Result<OperationPlan> {
        parse_required_mint(to_mint)?;
        let asset = self.resolve(from_mint).await?;
        let raw = self.raw_amount(amount, &asset)?;
        info!(from = %asset.mint, to = to_mint, amount = raw, "planning swap");
        self.plan_private_send(&asset, raw, self.config.operator_address)
            .await
    }

    /// Swap private `from_mint` for `to_mint` through the operator.
    ///
    /// Every bundle is signed in one request. Top-up bundles are sent and
    /// confirmed here; the signed transfer bundles are handed to the
    /// operator with the session descriptor. A `rejected` answer or a
    /// failed request is `SubmissionRejected`. Otherwise the call waits out
    /// the timeout and returns `Pending`.
    pub async fn swap(
        &self,
        from_mint: &str,
        to_mint: &str,
        amount: &str,
        options: SwapOptions,
    ) -> Result<SwapOutcome> {
        options.validate()?;
        let to = parse_required_mint(to_mint)?;
        let asset = self.resolve(from_mint).await?;
        let raw = self.raw_amount(amount, &asset)?;
        let operator = self.config.operator_address;
        info!(from = %asset.mint, %to, amount = raw, "starting swap");

        let plan = self.plan_private_send(&asset, raw, operator).await?;

        options.emit(SwapStatus::Signing);
        let signed = sign_bundles(self.signer.as_ref(), &plan.ordered()).await?;
        let (top_up, transfers) = signed.split_at(plan.top_up.len());

        if !top_up.is_empty() {
            let signatures = send_and_confirm(self.ledger.as_ref(), top_up).await?;
            debug!(count = signatures.len(), "top-up confirmed");
        }

        let session = SwapSession {
            id: Keypair::new().pubkey().to_string(),
            from_mint: asset.mint.to_string(),
            to_mint: to.to_string(),
            amount: amount.trim().to_string(),
            amount_value: raw,
            from_decimals: asset.decimals,
            owner: self.owner().to_string(),
            recipient: operator.to_string(),
            status: SwapStatus::Initialized,
            created: unix_millis(),
        };
        let session_id = session.id.clone();

        let signed_transfers = transfers
            .iter()
            .map(|tx| bincode::serialize(tx).map(|bytes| STANDARD.encode(bytes)))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        options.emit(SwapStatus::Processing);
        let response = self
            .operator
            .process_swap(&ProcessSwapRequest {
                session,
                signed_transfers,
            })
            .await?;

        match response.status {
            SwapStatus::Completed => {
                info!(%session_id, "swap completed");
                options.emit(SwapStatus::Completed);
                return Ok(SwapOutcome::Completed { result: response });
            },
            SwapStatus::Rejected => {
                let message = response
                    .error
                    .clone()
                    .unwrap_or_else(|| "swap rejected by operator".to_string());
                warn!(%session_id, %message, "swap rejected");
                return Err(NullTraceError::SubmissionRejected(message));
            },
            _ => {},
        }

        let timeout = options.timeout.unwrap_or_else(|| self.config.swap_timeout());
        let interval = options
            .poll_interval
            .unwrap_or_else(|| self.config.swap_poll_interval());
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            sleep(interval).await;
            options.emit(SwapStatus::Pending);
        }

        info!(%session_id, "swap still processing at timeout");
        Ok(SwapOutcome::Pending {
            session_id,
            result: response,
        })
    }
}

fn parse_required_mint(mint: &str) -> Result<solana_sdk::pubkey::Pubkey> {
    if mint.trim().is_empty() {
        return Err(NullTraceError::InvalidArgument("mint is required".to_string()));
    }
    parse_mint(mint)
}
