use crate::advanced::pipeline::sign_send_confirm;
use crate::advanced::selection::{fetch_sorted_records, select_records};
use crate::basic::client::{NullTrace, OperationPlan, SpendTarget};
use crate::core::constants::TOP_UP_FEE_HEADROOM;
use crate::error::{NullTraceError, Result};
use crate::types::Asset;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use std::str::FromStr;
use tracing::{debug, info};

pub(crate) fn parse_recipient(recipient: &str) -> Result<Pubkey> {
    if recipient.trim().is_empty() {
        return Err(NullTraceError::InvalidArgument("recipient is required".to_string()));
    }
    Pubkey::from_str(recipient.trim()).map_err(|e| {
        NullTraceError::InvalidArgument(format!("invalid recipient {}: {}", recipient, e))
    })
}

impl NullTrace {
    /// Plan a private-side spend of `raw` units to `recipient`.
    ///
    /// Records are selected largest first. Whatever they cannot cover is
    /// compressed from the owner's public balance straight to `recipient`
    /// in separate top-up bundles.
    pub(crate) async fn plan_private_send(
        &self,
        asset: &Asset,
        raw: u64,
        recipient: Pubkey,
    ) -> Result<OperationPlan> {
        let owner = self.owner();
        let sorted = fetch_sorted_records(self.ledger.as_ref(), &owner, asset).await?;
        let selection = select_records(&sorted, raw, asset.kind);

        let top_up_ixs = if selection.is_sufficient(raw) {
            Vec::new()
        } else {
            let deficit = selection.deficit(raw);
            debug!(private = selection.total, deficit, "private records short, topping up");
            self.top_up(asset, deficit, recipient).await?
        };

        let ixs = self
            .spend_records(asset, &selection.records, raw, SpendTarget::Transfer(recipient))
            .await?;

        let packer = self.packer().await?;
        Ok(OperationPlan {
            top_up: packer.pack(top_up_ixs)?,
            bundles: packer.pack(ixs)?,
        })
    }

    /// Compress `deficit` of public value directly to `recipient`.
    ///
    /// The operator fee is split off unless the recipient is the operator
    /// itself, in which case the whole deficit goes out as one output.
    async fn top_up(&self, asset: &Asset, deficit: u64, recipient: Pubkey) -> Result<Vec<Instruction>> {
        let owner = self.owner();
        if asset.kind.is_native() {
            let balance = self
                .ledger
                .get_balance(&owner)
                .await
                .map_err(|e| NullTraceError::Connection(e.to_string()))?;
            let required = deficit.saturating_add(TOP_UP_FEE_HEADROOM);
            if balance < required {
                return Err(NullTraceError::InsufficientBalance {
                    required,
                    available: balance,
                });
            }
        } else {
            let holdings = self
                .ledger
                .get_token_holdings(&owner, &asset.kind.token_program(), Some(&asset.mint))
                .await
                .map_err(|e| NullTraceError::Connection(e.to_string()))?;
            let public = holdings.first().map(|h| h.amount).unwrap_or(0);
            if public < deficit {
                return Err(NullTraceError::InsufficientBalance {
                    required: deficit,
                    available: public,
                });
            }
        }

        let operator = self.config.operator_address;
        let outputs = if recipient == operator {
            vec![(operator, deficit)]
        } else {
            let split = self.fee_split(deficit);
            vec![(recipient, split.net), (operator, split.fee)]
        };
        self.compress_to(asset, outputs).await
    }

    /// Bundles that send `amount` of private `mint` to `recipient`, topping
    /// up from public balance when needed.
    pub async fn plan_transfer(
        &self,
        mint: &str,
        amount: &str,
        recipient: &str,
    ) -> Result<OperationPlan> {
        let recipient = parse_recipient(recipient)?;
        let asset = self.resolve(mint).await?;
        let raw = self.raw_amount(amount, &asset)?;
        info!(mint = %asset.mint, amount = raw, %recipient, "planning transfer");
        self.plan_private_send(&asset, raw, recipient).await
    }

    /// Private to private. Top-up bundles are confirmed before the
    /// transfer bundles are sent.
    pub async fn transfer(&self, mint: &str, amount: &str, recipient: &str) -> Result<Vec<Signature>> {
        let plan = self.plan_transfer(mint, amount, recipient).await?;
        sign_send_confirm(self.ledger.as_ref(), self.signer.as_ref(), &plan.ordered()).await
    }
}
