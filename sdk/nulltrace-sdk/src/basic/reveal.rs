use crate::advanced::pipeline::sign_send_confirm;
use crate::advanced::selection::{fetch_sorted_records, select_records};
use crate::basic::client::{NullTrace, OperationPlan, SpendTarget};
use crate::error::{NullTraceError, Result};
use crate::utils::derive_holding_address;
use solana_sdk::signature::Signature;
use spl_associated_token_account::instruction::create_associated_token_account;
use tracing::info;

impl NullTrace {
    /// Bundles that move `amount` of private `mint` back to the owner's
    /// public account. Fails before building anything when the private
    /// records fall short.
    pub async fn plan_reveal(&self, mint: &str, amount: &str) -> Result<OperationPlan> {
        let asset = self.resolve(mint).await?;
        let raw = self.raw_amount(amount, &asset)?;
        let owner = self.owner();

        let sorted = fetch_sorted_records(self.ledger.as_ref(), &owner, &asset).await?;
        let selection = select_records(&sorted, raw, asset.kind);
        if !selection.is_sufficient(raw) {
            return Err(NullTraceError::InsufficientBalance {
                required: raw,
                available: selection.total,
            });
        }
        info!(
            mint = %asset.mint,
            amount = raw,
            records = selection.records.len(),
            "planning reveal"
        );

        let mut ixs = Vec::new();
        let destination = if asset.kind.is_native() {
            owner
        } else {
            let token_program = asset.kind.token_program();
            let holding = derive_holding_address(&owner, &asset.mint, &token_program);
            if !self.account_exists(&holding).await? {
                ixs.push(create_associated_token_account(
                    &owner,
                    &owner,
                    &asset.mint,
                    &token_program,
                ));
            }
            holding
        };

        ixs.extend(
            self.spend_records(
                &asset,
                &selection.records,
                raw,
                SpendTarget::Decompress(destination),
            )
            .await?,
        );

        let packer = self.packer().await?;
        Ok(OperationPlan {
            top_up: Vec::new(),
            bundles: packer.pack(ixs)?,
        })
    }

    /// Private to public. Returns the confirmed signatures in order.
    pub async fn reveal(&self, mint: &str, amount: &str) -> Result<Vec<Signature>> {
        let plan = self.plan_reveal(mint, amount).await?;
        sign_send_confirm(self.ledger.as_ref(), self.signer.as_ref(), &plan.ordered()).await
    }
}
