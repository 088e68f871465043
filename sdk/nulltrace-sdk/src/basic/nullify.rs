use crate::advanced::pipeline::sign_send_confirm;
use crate::basic::client::{NullTrace, OperationPlan};
use crate::error::Result;
use solana_sdk::signature::Signature;
use tracing::info;

impl NullTrace {
    /// Bundles that move `amount` of public `mint` into private records,
    /// the net share to the owner and the fee to the operator.
    pub async fn plan_nullify(&self, mint: &str, amount: &str) -> Result<OperationPlan> {
        let asset = self.resolve(mint).await?;
        let raw = self.raw_amount(amount, &asset)?;
        let split = self.fee_split(raw);
        let owner = self.owner();

        info!(mint = %asset.mint, amount = raw, fee = split.fee, "planning nullify");
        let ixs = self
            .compress_to(
                &asset,
                vec![(owner, split.net), (self.config.operator_address, split.fee)],
            )
            .await?;

        let packer = self.packer().await?;
        Ok(OperationPlan {
            top_up: Vec::new(),
            bundles: packer.pack(ixs)?,
        })
    }

    /// Public to private. Returns the confirmed signatures in order.
    pub async fn nullify(&self, mint: &str, amount: &str) -> Result<Vec<Signature>> {
        let plan = self.plan_nullify(mint, amount).await?;
        sign_send_confirm(self.ledger.as_ref(), self.signer.as_ref(), &plan.ordered()).await
    }
}
