use crate::advanced::packer::TransactionBundle;
use crate::core::connection::LedgerClient;
use crate::core::signer::NullSigner;
use crate::error::{NullTraceError, Result};
use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;
use tracing::{debug, info};

/// Ask the signer for every bundle in a single request.
pub async fn sign_bundles(
    signer: &dyn NullSigner,
    bundles: &[TransactionBundle],
) -> Result<Vec<VersionedTransaction>> {
    let unsigned: Vec<VersionedTransaction> =
        bundles.iter().map(|b| b.transaction.clone()).collect();
    let signed = signer
        .sign_transactions(unsigned)
        .await
        .map_err(NullTraceError::Signer)?;
    if signed.len() != bundles.len() {
        return Err(NullTraceError::Signer(format!(
            "signer returned {} transactions for {} bundles",
            signed.len(),
            bundles.len()
        )));
    }
    Ok(signed)
}

/// Broadcast signed transactions one at a time, waiting for each to confirm
/// before sending the next. Stops at the first failure; earlier
/// confirmations stand.
pub async fn send_and_confirm(
    ledger: &dyn LedgerClient,
    signed: &[VersionedTransaction],
) -> Result<Vec<Signature>> {
    let mut signatures = Vec::with_capacity(signed.len());
    for (position, tx) in signed.iter().enumerate() {
        let signature = ledger
            .send_transaction(tx)
            .await
            .map_err(|e| NullTraceError::SubmissionRejected(e.to_string()))?;
        debug!(%signature, position, "broadcast transaction");

        ledger
            .confirm_transaction(&signature)
            .await
            .map_err(|e| NullTraceError::ConfirmationFailure {
                signature: signature.to_string(),
                reason: e.to_string(),
            })?;
        info!(%signature, position, "confirmed transaction");
        signatures.push(signature);
    }
    Ok(signatures)
}

/// Sign all bundles at once, then send and confirm them in order.
pub async fn sign_send_confirm(
    ledger: &dyn LedgerClient,
    signer: &dyn NullSigner,
    bundles: &[TransactionBundle],
) -> Result<Vec<Signature>> {
    let signed = sign_bundles(signer, bundles).await?;
    send_and_confirm(ledger, &signed).await
}
