use crate::basic::client::NullTrace;
use crate::core::constants::{
    NATIVE_DECIMALS, NATIVE_FEE_RESERVE, OWNERSHIP_MESSAGE, TOKEN_2022_PROGRAM_ID,
};
use crate::error::{NullTraceError, Result};
use crate::types::{MergedBalance, TokenBalance};
use solana_sdk::signature::Signature;
use tracing::debug;

impl NullTrace {
    /// Spendable public balances: native value minus a fee reserve, then
    /// every non-empty holding under both token programs.
    pub async fn public_balances(&self) -> Result<Vec<TokenBalance>> {
        let owner = self.owner();
        let connection = |e: Box<dyn std::error::Error + Send + Sync>| {
            NullTraceError::Connection(e.to_string())
        };

        let (native, standard, extended) = tokio::try_join!(
            async { self.ledger.get_balance(&owner).await.map_err(connection) },
            async {
                self.ledger
                    .get_token_holdings(&owner, &spl_token::ID, None)
                    .await
                    .map_err(connection)
            },
            async {
                self.ledger
                    .get_token_holdings(&owner, &TOKEN_2022_PROGRAM_ID, None)
                    .await
                    .map_err(connection)
            },
        )?;

        let mut balances = Vec::new();
        if native > 0 {
            balances.push(TokenBalance {
                mint: spl_token::native_mint::ID,
                raw_amount: native.saturating_sub(NATIVE_FEE_RESERVE),
                decimals: NATIVE_DECIMALS,
            });
        }
        balances.extend(
            standard
                .into_iter()
                .chain(extended)
                .filter(|h| h.amount > 0)
                .map(|h| TokenBalance {
                    mint: h.mint,
                    raw_amount: h.amount,
                    decimals: h.decimals,
                }),
        );
        Ok(balances)
    }

    /// Compressed balances per mint. Requires the signer to prove
    /// ownership once; the signature is cached on this instance.
    pub async fn private_balances(&self) -> Result<Vec<TokenBalance>> {
        self.ownership_proof().await?;
        let owner = self.owner();
        let connection = |e: Box<dyn std::error::Error + Send + Sync>| {
            NullTraceError::Connection(e.to_string())
        };

        let native = self
            .ledger
            .get_compressed_balance(&owner)
            .await
            .map_err(connection)?;
        let records = self
            .ledger
            .get_compressed_token_accounts(&owner, None)
            .await
            .map_err(connection)?;

        let mut balances: Vec<TokenBalance> = Vec::new();
        if native > 0 {
            balances.push(TokenBalance {
                mint: spl_token::native_mint::ID,
                raw_amount: native,
                decimals: NATIVE_DECIMALS,
            });
        }
        for token in records.iter().filter_map(|r| r.token) {
            match balances.iter_mut().find(|b| b.mint == token.mint) {
                Some(entry) => entry.raw_amount = entry.raw_amount.saturating_add(token.amount),
                None => balances.push(TokenBalance {
                    mint: token.mint,
                    raw_amount: token.amount,
                    decimals: 0,
                }),
            }
        }
        balances.retain(|b| b.raw_amount > 0);
        Ok(balances)
    }

    /// Public and private balances side by side, public mints first
    pub async fn balances(&self) -> Result<Vec<MergedBalance>> {
        let (public, private) = tokio::try_join!(self.public_balances(), self.private_balances())?;
        Ok(merge_balances(public, private))
    }

    /// Forget the cached ownership signature. The next private balance
    /// query asks the signer again.
    pub async fn clear_signature_cache(&self) {
        *self.ownership_signature.lock().await = None;
    }

    async fn ownership_proof(&self) -> Result<Signature> {
        let mut cached = self.ownership_signature.lock().await;
        if let Some(signature) = *cached {
            return Ok(signature);
        }
        let signature = self
            .signer
            .sign_message(OWNERSHIP_MESSAGE)
            .await
            .map_err(NullTraceError::Signer)?;
        debug!("cached ownership signature");
        *cached = Some(signature);
        Ok(signature)
    }
}

fn merge_balances(public: Vec<TokenBalance>, private: Vec<TokenBalance>) -> Vec<MergedBalance> {
    let mut merged: Vec<MergedBalance> = public
        .into_iter()
        .map(|b| MergedBalance {
            mint: b.mint,
            decimals: b.decimals,
            public_amount: b.raw_amount,
            private_amount: 0,
        })
        .collect();
    for b in private {
        match merged.iter_mut().find(|m| m.mint == b.mint) {
            Some(entry) => {
                entry.private_amount = entry.private_amount.saturating_add(b.raw_amount)
            },
            None => merged.push(MergedBalance {
                mint: b.mint,
                decimals: b.decimals,
                public_amount: 0,
                private_amount: b.raw_amount,
            }),
        }
    }
    merged
}
