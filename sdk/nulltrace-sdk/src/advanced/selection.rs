use crate::core::connection::LedgerClient;
use crate::core::constants::ALLOWED_BATCH_SIZES;
use crate::error::{NullTraceError, Result};
use crate::types::{Asset, AssetKind, ValueRecord};
use solana_sdk::pubkey::Pubkey;
use tracing::debug;

/// Records chosen to cover a target amount, largest first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionResult {
    pub records: Vec<ValueRecord>,
    pub total: u64,
}

impl SelectionResult {
    pub fn is_sufficient(&self, target: u64) -> bool {
        self.total >= target
    }

    /// Amount still missing after spending every selected record
    pub fn deficit(&self, target: u64) -> u64 {
        target.saturating_sub(self.total)
    }
}

/// Fetch every compressed record of `asset` owned by `owner`, sorted by
/// value descending. Ties keep discovery order.
pub async fn fetch_sorted_records(
    ledger: &dyn LedgerClient,
    owner: &Pubkey,
    asset: &Asset,
) -> Result<Vec<ValueRecord>> {
    let mut records = match asset.kind {
        AssetKind::Native => ledger.get_compressed_accounts(owner).await,
        AssetKind::StandardA | AssetKind::StandardB => {
            ledger
                .get_compressed_token_accounts(owner, Some(&asset.mint))
                .await
        },
    }
    .map_err(|e| NullTraceError::Connection(e.to_string()))?;

    // sort_by is stable
    records.sort_by(|a, b| b.value(asset.kind).cmp(&a.value(asset.kind)));
    debug!(owner = %owner, mint = %asset.mint, count = records.len(), "fetched compressed records");
    Ok(records)
}

/// Take records from the front of `sorted` until their sum reaches `target`.
///
/// Stops at the first record that meets the threshold. When the whole list
/// falls short the full list is returned so the caller can size a top-up.
pub fn select_records(sorted: &[ValueRecord], target: u64, kind: AssetKind) -> SelectionResult {
    let mut selection = SelectionResult::default();
    for record in sorted {
        if selection.total >= target {
            break;
        }
        selection.total = selection.total.saturating_add(record.value(kind));
        selection.records.push(record.clone());
    }
    selection
}

/// Split records into consecutive groups whose sizes are drawn greedily from
/// [`ALLOWED_BATCH_SIZES`].
pub fn batch_records(records: &[ValueRecord]) -> Vec<Vec<ValueRecord>> {
    let mut batches = Vec::new();
    let mut remaining = records;
    while !remaining.is_empty() {
        let size = ALLOWED_BATCH_SIZES
            .iter()
            .copied()
            .find(|size| *size <= remaining.len())
            .unwrap_or(1);
        let (batch, rest) = remaining.split_at(size);
        batches.push(batch.to_vec());
        remaining = rest;
    }
    batches
}

/// Amount each batch moves: its own sum, capped by what is still owed.
///
/// When the batches cover `target`, the shares add up to exactly `target`
/// and any remainder lands on the last batch that is needed.
pub fn batch_amounts(batches: &[Vec<ValueRecord>], target: u64, kind: AssetKind) -> Vec<u64> {
    let mut remaining = target;
    batches
        .iter()
        .map(|batch| {
            let batch_sum = batch
                .iter()
                .fold(0u64, |acc, r| acc.saturating_add(r.value(kind)));
            let share = remaining.min(batch_sum);
            remaining -= share;
            share
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(lamports: u64, tag: u8) -> ValueRecord {
        ValueRecord {
            hash: [tag; 32],
            tree: Pubkey::default(),
            queue: Pubkey::default(),
            lamports,
            token: None,
        }
    }

    fn records(values: &[u64]) -> Vec<ValueRecord> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| record(*v, i as u8))
            .collect()
    }

    #[test]
    fn test_selects_minimal_prefix() {
        let sorted = records(&[700_000, 500_000, 100_000]);
        let selection = select_records(&sorted, 1_000_000, AssetKind::Native);
        assert_eq!(selection.records.len(), 2);
        assert_eq!(selection.total, 1_200_000);
        assert!(selection.is_sufficient(1_000_000));

        // Dropping the last pick falls short
        let without_last: u64 = selection.records[..1].iter().map(|r| r.lamports).sum();
        assert!(without_last < 1_000_000);
    }

    #[test]
    fn test_short_selection_returns_everything() {
        let sorted = records(&[500_000, 400_000]);
        let selection = select_records(&sorted, 1_000_000, AssetKind::Native);
        assert_eq!(selection.records.len(), 2);
        assert_eq!(selection.total, 900_000);
        assert_eq!(selection.deficit(1_000_000), 100_000);
    }

    #[test]
    fn test_zero_target_selects_nothing() {
        let selection = select_records(&records(&[10, 20]), 0, AssetKind::Native);
        assert!(selection.records.is_empty());
        assert_eq!(selection.total, 0);
    }

    #[test]
    fn test_token_records_use_parsed_amount() {
        let mint = Pubkey::new_unique();
        let mut r = record(1, 0);
        r.token = Some(crate::types::TokenAmount { mint, amount: 42 });
        let selection = select_records(&[r], 40, AssetKind::StandardA);
        assert_eq!(selection.total, 42);
    }

    #[test]
    fn test_batches_use_allowed_sizes() {
        let sizes = |n: usize| -> Vec<usize> {
            batch_records(&records(&vec![1; n]))
                .iter()
                .map(Vec::len)
                .collect()
        };
        assert_eq!(sizes(0), Vec::<usize>::new());
        assert_eq!(sizes(1), vec![1]);
        assert_eq!(sizes(3), vec![2, 1]);
        assert_eq!(sizes(7), vec![4, 2, 1]);
        assert_eq!(sizes(8), vec![8]);
        assert_eq!(sizes(15), vec![8, 4, 2, 1]);
        assert_eq!(sizes(21), vec![8, 8, 4, 1]);
    }

    #[test]
    fn test_batches_concatenate_to_input() {
        for n in 0..40 {
            let input = records(&(0..n as u64).collect::<Vec<_>>());
            let batches = batch_records(&input);
            assert!(batches
                .iter()
                .all(|b| ALLOWED_BATCH_SIZES.contains(&b.len())));
            let flattened: Vec<ValueRecord> = batches.into_iter().flatten().collect();
            assert_eq!(flattened, input);
        }
    }

    #[test]
    fn test_batch_amounts_sum_to_target() {
        let batches = batch_records(&records(&[700_000, 500_000]));
        assert_eq!(batches.len(), 1);
        assert_eq!(
            batch_amounts(&batches, 1_000_000, AssetKind::Native),
            vec![1_000_000]
        );

        let batches = batch_records(&records(&[400, 300, 200, 100, 50]));
        let amounts = batch_amounts(&batches, 950, AssetKind::Native);
        assert_eq!(amounts, vec![950, 0]);
        assert_eq!(amounts.iter().sum::<u64>(), 950);
    }

    #[test]
    fn test_batch_amounts_when_short_move_everything() {
        let batches = batch_records(&records(&[200_000, 100_000]));
        assert_eq!(
            batch_amounts(&batches, 1_000_000, AssetKind::Native),
            vec![300_000]
        );
    }
}
