use crate::core::constants::{COMPUTE_UNIT_LIMIT, COMPUTE_UNIT_PRICE, MAX_TRANSACTION_SIZE};
use crate::error::{NullTraceError, Result};
use solana_sdk::address_lookup_table::AddressLookupTableAccount;
use solana_sdk::compute_budget::ComputeBudgetInstruction;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::message::{v0::Message as MessageV0, VersionedMessage};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;
use tracing::debug;

/// One size-bounded transaction ready for signing.
#[derive(Debug, Clone)]
pub struct TransactionBundle {
    /// Instructions in execution order, compute-budget seeds first
    pub instructions: Vec<Instruction>,

    pub recent_blockhash: Hash,

    /// Unsigned transaction with placeholder signature slots
    pub transaction: VersionedTransaction,

    /// Serialized size in bytes, signatures included
    pub size: usize,
}

/// Packs an instruction stream into as few v0 transactions as fit under the
/// byte ceiling, preserving order.
#[derive(Debug, Clone)]
pub struct TransactionPacker {
    payer: Pubkey,
    recent_blockhash: Hash,
    lookup_tables: Vec<AddressLookupTableAccount>,
    seed: Vec<Instruction>,
    max_size: usize,
}

impl TransactionPacker {
    pub fn new(payer: Pubkey, recent_blockhash: Hash) -> Self {
        Self {
            payer,
            recent_blockhash,
            lookup_tables: Vec::new(),
            seed: compute_budget_instructions(COMPUTE_UNIT_LIMIT, COMPUTE_UNIT_PRICE),
            max_size: MAX_TRANSACTION_SIZE,
        }
    }

    pub fn with_lookup_table(mut self, table: AddressLookupTableAccount) -> Self {
        self.lookup_tables.push(table);
        self
    }

    pub fn with_compute_budget(mut self, unit_limit: u32, unit_price: u64) -> Self {
        self.seed = compute_budget_instructions(unit_limit, unit_price);
        self
    }

    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Instructions every bundle starts with
    pub fn seed_instructions(&self) -> &[Instruction] {
        &self.seed
    }

    pub fn pack(&self, instructions: Vec<Instruction>) -> Result<Vec<TransactionBundle>> {
        let seed_len = self.seed.len();
        let mut bundles = Vec::new();
        let mut current = self.seed.clone();

        for (index, ix) in instructions.into_iter().enumerate() {
            current.push(ix);
            if self.compile(&current).is_some() {
                continue;
            }

            // Roll back and close the bundle
            let overflow = match current.pop() {
                Some(ix) => ix,
                None => continue,
            };
            if current.len() > seed_len {
                bundles.push(self.bundle(current)?);
            }

            current = self.seed.clone();
            current.push(overflow);
            if self.compile(&current).is_none() {
                return Err(NullTraceError::TransactionTooLarge {
                    index,
                    limit: self.max_size,
                });
            }
        }

        if current.len() > seed_len {
            bundles.push(self.bundle(current)?);
        }

        debug!(bundles = bundles.len(), "packed instructions");
        Ok(bundles)
    }

    fn bundle(&self, instructions: Vec<Instruction>) -> Result<TransactionBundle> {
        let (transaction, size) = self.compile(&instructions).ok_or(
            NullTraceError::TransactionTooLarge {
                index: instructions.len(),
                limit: self.max_size,
            },
        )?;
        Ok(TransactionBundle {
            instructions,
            recent_blockhash: self.recent_blockhash,
            transaction,
            size,
        })
    }

    /// Compile and measure; `None` when the message cannot be compiled or is
    /// over the ceiling
    fn compile(&self, instructions: &[Instruction]) -> Option<(VersionedTransaction, usize)> {
        let message = MessageV0::try_compile(
            &self.payer,
            instructions,
            &self.lookup_tables,
            self.recent_blockhash,
        )
        .ok()?;
        let signers = message.header.num_required_signatures as usize;
        let transaction = VersionedTransaction {
            signatures: vec![Signature::default(); signers],
            message: VersionedMessage::V0(message),
        };
        let size = bincode::serialized_size(&transaction).ok()? as usize;
        (size <= self.max_size).then_some((transaction, size))
    }
}

pub fn compute_budget_instructions(unit_limit: u32, unit_price: u64) -> Vec<Instruction> {
    vec![
        ComputeBudgetInstruction::set_compute_unit_limit(unit_limit),
        ComputeBudgetInstruction::set_compute_unit_price(unit_price),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::instruction::AccountMeta;

    fn memo_like(payer: &Pubkey, data_len: usize, tag: u8) -> Instruction {
        Instruction {
            program_id: Pubkey::new_from_array([9; 32]),
            accounts: vec![
                AccountMeta::new(*payer, true),
                AccountMeta::new(Pubkey::new_unique(), false),
            ],
            data: vec![tag; data_len],
        }
    }

    #[test]
    fn test_empty_stream_yields_no_bundles() {
        let packer = TransactionPacker::new(Pubkey::new_unique(), Hash::default());
        assert!(packer.pack(vec![]).unwrap().is_empty());
    }

    #[test]
    fn test_small_stream_fits_one_bundle() {
        let payer = Pubkey::new_unique();
        let packer = TransactionPacker::new(payer, Hash::new_unique());
        let ixs: Vec<_> = (0..3).map(|i| memo_like(&payer, 10, i)).collect();

        let bundles = packer.pack(ixs.clone()).unwrap();
        assert_eq!(bundles.len(), 1);
        assert_eq!(bundles[0].instructions.len(), 5);
        assert_eq!(&bundles[0].instructions[..2], packer.seed_instructions());
        assert_eq!(&bundles[0].instructions[2..], &ixs[..]);
    }

    #[test]
    fn test_overflow_splits_and_preserves_order() {
        let payer = Pubkey::new_unique();
        let packer = TransactionPacker::new(payer, Hash::new_unique());
        let ixs: Vec<_> = (0..40).map(|i| memo_like(&payer, 120, i)).collect();

        let bundles = packer.pack(ixs.clone()).unwrap();
        assert!(bundles.len() > 1);

        let mut replayed = Vec::new();
        for bundle in &bundles {
            assert!(bundle.size <= MAX_TRANSACTION_SIZE);
            assert_eq!(
                bincode::serialized_size(&bundle.transaction).unwrap() as usize,
                bundle.size
            );
            assert_eq!(&bundle.instructions[..2], packer.seed_instructions());
            assert!(bundle.instructions.len() > 2);
            replayed.extend_from_slice(&bundle.instructions[2..]);
        }
        assert_eq!(replayed, ixs);
    }

    #[test]
    fn test_tighter_ceiling_means_more_bundles() {
        let payer = Pubkey::new_unique();
        let ixs: Vec<_> = (0..12).map(|i| memo_like(&payer, 60, i)).collect();
        let loose = TransactionPacker::new(payer, Hash::default())
            .pack(ixs.clone())
            .unwrap();
        let tight = TransactionPacker::new(payer, Hash::default())
            .with_max_size(600)
            .pack(ixs)
            .unwrap();
        assert!(tight.len() > loose.len());
        assert!(tight.iter().all(|b| b.size <= 600));
    }

    #[test]
    fn test_lookup_table_shrinks_bundles() {
        let payer = Pubkey::new_unique();
        let ixs: Vec<_> = (0..30).map(|i| memo_like(&payer, 4, i)).collect();
        let table = AddressLookupTableAccount {
            key: Pubkey::new_unique(),
            addresses: ixs.iter().map(|ix| ix.accounts[1].pubkey).collect(),
        };

        let without = TransactionPacker::new(payer, Hash::default())
            .pack(ixs.clone())
            .unwrap();
        let with = TransactionPacker::new(payer, Hash::default())
            .with_lookup_table(table)
            .pack(ixs)
            .unwrap();
        assert!(with.len() < without.len());
    }

    #[test]
    fn test_instruction_that_never_fits_is_an_error() {
        let payer = Pubkey::new_unique();
        let packer = TransactionPacker::new(payer, Hash::default());
        let ixs = vec![memo_like(&payer, 10, 0), memo_like(&payer, 2_000, 1)];
        match packer.pack(ixs) {
            Err(NullTraceError::TransactionTooLarge { index, limit }) => {
                assert_eq!(index, 1);
                assert_eq!(limit, MAX_TRANSACTION_SIZE);
            },
            other => panic!("expected TransactionTooLarge, got {:?}", other),
        }
    }
}
