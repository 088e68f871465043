use crate::core::constants::BPS_DENOMINATOR;

/// An amount split between its recipient and the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSplit {
    pub net: u64,
    pub fee: u64,
}

/// Skim `fee_bps` basis points (rounded down) off `amount`.
///
/// `net + fee == amount` always holds.
pub fn split_fee(amount: u64, fee_bps: u64) -> FeeSplit {
    let fee = (amount as u128 * fee_bps as u128 / BPS_DENOMINATOR as u128) as u64;
    FeeSplit {
        net: amount - fee.min(amount),
        fee: fee.min(amount),
    }
}
