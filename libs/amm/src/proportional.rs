//! Proportional deposit math for constant-product pools
//!
//! A deposit keeps the pool ratio when
//! `amount_other = amount_entered * reserve_other / reserve_entered`.
//! The division floors, so the derived amount never exceeds the exact ratio.

use crate::AmmError;
use dex_types::{ReservePair, U256};

/// Derive one side of a balanced deposit from the pool ratio
pub trait ProportionalDeposit {
    /// Quote amount matching a base deposit at the current pool ratio
    fn required_quote_for_base(&self, base_amount: U256) -> Result<U256, AmmError>;

    /// Base amount matching a quote deposit at the current pool ratio
    fn required_base_for_quote(&self, quote_amount: U256) -> Result<U256, AmmError>;
}

impl ProportionalDeposit for ReservePair {
    fn required_quote_for_base(&self, base_amount: U256) -> Result<U256, AmmError> {
        required_pair_amount(base_amount, self.reserve_base, self.reserve_quote)
    }

    fn required_base_for_quote(&self, quote_amount: U256) -> Result<U256, AmmError> {
        required_pair_amount(quote_amount, self.reserve_quote, self.reserve_base)
    }
}

/// `entered * reserve_other / reserve_entered` in 256-bit integers
pub fn required_pair_amount(
    entered: U256,
    reserve_entered: U256,
    reserve_other: U256,
) -> Result<U256, AmmError> {
    if reserve_entered.is_zero() {
        return Err(AmmError::EmptyReserve);
    }

    let numerator = entered
        .checked_mul(reserve_other)
        .ok_or(AmmError::Overflow)?;

    Ok(numerator / reserve_entered)
}
