//! Exchange pool state as read from the contract

use ethers_core::types::U256;
use serde::{Deserialize, Serialize};

/// Pooled amounts held by the exchange contract (`getReserves()`)
///
/// These belong to the pool, not the user, and are only used to derive a
/// proportional deposit or a display price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReservePair {
    pub reserve_base: U256,
    pub reserve_quote: U256,
}

impl ReservePair {
    pub fn new(reserve_base: U256, reserve_quote: U256) -> Self {
        Self {
            reserve_base,
            reserve_quote,
        }
    }

    /// True while the pool has not received its first liquidity
    pub fn is_empty(&self) -> bool {
        self.reserve_base.is_zero() || self.reserve_quote.is_zero()
    }
}
