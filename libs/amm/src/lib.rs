//! # DEX AMM Library - Client-Side Pool Arithmetic
//!
//! ## Purpose
//!
//! Exact integer arithmetic the client needs on top of a constant-product
//! pool's read-only state: the proportional second-asset amount for a
//! balanced liquidity deposit, and a display price derived from reserves.
//! The pool's own swap pricing, fees and LP-share minting stay on-chain.
//!
//! ## Integration Points
//!
//! - **Input Sources**: `getReserves()` results from the on-chain state cache
//! - **Output Destinations**: add-liquidity workflow (derived field), stats report
//! - **Precision**: smallest-unit `U256` throughout, no floating point
//!
//! ## Edge Cases
//!
//! - A pool with a zero reserve (just created) has no ratio; derivation
//!   returns [`AmmError::EmptyReserve`] instead of dividing by zero
//! - Products that exceed 256 bits return [`AmmError::Overflow`]

pub mod price;
pub mod proportional;

pub use price::{spot_price, PRICE_DISPLAY_DECIMALS};
pub use dex_types::ReservePair;
pub use proportional::{required_pair_amount, ProportionalDeposit};

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AmmError {
    #[error("Pool reserve is zero, ratio undefined")]
    EmptyReserve,

    #[error("Arithmetic overflow in pool calculation")]
    Overflow,
}
