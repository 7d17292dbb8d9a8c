//! Smallest-unit amount conversion
//!
//! Token amounts travel through the client as raw `U256` values in the
//! asset's smallest unit (wei for 18-decimal tokens). User-facing decimal
//! strings are parsed here and nowhere else.
//!
//! ## Critical Rules
//!
//! 1. **NO FLOATING POINT**: never route an amount through f32/f64
//! 2. **Parse Once**: convert at the workflow boundary right before use
//! 3. **Positive Only**: zero and negative inputs are rejected, not clamped

use ethers_core::types::U256;
use ethers_core::utils::{format_units, parse_units, ParseUnits};
use thiserror::Error;

/// Decimals of the source deployment's tokens (`parseEther` / `formatEther`)
pub const DEFAULT_DECIMALS: u8 = 18;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount is empty")]
    Empty,

    #[error("Invalid amount '{input}': {reason}")]
    Unparseable { input: String, reason: String },

    #[error("Amount must be positive, got '{input}'")]
    NotPositive { input: String },
}

/// Parse a decimal string into a positive smallest-unit amount
pub fn parse_amount(input: &str, decimals: u8) -> Result<U256, AmountError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }

    let parsed = parse_units(trimmed, u32::from(decimals)).map_err(|e| {
        AmountError::Unparseable {
            input: trimmed.to_string(),
            reason: e.to_string(),
        }
    })?;

    match parsed {
        ParseUnits::U256(value) if !value.is_zero() => Ok(value),
        // Negative inputs come back signed
        ParseUnits::U256(_) | ParseUnits::I256(_) => Err(AmountError::NotPositive {
            input: trimmed.to_string(),
        }),
    }
}

/// Render a smallest-unit amount as a trimmed decimal string
///
/// Trailing fractional zeros are dropped so `1500000000000000000` at 18
/// decimals renders as `1.5`, matching what a user would type back in.
pub fn format_amount(value: U256, decimals: u8) -> String {
    let rendered = match format_units(value, u32::from(decimals)) {
        Ok(rendered) => rendered,
        Err(_) => return value.to_string(),
    };

    if rendered.contains('.') {
        rendered
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    } else {
        rendered
    }
}
