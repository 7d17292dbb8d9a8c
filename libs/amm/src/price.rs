//! Reserve-derived display price

use dex_types::{format_amount, ReservePair, U256};
use tracing::debug;

/// Fractional digits reported for prices
pub const PRICE_DISPLAY_DECIMALS: u8 = 6;

/// Quote units per base unit, rendered with six fractional digits
///
/// Both tokens are assumed to share the same decimals, so the raw reserve
/// ratio is already the unit price. An empty base reserve prices at zero.
pub fn spot_price(reserves: &ReservePair) -> String {
    let scale = U256::exp10(PRICE_DISPLAY_DECIMALS as usize);

    let scaled = if reserves.reserve_base.is_zero() {
        U256::zero()
    } else {
        match reserves.reserve_quote.checked_mul(scale) {
            Some(numerator) => numerator / reserves.reserve_base,
            None => {
                // Scale after dividing; loses sub-unit digits only for huge reserves
                debug!("Price numerator overflowed, dividing first");
                (reserves.reserve_quote / reserves.reserve_base).saturating_mul(scale)
            }
        }
    };

    fixed_decimals(scaled)
}

fn fixed_decimals(scaled: U256) -> String {
    let trimmed = format_amount(scaled, PRICE_DISPLAY_DECIMALS);
    let (integer, fraction) = trimmed.split_once('.').unwrap_or((trimmed.as_str(), ""));
    format!(
        "{}.{:0<width$}",
        integer,
        fraction,
        width = PRICE_DISPLAY_DECIMALS as usize
    )
}
