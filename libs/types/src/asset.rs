//! Tracked assets and per-network contract addresses

use ethers_core::types::Address;
use serde::{Deserialize, Serialize};

/// One of the three assets a deployment exposes to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    /// Base token of the pair (reserve slot 0)
    Base,
    /// Quote token of the pair (reserve slot 1)
    Quote,
    /// LP share token, issued by the exchange contract itself
    LpShare,
}

impl Asset {
    pub const ALL: [Asset; 3] = [Asset::Base, Asset::Quote, Asset::LpShare];

    pub fn label(&self) -> &'static str {
        match self {
            Asset::Base => "BASE",
            Asset::Quote => "QUOTE",
            Asset::LpShare => "LP",
        }
    }

    /// Whether spending this asset through the exchange needs an allowance
    pub fn requires_approval(&self) -> bool {
        !matches!(self, Asset::LpShare)
    }
}

/// Contract addresses of one deployment (token pair + exchange)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkAddressSet {
    pub base_token: Address,
    pub quote_token: Address,
    pub exchange: Address,
}

impl NetworkAddressSet {
    pub fn new(base_token: Address, quote_token: Address, exchange: Address) -> Self {
        Self {
            base_token,
            quote_token,
            exchange,
        }
    }

    /// Token contract holding balances for `asset`
    pub fn asset_address(&self, asset: Asset) -> Address {
        match asset {
            Asset::Base => self.base_token,
            Asset::Quote => self.quote_token,
            Asset::LpShare => self.exchange,
        }
    }
}

/// Direction of a swap through the pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SwapDirection {
    #[default]
    BaseToQuote,
    QuoteToBase,
}

impl SwapDirection {
    pub fn input_asset(&self) -> Asset {
        match self {
            SwapDirection::BaseToQuote => Asset::Base,
            SwapDirection::QuoteToBase => Asset::Quote,
        }
    }

    pub fn output_asset(&self) -> Asset {
        match self {
            SwapDirection::BaseToQuote => Asset::Quote,
            SwapDirection::QuoteToBase => Asset::Base,
        }
    }

    pub fn reversed(&self) -> Self {
        match self {
            SwapDirection::BaseToQuote => SwapDirection::QuoteToBase,
            SwapDirection::QuoteToBase => SwapDirection::BaseToQuote,
        }
    }
}
