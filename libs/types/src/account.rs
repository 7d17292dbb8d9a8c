//! Connected account context supplied by the wallet

use ethers_core::types::Address;
use serde::{Deserialize, Serialize};

/// EVM chain identifier (EIP-155)
pub type ChainId = u64;

/// Wallet-reported account and network
///
/// Both fields are absent while no wallet is connected. The value changes
/// whenever the user reconnects or switches networks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountState {
    pub address: Option<Address>,
    pub chain_id: Option<ChainId>,
}

impl AccountState {
    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn connected(address: Address, chain_id: ChainId) -> Self {
        Self {
            address: Some(address),
            chain_id: Some(chain_id),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.address.is_some() && self.chain_id.is_some()
    }

    /// Same account on a different network
    pub fn with_chain(self, chain_id: ChainId) -> Self {
        Self {
            chain_id: Some(chain_id),
            ..self
        }
    }
}
