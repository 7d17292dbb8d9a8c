//! Network table and resolver
//!
//! Maps the wallet's chain id to the deployment's contract addresses. The
//! table is data: it is built once from configuration and never mutated.
//! A chain id without an entry is the ordinary "unsupported network" state.

use dex_types::{ChainId, NetworkAddressSet};
use std::collections::BTreeMap;

/// Networks the deployment targets
pub mod chains {
    use dex_types::ChainId;

    /// A well-known EVM network
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct KnownChain {
        /// Config key and public RPC subdomain
        pub name: &'static str,
        pub chain_id: ChainId,
        pub display_name: &'static str,
    }

    pub const BASE: KnownChain = KnownChain {
        name: "base",
        chain_id: 8453,
        display_name: "Base",
    };

    pub const BSC: KnownChain = KnownChain {
        name: "bsc",
        chain_id: 56,
        display_name: "BNB Smart Chain",
    };

    pub const OPTIMISM: KnownChain = KnownChain {
        name: "optimism",
        chain_id: 10,
        display_name: "Optimism",
    };

    pub const CELO: KnownChain = KnownChain {
        name: "celo",
        chain_id: 42220,
        display_name: "Celo",
    };

    pub const ARBITRUM: KnownChain = KnownChain {
        name: "arbitrum",
        chain_id: 42161,
        display_name: "Arbitrum One",
    };

    pub const KNOWN_CHAINS: &[KnownChain] = &[BASE, BSC, OPTIMISM, CELO, ARBITRUM];

    pub fn by_name(name: &str) -> Option<&'static KnownChain> {
        KNOWN_CHAINS
            .iter()
            .find(|chain| chain.name.eq_ignore_ascii_case(name))
    }

    pub fn by_id(chain_id: ChainId) -> Option<&'static KnownChain> {
        KNOWN_CHAINS.iter().find(|chain| chain.chain_id == chain_id)
    }

    /// Public fallback RPC used when no endpoint is configured
    pub fn default_rpc_url(name: &str) -> String {
        format!("https://{}.drpc.org", name)
    }
}

/// A fully configured deployment on one chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfiguredNetwork {
    pub name: String,
    pub chain_id: ChainId,
    pub rpc_url: String,
    pub addresses: NetworkAddressSet,
}

/// Resolution of the wallet's current chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    /// No chain reported (wallet disconnected)
    Disconnected,
    /// Connected to a chain with no configured deployment
    Unsupported(ChainId),
    /// Connected to a configured deployment
    Supported {
        chain_id: ChainId,
        addresses: NetworkAddressSet,
    },
}

impl NetworkStatus {
    pub fn addresses(&self) -> Option<&NetworkAddressSet> {
        match self {
            NetworkStatus::Supported { addresses, .. } => Some(addresses),
            _ => None,
        }
    }

    pub fn chain_id(&self) -> Option<ChainId> {
        match self {
            NetworkStatus::Disconnected => None,
            NetworkStatus::Unsupported(chain_id) => Some(*chain_id),
            NetworkStatus::Supported { chain_id, .. } => Some(*chain_id),
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, NetworkStatus::Supported { .. })
    }
}

/// Static chain id → address set lookup
#[derive(Debug, Clone, Default)]
pub struct NetworkResolver {
    networks: BTreeMap<ChainId, ConfiguredNetwork>,
}

impl NetworkResolver {
    pub fn new(networks: impl IntoIterator<Item = ConfiguredNetwork>) -> Self {
        Self {
            networks: networks
                .into_iter()
                .map(|network| (network.chain_id, network))
                .collect(),
        }
    }

    /// Resolve a chain id; `None` means disconnected
    pub fn resolve(&self, chain_id: Option<ChainId>) -> NetworkStatus {
        match chain_id {
            None => NetworkStatus::Disconnected,
            Some(chain_id) => match self.networks.get(&chain_id) {
                Some(network) => NetworkStatus::Supported {
                    chain_id,
                    addresses: network.addresses,
                },
                None => NetworkStatus::Unsupported(chain_id),
            },
        }
    }

    pub fn network(&self, chain_id: ChainId) -> Option<&ConfiguredNetwork> {
        self.networks.get(&chain_id)
    }

    pub fn network_by_name(&self, name: &str) -> Option<&ConfiguredNetwork> {
        self.networks
            .values()
            .find(|network| network.name.eq_ignore_ascii_case(name))
    }

    /// Configured networks ordered by chain id
    pub fn networks(&self) -> impl Iterator<Item = &ConfiguredNetwork> {
        self.networks.values()
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}
