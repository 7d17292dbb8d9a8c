//! Exchange statistics across configured chains
//!
//! Per chain: reserves, LP supply and both token symbols, read
//! concurrently, plus the quote-per-base price derived from the reserves.
//! A chain whose reads fail reports the error in its own entry.

use crate::logging::LogEmoji;
use dex_amm::spot_price;
use dex_config::{chains, ConfiguredNetwork, NetworkResolver};
use dex_types::{format_amount, Address, ChainId, ChainReader};
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

const MISSING_CONFIGURATION: &str = "Configuration for this chain is missing or incomplete.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenStats {
    pub address: String,
    pub symbol: String,
    /// Reserve in display units
    pub reserve: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeStats {
    pub chain: String,
    pub chain_id: Option<ChainId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_a: Option<TokenStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_b: Option<TokenStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_quote_per_base: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_lp_supply: Option<String>,
    pub error: Option<String>,
}

impl ExchangeStats {
    fn unavailable(chain: &str, chain_id: Option<ChainId>, error: impl Into<String>) -> Self {
        Self {
            chain: chain.to_string(),
            chain_id,
            exchange_address: None,
            token_a: None,
            token_b: None,
            price_quote_per_base: None,
            total_lp_supply: None,
            error: Some(error.into()),
        }
    }
}

fn hex_address(address: Address) -> String {
    format!("{:?}", address)
}

/// Statistics for one configured network
pub async fn exchange_stats(
    reader: &dyn ChainReader,
    network: &ConfiguredNetwork,
    decimals: u8,
) -> ExchangeStats {
    let chain_id = network.chain_id;
    let addresses = network.addresses;

    let reads = futures::try_join!(
        reader.reserves(chain_id, addresses.exchange),
        reader.total_supply(chain_id, addresses.exchange),
        reader.symbol(chain_id, addresses.base_token),
        reader.symbol(chain_id, addresses.quote_token),
    );

    let (reserves, total_supply, base_symbol, quote_symbol) = match reads {
        Ok(values) => values,
        Err(e) => {
            warn!("{} Stats for {} failed: {}", LogEmoji::WARNING, network.name, e);
            return ExchangeStats {
                exchange_address: Some(hex_address(addresses.exchange)),
                ..ExchangeStats::unavailable(
                    &network.name,
                    Some(chain_id),
                    format!("Failed to fetch data: {}", e),
                )
            };
        }
    };

    debug!(
        "{} {} reserves {} / {}",
        LogEmoji::POOL,
        network.name,
        reserves.reserve_base,
        reserves.reserve_quote
    );

    ExchangeStats {
        chain: network.name.clone(),
        chain_id: Some(chain_id),
        exchange_address: Some(hex_address(addresses.exchange)),
        token_a: Some(TokenStats {
            address: hex_address(addresses.base_token),
            symbol: base_symbol,
            reserve: format_amount(reserves.reserve_base, decimals),
        }),
        token_b: Some(TokenStats {
            address: hex_address(addresses.quote_token),
            symbol: quote_symbol,
            reserve: format_amount(reserves.reserve_quote, decimals),
        }),
        price_quote_per_base: Some(spot_price(&reserves)),
        total_lp_supply: Some(format_amount(total_supply, decimals)),
        error: None,
    }
}

/// Statistics for one chain by name, or for every known and configured chain
///
/// Known chains without a complete configuration report an error entry.
pub async fn collect_stats(
    reader: &dyn ChainReader,
    resolver: &NetworkResolver,
    only: Option<&str>,
    decimals: u8,
) -> Vec<ExchangeStats> {
    let mut names: Vec<String> = match only {
        Some(name) => vec![name.to_lowercase()],
        None => chains::KNOWN_CHAINS
            .iter()
            .map(|chain| chain.name.to_string())
            .chain(resolver.networks().map(|network| network.name.clone()))
            .collect(),
    };
    let mut seen = HashSet::new();
    names.retain(|name| seen.insert(name.clone()));

    let futures = names.iter().map(|name| async move {
        match resolver.network_by_name(name) {
            Some(network) => exchange_stats(reader, network, decimals).await,
            None => {
                let chain_id = chains::by_name(name).map(|chain| chain.chain_id);
                ExchangeStats::unavailable(name, chain_id, MISSING_CONFIGURATION)
            }
        }
    });

    join_all(futures).await
}
