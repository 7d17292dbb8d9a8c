//! Read-only chain access
//!
//! One pooled HTTP provider per configured chain. Reads are plain
//! `eth_call`s; confirmation monitoring polls for the receipt.

use crate::abi::{AmmExchange, Erc20Token};
use crate::errors::{classify_contract_error, classify_provider_error};
use crate::http_provider;
use anyhow::Result;
use async_trait::async_trait;
use dex_config::{ConfiguredNetwork, ConfirmationConfig};
use dex_types::{
    Address, ChainId, ChainReader, Confirmation, DexError, ReservePair, TransactionHandle, U256,
};
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::U64;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// ethers-backed [`ChainReader`]
pub struct EthersChainReader {
    providers: HashMap<ChainId, Arc<Provider<Http>>>,
    poll_interval: Duration,
    confirmation_timeout: Duration,
}

impl EthersChainReader {
    /// Create providers for every configured network
    pub fn new<'a>(
        networks: impl IntoIterator<Item = &'a ConfiguredNetwork>,
        confirmation: &ConfirmationConfig,
    ) -> Result<Self> {
        let mut providers = HashMap::new();

        for network in networks {
            let provider = http_provider(&network.rpc_url, Duration::from_secs(30))?;
            debug!(
                "RPC provider for {} (chain {}): {}",
                network.name, network.chain_id, network.rpc_url
            );
            providers.insert(network.chain_id, Arc::new(provider));
        }

        info!("✅ Chain reader ready for {} networks", providers.len());

        Ok(Self {
            providers,
            poll_interval: Duration::from_millis(confirmation.poll_interval_ms),
            confirmation_timeout: Duration::from_secs(confirmation.timeout_secs),
        })
    }

    fn provider(&self, chain_id: ChainId) -> Result<Arc<Provider<Http>>, DexError> {
        self.providers
            .get(&chain_id)
            .cloned()
            .ok_or(DexError::UnsupportedNetwork {
                chain_id: Some(chain_id),
            })
    }

    fn token(&self, chain_id: ChainId, token: Address) -> Result<Erc20Token<Provider<Http>>, DexError> {
        Ok(Erc20Token::new(token, self.provider(chain_id)?))
    }
}

#[async_trait]
impl ChainReader for EthersChainReader {
    async fn balance_of(
        &self,
        chain_id: ChainId,
        asset: Address,
        owner: Address,
    ) -> Result<U256, DexError> {
        self.token(chain_id, asset)?
            .balance_of(owner)
            .call()
            .await
            .map_err(classify_contract_error)
    }

    async fn allowance(
        &self,
        chain_id: ChainId,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, DexError> {
        self.token(chain_id, token)?
            .allowance(owner, spender)
            .call()
            .await
            .map_err(classify_contract_error)
    }

    async fn reserves(
        &self,
        chain_id: ChainId,
        exchange: Address,
    ) -> Result<ReservePair, DexError> {
        let (reserve_base, reserve_quote) = AmmExchange::new(exchange, self.provider(chain_id)?)
            .get_reserves()
            .call()
            .await
            .map_err(classify_contract_error)?;

        Ok(ReservePair::new(reserve_base, reserve_quote))
    }

    async fn total_supply(&self, chain_id: ChainId, token: Address) -> Result<U256, DexError> {
        self.token(chain_id, token)?
            .total_supply()
            .call()
            .await
            .map_err(classify_contract_error)
    }

    async fn symbol(&self, chain_id: ChainId, token: Address) -> Result<String, DexError> {
        self.token(chain_id, token)?
            .symbol()
            .call()
            .await
            .map_err(classify_contract_error)
    }

    async fn wait_for_confirmation(
        &self,
        handle: &TransactionHandle,
    ) -> Result<Confirmation, DexError> {
        let provider = self.provider(handle.chain_id)?;
        debug!("⏳ Monitoring confirmation for tx: 0x{:x}", handle.hash);

        let start_time = Instant::now();
        loop {
            if start_time.elapsed() > self.confirmation_timeout {
                return Err(DexError::network(format!(
                    "Transaction 0x{:x} not confirmed after {}s",
                    handle.hash,
                    self.confirmation_timeout.as_secs()
                )));
            }

            match provider.get_transaction_receipt(handle.hash).await {
                Ok(Some(receipt)) => {
                    let block_number = receipt.block_number.map(|block| block.as_u64());

                    if receipt.status == Some(U64::zero()) {
                        warn!(
                            "❌ Transaction 0x{:x} reverted in block {:?}",
                            handle.hash, block_number
                        );
                        return Err(DexError::reverted(format!(
                            "transaction 0x{:x} reverted",
                            handle.hash
                        )));
                    }

                    info!(
                        "✅ Transaction confirmed in block {}: 0x{:x}",
                        block_number.unwrap_or_default(),
                        handle.hash
                    );
                    return Ok(Confirmation {
                        hash: handle.hash,
                        block_number,
                    });
                }
                Ok(None) => {
                    tokio::time::sleep(self.poll_interval).await;
                }
                Err(e) => {
                    // Transient; keep polling until the deadline
                    warn!(
                        "Error checking transaction receipt: {}",
                        classify_provider_error(&e)
                    );
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }
}
