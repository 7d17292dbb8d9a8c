//! External JSON-RPC wallet
//!
//! The wallet (Frame, a browser-extension bridge, or a dev node with
//! unlocked accounts) owns the keys. This side only asks for account access,
//! watches the selected account/chain, and hands over unsigned transactions
//! via `eth_sendTransaction`, which triggers the user's signing prompt.

use crate::abi::{erc20, exchange};
use crate::errors::classify_provider_error;
use crate::http_provider;
use anyhow::Result;
use async_trait::async_trait;
use dex_types::{
    AccountState, Address, ChainId, ContractCall, DexError, TransactionHandle, WalletConnector, U256,
};
use ethers::abi::AbiEncode;
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::{Bytes, TransactionRequest};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// `eth_chainId` result as a chain id; out-of-range values are a bad response
fn chain_id_from(value: U256) -> Result<ChainId, DexError> {
    if value > U256::from(u64::MAX) {
        return Err(DexError::network(format!(
            "wallet reported chain id 0x{:x}, out of range",
            value
        )));
    }
    Ok(value.low_u64())
}

/// ABI-encode a contract call, selector included
pub fn encode_call(call: &ContractCall) -> Bytes {
    let data = match *call {
        ContractCall::Approve { spender, amount } => {
            erc20::ApproveCall { spender, amount }.encode()
        }
        ContractCall::Swap {
            token_in,
            amount_in,
        } => exchange::SwapCall {
            token_in,
            amount_in,
        }
        .encode(),
        ContractCall::AddLiquidity {
            amount_base,
            amount_quote,
        } => exchange::AddLiquidityCall {
            amount_a: amount_base,
            amount_b: amount_quote,
        }
        .encode(),
        ContractCall::RemoveLiquidity { liquidity } => {
            exchange::RemoveLiquidityCall { liquidity }.encode()
        }
    };
    Bytes::from(data)
}

/// [`WalletConnector`] over a wallet's JSON-RPC endpoint
pub struct RpcWallet {
    provider: Provider<Http>,
    state: watch::Sender<AccountState>,
    connected: AtomicBool,
}

impl RpcWallet {
    pub fn new(rpc_url: &str) -> Result<Self> {
        // Signing prompts can stay open for a long time
        let provider = http_provider(rpc_url, Duration::from_secs(600))?;
        let (state, _) = watch::channel(AccountState::disconnected());

        Ok(Self {
            provider,
            state,
            connected: AtomicBool::new(false),
        })
    }

    /// Query the wallet's selected account and chain without prompting
    async fn read_account(&self) -> Result<AccountState, DexError> {
        let accounts: Vec<Address> = self
            .provider
            .request("eth_accounts", ())
            .await
            .map_err(|e| classify_provider_error(&e))?;

        let Some(address) = accounts.first().copied() else {
            return Ok(AccountState::disconnected());
        };

        let chain_id = self
            .provider
            .get_chainid()
            .await
            .map_err(|e| classify_provider_error(&e))?;

        Ok(AccountState::connected(address, chain_id_from(chain_id)?))
    }

    /// Publish a new account state; returns whether it changed
    fn publish(&self, next: AccountState) -> bool {
        self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        })
    }

    /// Poll the wallet for account or chain switches
    ///
    /// Polling stops publishing while disconnected.
    pub fn spawn_account_watch(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let wallet = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                if !wallet.connected.load(Ordering::Acquire) {
                    continue;
                }

                match wallet.read_account().await {
                    Ok(state) => {
                        if wallet.publish(state) {
                            info!(
                                "🔄 Wallet account changed: {:?} on chain {:?}",
                                state.address, state.chain_id
                            );
                        }
                    }
                    Err(e) => debug!("Wallet poll failed: {}", e),
                }
            }
        })
    }
}

#[async_trait]
impl WalletConnector for RpcWallet {
    async fn connect(&self) -> Result<AccountState, DexError> {
        let accounts: Vec<Address> = self
            .provider
            .request("eth_requestAccounts", ())
            .await
            .map_err(|e| classify_provider_error(&e))?;

        if accounts.is_empty() {
            warn!("Wallet returned no accounts");
            return Err(DexError::UserRejected);
        }

        self.connected.store(true, Ordering::Release);
        let state = self.read_account().await?;
        self.publish(state);

        info!(
            "✅ Wallet connected: {:?} on chain {:?}",
            state.address, state.chain_id
        );
        Ok(state)
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::Release);
        self.publish(AccountState::disconnected());
        info!("Wallet disconnected");
    }

    fn subscribe(&self) -> watch::Receiver<AccountState> {
        self.state.subscribe()
    }

    async fn submit_transaction(
        &self,
        contract: Address,
        call: ContractCall,
    ) -> Result<TransactionHandle, DexError> {
        let account = self.account();
        let (Some(from), Some(chain_id)) = (account.address, account.chain_id) else {
            return Err(DexError::UnsupportedNetwork {
                chain_id: account.chain_id,
            });
        };

        debug!("Submitting {} to {:?} from {:?}", call, contract, from);

        let tx = TransactionRequest::new()
            .from(from)
            .to(contract)
            .data(encode_call(&call));

        let pending = self
            .provider
            .send_transaction(tx, None)
            .await
            .map_err(|e| classify_provider_error(&e))?;

        let hash = pending.tx_hash();
        info!("🚀 {} submitted: 0x{:x}", call.function_name(), hash);

        Ok(TransactionHandle { chain_id, hash })
    }
}
