//! Collaborator interfaces
//!
//! The client never talks to a chain directly. Reads go through a
//! [`ChainReader`]; state-changing transactions go through a
//! [`WalletConnector`], which owns the connected account and the signing
//! prompt. Production implementations live in the EVM adapter; tests use
//! in-memory ones.

use crate::account::{AccountState, ChainId};
use crate::errors::DexError;
use crate::pool::ReservePair;
use async_trait::async_trait;
use ethers_core::types::{Address, H256, U256};
use std::fmt;
use tokio::sync::watch;

/// A state-changing call on one of the deployment's contracts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractCall {
    /// ERC-20 `approve(spender, amount)` on a token contract
    Approve { spender: Address, amount: U256 },
    /// Exchange `swap(tokenIn, amountIn)`
    Swap { token_in: Address, amount_in: U256 },
    /// Exchange `addLiquidity(amountA, amountB)`
    AddLiquidity {
        amount_base: U256,
        amount_quote: U256,
    },
    /// Exchange `removeLiquidity(liquidity)`
    RemoveLiquidity { liquidity: U256 },
}

impl ContractCall {
    /// Solidity function name
    pub fn function_name(&self) -> &'static str {
        match self {
            ContractCall::Approve { .. } => "approve",
            ContractCall::Swap { .. } => "swap",
            ContractCall::AddLiquidity { .. } => "addLiquidity",
            ContractCall::RemoveLiquidity { .. } => "removeLiquidity",
        }
    }
}

impl fmt::Display for ContractCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractCall::Approve { spender, amount } => {
                write!(f, "approve({:?}, {})", spender, amount)
            }
            ContractCall::Swap {
                token_in,
                amount_in,
            } => write!(f, "swap({:?}, {})", token_in, amount_in),
            ContractCall::AddLiquidity {
                amount_base,
                amount_quote,
            } => write!(f, "addLiquidity({}, {})", amount_base, amount_quote),
            ContractCall::RemoveLiquidity { liquidity } => {
                write!(f, "removeLiquidity({})", liquidity)
            }
        }
    }
}

/// A submitted, not yet confirmed, transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionHandle {
    pub chain_id: ChainId,
    pub hash: H256,
}

/// A transaction mined with success status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    pub hash: H256,
    pub block_number: Option<u64>,
}

/// Wallet/connector: connected account plus transaction submission
#[async_trait]
pub trait WalletConnector: Send + Sync {
    /// Request account access; resolves with the resulting account state
    async fn connect(&self) -> Result<AccountState, DexError>;

    async fn disconnect(&self);

    /// Reactive account context; receivers observe every change
    fn subscribe(&self) -> watch::Receiver<AccountState>;

    /// Current account context
    fn account(&self) -> AccountState {
        let receiver = self.subscribe();
        let state = *receiver.borrow();
        state
    }

    /// Prompt the user to sign and broadcast `call` against `contract`
    ///
    /// Fails with `UserRejected`, `ContractReverted` or `NetworkError`.
    async fn submit_transaction(
        &self,
        contract: Address,
        call: ContractCall,
    ) -> Result<TransactionHandle, DexError>;
}

/// Chain-read collaborator (balances, allowances, pool state, receipts)
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// ERC-20 `balanceOf(owner)` on `asset`
    async fn balance_of(
        &self,
        chain_id: ChainId,
        asset: Address,
        owner: Address,
    ) -> Result<U256, DexError>;

    /// ERC-20 `allowance(owner, spender)` on `token`
    async fn allowance(
        &self,
        chain_id: ChainId,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, DexError>;

    /// Exchange `getReserves()`
    async fn reserves(&self, chain_id: ChainId, exchange: Address)
        -> Result<ReservePair, DexError>;

    /// ERC-20 `totalSupply()`
    async fn total_supply(&self, chain_id: ChainId, token: Address) -> Result<U256, DexError>;

    /// ERC-20 `symbol()`
    async fn symbol(&self, chain_id: ChainId, token: Address) -> Result<String, DexError>;

    /// Wait until the transaction is mined
    ///
    /// A receipt with failure status is `ContractReverted`; giving up on a
    /// pending transaction is `NetworkError`.
    async fn wait_for_confirmation(
        &self,
        handle: &TransactionHandle,
    ) -> Result<Confirmation, DexError>;
}
