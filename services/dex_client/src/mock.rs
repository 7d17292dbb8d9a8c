//! In-memory chain and wallet for tests
//!
//! [`MockChain`] keeps balances, allowances and pool state per chain and
//! counts every read. [`MockWallet`] applies submitted calls to the chain
//! like a mined transaction would, unless an outcome was scripted.

use async_trait::async_trait;
use dex_types::{
    AccountState, Address, ChainId, ChainReader, Confirmation, ContractCall, DexError,
    NetworkAddressSet, ReservePair, TransactionHandle, WalletConnector, H256, U256,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// One read served by the mock chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockRead {
    Balance {
        chain_id: ChainId,
        asset: Address,
        owner: Address,
    },
    Allowance {
        chain_id: ChainId,
        token: Address,
        owner: Address,
        spender: Address,
    },
    Reserves {
        chain_id: ChainId,
        exchange: Address,
    },
    TotalSupply {
        chain_id: ChainId,
        token: Address,
    },
    Symbol {
        chain_id: ChainId,
        token: Address,
    },
}

impl MockRead {
    pub fn chain_id(&self) -> ChainId {
        match self {
            MockRead::Balance { chain_id, .. }
            | MockRead::Allowance { chain_id, .. }
            | MockRead::Reserves { chain_id, .. }
            | MockRead::TotalSupply { chain_id, .. }
            | MockRead::Symbol { chain_id, .. } => *chain_id,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Pool {
    reserves: ReservePair,
    addresses: NetworkAddressSet,
}

#[derive(Debug, Default)]
struct ChainState {
    balances: HashMap<(ChainId, Address, Address), U256>,
    allowances: HashMap<(ChainId, Address, Address, Address), U256>,
    pools: HashMap<(ChainId, Address), Pool>,
    supplies: HashMap<(ChainId, Address), U256>,
    symbols: HashMap<(ChainId, Address), String>,
    receipts: HashMap<H256, bool>,
    failing_chains: HashSet<ChainId>,
}

/// In-memory [`ChainReader`]
#[derive(Debug, Default)]
pub struct MockChain {
    state: Mutex<ChainState>,
    reads: Mutex<Vec<MockRead>>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an exchange and its tokens
    pub fn deploy(&self, chain_id: ChainId, addresses: NetworkAddressSet, reserves: ReservePair) {
        let mut state = self.state.lock();
        state.pools.insert(
            (chain_id, addresses.exchange),
            Pool {
                reserves,
                addresses,
            },
        );
        state.symbols.insert((chain_id, addresses.base_token), "AKT".to_string());
        state.symbols.insert((chain_id, addresses.quote_token), "WETH".to_string());
    }

    pub fn set_balance(&self, chain_id: ChainId, asset: Address, owner: Address, amount: U256) {
        self.state
            .lock()
            .balances
            .insert((chain_id, asset, owner), amount);
    }

    pub fn set_allowance(
        &self,
        chain_id: ChainId,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) {
        self.state
            .lock()
            .allowances
            .insert((chain_id, token, owner, spender), amount);
    }

    pub fn set_total_supply(&self, chain_id: ChainId, token: Address, amount: U256) {
        self.state.lock().supplies.insert((chain_id, token), amount);
    }

    /// Make every read on `chain_id` fail with a network error
    pub fn set_failing(&self, chain_id: ChainId, failing: bool) {
        let mut state = self.state.lock();
        if failing {
            state.failing_chains.insert(chain_id);
        } else {
            state.failing_chains.remove(&chain_id);
        }
    }

    pub fn balance(&self, chain_id: ChainId, asset: Address, owner: Address) -> U256 {
        self.state
            .lock()
            .balances
            .get(&(chain_id, asset, owner))
            .copied()
            .unwrap_or_default()
    }

    pub fn pool_reserves(&self, chain_id: ChainId, exchange: Address) -> Option<ReservePair> {
        self.state
            .lock()
            .pools
            .get(&(chain_id, exchange))
            .map(|pool| pool.reserves)
    }

    pub fn reads(&self) -> Vec<MockRead> {
        self.reads.lock().clone()
    }

    pub fn read_count(&self) -> usize {
        self.reads.lock().len()
    }

    /// Number of reads matching `read`
    pub fn count(&self, read: &MockRead) -> usize {
        self.reads.lock().iter().filter(|r| *r == read).count()
    }

    pub fn reset_reads(&self) {
        self.reads.lock().clear();
    }

    fn record(&self, read: MockRead) -> Result<(), DexError> {
        self.reads.lock().push(read);
        if self.state.lock().failing_chains.contains(&read.chain_id()) {
            return Err(DexError::network(format!(
                "chain {} unreachable",
                read.chain_id()
            )));
        }
        Ok(())
    }

    fn record_receipt(&self, hash: H256, success: bool) {
        self.state.lock().receipts.insert(hash, success);
    }

    /// Apply a mined call from `owner`
    fn apply(
        &self,
        chain_id: ChainId,
        owner: Address,
        contract: Address,
        call: ContractCall,
    ) -> Result<(), DexError> {
        let mut state = self.state.lock();

        match call {
            ContractCall::Approve { spender, amount } => {
                state
                    .allowances
                    .insert((chain_id, contract, owner, spender), amount);
                Ok(())
            }
            ContractCall::Swap {
                token_in,
                amount_in,
            } => {
                let mut pool = *state
                    .pools
                    .get(&(chain_id, contract))
                    .ok_or_else(|| DexError::reverted("not an exchange"))?;
                let base_in = token_in == pool.addresses.base_token;
                let token_out = if base_in {
                    pool.addresses.quote_token
                } else {
                    pool.addresses.base_token
                };
                let (reserve_in, reserve_out) = if base_in {
                    (pool.reserves.reserve_base, pool.reserves.reserve_quote)
                } else {
                    (pool.reserves.reserve_quote, pool.reserves.reserve_base)
                };

                spend(&mut state, chain_id, token_in, owner, contract, amount_in)?;

                // x * y = k, no fee
                let amount_out = amount_in * reserve_out / (reserve_in + amount_in);
                credit(&mut state, chain_id, token_out, owner, amount_out);

                let (new_in, new_out) = (reserve_in + amount_in, reserve_out - amount_out);
                pool.reserves = if base_in {
                    ReservePair::new(new_in, new_out)
                } else {
                    ReservePair::new(new_out, new_in)
                };
                state.pools.insert((chain_id, contract), pool);
                Ok(())
            }
            ContractCall::AddLiquidity {
                amount_base,
                amount_quote,
            } => {
                let mut pool = *state
                    .pools
                    .get(&(chain_id, contract))
                    .ok_or_else(|| DexError::reverted("not an exchange"))?;
                let (base, quote) = (pool.addresses.base_token, pool.addresses.quote_token);

                spend(&mut state, chain_id, base, owner, contract, amount_base)?;
                spend(&mut state, chain_id, quote, owner, contract, amount_quote)?;

                let supply = state
                    .supplies
                    .get(&(chain_id, contract))
                    .copied()
                    .unwrap_or_default();
                let minted = if supply.is_zero() || pool.reserves.reserve_base.is_zero() {
                    amount_base
                } else {
                    amount_base * supply / pool.reserves.reserve_base
                };
                credit(&mut state, chain_id, contract, owner, minted);
                state.supplies.insert((chain_id, contract), supply + minted);

                pool.reserves = ReservePair::new(
                    pool.reserves.reserve_base + amount_base,
                    pool.reserves.reserve_quote + amount_quote,
                );
                state.pools.insert((chain_id, contract), pool);
                Ok(())
            }
            ContractCall::RemoveLiquidity { liquidity } => {
                let mut pool = *state
                    .pools
                    .get(&(chain_id, contract))
                    .ok_or_else(|| DexError::reverted("not an exchange"))?;
                let held = state
                    .balances
                    .get(&(chain_id, contract, owner))
                    .copied()
                    .unwrap_or_default();
                let supply = state
                    .supplies
                    .get(&(chain_id, contract))
                    .copied()
                    .unwrap_or_default();
                if held < liquidity || supply.is_zero() {
                    return Err(DexError::reverted("insufficient LP balance"));
                }

                let base_out = liquidity * pool.reserves.reserve_base / supply;
                let quote_out = liquidity * pool.reserves.reserve_quote / supply;

                state
                    .balances
                    .insert((chain_id, contract, owner), held - liquidity);
                state.supplies.insert((chain_id, contract), supply - liquidity);
                credit(&mut state, chain_id, pool.addresses.base_token, owner, base_out);
                credit(&mut state, chain_id, pool.addresses.quote_token, owner, quote_out);

                pool.reserves = ReservePair::new(
                    pool.reserves.reserve_base - base_out,
                    pool.reserves.reserve_quote - quote_out,
                );
                state.pools.insert((chain_id, contract), pool);
                Ok(())
            }
        }
    }
}

/// `transferFrom(owner → exchange)` under the owner's allowance
fn spend(
    state: &mut ChainState,
    chain_id: ChainId,
    token: Address,
    owner: Address,
    spender: Address,
    amount: U256,
) -> Result<(), DexError> {
    let allowance_key = (chain_id, token, owner, spender);
    let allowance = state.allowances.get(&allowance_key).copied().unwrap_or_default();
    if allowance < amount {
        return Err(DexError::reverted("ERC20: insufficient allowance"));
    }

    let balance_key = (chain_id, token, owner);
    let balance = state.balances.get(&balance_key).copied().unwrap_or_default();
    if balance < amount {
        return Err(DexError::reverted("ERC20: transfer amount exceeds balance"));
    }

    state.allowances.insert(allowance_key, allowance - amount);
    state.balances.insert(balance_key, balance - amount);
    Ok(())
}

fn credit(state: &mut ChainState, chain_id: ChainId, token: Address, owner: Address, amount: U256) {
    let balance = state.balances.entry((chain_id, token, owner)).or_default();
    *balance = *balance + amount;
}

#[async_trait]
impl ChainReader for MockChain {
    async fn balance_of(
        &self,
        chain_id: ChainId,
        asset: Address,
        owner: Address,
    ) -> Result<U256, DexError> {
        self.record(MockRead::Balance {
            chain_id,
            asset,
            owner,
        })?;
        Ok(self.balance(chain_id, asset, owner))
    }

    async fn allowance(
        &self,
        chain_id: ChainId,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, DexError> {
        self.record(MockRead::Allowance {
            chain_id,
            token,
            owner,
            spender,
        })?;
        Ok(self
            .state
            .lock()
            .allowances
            .get(&(chain_id, token, owner, spender))
            .copied()
            .unwrap_or_default())
    }

    async fn reserves(&self, chain_id: ChainId, exchange: Address) -> Result<ReservePair, DexError> {
        self.record(MockRead::Reserves { chain_id, exchange })?;
        self.pool_reserves(chain_id, exchange)
            .ok_or_else(|| DexError::reverted("getReserves: not an exchange"))
    }

    async fn total_supply(&self, chain_id: ChainId, token: Address) -> Result<U256, DexError> {
        self.record(MockRead::TotalSupply { chain_id, token })?;
        Ok(self
            .state
            .lock()
            .supplies
            .get(&(chain_id, token))
            .copied()
            .unwrap_or_default())
    }

    async fn symbol(&self, chain_id: ChainId, token: Address) -> Result<String, DexError> {
        self.record(MockRead::Symbol { chain_id, token })?;
        self.state
            .lock()
            .symbols
            .get(&(chain_id, token))
            .cloned()
            .ok_or_else(|| DexError::reverted("symbol: not a token"))
    }

    async fn wait_for_confirmation(
        &self,
        handle: &TransactionHandle,
    ) -> Result<Confirmation, DexError> {
        match self.state.lock().receipts.get(&handle.hash) {
            Some(true) => Ok(Confirmation {
                hash: handle.hash,
                block_number: Some(1),
            }),
            Some(false) => Err(DexError::reverted(format!(
                "transaction 0x{:x} reverted",
                handle.hash
            ))),
            None => Err(DexError::network("transaction not found")),
        }
    }
}

/// Scripted result of the next submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOutcome {
    /// Mine and apply the call
    Apply,
    /// User declines the prompt
    Reject,
    /// Fails at submission (gas estimation revert)
    Revert(String),
    /// Mined with failure status; nothing applied
    RevertOnChain,
}

/// In-memory [`WalletConnector`] bound to a [`MockChain`]
pub struct MockWallet {
    chain: Arc<MockChain>,
    address: Address,
    chain_id: Mutex<ChainId>,
    state: watch::Sender<AccountState>,
    outcomes: Mutex<VecDeque<MockOutcome>>,
    submitted: Mutex<Vec<(Address, ContractCall)>>,
    nonce: AtomicU64,
}

impl MockWallet {
    /// Wallet for `address`, connecting on `chain_id`
    pub fn new(chain: Arc<MockChain>, address: Address, chain_id: ChainId) -> Self {
        let (state, _) = watch::channel(AccountState::disconnected());
        Self {
            chain,
            address,
            chain_id: Mutex::new(chain_id),
            state,
            outcomes: Mutex::new(VecDeque::new()),
            submitted: Mutex::new(Vec::new()),
            nonce: AtomicU64::new(1),
        }
    }

    /// User switches networks in the wallet
    pub fn switch_chain(&self, chain_id: ChainId) {
        *self.chain_id.lock() = chain_id;
        self.state.send_modify(|state| {
            if state.is_connected() {
                *state = state.with_chain(chain_id);
            }
        });
    }

    /// Script the outcome of the next submission
    pub fn push_outcome(&self, outcome: MockOutcome) {
        self.outcomes.lock().push_back(outcome);
    }

    pub fn submitted(&self) -> Vec<(Address, ContractCall)> {
        self.submitted.lock().clone()
    }

    pub fn address(&self) -> Address {
        self.address
    }

    fn next_hash(&self) -> H256 {
        H256::from_low_u64_be(self.nonce.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl WalletConnector for MockWallet {
    async fn connect(&self) -> Result<AccountState, DexError> {
        let state = AccountState::connected(self.address, *self.chain_id.lock());
        self.state.send_replace(state);
        Ok(state)
    }

    async fn disconnect(&self) {
        self.state.send_replace(AccountState::disconnected());
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
        let (Some(owner), Some(chain_id)) = (account.address, account.chain_id) else {
            return Err(DexError::UnsupportedNetwork {
                chain_id: account.chain_id,
            });
        };

        self.submitted.lock().push((contract, call));
        let outcome = self.outcomes.lock().pop_front().unwrap_or(MockOutcome::Apply);
        let hash = self.next_hash();

        match outcome {
            MockOutcome::Reject => return Err(DexError::UserRejected),
            MockOutcome::Revert(reason) => return Err(DexError::reverted(reason)),
            MockOutcome::RevertOnChain => self.chain.record_receipt(hash, false),
            MockOutcome::Apply => {
                self.chain.apply(chain_id, owner, contract, call)?;
                self.chain.record_receipt(hash, true);
            }
        }

        Ok(TransactionHandle { chain_id, hash })
    }
}
