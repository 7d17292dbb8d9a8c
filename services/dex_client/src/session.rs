//! Wallet session: account context, network resolution and the shared cache

use crate::cache::{CacheKey, StateCache};
use crate::{log_network, log_success};
use dex_config::{NetworkResolver, NetworkStatus};
use dex_types::{
    AccountState, Address, Asset, ChainId, ChainReader, Confirmation, ContractCall, DexError,
    NetworkAddressSet, WalletConnector,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// A supported network with the connected owner
///
/// Only obtainable while the wallet is on a configured chain, so holding one
/// is the permission to read and act.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scope {
    pub chain_id: ChainId,
    pub addresses: NetworkAddressSet,
    pub owner: Option<Address>,
}

impl Scope {
    pub fn token(&self, asset: Asset) -> Address {
        self.addresses.asset_address(asset)
    }

    pub fn balance_key(&self, asset: Asset) -> Option<CacheKey> {
        CacheKey::balance(self.chain_id, Some(self.token(asset)), self.owner)
    }

    /// Allowance granted by the owner to the exchange; none for LP shares
    pub fn allowance_key(&self, asset: Asset) -> Option<CacheKey> {
        if !asset.requires_approval() {
            return None;
        }
        CacheKey::allowance(
            self.chain_id,
            Some(self.token(asset)),
            self.owner,
            Some(self.addresses.exchange),
        )
    }

    pub fn reserves_key(&self) -> CacheKey {
        CacheKey::Reserves {
            chain_id: self.chain_id,
            exchange: self.addresses.exchange,
        }
    }

    /// Balance keys for `assets` that are defined for this owner
    pub fn balance_keys(&self, assets: &[Asset]) -> Vec<CacheKey> {
        assets
            .iter()
            .filter_map(|asset| self.balance_key(*asset))
            .collect()
    }

    /// Owner required to submit a transaction
    pub fn require_owner(&self) -> Result<Address, DexError> {
        self.owner.ok_or(DexError::UnsupportedNetwork { chain_id: None })
    }
}

/// Shared client state behind every workflow
pub struct DexSession {
    wallet: Arc<dyn WalletConnector>,
    reader: Arc<dyn ChainReader>,
    resolver: Arc<NetworkResolver>,
    cache: StateCache,
    decimals: u8,
    /// Account the cache currently belongs to
    observed: Mutex<AccountState>,
}

impl DexSession {
    pub fn new(
        wallet: Arc<dyn WalletConnector>,
        reader: Arc<dyn ChainReader>,
        resolver: Arc<NetworkResolver>,
        decimals: u8,
    ) -> Self {
        let observed = wallet.account();
        Self {
            wallet,
            cache: StateCache::new(reader.clone()),
            reader,
            resolver,
            decimals,
            observed: Mutex::new(observed),
        }
    }

    pub async fn connect(&self) -> Result<NetworkStatus, DexError> {
        let account = self.wallet.connect().await?;
        self.sync_account(account);

        let status = self.resolver.resolve(account.chain_id);
        match &status {
            NetworkStatus::Supported { chain_id, .. } => {
                log_success!("Connected {:?} on supported chain {}", account.address, chain_id)
            }
            other => warn!("Connected, but network is not available: {:?}", other),
        }
        Ok(status)
    }

    pub async fn disconnect(&self) {
        self.wallet.disconnect().await;
        self.sync_account(self.wallet.account());
    }

    /// Current account; re-keys the cache if it changed
    pub fn account(&self) -> AccountState {
        let account = self.wallet.account();
        self.sync_account(account);
        account
    }

    fn sync_account(&self, account: AccountState) {
        let mut observed = self.observed.lock();
        if *observed != account {
            log_network!(
                "Account context changed: {:?} on chain {:?} -> {:?} on chain {:?}",
                observed.address,
                observed.chain_id,
                account.address,
                account.chain_id
            );
            *observed = account;
            self.cache.clear();
        }
    }

    /// Follow the wallet's account channel in the background
    pub fn spawn_account_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let session = Arc::clone(self);
        let mut receiver = self.wallet.subscribe();

        tokio::spawn(async move {
            while receiver.changed().await.is_ok() {
                let account = *receiver.borrow_and_update();
                session.sync_account(account);
            }
            debug!("Wallet account channel closed");
        })
    }

    pub fn status(&self) -> NetworkStatus {
        self.resolver.resolve(self.account().chain_id)
    }

    /// Read/act permission for the current network
    ///
    /// `UnsupportedNetwork` while disconnected or on an unconfigured chain.
    pub fn scope(&self) -> Result<Scope, DexError> {
        let account = self.account();
        match self.resolver.resolve(account.chain_id) {
            NetworkStatus::Supported {
                chain_id,
                addresses,
            } => Ok(Scope {
                chain_id,
                addresses,
                owner: account.address,
            }),
            NetworkStatus::Unsupported(chain_id) => Err(DexError::UnsupportedNetwork {
                chain_id: Some(chain_id),
            }),
            NetworkStatus::Disconnected => Err(DexError::UnsupportedNetwork { chain_id: None }),
        }
    }

    /// Submit through the wallet and wait until mined
    pub(crate) async fn execute(
        &self,
        contract: Address,
        call: ContractCall,
    ) -> Result<Confirmation, DexError> {
        let handle = self.wallet.submit_transaction(contract, call).await?;
        self.reader.wait_for_confirmation(&handle).await
    }

    pub fn cache(&self) -> &StateCache {
        &self.cache
    }

    pub fn reader(&self) -> &Arc<dyn ChainReader> {
        &self.reader
    }

    pub fn resolver(&self) -> &NetworkResolver {
        &self.resolver
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }
}

/// First error of a batch of independent reads
pub(crate) fn first_error<I>(results: I) -> Result<(), DexError>
where
    I: IntoIterator<Item = Result<(), DexError>>,
{
    results.into_iter().collect()
}
