//! Test fixtures: deployment, funded user and connected session

use dex_client::mock::{MockChain, MockWallet};
use dex_client::{CacheKey, DexSession, EntryStatus};
use dex_config::{chains, ConfiguredNetwork, NetworkResolver};
use dex_types::{Address, Asset, ChainId, NetworkAddressSet, ReservePair, U256};
use std::sync::Arc;

/// Chain with the deployment
pub const BASE_CHAIN: ChainId = chains::BASE.chain_id;

/// Ethereum mainnet, never configured
pub const MAINNET: ChainId = 1;

/// Amounts in tests are whole smallest units
pub const TEST_DECIMALS: u8 = 0;

pub fn deployment() -> NetworkAddressSet {
    NetworkAddressSet::new(
        Address::repeat_byte(0xa1),
        Address::repeat_byte(0xb2),
        Address::repeat_byte(0xc3),
    )
}

pub fn user() -> Address {
    Address::repeat_byte(0x42)
}

pub fn resolver() -> NetworkResolver {
    NetworkResolver::new(vec![ConfiguredNetwork {
        name: chains::BASE.name.to_string(),
        chain_id: BASE_CHAIN,
        rpc_url: chains::default_rpc_url(chains::BASE.name),
        addresses: deployment(),
    }])
}

/// Route test logs through `RUST_LOG` when set
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Client wired to an in-memory chain
pub struct TestHarness {
    pub chain: Arc<MockChain>,
    pub wallet: Arc<MockWallet>,
    pub session: Arc<DexSession>,
}

impl TestHarness {
    /// Pool with `reserves` on Base; the wallet connects on `chain_id`
    pub fn new(chain_id: ChainId, reserves: ReservePair) -> Self {
        init_logging();

        let chain = Arc::new(MockChain::new());
        chain.deploy(BASE_CHAIN, deployment(), reserves);

        let wallet = Arc::new(MockWallet::new(chain.clone(), user(), chain_id));
        let session = Arc::new(DexSession::new(
            wallet.clone(),
            chain.clone(),
            Arc::new(resolver()),
            TEST_DECIMALS,
        ));

        Self {
            chain,
            wallet,
            session,
        }
    }

    /// Constant-product pool of 1000 BASE / 4000 QUOTE, wallet connected
    pub async fn connected(chain_id: ChainId) -> Self {
        let harness = Self::new(
            chain_id,
            ReservePair::new(U256::from(1000), U256::from(4000)),
        );
        harness.session.connect().await.expect("mock wallet connects");
        harness
    }

    pub fn token(&self, asset: Asset) -> Address {
        deployment().asset_address(asset)
    }

    pub fn fund(&self, asset: Asset, amount: u64) {
        self.chain
            .set_balance(BASE_CHAIN, self.token(asset), user(), U256::from(amount));
    }

    pub fn balance(&self, asset: Asset) -> U256 {
        self.chain.balance(BASE_CHAIN, self.token(asset), user())
    }

    pub fn balance_key(&self, asset: Asset) -> CacheKey {
        CacheKey::Balance {
            chain_id: BASE_CHAIN,
            asset: self.token(asset),
            owner: user(),
        }
    }

    pub fn allowance_key(&self, asset: Asset) -> CacheKey {
        CacheKey::Allowance {
            chain_id: BASE_CHAIN,
            token: self.token(asset),
            owner: user(),
            spender: deployment().exchange,
        }
    }

    pub fn status(&self, key: &CacheKey) -> EntryStatus {
        self.session.cache().entry_status(key)
    }

    pub fn invalidations(&self, key: &CacheKey) -> u64 {
        self.status(key).invalidations
    }
}
