//! Behaviour while disconnected or on an unconfigured chain

use dex_client::{ActionState, AddLiquidityWorkflow, RemoveLiquidityWorkflow, SwapWorkflow};
use dex_config::NetworkStatus;
use dex_e2e_tests::{deployment, TestHarness, BASE_CHAIN};
use dex_types::{Asset, DexError, ReservePair, U256};

#[tokio::test]
async fn test_disconnected_wallet_reads_nothing() {
    let harness = TestHarness::new(
        BASE_CHAIN,
        ReservePair::new(U256::from(1000), U256::from(4000)),
    );
    assert_eq!(harness.session.status(), NetworkStatus::Disconnected);

    let add = AddLiquidityWorkflow::new(harness.session.clone());
    let remove = RemoveLiquidityWorkflow::new(harness.session.clone());
    let unsupported = Err(DexError::UnsupportedNetwork { chain_id: None });

    assert_eq!(add.refresh().await, unsupported);
    assert_eq!(remove.refresh().await, unsupported);
    assert_eq!(harness.chain.read_count(), 0);

    remove.set_lp_amount("1");
    assert!(remove.view().available_actions.is_empty());
    assert_eq!(
        remove.withdraw().await,
        Err(DexError::UnsupportedNetwork { chain_id: None })
    );
    assert_eq!(remove.action_state(), ActionState::Idle);
    assert!(harness.wallet.submitted().is_empty());
}

#[tokio::test]
async fn test_switching_chains_rekeys_state() {
    let harness = TestHarness::connected(BASE_CHAIN).await;
    harness.fund(Asset::Base, 1000);

    let swap = SwapWorkflow::new(harness.session.clone());
    swap.refresh().await.unwrap();
    assert!(harness.status(&harness.balance_key(Asset::Base)).known);

    // Optimism has no deployment here
    harness.wallet.switch_chain(10);
    assert_eq!(harness.session.status(), NetworkStatus::Unsupported(10));
    assert!(harness.session.cache().is_empty());
    assert!(swap.view().balances.base.is_none());

    harness.chain.reset_reads();
    assert!(swap.refresh().await.is_err());
    assert_eq!(harness.chain.read_count(), 0);

    // Back on Base the entries are read again from scratch
    harness.wallet.switch_chain(BASE_CHAIN);
    swap.refresh().await.unwrap();
    assert_eq!(
        harness.session.status(),
        NetworkStatus::Supported {
            chain_id: BASE_CHAIN,
            addresses: deployment(),
        }
    );
    assert_eq!(harness.invalidations(&harness.balance_key(Asset::Base)), 0);
    assert_eq!(
        swap.view().balances.base.map(|b| b.value),
        Some(U256::from(1000))
    );
}

#[tokio::test]
async fn test_disconnect_clears_cache() {
    let harness = TestHarness::connected(BASE_CHAIN).await;
    let swap = SwapWorkflow::new(harness.session.clone());
    swap.refresh().await.unwrap();
    assert!(!harness.session.cache().is_empty());

    harness.session.disconnect().await;
    assert!(harness.session.cache().is_empty());
    assert_eq!(harness.session.status(), NetworkStatus::Disconnected);
}
