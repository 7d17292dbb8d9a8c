//! Swap workflow scenarios: network gating, approve-then-swap, failures

use dex_client::mock::{MockOutcome, MockRead};
use dex_client::{ActionKind, ActionState, SwapWorkflow};
use dex_config::NetworkStatus;
use dex_e2e_tests::{deployment, user, TestHarness, BASE_CHAIN, MAINNET};
use dex_types::{Asset, ContractCall, DexError, SwapDirection, U256};

fn allowance_read(harness: &TestHarness, asset: Asset) -> MockRead {
    MockRead::Allowance {
        chain_id: BASE_CHAIN,
        token: harness.token(asset),
        owner: user(),
        spender: deployment().exchange,
    }
}

#[tokio::test]
async fn test_unsupported_network_to_confirmed_swap() {
    let harness = TestHarness::connected(MAINNET).await;
    let swap = SwapWorkflow::new(harness.session.clone());
    harness.fund(Asset::Base, 1000);
    swap.set_amount_in("50");

    // Chain 1 has no deployment: nothing is read, nothing is offered
    assert_eq!(harness.session.status(), NetworkStatus::Unsupported(MAINNET));
    assert_eq!(
        swap.refresh().await,
        Err(DexError::UnsupportedNetwork {
            chain_id: Some(MAINNET)
        })
    );
    assert_eq!(harness.chain.read_count(), 0);

    let view = swap.view();
    assert!(view.available_actions.is_empty());
    assert!(!view.needs_approval);

    // Unsupported is a steady state, not an action failure
    assert!(matches!(
        swap.approve().await,
        Err(DexError::UnsupportedNetwork { .. })
    ));
    assert_eq!(swap.action_state(), ActionState::Idle);
    assert!(harness.wallet.submitted().is_empty());

    // Switching to Base starts the reads
    harness.wallet.switch_chain(BASE_CHAIN);
    swap.refresh().await.unwrap();
    assert!(harness.chain.read_count() > 0);

    // Allowance 0 < 50: only Approve
    let view = swap.view();
    assert_eq!(view.available_actions, vec![ActionKind::Approve(Asset::Base)]);
    assert!(view.needs_approval);
    assert_eq!(view.derived.amount_in, Some(U256::from(50)));
    assert_eq!(view.balances.base.map(|b| b.value), Some(U256::from(1000)));

    // Approve exactly 50, then the allowance is re-read
    swap.approve().await.unwrap();
    assert_eq!(
        harness.wallet.submitted(),
        vec![(
            harness.token(Asset::Base),
            ContractCall::Approve {
                spender: deployment().exchange,
                amount: U256::from(50),
            }
        )]
    );
    assert_eq!(harness.chain.count(&allowance_read(&harness, Asset::Base)), 2);
    assert_eq!(harness.invalidations(&harness.allowance_key(Asset::Base)), 1);

    let view = swap.view();
    assert_eq!(view.allowances.base.map(|a| a.value), Some(U256::from(50)));
    assert_eq!(view.available_actions, vec![ActionKind::Swap]);
    assert!(!view.needs_approval);

    // Swap confirms: both balances invalidated, input cleared, idle
    swap.swap().await.unwrap();

    assert_eq!(harness.invalidations(&harness.balance_key(Asset::Base)), 1);
    assert_eq!(harness.invalidations(&harness.balance_key(Asset::Quote)), 1);
    assert_eq!(harness.invalidations(&harness.balance_key(Asset::LpShare)), 0);

    // The swap spent the allowance: stale until re-read
    let allowance = harness.status(&harness.allowance_key(Asset::Base));
    assert_eq!(allowance.invalidations, 2);
    assert!(allowance.stale);

    assert_eq!(swap.inputs().amount_in, "");
    assert_eq!(swap.action_state(), ActionState::Idle);

    // 50 * 4000 / (1000 + 50), floored
    let view = swap.view();
    assert_eq!(view.balances.base.map(|b| b.value), Some(U256::from(950)));
    assert_eq!(view.balances.quote.map(|b| b.value), Some(U256::from(190)));
    assert!(view.available_actions.is_empty());
}

#[tokio::test]
async fn test_spent_allowance_requires_new_approval() {
    let harness = TestHarness::connected(BASE_CHAIN).await;
    let swap = SwapWorkflow::new(harness.session.clone());
    harness.fund(Asset::Base, 1000);
    swap.set_amount_in("50");
    swap.refresh().await.unwrap();

    swap.approve().await.unwrap();
    swap.swap().await.unwrap();

    // Same amount again: the stale cached 50 must not clear the gate
    swap.set_amount_in("50");
    assert!(swap.view().available_actions.is_empty());

    swap.refresh().await.unwrap();
    let view = swap.view();
    assert_eq!(view.allowances.base.map(|a| a.value), Some(U256::zero()));
    assert_eq!(view.available_actions, vec![ActionKind::Approve(Asset::Base)]);
    assert!(view.needs_approval);

    // Swapping anyway is refused before anything reaches the wallet
    let submitted = harness.wallet.submitted().len();
    assert_eq!(
        swap.swap().await,
        Err(DexError::InsufficientAllowance {
            allowance: U256::zero(),
            required: U256::from(50),
        })
    );
    assert_eq!(harness.wallet.submitted().len(), submitted);
}

#[tokio::test]
async fn test_spent_allowance_rechecked_without_refresh() {
    let harness = TestHarness::connected(BASE_CHAIN).await;
    let swap = SwapWorkflow::new(harness.session.clone());
    harness.fund(Asset::Base, 1000);
    swap.set_amount_in("50");
    swap.refresh().await.unwrap();
    swap.approve().await.unwrap();
    swap.swap().await.unwrap();

    swap.set_amount_in("50");
    let err = swap.swap().await.unwrap_err();
    assert!(matches!(err, DexError::InsufficientAllowance { .. }));
    assert_eq!(harness.wallet.submitted().len(), 2);
}

#[tokio::test]
async fn test_rejected_approval_returns_to_idle() {
    let harness = TestHarness::connected(BASE_CHAIN).await;
    let swap = SwapWorkflow::new(harness.session.clone());
    harness.fund(Asset::Base, 1000);
    swap.set_amount_in("50");
    swap.refresh().await.unwrap();

    harness.wallet.push_outcome(MockOutcome::Reject);
    assert_eq!(swap.approve().await, Err(DexError::UserRejected));

    // Failure surfaced against the action, cache untouched
    assert_eq!(
        swap.action_state(),
        ActionState::Failed {
            kind: ActionKind::Approve(Asset::Base),
            error: DexError::UserRejected,
        }
    );
    assert_eq!(harness.invalidations(&harness.allowance_key(Asset::Base)), 0);

    let view = swap.view();
    assert!(view.needs_approval);
    assert_eq!(view.available_actions, vec![ActionKind::Approve(Asset::Base)]);

    // The next edit clears the failure
    swap.set_amount_in("40");
    assert_eq!(swap.action_state(), ActionState::Idle);
}

#[tokio::test]
async fn test_swap_without_allowance_is_refused() {
    let harness = TestHarness::connected(BASE_CHAIN).await;
    let swap = SwapWorkflow::new(harness.session.clone());
    harness.fund(Asset::Base, 1000);
    swap.set_amount_in("50");

    let err = swap.swap().await.unwrap_err();
    assert_eq!(
        err,
        DexError::InsufficientAllowance {
            allowance: U256::zero(),
            required: U256::from(50),
        }
    );
    assert!(harness.wallet.submitted().is_empty());
    assert!(matches!(swap.action_state(), ActionState::Failed { .. }));
}

#[tokio::test]
async fn test_reverted_swap_changes_nothing() {
    let harness = TestHarness::connected(BASE_CHAIN).await;
    let swap = SwapWorkflow::new(harness.session.clone());
    harness.fund(Asset::Base, 1000);
    harness.chain.set_allowance(
        BASE_CHAIN,
        harness.token(Asset::Base),
        user(),
        deployment().exchange,
        U256::from(50),
    );
    swap.set_amount_in("50");
    swap.refresh().await.unwrap();
    assert_eq!(swap.view().available_actions, vec![ActionKind::Swap]);

    harness.wallet.push_outcome(MockOutcome::RevertOnChain);
    let err = swap.swap().await.unwrap_err();
    assert!(matches!(err, DexError::ContractReverted { .. }));

    // Input kept, nothing invalidated, Swap offered again
    assert_eq!(swap.inputs().amount_in, "50");
    assert_eq!(harness.invalidations(&harness.balance_key(Asset::Base)), 0);
    assert_eq!(harness.invalidations(&harness.balance_key(Asset::Quote)), 0);
    assert_eq!(swap.view().available_actions, vec![ActionKind::Swap]);
    assert_eq!(harness.balance(Asset::Base), U256::from(1000));
}

#[tokio::test]
async fn test_invalid_amount_offers_no_action() {
    let harness = TestHarness::connected(BASE_CHAIN).await;
    let swap = SwapWorkflow::new(harness.session.clone());
    swap.refresh().await.unwrap();

    for input in ["", "abc", "0", "-5"] {
        swap.set_amount_in(input);
        let view = swap.view();
        assert_eq!(view.derived.amount_in, None, "input {:?}", input);
        assert!(view.available_actions.is_empty(), "input {:?}", input);
    }

    let err = swap.approve().await.unwrap_err();
    assert!(matches!(err, DexError::InvalidInput(_)));
    assert!(harness.wallet.submitted().is_empty());
}

#[tokio::test]
async fn test_reverse_direction_approves_quote() {
    let harness = TestHarness::connected(BASE_CHAIN).await;
    let swap = SwapWorkflow::new(harness.session.clone());
    harness.fund(Asset::Quote, 400);

    swap.set_direction(SwapDirection::QuoteToBase);
    swap.set_amount_in("400");
    swap.refresh().await.unwrap();

    assert_eq!(
        swap.view().available_actions,
        vec![ActionKind::Approve(Asset::Quote)]
    );

    swap.approve().await.unwrap();
    swap.swap().await.unwrap();

    let submitted = harness.wallet.submitted();
    assert_eq!(submitted[0].0, harness.token(Asset::Quote));
    assert_eq!(
        submitted[1],
        (
            deployment().exchange,
            ContractCall::Swap {
                token_in: harness.token(Asset::Quote),
                amount_in: U256::from(400),
            }
        )
    );

    // 400 * 1000 / (4000 + 400)
    assert_eq!(harness.balance(Asset::Base), U256::from(90));
    assert_eq!(harness.balance(Asset::Quote), U256::zero());
}

#[tokio::test]
async fn test_account_change_clears_cache() {
    let harness = TestHarness::connected(BASE_CHAIN).await;
    let listener = harness.session.spawn_account_listener();
    let swap = SwapWorkflow::new(harness.session.clone());
    swap.set_amount_in("5");
    swap.refresh().await.unwrap();
    assert!(!harness.session.cache().is_empty());

    harness.wallet.switch_chain(MAINNET);

    // The listener re-keys in the background
    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        while !harness.session.cache().is_empty() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("cache cleared after chain switch");

    assert!(swap.view().available_actions.is_empty());
    listener.abort();
}
