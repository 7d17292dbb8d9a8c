//! Add/remove liquidity scenarios: quote derivation, dual approval, burn

use dex_client::mock::MockOutcome;
use dex_client::{ActionKind, ActionState, AddLiquidityWorkflow, RemoveLiquidityWorkflow};
use dex_e2e_tests::{deployment, TestHarness, BASE_CHAIN};
use dex_types::{Asset, ContractCall, DexError, ReservePair, U256};
use proptest::prelude::*;

#[tokio::test]
async fn test_quote_follows_base_on_funded_pool() {
    let harness = TestHarness::connected(BASE_CHAIN).await;
    let add = AddLiquidityWorkflow::new(harness.session.clone());
    add.refresh().await.unwrap();

    add.set_base_amount("100");
    assert!(add.quote_derived());
    assert_eq!(add.inputs().quote_amount, "400");

    // Floored: 7 * 4000 / 1000 = 28
    add.set_base_amount("7");
    assert_eq!(add.inputs().quote_amount, "28");

    // An unparseable base leaves the last quote in place
    add.set_base_amount("");
    assert_eq!(add.inputs().quote_amount, "28");
    add.set_base_amount("abc");
    assert_eq!(add.inputs().quote_amount, "28");
    assert!(add.view().available_actions.is_empty());
}

#[tokio::test]
async fn test_user_quote_overrides_derived_value() {
    let harness = TestHarness::connected(BASE_CHAIN).await;
    harness.fund(Asset::Base, 500);
    harness.fund(Asset::Quote, 2000);
    let add = AddLiquidityWorkflow::new(harness.session.clone());
    add.refresh().await.unwrap();

    add.set_base_amount("100");
    assert_eq!(add.inputs().quote_amount, "400");

    add.set_quote_amount("390");
    assert!(!add.quote_derived());
    assert_eq!(add.inputs().quote_amount, "390");

    // A refresh keeps the typed value
    add.refresh().await.unwrap();
    assert_eq!(add.inputs().quote_amount, "390");
    assert_eq!(add.view().derived.quote_amount, Some(U256::from(390)));

    // The deposit uses the amounts as displayed
    add.approve_base().await.unwrap();
    add.approve_quote().await.unwrap();
    add.deposit().await.unwrap();
    assert_eq!(
        harness.wallet.submitted().last(),
        Some(&(
            deployment().exchange,
            ContractCall::AddLiquidity {
                amount_base: U256::from(100),
                amount_quote: U256::from(390),
            }
        ))
    );

    // The next base edit derives again
    add.refresh().await.unwrap();
    add.set_base_amount("10");
    assert!(add.quote_derived());
}

#[tokio::test]
async fn test_empty_pool_leaves_quote_editable() {
    let harness = TestHarness::new(BASE_CHAIN, ReservePair::default());
    harness.session.connect().await.unwrap();
    let add = AddLiquidityWorkflow::new(harness.session.clone());
    add.refresh().await.unwrap();

    add.set_base_amount("10");
    assert!(!add.quote_derived());
    add.set_quote_amount("25");
    assert_eq!(add.inputs().quote_amount, "25");

    add.set_base_amount("11");
    assert_eq!(add.inputs().quote_amount, "25");
}

#[tokio::test]
async fn test_two_approvals_then_deposit() {
    let harness = TestHarness::connected(BASE_CHAIN).await;
    harness.fund(Asset::Base, 500);
    harness.fund(Asset::Quote, 2000);
    harness
        .chain
        .set_total_supply(BASE_CHAIN, deployment().exchange, U256::from(1000));

    let add = AddLiquidityWorkflow::new(harness.session.clone());
    add.refresh().await.unwrap();
    add.set_base_amount("100");

    let view = add.view();
    assert!(view.needs_base_approval);
    assert!(view.needs_quote_approval);
    assert_eq!(
        view.available_actions,
        vec![
            ActionKind::Approve(Asset::Base),
            ActionKind::Approve(Asset::Quote)
        ]
    );

    // One gate cleared is not enough
    add.approve_base().await.unwrap();
    assert_eq!(
        add.view().available_actions,
        vec![ActionKind::Approve(Asset::Quote)]
    );

    add.approve_quote().await.unwrap();
    assert_eq!(add.view().available_actions, vec![ActionKind::Deposit]);

    add.deposit().await.unwrap();

    let submitted = harness.wallet.submitted();
    assert_eq!(
        submitted.last(),
        Some(&(
            deployment().exchange,
            ContractCall::AddLiquidity {
                amount_base: U256::from(100),
                amount_quote: U256::from(400),
            }
        ))
    );

    for asset in [Asset::Base, Asset::Quote, Asset::LpShare] {
        assert_eq!(harness.invalidations(&harness.balance_key(asset)), 1, "{:?}", asset);
    }
    // The deposit spent both allowances: marked stale after the approval re-read
    for asset in [Asset::Base, Asset::Quote] {
        let status = harness.status(&harness.allowance_key(asset));
        assert_eq!(status.invalidations, 2, "{:?}", asset);
        assert!(status.stale, "{:?}", asset);
    }

    let inputs = add.inputs();
    assert_eq!(inputs.base_amount, "");
    assert_eq!(inputs.quote_amount, "");
    assert_eq!(add.action_state(), ActionState::Idle);

    let view = add.view();
    assert_eq!(view.balances.base.map(|b| b.value), Some(U256::from(400)));
    assert_eq!(view.balances.quote.map(|b| b.value), Some(U256::from(1600)));
    assert_eq!(view.balances.lp.map(|b| b.value), Some(U256::from(100)));

    // Reserves marked stale until the next refresh
    let reserves = view.derived.reserves.unwrap();
    assert!(reserves.stale);

    // No derivation from the pre-deposit ratio
    add.set_base_amount("100");
    assert!(!add.quote_derived());
    assert_eq!(add.inputs().quote_amount, "");

    add.refresh().await.unwrap();
    let view = add.view();
    let reserves = view.derived.reserves.unwrap();
    assert!(!reserves.stale);
    assert_eq!(
        reserves.value,
        ReservePair::new(U256::from(1100), U256::from(4400))
    );

    // 100 * 4400 / 1100, and both spent allowances gate again
    assert!(add.quote_derived());
    assert_eq!(add.inputs().quote_amount, "400");
    assert_eq!(view.allowances.base.map(|a| a.value), Some(U256::zero()));
    assert_eq!(
        view.available_actions,
        vec![
            ActionKind::Approve(Asset::Base),
            ActionKind::Approve(Asset::Quote)
        ]
    );
}

#[tokio::test]
async fn test_second_deposit_on_spent_allowances_needs_approval() {
    let harness = TestHarness::connected(BASE_CHAIN).await;
    harness.fund(Asset::Base, 500);
    harness.fund(Asset::Quote, 2000);

    let add = AddLiquidityWorkflow::new(harness.session.clone());
    add.refresh().await.unwrap();
    add.set_base_amount("100");
    add.approve_base().await.unwrap();
    add.approve_quote().await.unwrap();
    add.deposit().await.unwrap();

    // Before any refresh the stale allowances offer nothing
    add.set_base_amount("100");
    add.set_quote_amount("400");
    assert!(!add.view().available_actions.contains(&ActionKind::Deposit));

    // Depositing anyway re-reads the allowance and refuses without submitting
    let submitted = harness.wallet.submitted().len();
    let err = add.deposit().await.unwrap_err();
    assert_eq!(
        err,
        DexError::InsufficientAllowance {
            allowance: U256::zero(),
            required: U256::from(100),
        }
    );
    assert_eq!(harness.wallet.submitted().len(), submitted);
}

#[tokio::test]
async fn test_deposit_refused_without_quote_allowance() {
    let harness = TestHarness::connected(BASE_CHAIN).await;
    harness.fund(Asset::Base, 500);
    let add = AddLiquidityWorkflow::new(harness.session.clone());
    add.refresh().await.unwrap();
    add.set_base_amount("100");
    add.approve_base().await.unwrap();

    let err = add.deposit().await.unwrap_err();
    assert_eq!(
        err,
        DexError::InsufficientAllowance {
            allowance: U256::zero(),
            required: U256::from(400),
        }
    );
    assert_eq!(harness.wallet.submitted().len(), 1);
    assert!(matches!(
        add.action_state(),
        ActionState::Failed {
            kind: ActionKind::Deposit,
            ..
        }
    ));
}

#[tokio::test]
async fn test_remove_liquidity_needs_no_approval() {
    let harness = TestHarness::connected(BASE_CHAIN).await;
    harness.fund(Asset::LpShare, 50);
    harness
        .chain
        .set_total_supply(BASE_CHAIN, deployment().exchange, U256::from(1000));

    let remove = RemoveLiquidityWorkflow::new(harness.session.clone());
    remove.refresh().await.unwrap();
    remove.set_lp_amount("10");
    assert_eq!(remove.view().available_actions, vec![ActionKind::Withdraw]);

    remove.withdraw().await.unwrap();

    assert_eq!(
        harness.wallet.submitted(),
        vec![(
            deployment().exchange,
            ContractCall::RemoveLiquidity {
                liquidity: U256::from(10)
            }
        )]
    );
    for asset in [Asset::Base, Asset::Quote, Asset::LpShare] {
        assert_eq!(harness.invalidations(&harness.balance_key(asset)), 1, "{:?}", asset);
    }
    assert_eq!(remove.view().inputs.lp_amount, "");

    // 10 of 1000 shares against 1000 / 4000
    assert_eq!(harness.balance(Asset::LpShare), U256::from(40));
    assert_eq!(harness.balance(Asset::Base), U256::from(10));
    assert_eq!(harness.balance(Asset::Quote), U256::from(40));
}

#[tokio::test]
async fn test_remove_more_than_held_reverts() {
    let harness = TestHarness::connected(BASE_CHAIN).await;
    harness.fund(Asset::LpShare, 5);
    harness
        .chain
        .set_total_supply(BASE_CHAIN, deployment().exchange, U256::from(1000));

    let remove = RemoveLiquidityWorkflow::new(harness.session.clone());
    remove.refresh().await.unwrap();

    // No client-side upper bound: the exchange rejects it
    remove.set_lp_amount("6");
    assert_eq!(remove.view().available_actions, vec![ActionKind::Withdraw]);

    let err = remove.withdraw().await.unwrap_err();
    assert!(matches!(err, DexError::ContractReverted { .. }));
    assert_eq!(harness.invalidations(&harness.balance_key(Asset::LpShare)), 0);
    assert_eq!(remove.view().inputs.lp_amount, "6");
}

#[tokio::test]
async fn test_user_rejected_deposit_keeps_inputs() {
    let harness = TestHarness::connected(BASE_CHAIN).await;
    harness.fund(Asset::Base, 500);
    harness.fund(Asset::Quote, 2000);

    let add = AddLiquidityWorkflow::new(harness.session.clone());
    add.refresh().await.unwrap();
    add.set_base_amount("100");
    add.approve_base().await.unwrap();
    add.approve_quote().await.unwrap();

    harness.wallet.push_outcome(MockOutcome::Reject);
    assert_eq!(add.deposit().await, Err(DexError::UserRejected));

    assert_eq!(add.inputs().base_amount, "100");
    assert_eq!(add.inputs().quote_amount, "400");
    assert_eq!(harness.invalidations(&harness.balance_key(Asset::Base)), 0);
    assert_eq!(add.view().available_actions, vec![ActionKind::Deposit]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_derived_quote_is_floored_ratio(
        reserve_base in 1u64..1_000_000,
        reserve_quote in 0u64..1_000_000,
        base in 1u64..1_000_000,
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let quote = runtime.block_on(async {
            let harness = TestHarness::new(
                BASE_CHAIN,
                ReservePair::new(U256::from(reserve_base), U256::from(reserve_quote)),
            );
            harness.session.connect().await.unwrap();
            let add = AddLiquidityWorkflow::new(harness.session.clone());
            add.refresh().await.unwrap();
            add.set_base_amount(base.to_string());
            add.inputs().quote_amount
        });

        let expected = u128::from(base) * u128::from(reserve_quote) / u128::from(reserve_base);
        prop_assert_eq!(quote, expected.to_string());
    }
}
