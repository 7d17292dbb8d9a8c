//! Swap workflow: approve-then-swap of one asset for the other

use crate::action::{ActionKind, ActionSlot, ActionState};
use crate::cache::CacheKey;
use crate::session::{first_error, DexSession, Scope};
use crate::view::{AllowancesView, ApprovalGate, BalancesView, SwapDerived, SwapInputs, SwapView};
use crate::{log_execution, log_success};
use dex_types::{format_amount, parse_amount, Asset, Confirmation, ContractCall, DexError, SwapDirection, U256};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::warn;

const SWAP_ASSETS: [Asset; 2] = [Asset::Base, Asset::Quote];

pub struct SwapWorkflow {
    session: Arc<DexSession>,
    inputs: Mutex<SwapInputs>,
    slot: ActionSlot,
}

impl SwapWorkflow {
    pub fn new(session: Arc<DexSession>) -> Self {
        Self {
            session,
            inputs: Mutex::new(SwapInputs {
                amount_in: String::new(),
                direction: SwapDirection::default(),
            }),
            slot: ActionSlot::new(),
        }
    }

    pub fn set_amount_in(&self, amount: impl Into<String>) {
        self.inputs.lock().amount_in = amount.into();
        self.slot.clear_failure();
    }

    pub fn set_direction(&self, direction: SwapDirection) {
        self.inputs.lock().direction = direction;
        self.slot.clear_failure();
    }

    pub fn inputs(&self) -> SwapInputs {
        self.inputs.lock().clone()
    }

    pub fn action_state(&self) -> ActionState {
        self.slot.state()
    }

    fn direction(&self) -> SwapDirection {
        self.inputs.lock().direction
    }

    fn amount_in(&self) -> Result<U256, DexError> {
        let text = self.inputs.lock().amount_in.clone();
        Ok(parse_amount(&text, self.session.decimals())?)
    }

    /// Load both balances and the input asset's allowance
    pub async fn refresh(&self) -> Result<(), DexError> {
        let scope = self.session.scope()?;
        let cache = self.session.cache();
        let input = self.direction().input_asset();

        let (base, quote, allowance) = tokio::join!(
            cache.get_balance(scope.chain_id, Some(scope.token(Asset::Base)), scope.owner),
            cache.get_balance(scope.chain_id, Some(scope.token(Asset::Quote)), scope.owner),
            cache.get_allowance(
                scope.chain_id,
                Some(scope.token(input)),
                scope.owner,
                Some(scope.addresses.exchange)
            ),
        );

        first_error([base.map(|_| ()), quote.map(|_| ()), allowance.map(|_| ())])
    }

    pub fn view(&self) -> SwapView {
        let inputs = self.inputs();
        let direction = inputs.direction;
        let amount_in = parse_amount(&inputs.amount_in, self.session.decimals()).ok();
        let current_action = self.slot.state();

        let derived = SwapDerived {
            input_asset: direction.input_asset(),
            output_asset: direction.output_asset(),
            amount_in,
        };

        let network = self.session.status();
        let Ok(scope) = self.session.scope() else {
            return SwapView {
                network,
                inputs,
                derived,
                current_action,
                available_actions: Vec::new(),
                balances: BalancesView::default(),
                allowances: AllowancesView::default(),
                needs_approval: false,
            };
        };

        let cache = self.session.cache();
        let balances = BalancesView::from_cache(cache, &scope, &SWAP_ASSETS);
        let allowances = AllowancesView::from_cache(cache, &scope, &SWAP_ASSETS);

        let gate = amount_in.map(|amount| {
            ApprovalGate::evaluate(allowances.get(direction.input_asset()).as_ref(), amount)
        });

        let mut available_actions = Vec::new();
        if !current_action.is_submitting() && scope.owner.is_some() {
            match gate {
                Some(ApprovalGate::NeedsApproval) => {
                    available_actions.push(ActionKind::Approve(direction.input_asset()))
                }
                Some(ApprovalGate::Cleared) => available_actions.push(ActionKind::Swap),
                Some(ApprovalGate::Unknown) | None => {}
            }
        }

        SwapView {
            network,
            inputs,
            derived,
            current_action,
            available_actions,
            balances,
            allowances,
            needs_approval: gate == Some(ApprovalGate::NeedsApproval),
        }
    }

    /// Approve the exchange for exactly the entered amount
    pub async fn approve(&self) -> Result<Confirmation, DexError> {
        let scope = self.session.scope()?;
        scope.require_owner()?;
        let asset = self.direction().input_asset();

        self.slot
            .run(ActionKind::Approve(asset), self.approve_inner(scope, asset))
            .await
    }

    async fn approve_inner(&self, scope: Scope, asset: Asset) -> Result<Confirmation, DexError> {
        let amount = self.amount_in()?;
        let exchange = scope.addresses.exchange;

        log_execution!(
            "Approving {} {} for exchange {:?}",
            format_amount(amount, self.session.decimals()),
            asset.label(),
            exchange
        );

        let confirmation = self
            .session
            .execute(
                scope.token(asset),
                ContractCall::Approve {
                    spender: exchange,
                    amount,
                },
            )
            .await?;

        if let Some(key) = scope.allowance_key(asset) {
            if let Err(e) = self.session.cache().invalidate(key).await {
                warn!("Allowance re-read after approval failed: {}", e);
            }
        }

        log_success!("{} approval confirmed: 0x{:x}", asset.label(), confirmation.hash);
        Ok(confirmation)
    }

    /// Swap the entered amount; requires a fresh allowance covering it
    pub async fn swap(&self) -> Result<Confirmation, DexError> {
        let scope = self.session.scope()?;
        scope.require_owner()?;

        self.slot.run(ActionKind::Swap, self.swap_inner(scope)).await
    }

    async fn swap_inner(&self, scope: Scope) -> Result<Confirmation, DexError> {
        let amount_in = self.amount_in()?;
        let direction = self.direction();
        let token_in = scope.token(direction.input_asset());

        let allowance = self
            .session
            .cache()
            .get_allowance(
                scope.chain_id,
                Some(token_in),
                scope.owner,
                Some(scope.addresses.exchange),
            )
            .await?
            .map(|snapshot| snapshot.value)
            .unwrap_or_default();

        if allowance < amount_in {
            return Err(DexError::InsufficientAllowance {
                allowance,
                required: amount_in,
            });
        }

        log_execution!(
            "Swapping {} {} for {}",
            format_amount(amount_in, self.session.decimals()),
            direction.input_asset().label(),
            direction.output_asset().label()
        );

        let confirmation = self
            .session
            .execute(
                scope.addresses.exchange,
                ContractCall::Swap {
                    token_in,
                    amount_in,
                },
            )
            .await?;

        self.after_confirmation(&scope, direction.input_asset()).await;
        self.inputs.lock().amount_in.clear();

        log_success!("Swap confirmed: 0x{:x}", confirmation.hash);
        Ok(confirmation)
    }

    async fn after_confirmation(&self, scope: &Scope, input: Asset) {
        let cache = self.session.cache();
        let keys: Vec<CacheKey> = scope.balance_keys(&SWAP_ASSETS);

        if let Err(e) = cache.invalidate_all(&keys).await {
            warn!("Balance re-read after swap failed: {}", e);
        }
        // The exchange spent the allowance; reserves moved. Both re-read on next refresh
        if let Some(key) = scope.allowance_key(input) {
            cache.mark_stale(&key);
        }
        cache.mark_stale(&scope.reserves_key());
    }
}
