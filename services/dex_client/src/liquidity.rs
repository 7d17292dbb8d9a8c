//! Liquidity workflows
//!
//! Adding liquidity derives the quote amount from the base amount and the
//! pool reserves (`quote = base * reserve_quote / reserve_base`, floored)
//! on every base edit while the pool has liquidity. The quote field stays
//! editable; whatever it shows is what gets deposited. An empty pool never
//! derives, since the first deposit sets the price. Each token has its
//! own approval gate; both must clear before the deposit is available.
//!
//! Removing liquidity burns LP shares and needs no approval.

use crate::action::{ActionKind, ActionSlot, ActionState};
use crate::session::{first_error, DexSession, Scope};
use crate::view::{
    AddLiquidityDerived, AddLiquidityInputs, AddLiquidityView, AllowancesView, ApprovalGate,
    BalancesView, RemoveLiquidityInputs, RemoveLiquidityView,
};
use crate::{log_execution, log_success};
use dex_amm::ProportionalDeposit;
use dex_types::{format_amount, parse_amount, Asset, Confirmation, ContractCall, DexError, U256};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};

const POOL_ASSETS: [Asset; 3] = [Asset::Base, Asset::Quote, Asset::LpShare];
const DEPOSIT_ASSETS: [Asset; 2] = [Asset::Base, Asset::Quote];

/// Invalidate every balance a liquidity change touched
///
/// `spent` lists the tokens the exchange pulled through `transferFrom`;
/// their allowances are marked stale with the reserves.
async fn refresh_pool_balances(session: &DexSession, scope: &Scope, spent: &[Asset]) {
    let cache = session.cache();
    if let Err(e) = cache.invalidate_all(&scope.balance_keys(&POOL_ASSETS)).await {
        warn!("Balance re-read after liquidity change failed: {}", e);
    }
    for key in spent.iter().filter_map(|asset| scope.allowance_key(*asset)) {
        cache.mark_stale(&key);
    }
    cache.mark_stale(&scope.reserves_key());
}

#[derive(Debug, Clone, Default)]
struct DepositInputs {
    base_amount: String,
    quote_amount: String,
    quote_derived: bool,
}

pub struct AddLiquidityWorkflow {
    session: Arc<DexSession>,
    inputs: Mutex<DepositInputs>,
    slot: ActionSlot,
}

impl AddLiquidityWorkflow {
    pub fn new(session: Arc<DexSession>) -> Self {
        Self {
            session,
            inputs: Mutex::new(DepositInputs::default()),
            slot: ActionSlot::new(),
        }
    }

    /// Edit the base amount, re-deriving the quote amount when possible
    pub fn set_base_amount(&self, amount: impl Into<String>) {
        self.inputs.lock().base_amount = amount.into();
        self.slot.clear_failure();
        self.derive_quote(true);
    }

    /// Edit the quote amount, overriding the derived value
    ///
    /// Kept across refreshes; the next base edit re-derives it.
    pub fn set_quote_amount(&self, amount: impl Into<String>) {
        {
            let mut inputs = self.inputs.lock();
            inputs.quote_amount = amount.into();
            inputs.quote_derived = false;
        }
        self.slot.clear_failure();
    }

    pub fn inputs(&self) -> AddLiquidityInputs {
        let inputs = self.inputs.lock();
        AddLiquidityInputs {
            base_amount: inputs.base_amount.clone(),
            quote_amount: inputs.quote_amount.clone(),
        }
    }

    /// Quote amount was last set from the base amount and reserves
    pub fn quote_derived(&self) -> bool {
        self.inputs.lock().quote_derived
    }

    pub fn action_state(&self) -> ActionState {
        self.slot.state()
    }

    /// Recompute the quote field from cached reserves
    ///
    /// Needs fresh reserves with a non-zero base side and a parseable base
    /// amount; otherwise the quote field keeps whatever it holds. Without
    /// `base_edited`, a quote the user typed is left alone.
    fn derive_quote(&self, base_edited: bool) {
        let reserves = self.session.scope().ok().and_then(|scope| {
            self.session
                .cache()
                .peek_reserves(scope.chain_id, Some(scope.addresses.exchange))
        });

        let decimals = self.session.decimals();
        let mut inputs = self.inputs.lock();

        if !base_edited && !inputs.quote_derived && !inputs.quote_amount.is_empty() {
            return;
        }

        let pair = match reserves {
            Some(snapshot) if !snapshot.stale && !snapshot.value.reserve_base.is_zero() => {
                snapshot.value
            }
            // First liquidity, or a ratio that moved since the last read
            _ => {
                inputs.quote_derived = false;
                return;
            }
        };

        let Ok(base) = parse_amount(&inputs.base_amount, decimals) else {
            return;
        };

        match pair.required_quote_for_base(base) {
            Ok(quote) => {
                inputs.quote_amount = format_amount(quote, decimals);
                inputs.quote_derived = true;
            }
            Err(e) => debug!("Quote derivation failed: {}", e),
        }
    }

    fn amounts(&self) -> (Result<U256, DexError>, Result<U256, DexError>) {
        let inputs = self.inputs.lock().clone();
        let decimals = self.session.decimals();
        (
            parse_amount(&inputs.base_amount, decimals).map_err(DexError::from),
            parse_amount(&inputs.quote_amount, decimals).map_err(DexError::from),
        )
    }

    fn amount(&self, asset: Asset) -> Result<U256, DexError> {
        let (base, quote) = self.amounts();
        match asset {
            Asset::Base => base,
            _ => quote,
        }
    }

    /// Load balances, both allowances and the reserves; re-derives the quote
    pub async fn refresh(&self) -> Result<(), DexError> {
        let scope = self.session.scope()?;
        let cache = self.session.cache();
        let exchange = Some(scope.addresses.exchange);

        let (base, quote, lp, base_allowance, quote_allowance, reserves) = tokio::join!(
            cache.get_balance(scope.chain_id, Some(scope.token(Asset::Base)), scope.owner),
            cache.get_balance(scope.chain_id, Some(scope.token(Asset::Quote)), scope.owner),
            cache.get_balance(scope.chain_id, Some(scope.token(Asset::LpShare)), scope.owner),
            cache.get_allowance(scope.chain_id, Some(scope.token(Asset::Base)), scope.owner, exchange),
            cache.get_allowance(scope.chain_id, Some(scope.token(Asset::Quote)), scope.owner, exchange),
            cache.get_reserves(scope.chain_id, exchange),
        );

        self.derive_quote(false);

        first_error([
            base.map(|_| ()),
            quote.map(|_| ()),
            lp.map(|_| ()),
            base_allowance.map(|_| ()),
            quote_allowance.map(|_| ()),
            reserves.map(|_| ()),
        ])
    }

    pub fn view(&self) -> AddLiquidityView {
        let inputs = self.inputs();
        let quote_derived = self.quote_derived();
        let (base_amount, quote_amount) = self.amounts();
        let (base_amount, quote_amount) = (base_amount.ok(), quote_amount.ok());
        let current_action = self.slot.state();
        let network = self.session.status();

        let Ok(scope) = self.session.scope() else {
            return AddLiquidityView {
                network,
                inputs,
                derived: AddLiquidityDerived {
                    base_amount,
                    quote_amount,
                    quote_derived,
                    reserves: None,
                },
                current_action,
                available_actions: Vec::new(),
                balances: BalancesView::default(),
                allowances: AllowancesView::default(),
                needs_base_approval: false,
                needs_quote_approval: false,
            };
        };

        let cache = self.session.cache();
        let balances = BalancesView::from_cache(cache, &scope, &POOL_ASSETS);
        let allowances = AllowancesView::from_cache(cache, &scope, &DEPOSIT_ASSETS);
        let reserves = cache.peek_reserves(scope.chain_id, Some(scope.addresses.exchange));

        let base_gate =
            base_amount.map(|amount| ApprovalGate::evaluate(allowances.base.as_ref(), amount));
        let quote_gate =
            quote_amount.map(|amount| ApprovalGate::evaluate(allowances.quote.as_ref(), amount));

        let mut available_actions = Vec::new();
        if !current_action.is_submitting() && scope.owner.is_some() {
            if base_gate == Some(ApprovalGate::NeedsApproval) {
                available_actions.push(ActionKind::Approve(Asset::Base));
            }
            if quote_gate == Some(ApprovalGate::NeedsApproval) {
                available_actions.push(ActionKind::Approve(Asset::Quote));
            }
            if base_gate == Some(ApprovalGate::Cleared) && quote_gate == Some(ApprovalGate::Cleared)
            {
                available_actions.push(ActionKind::Deposit);
            }
        }

        AddLiquidityView {
            network,
            inputs,
            derived: AddLiquidityDerived {
                base_amount,
                quote_amount,
                quote_derived,
                reserves,
            },
            current_action,
            available_actions,
            balances,
            allowances,
            needs_base_approval: base_gate == Some(ApprovalGate::NeedsApproval),
            needs_quote_approval: quote_gate == Some(ApprovalGate::NeedsApproval),
        }
    }

    pub async fn approve_base(&self) -> Result<Confirmation, DexError> {
        self.approve(Asset::Base).await
    }

    pub async fn approve_quote(&self) -> Result<Confirmation, DexError> {
        self.approve(Asset::Quote).await
    }

    async fn approve(&self, asset: Asset) -> Result<Confirmation, DexError> {
        let scope = self.session.scope()?;
        scope.require_owner()?;

        self.slot
            .run(ActionKind::Approve(asset), self.approve_inner(scope, asset))
            .await
    }

    async fn approve_inner(&self, scope: Scope, asset: Asset) -> Result<Confirmation, DexError> {
        let amount = self.amount(asset)?;
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

    /// Deposit both amounts as currently displayed
    pub async fn deposit(&self) -> Result<Confirmation, DexError> {
        let scope = self.session.scope()?;
        scope.require_owner()?;

        self.slot.run(ActionKind::Deposit, self.deposit_inner(scope)).await
    }

    async fn deposit_inner(&self, scope: Scope) -> Result<Confirmation, DexError> {
        let (amount_base, amount_quote) = self.amounts();
        let (amount_base, amount_quote) = (amount_base?, amount_quote?);

        for (asset, required) in [(Asset::Base, amount_base), (Asset::Quote, amount_quote)] {
            let allowance = self
                .session
                .cache()
                .get_allowance(
                    scope.chain_id,
                    Some(scope.token(asset)),
                    scope.owner,
                    Some(scope.addresses.exchange),
                )
                .await?
                .map(|snapshot| snapshot.value)
                .unwrap_or_default();

            if allowance < required {
                return Err(DexError::InsufficientAllowance { allowance, required });
            }
        }

        let decimals = self.session.decimals();
        log_execution!(
            "Adding liquidity: {} BASE + {} QUOTE",
            format_amount(amount_base, decimals),
            format_amount(amount_quote, decimals)
        );

        let confirmation = self
            .session
            .execute(
                scope.addresses.exchange,
                ContractCall::AddLiquidity {
                    amount_base,
                    amount_quote,
                },
            )
            .await?;

        refresh_pool_balances(&self.session, &scope, &DEPOSIT_ASSETS).await;
        {
            let mut inputs = self.inputs.lock();
            inputs.base_amount.clear();
            inputs.quote_amount.clear();
        }

        log_success!("Liquidity added: 0x{:x}", confirmation.hash);
        Ok(confirmation)
    }
}

pub struct RemoveLiquidityWorkflow {
    session: Arc<DexSession>,
    lp_amount: Mutex<String>,
    slot: ActionSlot,
}

impl RemoveLiquidityWorkflow {
    pub fn new(session: Arc<DexSession>) -> Self {
        Self {
            session,
            lp_amount: Mutex::new(String::new()),
            slot: ActionSlot::new(),
        }
    }

    pub fn set_lp_amount(&self, amount: impl Into<String>) {
        *self.lp_amount.lock() = amount.into();
        self.slot.clear_failure();
    }

    pub fn action_state(&self) -> ActionState {
        self.slot.state()
    }

    fn lp_amount(&self) -> Result<U256, DexError> {
        let text = self.lp_amount.lock().clone();
        Ok(parse_amount(&text, self.session.decimals())?)
    }

    pub async fn refresh(&self) -> Result<(), DexError> {
        let scope = self.session.scope()?;
        let cache = self.session.cache();

        let results = futures::future::join_all(POOL_ASSETS.iter().map(|asset| {
            cache.get_balance(scope.chain_id, Some(scope.token(*asset)), scope.owner)
        }))
        .await;

        first_error(results.into_iter().map(|result| result.map(|_| ())))
    }

    pub fn view(&self) -> RemoveLiquidityView {
        let inputs = RemoveLiquidityInputs {
            lp_amount: self.lp_amount.lock().clone(),
        };
        let lp_amount = self.lp_amount().ok();
        let current_action = self.slot.state();
        let network = self.session.status();

        let (balances, available_actions) = match self.session.scope() {
            Ok(scope) => {
                let balances =
                    BalancesView::from_cache(self.session.cache(), &scope, &POOL_ASSETS);
                let available = if lp_amount.is_some()
                    && scope.owner.is_some()
                    && !current_action.is_submitting()
                {
                    vec![ActionKind::Withdraw]
                } else {
                    Vec::new()
                };
                (balances, available)
            }
            Err(_) => (BalancesView::default(), Vec::new()),
        };

        RemoveLiquidityView {
            network,
            inputs,
            lp_amount,
            current_action,
            available_actions,
            balances,
        }
    }

    /// Burn the entered LP amount; no client-side upper bound
    pub async fn withdraw(&self) -> Result<Confirmation, DexError> {
        let scope = self.session.scope()?;
        scope.require_owner()?;

        self.slot.run(ActionKind::Withdraw, self.withdraw_inner(scope)).await
    }

    async fn withdraw_inner(&self, scope: Scope) -> Result<Confirmation, DexError> {
        let liquidity = self.lp_amount()?;

        log_execution!(
            "Removing {} LP",
            format_amount(liquidity, self.session.decimals())
        );

        let confirmation = self
            .session
            .execute(
                scope.addresses.exchange,
                ContractCall::RemoveLiquidity { liquidity },
            )
            .await?;

        refresh_pool_balances(&self.session, &scope, &[]).await;
        self.lp_amount.lock().clear();

        log_success!("Liquidity removed: 0x{:x}", confirmation.hash);
        Ok(confirmation)
    }
}
