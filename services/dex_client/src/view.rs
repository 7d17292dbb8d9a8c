//! View models handed to the presentation layer
//!
//! Views are synchronous: they are built from cached snapshots only and
//! never issue reads. Workflows populate the cache through `refresh()`.

use crate::action::{ActionKind, ActionState};
use crate::cache::{AllowanceSnapshot, BalanceSnapshot, ReserveSnapshot, StateCache};
use crate::session::Scope;
use dex_config::NetworkStatus;
use dex_types::{Asset, SwapDirection, U256};

/// Cached balances shown by a workflow
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BalancesView {
    pub base: Option<BalanceSnapshot>,
    pub quote: Option<BalanceSnapshot>,
    pub lp: Option<BalanceSnapshot>,
}

impl BalancesView {
    pub fn from_cache(cache: &StateCache, scope: &Scope, assets: &[Asset]) -> Self {
        let mut view = Self::default();
        for asset in assets {
            let snapshot =
                cache.peek_balance(scope.chain_id, Some(scope.token(*asset)), scope.owner);
            match asset {
                Asset::Base => view.base = snapshot,
                Asset::Quote => view.quote = snapshot,
                Asset::LpShare => view.lp = snapshot,
            }
        }
        view
    }

    pub fn get(&self, asset: Asset) -> Option<BalanceSnapshot> {
        match asset {
            Asset::Base => self.base,
            Asset::Quote => self.quote,
            Asset::LpShare => self.lp,
        }
    }
}

/// Cached allowances (owner → exchange)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllowancesView {
    pub base: Option<AllowanceSnapshot>,
    pub quote: Option<AllowanceSnapshot>,
}

impl AllowancesView {
    pub fn from_cache(cache: &StateCache, scope: &Scope, assets: &[Asset]) -> Self {
        let mut view = Self::default();
        for asset in assets {
            let snapshot = cache.peek_allowance(
                scope.chain_id,
                Some(scope.token(*asset)),
                scope.owner,
                Some(scope.addresses.exchange),
            );
            match asset {
                Asset::Base => view.base = snapshot,
                Asset::Quote => view.quote = snapshot,
                Asset::LpShare => {}
            }
        }
        view
    }

    pub fn get(&self, asset: Asset) -> Option<AllowanceSnapshot> {
        match asset {
            Asset::Base => self.base,
            Asset::Quote => self.quote,
            Asset::LpShare => None,
        }
    }
}

/// Allowance gate for one amount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalGate {
    /// Allowance never read, or invalidated and not yet re-read
    Unknown,
    NeedsApproval,
    Cleared,
}

impl ApprovalGate {
    /// Cleared only by a fresh allowance covering `required`
    pub fn evaluate(allowance: Option<&AllowanceSnapshot>, required: U256) -> Self {
        match allowance {
            None => ApprovalGate::Unknown,
            Some(snapshot) if snapshot.value < required => ApprovalGate::NeedsApproval,
            Some(snapshot) if snapshot.stale => ApprovalGate::Unknown,
            Some(_) => ApprovalGate::Cleared,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapInputs {
    pub amount_in: String,
    pub direction: SwapDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapDerived {
    pub input_asset: Asset,
    pub output_asset: Asset,
    /// Parsed input amount, when valid
    pub amount_in: Option<U256>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapView {
    pub network: NetworkStatus,
    pub inputs: SwapInputs,
    pub derived: SwapDerived,
    pub current_action: ActionState,
    pub available_actions: Vec<ActionKind>,
    pub balances: BalancesView,
    pub allowances: AllowancesView,
    pub needs_approval: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddLiquidityInputs {
    pub base_amount: String,
    pub quote_amount: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddLiquidityDerived {
    pub base_amount: Option<U256>,
    pub quote_amount: Option<U256>,
    /// Quote amount follows the base amount and the reserves
    pub quote_derived: bool,
    pub reserves: Option<ReserveSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddLiquidityView {
    pub network: NetworkStatus,
    pub inputs: AddLiquidityInputs,
    pub derived: AddLiquidityDerived,
    pub current_action: ActionState,
    pub available_actions: Vec<ActionKind>,
    pub balances: BalancesView,
    pub allowances: AllowancesView,
    pub needs_base_approval: bool,
    pub needs_quote_approval: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveLiquidityInputs {
    pub lp_amount: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveLiquidityView {
    pub network: NetworkStatus,
    pub inputs: RemoveLiquidityInputs,
    pub lp_amount: Option<U256>,
    pub current_action: ActionState,
    pub available_actions: Vec<ActionKind>,
    pub balances: BalancesView,
}
