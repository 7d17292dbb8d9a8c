//! # DEX Client
//!
//! ## Purpose
//!
//! Multi-chain client for a constant-product AMM deployment. It resolves the
//! deployment for whatever chain the wallet is on, keeps a read-through cache
//! of the user's balances, allowances and the pool reserves, and sequences
//! the approve-then-act transactions of the swap and liquidity workflows.
//!
//! ## Integration Points
//!
//! - **Wallet**: [`WalletConnector`](dex_types::WalletConnector), reactive account context plus signing
//! - **Chain reads**: [`ChainReader`](dex_types::ChainReader), contract calls and receipts
//! - **Network table**: [`NetworkResolver`](dex_config::NetworkResolver) from configuration
//! - **Presentation**: synchronous view models per workflow ([`view`])
//!
//! ## Architecture Role
//!
//! ```text
//! Wallet ──account──▶ DexSession ──resolve──▶ NetworkResolver
//!                          │
//!                          ├──▶ StateCache ──▶ ChainReader
//!                          │        ▲
//!    SwapWorkflow ─────────┤        │ invalidate after confirmation
//!    AddLiquidityWorkflow ─┤────────┘
//!    RemoveLiquidityWorkflow
//! ```
//!
//! Workflows are independent of each other; within one workflow a single
//! action submits at a time.

pub mod action;
pub mod cache;
pub mod liquidity;
pub mod logging;
pub mod session;
pub mod stats;
pub mod swap;
pub mod view;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use action::{ActionKind, ActionSlot, ActionState};
pub use cache::{
    AllowanceSnapshot, BalanceSnapshot, CacheKey, CacheMetrics, CachedValue, EntryStatus,
    ReserveSnapshot, Snapshot, StateCache,
};
pub use liquidity::{AddLiquidityWorkflow, RemoveLiquidityWorkflow};
pub use session::{DexSession, Scope};
pub use stats::{collect_stats, exchange_stats, ExchangeStats, TokenStats};
pub use swap::SwapWorkflow;
pub use view::{
    AddLiquidityView, AllowancesView, ApprovalGate, BalancesView, RemoveLiquidityView, SwapView,
};
