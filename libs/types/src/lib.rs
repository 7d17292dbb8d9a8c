//! # DEX Client Types
//!
//! Shared type system for the multi-chain AMM client.
//!
//! ## Design Philosophy
//!
//! - **No Precision Loss**: every on-chain amount is a smallest-unit `U256`
//! - **Clear Boundaries**: decimal strings are converted exactly once, at the
//!   point where a workflow is about to use them ([`parse_amount`])
//! - **Explicit Absence**: a missing address set or an unfetched value is
//!   `None`, never an implicit zero
//!
//! ## Quick Start
//!
//! ```rust
//! use dex_types::{parse_amount, format_amount, Asset, U256};
//!
//! let raw = parse_amount("1.5", 18).unwrap();
//! assert_eq!(raw, U256::from(1_500_000_000_000_000_000u128));
//! assert_eq!(format_amount(raw, 18), "1.5");
//! assert_eq!(Asset::LpShare.label(), "LP");
//! ```

pub mod account;
pub mod amount;
pub mod asset;
pub mod errors;
pub mod pool;
pub mod ports;

pub use account::{AccountState, ChainId};
pub use amount::{format_amount, parse_amount, AmountError, DEFAULT_DECIMALS};
pub use asset::{Asset, NetworkAddressSet, SwapDirection};
pub use errors::DexError;
pub use pool::ReservePair;
pub use ports::{ChainReader, Confirmation, ContractCall, TransactionHandle, WalletConnector};

/// Ethereum primitives used across the workspace
pub use ethers_core::types::{Address, H256, U256};
