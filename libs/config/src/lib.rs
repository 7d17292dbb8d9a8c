//! # DEX Client Configuration
//!
//! Centralized configuration for the multi-chain AMM client.
//!
//! ## Features
//!
//! - **Network Table**: per-chain contract addresses, built once from config
//! - **Resolver**: chain id → address set, or an explicit unsupported state
//! - **Client Settings**: wallet endpoint, confirmation monitoring, decimals
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dex_config::{load_config, NetworkStatus};
//!
//! let config = load_config(None, None).unwrap();
//! let resolver = config.resolver();
//!
//! match resolver.resolve(Some(8453)) {
//!     NetworkStatus::Supported { addresses, .. } => println!("exchange {:?}", addresses.exchange),
//!     other => println!("not available: {:?}", other),
//! }
//! ```

pub mod client_config;
pub mod networks;

// Re-export commonly used types
pub use client_config::{
    load_config, ClientConfig, ConfirmationConfig, NetworkSettings, WalletConfig,
};
pub use networks::{chains, ConfiguredNetwork, NetworkResolver, NetworkStatus};
