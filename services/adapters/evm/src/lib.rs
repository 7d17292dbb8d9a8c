//! # EVM Adapter
//!
//! ## Purpose
//!
//! Production implementations of the client's collaborator ports on top of
//! `ethers`: [`EthersChainReader`] performs read-only calls against each
//! configured network's RPC endpoint, and [`RpcWallet`] drives an external
//! JSON-RPC wallet that holds the keys and prompts the user for signatures.
//!
//! ## Integration Points
//!
//! - **Input**: `ConfiguredNetwork` list and `ConfirmationConfig` from `dex-config`
//! - **Output**: `ChainReader` / `WalletConnector` trait objects used by `dex-client`
//! - **Errors**: every provider/contract failure is classified into `DexError`
//!   (`UserRejected`, `ContractReverted`, `NetworkError`)
//!
//! ## Architecture Role
//!
//! ```text
//! dex-client ──ChainReader──▶ EthersChainReader ──HTTP──▶ chain RPC (per chain id)
//!     │
//!     └──WalletConnector──▶ RpcWallet ──HTTP──▶ wallet RPC (signs + broadcasts)
//! ```

pub mod abi;
pub mod errors;
pub mod reader;
pub mod wallet;

pub use errors::{classify_contract_error, classify_provider_error, USER_REJECTED_CODE};
pub use reader::EthersChainReader;
pub use wallet::{encode_call, RpcWallet};

use anyhow::{Context, Result};
use ethers::providers::{Http, Provider};
use std::time::Duration;
use url::Url;

/// Build an HTTP provider over a pooled client
pub(crate) fn http_provider(rpc_url: &str, request_timeout: Duration) -> Result<Provider<Http>> {
    let http_client = reqwest::Client::builder()
        .pool_idle_timeout(Duration::from_secs(60))
        .pool_max_idle_per_host(5)
        .timeout(request_timeout)
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .context("Failed to create HTTP client")?;

    let url: Url = rpc_url
        .parse()
        .with_context(|| format!("Invalid RPC URL: {}", rpc_url))?;

    Ok(Provider::new(Http::new_with_client(url, http_client)))
}
