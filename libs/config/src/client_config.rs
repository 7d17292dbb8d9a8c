//! Client Configuration Module
//!
//! Loads the client configuration from an optional TOML file with
//! environment-specific overrides, then `DEX_`-prefixed environment
//! variables (`DEX_NETWORKS__BASE__EXCHANGE=0x...`).

use crate::networks::{chains, ConfiguredNetwork, NetworkResolver};
use anyhow::{anyhow, Context, Result};
use config_crate::{Config, Environment, File};
use dex_types::{Address, NetworkAddressSet, DEFAULT_DECIMALS};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Main client configuration structure
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ClientConfig {
    /// Default tracing filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Decimals used to convert user-entered amounts
    #[serde(default = "default_token_decimals")]
    pub token_decimals: u8,

    #[serde(default)]
    pub wallet: WalletConfig,

    #[serde(default)]
    pub confirmation: ConfirmationConfig,

    /// Deployments keyed by network name
    #[serde(default)]
    pub networks: HashMap<String, NetworkSettings>,
}

/// Wallet JSON-RPC endpoint (the wallet signs and prompts the user)
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WalletConfig {
    pub rpc_url: String,
    /// Account/chain polling interval
    pub poll_interval_ms: u64,
}

/// Transaction confirmation monitoring
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConfirmationConfig {
    pub poll_interval_ms: u64,
    pub timeout_secs: u64,
}

/// One deployment as written in configuration
///
/// Addresses stay strings here so an incomplete entry can be reported and
/// skipped instead of failing the whole load.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct NetworkSettings {
    /// Defaults to the well-known id for the section name
    pub chain_id: Option<u64>,
    pub rpc_url: Option<String>,
    pub base_token: Option<String>,
    pub quote_token: Option<String>,
    pub exchange: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_token_decimals() -> u8 {
    DEFAULT_DECIMALS
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            // Frame's local wallet endpoint
            rpc_url: "http://127.0.0.1:1248".to_string(),
            poll_interval_ms: 1_000,
        }
    }
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            timeout_secs: 300,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            token_decimals: default_token_decimals(),
            wallet: WalletConfig::default(),
            confirmation: ConfirmationConfig::default(),
            networks: HashMap::new(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from files with environment overrides
    pub fn load(base_path: Option<&Path>, environment: Option<&str>) -> Result<Self> {
        let base = base_path.unwrap_or(Path::new("config/dex.toml"));

        // An explicit path must exist; the default one is optional
        let mut builder =
            Config::builder().add_source(File::from(base).required(base_path.is_some()));

        if let Some(env) = environment {
            let env_file = PathBuf::from("config/environments").join(format!("{}.toml", env));

            if env_file.exists() {
                info!("Loading environment config: {:?}", env_file);
                builder = builder.add_source(File::from(env_file));
            } else {
                warn!("Environment config not found: {:?}", env_file);
            }
        }

        // Override with environment variables (DEX_ prefix, __ nesting)
        builder = builder.add_source(
            Environment::with_prefix("DEX")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Expand environment variables in RPC URLs
    pub fn expand_env_vars(&mut self) -> Result<()> {
        let expanded = shellexpand::env(&self.wallet.rpc_url)
            .context("Failed to expand wallet RPC URL")?;
        self.wallet.rpc_url = expanded.to_string();

        for (name, network) in &mut self.networks {
            if let Some(rpc) = &network.rpc_url {
                let expanded = shellexpand::env(rpc)
                    .with_context(|| format!("Failed to expand RPC URL for {}", name))?;
                network.rpc_url = Some(expanded.to_string());
            }
        }

        Ok(())
    }

    /// Build the resolver from every complete network section
    ///
    /// Sections with a missing or malformed address are skipped with a
    /// warning; their chain then resolves as unsupported.
    pub fn resolver(&self) -> NetworkResolver {
        let mut names: Vec<&String> = self.networks.keys().collect();
        names.sort();

        let networks = names.into_iter().filter_map(|name| {
            match self.networks[name].to_network(name) {
                Ok(network) => {
                    debug!(
                        "Configured network {} (chain {}) exchange {:?}",
                        network.name, network.chain_id, network.addresses.exchange
                    );
                    Some(network)
                }
                Err(e) => {
                    warn!(
                        "Could not load configuration for network '{}'. It will be unavailable: {:#}",
                        name, e
                    );
                    None
                }
            }
        });

        NetworkResolver::new(networks)
    }
}

impl NetworkSettings {
    fn to_network(&self, name: &str) -> Result<ConfiguredNetwork> {
        let known = chains::by_name(name);

        let chain_id = self
            .chain_id
            .or_else(|| known.map(|chain| chain.chain_id))
            .with_context(|| format!("No chain_id for unknown network '{}'", name))?;

        let rpc_url = self
            .rpc_url
            .clone()
            .unwrap_or_else(|| chains::default_rpc_url(name));

        let addresses = NetworkAddressSet::new(
            parse_address("base_token", self.base_token.as_deref())?,
            parse_address("quote_token", self.quote_token.as_deref())?,
            parse_address("exchange", self.exchange.as_deref())?,
        );

        Ok(ConfiguredNetwork {
            name: name.to_lowercase(),
            chain_id,
            rpc_url,
            addresses,
        })
    }
}

fn parse_address(field: &str, value: Option<&str>) -> Result<Address> {
    let value = value.with_context(|| format!("Missing {}", field))?;
    Address::from_str(value.trim())
        .map_err(|e| anyhow!("Invalid {} '{}': {}", field, value, e))
}

/// Convenience function to load configuration with defaults
pub fn load_config(path: Option<&Path>, environment: Option<&str>) -> Result<ClientConfig> {
    let mut config = ClientConfig::load(path, environment)?;
    config.expand_env_vars()?;
    Ok(config)
}
