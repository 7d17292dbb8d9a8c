//! `dex` command-line client
//!
//! Usage:
//!   dex networks
//!   dex status
//!   dex swap --amount 1.5 [--reverse]
//!   dex add-liquidity --base 10 [--quote 40]
//!   dex remove-liquidity --lp 2
//!   dex stats [--chain base]

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dex_client::{
    collect_stats, log_error, ActionKind, AddLiquidityWorkflow, BalanceSnapshot, DexSession,
    RemoveLiquidityWorkflow, SwapWorkflow,
};
use dex_config::{chains, load_config, ClientConfig, NetworkResolver, NetworkStatus};
use dex_types::{format_amount, Asset, DexError, SwapDirection};
use evm_adapter::{EthersChainReader, RpcWallet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dex")]
#[command(about = "Multi-chain AMM client")]
#[command(version)]
struct Cli {
    /// Path to configuration file (default: config/dex.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Environment overrides from config/environments/<env>.toml
    #[arg(short, long)]
    env: Option<String>,

    /// Enable JSON logging format
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List configured networks and their contracts
    Networks,
    /// Connect the wallet and show balances, allowances and reserves
    Status,
    /// Swap base for quote (or quote for base with --reverse)
    Swap {
        /// Input amount in display units
        #[arg(long)]
        amount: String,
        #[arg(long)]
        reverse: bool,
    },
    /// Deposit base and quote tokens
    AddLiquidity {
        #[arg(long)]
        base: String,
        /// Defaults to the amount matching the pool ratio
        #[arg(long)]
        quote: Option<String>,
    },
    /// Burn LP shares
    RemoveLiquidity {
        #[arg(long)]
        lp: String,
    },
    /// Exchange statistics as JSON
    Stats {
        #[arg(long)]
        chain: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref(), cli.env.as_deref())
        .context("Failed to load configuration")?;
    init_logging(&config, cli.json_logs);

    if let Err(e) = run(cli.command, config).await {
        let kind = e.downcast_ref::<DexError>().map_or("other", DexError::kind);
        log_error!("[{}] {:#}", kind, e);
        return Err(e);
    }
    Ok(())
}

fn init_logging(config: &ClientConfig, json_logs: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));

    if json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

async fn run(command: Command, config: ClientConfig) -> Result<()> {
    let resolver = Arc::new(config.resolver());
    info!("Loaded {} configured networks", resolver.len());

    match command {
        Command::Networks => {
            print_networks(&resolver);
            Ok(())
        }
        Command::Stats { chain } => {
            let reader = EthersChainReader::new(resolver.networks(), &config.confirmation)?;
            let stats = collect_stats(
                &reader,
                &resolver,
                chain.as_deref(),
                config.token_decimals,
            )
            .await;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }
        command => {
            let session = connect_session(&config, resolver).await?;
            match command {
                Command::Status => status(&session).await,
                Command::Swap { amount, reverse } => swap(&session, amount, reverse).await,
                Command::AddLiquidity { base, quote } => {
                    add_liquidity(&session, base, quote).await
                }
                Command::RemoveLiquidity { lp } => remove_liquidity(&session, lp).await,
                Command::Networks | Command::Stats { .. } => Ok(()),
            }
        }
    }
}

fn print_networks(resolver: &NetworkResolver) {
    if resolver.is_empty() {
        println!("No networks configured");
        return;
    }
    for network in resolver.networks() {
        let display_name = chains::by_id(network.chain_id)
            .map_or(network.name.as_str(), |chain| chain.display_name);
        println!("{} (chain {})", display_name, network.chain_id);
        println!("  rpc:      {}", network.rpc_url);
        println!("  base:     {:?}", network.addresses.base_token);
        println!("  quote:    {:?}", network.addresses.quote_token);
        println!("  exchange: {:?}", network.addresses.exchange);
    }
}

async fn connect_session(
    config: &ClientConfig,
    resolver: Arc<NetworkResolver>,
) -> Result<Arc<DexSession>> {
    let reader = Arc::new(EthersChainReader::new(
        resolver.networks(),
        &config.confirmation,
    )?);
    let wallet = Arc::new(RpcWallet::new(&config.wallet.rpc_url)?);

    let session = Arc::new(DexSession::new(
        wallet.clone(),
        reader,
        resolver,
        config.token_decimals,
    ));

    wallet.spawn_account_watch(Duration::from_millis(config.wallet.poll_interval_ms));
    session.spawn_account_listener();

    match session.connect().await? {
        NetworkStatus::Supported { chain_id, .. } => {
            info!("🌐 Using deployment on chain {}", chain_id)
        }
        NetworkStatus::Unsupported(chain_id) => {
            bail!("Wallet is on chain {}, which has no configured deployment", chain_id)
        }
        NetworkStatus::Disconnected => bail!("Wallet did not report a chain"),
    }

    Ok(session)
}

fn display(snapshot: Option<BalanceSnapshot>, decimals: u8) -> String {
    match snapshot {
        Some(snapshot) if snapshot.stale => format!("{} (stale)", format_amount(snapshot.value, decimals)),
        Some(snapshot) => format_amount(snapshot.value, decimals),
        None => "unknown".to_string(),
    }
}

async fn status(session: &Arc<DexSession>) -> Result<()> {
    let decimals = session.decimals();
    let add = AddLiquidityWorkflow::new(session.clone());
    if let Err(e) = add.refresh().await {
        warn!("Some reads failed: {}", e);
    }

    let view = add.view();
    match view.network.chain_id() {
        Some(chain_id) if view.network.is_supported() => println!("Network:  chain {}", chain_id),
        Some(chain_id) => println!("Network:  chain {} (unsupported)", chain_id),
        None => println!("Network:  disconnected"),
    }
    if let Some(addresses) = view.network.addresses() {
        println!("Exchange: {:?}", addresses.exchange);
    }
    println!("Account:  {:?}", session.account().address);
    for asset in Asset::ALL {
        println!(
            "Balance {:<5} {}",
            asset.label(),
            display(view.balances.get(asset), decimals)
        );
    }
    for asset in [Asset::Base, Asset::Quote] {
        println!(
            "Allowance {:<5} {}",
            asset.label(),
            display(view.allowances.get(asset), decimals)
        );
    }
    match view.derived.reserves {
        Some(reserves) => println!(
            "Reserves: {} BASE / {} QUOTE",
            format_amount(reserves.value.reserve_base, decimals),
            format_amount(reserves.value.reserve_quote, decimals)
        ),
        None => println!("Reserves: unknown"),
    }
    Ok(())
}

async fn swap(session: &Arc<DexSession>, amount: String, reverse: bool) -> Result<()> {
    let workflow = SwapWorkflow::new(session.clone());
    if reverse {
        workflow.set_direction(SwapDirection::QuoteToBase);
    }
    workflow.set_amount_in(amount);
    workflow.refresh().await?;

    let view = workflow.view();
    if let Some(ActionKind::Approve(_)) = view.available_actions.first() {
        workflow.approve().await?;
    }

    if !workflow.view().available_actions.contains(&ActionKind::Swap) {
        bail!("Swap is not available: allowance not confirmed or amount invalid");
    }

    let confirmation = workflow.swap().await?;
    println!("Swap confirmed: 0x{:x}", confirmation.hash);
    Ok(())
}

async fn add_liquidity(
    session: &Arc<DexSession>,
    base: String,
    quote: Option<String>,
) -> Result<()> {
    let workflow = AddLiquidityWorkflow::new(session.clone());
    workflow.refresh().await?;
    workflow.set_base_amount(base);

    if let Some(quote) = quote {
        if workflow.quote_derived() {
            warn!(
                "Overriding the reserve-derived quote amount {} with {}",
                workflow.inputs().quote_amount,
                quote
            );
        }
        workflow.set_quote_amount(quote);
    }

    let inputs = workflow.inputs();
    info!(
        "Depositing {} BASE + {} QUOTE",
        inputs.base_amount, inputs.quote_amount
    );

    for kind in workflow.view().available_actions {
        match kind {
            ActionKind::Approve(Asset::Base) => {
                workflow.approve_base().await?;
            }
            ActionKind::Approve(Asset::Quote) => {
                workflow.approve_quote().await?;
            }
            _ => {}
        }
    }

    if !workflow.view().available_actions.contains(&ActionKind::Deposit) {
        bail!("Deposit is not available: allowances not confirmed or amounts invalid");
    }

    let confirmation = workflow.deposit().await?;
    println!("Liquidity added: 0x{:x}", confirmation.hash);
    Ok(())
}

async fn remove_liquidity(session: &Arc<DexSession>, lp: String) -> Result<()> {
    let workflow = RemoveLiquidityWorkflow::new(session.clone());
    workflow.set_lp_amount(lp);
    workflow.refresh().await?;

    if !workflow.view().available_actions.contains(&ActionKind::Withdraw) {
        bail!("Withdraw is not available: invalid LP amount");
    }

    let confirmation = workflow.withdraw().await?;
    println!("Liquidity removed: 0x{:x}", confirmation.hash);
    Ok(())
}
