//! solswap - buy and sell SPL tokens through the Jupiter router with
//! bounded submit/confirm retries

#![deny(unused_imports)]
#![deny(unused_mut)]
#![warn(unused_must_use)]

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use solana_sdk::pubkey::Pubkey;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use solswap::chain::{ChainClient, RpcChainClient};
use solswap::config::Config;
use solswap::engine::{RetryPolicy, SwapEngine, SwapOutcome};
use solswap::jupiter::JupiterClient;
use solswap::trader::{JupiterSwapSource, Trader};
use solswap::types::LAMPORTS_PER_SOL;
use solswap::wallet::Wallet;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Swap SOL into a token
    Buy {
        /// Token mint address
        mint: Pubkey,

        /// Amount of SOL to spend
        #[arg(long)]
        sol: f64,

        #[command(flatten)]
        overrides: TradeOverrides,
    },

    /// Swap a percentage of a token holding back into SOL
    Sell {
        /// Token mint address
        mint: Pubkey,

        /// Percentage of the current holding to sell, in (0, 100]
        #[arg(long)]
        percentage: f64,

        #[command(flatten)]
        overrides: TradeOverrides,
    },

    /// Show the wallet's SOL balance, and a token balance with --mint
    Balance {
        #[arg(long)]
        mint: Option<Pubkey>,
    },
}

#[derive(clap::Args, Debug)]
struct TradeOverrides {
    /// Maximum slippage in basis points
    #[arg(long)]
    slippage_bps: Option<u16>,

    /// Cap on the priority fee, in SOL
    #[arg(long)]
    priority_fee_sol: Option<f64>,

    /// Maximum submit/confirm attempts
    #[arg(long)]
    max_attempts: Option<u32>,
}

impl TradeOverrides {
    fn apply(&self, config: &mut Config) {
        if let Some(bps) = self.slippage_bps {
            config.trading.max_slippage_bps = bps;
        }
        if let Some(fee) = self.priority_fee_sol {
            config.trading.max_priority_fee_sol = fee;
        }
        if let Some(attempts) = self.max_attempts {
            config.trading.max_attempts = attempts;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = Config::load(&args.config)
        .with_context(|| format!("failed to load configuration from {}", args.config))?;
    if let Command::Buy { overrides, .. } | Command::Sell { overrides, .. } = &args.command {
        overrides.apply(&mut config);
        config.validate()?;
    }

    let wallet = Arc::new(load_wallet(&config)?);
    info!(wallet = %wallet.pubkey(), rpc = %config.rpc.endpoint, "starting");

    let chain: Arc<dyn ChainClient> = Arc::new(RpcChainClient::new(&config.rpc));

    let outcome = match args.command {
        Command::Balance { mint } => {
            return show_balances(chain.as_ref(), &wallet.pubkey(), mint).await;
        }
        Command::Buy { mint, sol, .. } => {
            let trader = build_trader(&config, wallet, chain.clone());
            trader.buy(mint, sol).await?
        }
        Command::Sell { mint, percentage, .. } => {
            let trader = build_trader(&config, wallet, chain.clone());
            trader.sell(mint, percentage).await?
        }
    };

    match outcome {
        SwapOutcome::Confirmed { signature, attempts } => {
            info!(%signature, attempts, "swap confirmed");
            println!(
                "confirmed in {} attempt(s): https://explorer.solana.com/tx/{}",
                attempts, signature
            );
            Ok(())
        }
        SwapOutcome::Exhausted { attempts, last_error } => {
            match last_error {
                Some(err) => error!(attempts, %err, "swap failed, attempt budget exhausted"),
                None => error!(attempts, "swap failed, attempt budget exhausted"),
            }
            std::process::exit(1);
        }
    }
}

fn build_trader(config: &Config, wallet: Arc<Wallet>, chain: Arc<dyn ChainClient>) -> Trader {
    let owner = wallet.pubkey();
    let jupiter = JupiterClient::new(config.jupiter.clone());
    let source = Arc::new(JupiterSwapSource::new(jupiter, wallet));
    let policy = RetryPolicy {
        max_attempts: config.trading.max_attempts,
        confirmation_delay: std::time::Duration::from_secs(
            config.trading.confirmation_delay_secs,
        ),
    };
    let engine = SwapEngine::new(source, chain.clone(), policy);
    Trader::new(engine, chain, owner, config.trading.clone())
}

async fn show_balances(
    chain: &dyn ChainClient,
    owner: &Pubkey,
    mint: Option<Pubkey>,
) -> Result<()> {
    let lamports = chain
        .sol_balance(owner)
        .await
        .context("failed to fetch SOL balance")?;
    println!(
        "{}: {} SOL ({} lamports)",
        owner,
        lamports as f64 / LAMPORTS_PER_SOL as f64,
        lamports
    );

    if let Some(mint) = mint {
        let balance = chain
            .token_balance(owner, &mint)
            .await
            .with_context(|| format!("failed to fetch balance for {}", mint))?;
        println!(
            "{}: {} ({} raw units, {} decimals)",
            mint,
            balance.amount as f64 / 10f64.powi(balance.decimals as i32),
            balance.amount,
            balance.decimals
        );
    }
    Ok(())
}

fn load_wallet(config: &Config) -> Result<Wallet> {
    match &config.wallet.keypair_path {
        Some(path) => Wallet::from_file(path)
            .with_context(|| format!("failed to load keypair from {}", path)),
        None => Wallet::from_env(&config.wallet.private_key_env).with_context(|| {
            format!(
                "failed to load keypair from ${}",
                config.wallet.private_key_env
            )
        }),
    }
}

/// Initialize logging subsystem
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "solswap=debug,info"
    } else {
        "solswap=info,warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}
