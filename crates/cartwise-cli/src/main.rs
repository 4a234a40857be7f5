mod plan;
mod shop;

use std::path::PathBuf;
use std::sync::Arc;

use cartwise_core::StoreKey;
use cartwise_feeds::{
    AcquisitionOrchestrator, ChainEndpoints, ChainRegistry, FeedClient, OrchestratorSettings,
};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "cartwise")]
#[command(about = "Compare supermarket prices across stores and plan the cheapest trip")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List supported chains
    Chains,
    /// Fetch one store's catalog and show an item's price and promotions
    Shop {
        /// Chain code or alias, e.g. `shufersal`
        #[arg(long)]
        chain: String,
        #[arg(long)]
        store: String,
        /// Item code to look up
        #[arg(long)]
        item: Option<String>,
    },
    /// Pick the cheapest combination of stores for a shopping list
    Plan {
        /// Candidate store as `CHAIN:STORE`; repeat for each store
        #[arg(long = "store", required = true, value_parser = parse_store_arg)]
        stores: Vec<StoreArg>,
        /// JSON array of `{"item_code": "...", "quantity": "..."}`
        #[arg(long)]
        list: PathBuf,
        /// Maximum number of stores to visit
        #[arg(long)]
        max_stores: usize,
        /// Drop stores that do not carry every item instead of failing
        #[arg(long, default_value_t = false)]
        exclude_incomplete: bool,
    },
}

/// A `CHAIN:STORE` argument; the chain may be a code or an alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StoreArg {
    pub chain: String,
    pub store: String,
}

fn parse_store_arg(raw: &str) -> Result<StoreArg, String> {
    match raw.split_once(':') {
        Some((chain, store)) if !chain.is_empty() && !store.is_empty() => Ok(StoreArg {
            chain: chain.to_owned(),
            store: store.to_owned(),
        }),
        _ => Err(format!("expected CHAIN:STORE, got '{raw}'")),
    }
}

/// Resolves a chain alias to its code so store keys are canonical.
pub(crate) fn store_key(
    registry: &ChainRegistry,
    chain: &str,
    store: &str,
) -> anyhow::Result<StoreKey> {
    let adapter = registry.require(chain)?;
    Ok(StoreKey::new(adapter.chain_code(), store))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = cartwise_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(env = %config.env, ?config, "configuration loaded");

    let cli = Cli::parse();

    let registry = Arc::new(ChainRegistry::standard(&ChainEndpoints::default())?);
    let client = FeedClient::from_config(&config)?;
    let orchestrator = AcquisitionOrchestrator::new(
        Arc::clone(&registry),
        client,
        OrchestratorSettings::from_config(&config),
    );

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling acquisition");
            on_interrupt.cancel();
        }
    });

    match cli.command {
        Commands::Chains => {
            for adapter in registry.list() {
                println!("{:<16} {}", adapter.alias(), adapter.chain_code());
            }
        }
        Commands::Shop { chain, store, item } => {
            shop::run_shop(&orchestrator, &chain, &store, item.as_deref(), &cancel).await?;
        }
        Commands::Plan {
            stores,
            list,
            max_stores,
            exclude_incomplete,
        } => {
            plan::run_plan(
                &orchestrator,
                &stores,
                &list,
                max_stores,
                exclude_incomplete,
                &cancel,
            )
            .await?;
        }
    }

    Ok(())
}
