//! Wires `ServiceGraph` over the event watcher, the wallet-sync pipeline
//! and the RPC dispatcher, backed by `sled` persistence and demo-weight
//! client-trait implementations (spec.md §2, §9).
//!
//! Production Ethereum JSON-RPC, operator HTTP, and keystore adapters are
//! out of scope (spec.md §1 Non-goals); this binary proves the wiring
//! with the trait-based `AnchorClient`/`OperatorClient`/`WalletSigner`
//! seams those adapters would otherwise fill.

mod args;
mod dummy_clients;
mod services;

use std::sync::Arc;

use clap::Parser;
use rangechain_chain_service::ChainService;
use rangechain_chain_store::{ChainStore, SyncCursorStore};
use rangechain_client_traits::{AnchorClient, ContractClient, OperatorClient, WalletSigner};
use rangechain_config::Config;
use rangechain_event_watcher::EventWatcher;
use rangechain_primitives::BigAmount;
use rangechain_proof_verifier::{BinarySumTree, ProofVerifier};
use rangechain_service_graph::ServiceGraph;
use rangechain_sync::EventHandler;
use tracing::info;
use tracing_subscriber::EnvFilter;

use args::Args;
use dummy_clients::{DummyAnchorClient, DummyContractClient, DummyOperatorClient, DummyWallet};
use services::{DispatcherService, EventWatcherService, SyncPipelineService};

/// Coin positions are partitioned into fixed-width per-token segments
/// (DESIGN.md Open Question 4); this demo uses one segment per 10^12 coin
/// units, large enough that a handful of demo deposits stay inside token 0.
const TOKEN_SEGMENT_SIZE: u64 = 1_000_000_000_000;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;
    init_logging(&config);

    info!(?config, "rangechain-node starting");

    let (chain_store, cursor_store) = open_stores(&args)?;

    let anchor_client: Arc<dyn AnchorClient> = Arc::new(DummyAnchorClient::new(0));
    let operator_client: Arc<dyn OperatorClient> = Arc::new(DummyOperatorClient);
    let contract_client: Arc<dyn ContractClient> = Arc::new(DummyContractClient);
    let wallet: Arc<dyn WalletSigner> = Arc::new(DummyWallet::new());

    let proof_verifier = Arc::new(ProofVerifier::new(
        chain_store.clone(),
        anchor_client.clone(),
        contract_client,
        Arc::new(BinarySumTree),
    ));

    let chain_service = Arc::new(ChainService::new(
        chain_store.clone(),
        proof_verifier,
        anchor_client.clone(),
        operator_client.clone(),
        BigAmount::from_u64(TOKEN_SEGMENT_SIZE),
        config.finality_depth,
    ));

    let event_watcher = Arc::new(EventWatcher::new(
        anchor_client,
        cursor_store.clone(),
        config.finality_depth,
        config.event_poll_interval(),
    ));
    let event_handler = Arc::new(EventHandler::new(chain_service.clone(), chain_store.clone()));

    // The plasma contract address is only considered resolved once both
    // halves of the registry lookup are configured (spec.md §6
    // `registryAddress` + `plasmaChainName`); actually resolving a chain
    // name through the registry is anchor-chain RPC, out of scope here.
    let plasma_contract_address = match (&config.registry_address, &config.plasma_chain_name) {
        (Some(registry), Some(_chain_name)) => Some(registry.clone()),
        _ => None,
    };

    let graph = ServiceGraph::new();
    graph
        .register_service(Arc::new(EventWatcherService::new(event_watcher, event_handler)))
        .await?;
    graph
        .register_service(Arc::new(SyncPipelineService::new(
            chain_service,
            chain_store.clone(),
            cursor_store,
            operator_client,
            wallet.clone(),
            config.transaction_poll_interval(),
            plasma_contract_address,
        )))
        .await?;
    graph
        .register_service(Arc::new(DispatcherService::new(wallet, chain_store)))
        .await?;

    graph.start().await?;
    info!("rangechain-node: service graph started");

    if args.once {
        graph.stop().await?;
        return Ok(());
    }

    tokio::signal::ctrl_c().await?;
    info!("rangechain-node: shutting down");
    graph.stop().await?;
    Ok(())
}

fn load_config(args: &Args) -> eyre::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    config.apply_env_overlay(std::env::vars())?;
    Ok(config)
}

fn init_logging(config: &Config) {
    let filter = config
        .debug
        .clone()
        .map(EnvFilter::new)
        .unwrap_or_else(|| EnvFilter::new("rangechain=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn open_stores(args: &Args) -> eyre::Result<(Arc<ChainStore>, Arc<SyncCursorStore>)> {
    match &args.data_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let chain_store = Arc::new(ChainStore::open(dir.join("chain"))?);
            let cursor_store = Arc::new(SyncCursorStore::open(dir.join("cursor"))?);
            Ok((chain_store, cursor_store))
        }
        None => {
            let chain_store = Arc::new(ChainStore::in_memory()?);
            let cursor_store = Arc::new(SyncCursorStore::in_memory()?);
            Ok((chain_store, cursor_store))
        }
    }
}
