//! `rangechain-service-graph::Service` wrappers over this binary's
//! long-running components: the event watcher, the wallet-sync pipeline,
//! and the RPC dispatcher loop.
//!
//! Each mirrors spec.md §5's cooperative-loop model: `start()` spawns a
//! single `tokio` task that checks a `started` flag each iteration,
//! rather than blocking the caller, and `stop()` cancels that task —
//! matching `EventWatcher`'s own `ensure_started`/`stop` shape, one level
//! up.

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rangechain_chain_service::ChainService;
use rangechain_chain_store::{ChainStore, SyncCursorStore};
use rangechain_client_traits::{OperatorClient, WalletSigner};
use rangechain_dispatcher::{ChainStoreMethods, Dispatcher, Request, WalletMethods};
use rangechain_event_watcher::EventWatcher;
use rangechain_service_graph::{Service, ServiceName};
use rangechain_sync::EventHandler;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{info, warn};

const EVENT_NAMES: [&str; 4] = ["Deposit", "BlockSubmitted", "ExitStarted", "ExitFinalized"];

/// Registers the sync `EventHandler` against every domain event name and
/// leans on `EventWatcher`'s own lazily-started poll loop (spec.md §4.F).
pub struct EventWatcherService {
    watcher: Arc<EventWatcher>,
    handler: Arc<EventHandler>,
    started: AtomicBool,
}

impl EventWatcherService {
    pub fn new(watcher: Arc<EventWatcher>, handler: Arc<EventHandler>) -> Self {
        Self {
            watcher,
            handler,
            started: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Service for EventWatcherService {
    fn name(&self) -> ServiceName {
        ServiceName::from_static("event-watcher")
    }

    fn dependencies(&self) -> Vec<ServiceName> {
        Vec::new()
    }

    async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let listener: Arc<dyn rangechain_event_watcher::EventListener> = self.handler.clone();
        for name in EVENT_NAMES {
            self.watcher.subscribe(name, listener.clone()).await;
        }
        self.started.store(true, Ordering::SeqCst);
        info!("event-watcher: subscribed to all domain events");
        Ok(())
    }

    async fn stop(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.watcher.stop().await;
        self.started.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Drives `rangechain_sync::sync_wallet_transactions` on a fixed interval
/// (spec.md §4.G sync loop), cancelling the background task on `stop()`.
pub struct SyncPipelineService {
    chain_service: Arc<ChainService>,
    chain_store: Arc<ChainStore>,
    cursor_store: Arc<SyncCursorStore>,
    operator_client: Arc<dyn OperatorClient>,
    wallet: Arc<dyn WalletSigner>,
    poll_interval: Duration,
    /// The resolved plasma chain contract address (spec.md §6
    /// `plasmaChainName`, resolved via `registryAddress`). `None` until
    /// both config keys are set, matching spec.md §4.G step 1's "plasma
    /// contract address is unset" skip condition.
    plasma_contract_address: Option<String>,
    task: tokio::sync::Mutex<Option<JoinHandle<()>>>,
    started: AtomicBool,
}

impl SyncPipelineService {
    pub fn new(
        chain_service: Arc<ChainService>,
        chain_store: Arc<ChainStore>,
        cursor_store: Arc<SyncCursorStore>,
        operator_client: Arc<dyn OperatorClient>,
        wallet: Arc<dyn WalletSigner>,
        poll_interval: Duration,
        plasma_contract_address: Option<String>,
    ) -> Self {
        Self {
            chain_service,
            chain_store,
            cursor_store,
            operator_client,
            wallet,
            poll_interval,
            plasma_contract_address,
            task: tokio::sync::Mutex::new(None),
            started: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Service for SyncPipelineService {
    fn name(&self) -> ServiceName {
        ServiceName::from_static("sync-pipeline")
    }

    fn dependencies(&self) -> Vec<ServiceName> {
        vec![ServiceName::from_static("event-watcher")]
    }

    async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let chain_service = self.chain_service.clone();
        let chain_store = self.chain_store.clone();
        let cursor_store = self.cursor_store.clone();
        let operator_client = self.operator_client.clone();
        let wallet = self.wallet.clone();
        let poll_interval = self.poll_interval;
        let plasma_contract_address = self.plasma_contract_address.clone();

        let handle = tokio::spawn(async move {
            loop {
                match rangechain_sync::sync_wallet_transactions(
                    chain_service.as_ref(),
                    chain_store.as_ref(),
                    cursor_store.as_ref(),
                    operator_client.as_ref(),
                    wallet.as_ref(),
                    plasma_contract_address.as_deref(),
                )
                .await
                {
                    Ok(report) => {
                        if report.imported > 0 || report.failed > 0 {
                            info!(?report, "sync-pipeline: pass complete");
                        }
                    }
                    Err(err) => warn!(%err, "sync-pipeline: pass failed, will retry next interval"),
                }
                tokio::time::sleep(poll_interval).await;
            }
        });
        *self.task.lock().await = Some(handle);
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Some(handle) = self.task.lock().await.take() {
            handle.abort();
        }
        self.started.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Exposes the assembled `Dispatcher` over a minimal newline-delimited
/// JSON-RPC loop on stdio (spec.md §4.J) — enough to prove the method
/// tables are wired to live services without building the production
/// HTTP/JSON-RPC gateway that §1 Non-goals excludes.
pub struct DispatcherService {
    dispatcher: Arc<Dispatcher>,
    task: tokio::sync::Mutex<Option<JoinHandle<()>>>,
    started: AtomicBool,
}

impl DispatcherService {
    pub fn new(wallet: Arc<dyn WalletSigner>, chain_store: Arc<ChainStore>) -> Self {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(&WalletMethods::new(wallet));
        dispatcher.register(&ChainStoreMethods::new(chain_store));
        Self {
            dispatcher: Arc::new(dispatcher),
            task: tokio::sync::Mutex::new(None),
            started: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Service for DispatcherService {
    fn name(&self) -> ServiceName {
        ServiceName::from_static("dispatcher")
    }

    fn dependencies(&self) -> Vec<ServiceName> {
        vec![ServiceName::from_static("event-watcher"), ServiceName::from_static("sync-pipeline")]
    }

    async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let dispatcher = self.dispatcher.clone();
        let handle = tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) if !line.trim().is_empty() => {
                        let response = match Request::from_str(&line) {
                            Ok(request) => dispatcher.dispatch(request),
                            Err(err) => {
                                warn!(%err, "dispatcher: malformed request");
                                continue;
                            }
                        };
                        let Ok(encoded) = serde_json::to_string(&response) else {
                            continue;
                        };
                        let mut stdout = tokio::io::stdout();
                        let _ = stdout.write_all(encoded.as_bytes()).await;
                        let _ = stdout.write_all(b"\n").await;
                        let _ = stdout.flush().await;
                    }
                    Ok(Some(_)) => continue,
                    Ok(None) => break,
                    Err(err) => {
                        warn!(%err, "dispatcher: stdin read failed");
                        break;
                    }
                }
            }
        });
        *self.task.lock().await = Some(handle);
        self.started.store(true, Ordering::SeqCst);
        info!(methods = ?self.dispatcher.method_names(), "dispatcher: listening on stdio");
        Ok(())
    }

    async fn stop(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Some(handle) = self.task.lock().await.take() {
            handle.abort();
        }
        self.started.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
