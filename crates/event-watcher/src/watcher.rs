use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rangechain_chain_store::SyncCursorStore;
use rangechain_client_traits::{AnchorClient, AnchorEvent};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use crate::error::EventWatcherError;
use crate::listener::EventListener;

type Subscriptions = HashMap<String, Vec<Arc<dyn EventListener>>>;

/// Finality-delayed, deduplicated, subscriber-driven poller over a single
/// anchor chain (spec.md §4.F).
///
/// A single logical loop alternates between "check every currently
/// subscribed event name" and `sleep(poll_interval)`, started lazily on the
/// first `subscribe` and stopped on `stop()` — mirroring the teacher's
/// `ol_tracker_task` cooperative-loop shape
/// (`crates/alpen-ee/ol_tracker/src/task.rs`), generalized here from one
/// tracked chain to an arbitrary set of named subscriptions.
pub struct EventWatcher {
    anchor_client: Arc<dyn AnchorClient>,
    cursor_store: Arc<SyncCursorStore>,
    finality_depth: u64,
    poll_interval: Duration,
    subscriptions: Arc<Mutex<Subscriptions>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl EventWatcher {
    pub fn new(
        anchor_client: Arc<dyn AnchorClient>,
        cursor_store: Arc<SyncCursorStore>,
        finality_depth: u64,
        poll_interval: Duration,
    ) -> Self {
        Self {
            anchor_client,
            cursor_store,
            finality_depth,
            poll_interval,
            subscriptions: Arc::new(Mutex::new(HashMap::new())),
            task: Mutex::new(None),
        }
    }

    /// Registers `listener` for `event_name`, starting the background poll
    /// loop on the very first subscription.
    pub async fn subscribe(&self, event_name: impl Into<String>, listener: Arc<dyn EventListener>) {
        let event_name = event_name.into();
        {
            let mut subs = self.subscriptions.lock().await;
            subs.entry(event_name).or_default().push(listener);
        }
        self.ensure_started().await;
    }

    /// Drops every listener registered for `event_name`. Once the last
    /// listener for a name is gone, polling for that name stops until
    /// resubscribed (the name is simply absent from `subscriptions`).
    pub async fn unsubscribe_all(&self, event_name: &str) {
        self.subscriptions.lock().await.remove(event_name);
    }

    async fn ensure_started(&self) {
        let mut task = self.task.lock().await;
        if task.is_some() {
            return;
        }
        let anchor_client = self.anchor_client.clone();
        let cursor_store = self.cursor_store.clone();
        let subscriptions = self.subscriptions.clone();
        let finality_depth = self.finality_depth;
        let poll_interval = self.poll_interval;

        *task = Some(tokio::spawn(async move {
            loop {
                let names: Vec<String> = subscriptions.lock().await.keys().cloned().collect();
                for name in names {
                    if let Err(err) = poll_one(
                        &name,
                        anchor_client.as_ref(),
                        cursor_store.as_ref(),
                        finality_depth,
                        &subscriptions,
                    )
                    .await
                    {
                        warn!(event = %name, %err, "event-watcher: poll failed, will retry next interval");
                    }
                }
                tokio::time::sleep(poll_interval).await;
            }
        }));
    }

    /// Cancels the background loop. A subsequent `subscribe` starts a fresh
    /// one.
    pub async fn stop(&self) {
        if let Some(handle) = self.task.lock().await.take() {
            handle.abort();
        }
    }

    pub async fn is_running(&self) -> bool {
        self.task.lock().await.is_some()
    }
}

/// One event name's worth of spec.md §4.F steps 1-9. Split out of the loop
/// body so it's directly testable without spawning a task or sleeping.
#[instrument(skip(anchor_client, cursor_store, subscriptions))]
async fn poll_one(
    event_name: &str,
    anchor_client: &dyn AnchorClient,
    cursor_store: &SyncCursorStore,
    finality_depth: u64,
    subscriptions: &Mutex<Subscriptions>,
) -> Result<(), EventWatcherError> {
    let head = anchor_client.head_height().await?;
    let final_head = head.saturating_sub(finality_depth);

    let last = cursor_store.get_last_logged_event_block(event_name)?;
    let from = last + 1;
    if from > final_head {
        debug!(event = %event_name, from, final_head, "event-watcher: nothing new past finality");
        return Ok(());
    }

    let events = anchor_client.get_events(event_name, from, final_head).await?;
    let mut survivors = Vec::with_capacity(events.len());
    for e in events {
        if !cursor_store.has_event(e.identity())? {
            survivors.push(e);
        }
    }

    if !survivors.is_empty() {
        let identities: Vec<_> = survivors.iter().map(AnchorEvent::identity).collect();
        cursor_store.add_events(&identities)?;

        let listeners = subscriptions
            .lock()
            .await
            .get(event_name)
            .cloned()
            .unwrap_or_default();
        for listener in listeners {
            if let Err(err) = listener.handle_events(event_name, &survivors).await {
                warn!(event = %event_name, %err, "event-watcher: listener failed, continuing with remaining listeners");
            }
        }
    }

    cursor_store.set_last_logged_event_block(event_name, final_head)?;
    Ok(())
}
