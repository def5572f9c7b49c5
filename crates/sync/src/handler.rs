use std::sync::Arc;

use async_trait::async_trait;
use rangechain_chain_service::ChainService;
use rangechain_chain_store::ChainStore;
use rangechain_client_traits::AnchorEvent;
use rangechain_event_watcher::EventListener;
use tokio::sync::broadcast;
use tracing::{instrument, warn};

use crate::error::SyncError;
use crate::event::{parse, DomainEvent};

const LOCAL_SIGNAL_CHANNEL_CAPACITY: usize = 256;

/// Lifts raw anchor events into domain events, applies them to local state,
/// and re-broadcasts them as a local, typed `event:{Name}` signal for any
/// in-process subscriber (spec.md §4.G).
///
/// Subscribing to `EventHandler::subscribe()` is the typed-channel
/// replacement for "inherited emitter behaviour" (spec.md §9 Design
/// Notes) — a dropped receiver or a lagging subscriber never blocks
/// delivery to `handle_events`'s caller.
pub struct EventHandler {
    chain_service: Arc<ChainService>,
    chain_store: Arc<ChainStore>,
    signals: broadcast::Sender<DomainEvent>,
}

impl EventHandler {
    pub fn new(chain_service: Arc<ChainService>, chain_store: Arc<ChainStore>) -> Self {
        let (signals, _rx) = broadcast::channel(LOCAL_SIGNAL_CHANNEL_CAPACITY);
        Self {
            chain_service,
            chain_store,
            signals,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.signals.subscribe()
    }

    async fn apply(&self, event: &DomainEvent) -> Result<(), SyncError> {
        match event {
            DomainEvent::Deposit(object) => {
                self.chain_service.add_deposits(vec![object.clone()]).await?;
            }
            DomainEvent::BlockSubmitted { number, root } => {
                self.chain_store.put_block_header(*number, *root)?;
                self.chain_store.set_latest_block(*number).await?;
            }
            DomainEvent::ExitStarted(exit) => {
                self.chain_store.mark_exited(&exit.token, &exit.start, &exit.end)?;
                self.chain_store.append_exit(exit).await?;
            }
            DomainEvent::ExitFinalized { token, start, end } => {
                self.chain_store.mark_finalized(token, start, end)?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl EventListener for EventHandler {
    #[instrument(skip(self, events))]
    async fn handle_events(
        &self,
        event_name: &str,
        events: &[AnchorEvent],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        for raw in events {
            let domain = parse(raw)?;
            self.apply(&domain).await?;
            if self.signals.send(domain.clone()).is_err() {
                // No subscribers currently listening; the event was still
                // applied to state above, so this is not a failure.
            }
        }
        Ok(())
    }
}

/// Surfaced so integration tests and `rangechain-node` can skip the loop
/// entirely while wiring things up without caring about lagging behind.
impl EventHandler {
    pub fn warn_if_lagged(result: Result<DomainEvent, broadcast::error::RecvError>) -> Option<DomainEvent> {
        match result {
            Ok(event) => Some(event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "event handler subscriber lagged, skipped events");
                None
            }
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rangechain_chain_service::ChainService;
    use rangechain_client_traits::{MockAnchorClient, MockOperatorClient};
    use rangechain_primitives::{Address, BigAmount};
    use rangechain_proof_verifier::{BinarySumTree, ProofVerifier};
    use std::collections::BTreeMap;

    fn handler() -> (EventHandler, Arc<ChainStore>) {
        let chain_store = Arc::new(ChainStore::in_memory().unwrap());
        let anchor: Arc<dyn rangechain_client_traits::AnchorClient> = Arc::new(MockAnchorClient::new());
        let contract = Arc::new(rangechain_client_traits::MockContractClient::new());
        let proof_verifier = Arc::new(ProofVerifier::new(
            chain_store.clone(),
            anchor.clone(),
            contract,
            Arc::new(BinarySumTree),
        ));
        let chain_service = Arc::new(ChainService::new(
            chain_store.clone(),
            proof_verifier,
            anchor,
            Arc::new(MockOperatorClient::new()),
            BigAmount::from_u64(1_000_000),
            100,
        ));
        (EventHandler::new(chain_service, chain_store.clone()), chain_store)
    }

    fn deposit_event(owner: Address, start: u64, end: u64, block: u64) -> AnchorEvent {
        let mut state = owner.as_bytes().to_vec();
        state.extend_from_slice(b"owner-predicate");
        let mut fields = BTreeMap::new();
        fields.insert("start".to_string(), BigAmount::from_u64(start).to_bytes_be());
        fields.insert("end".to_string(), BigAmount::from_u64(end).to_bytes_be());
        fields.insert("block".to_string(), BigAmount::from_u64(block).to_bytes_be());
        fields.insert("predicate".to_string(), Address::new([9; 20]).as_bytes().to_vec());
        fields.insert("state".to_string(), state);
        AnchorEvent {
            name: "Deposit".to_string(),
            block_number: block,
            log_index: 0,
            transaction_hash: rangechain_primitives::Hash32::new([block as u8; 32]),
            return_values: fields,
        }
    }

    #[tokio::test]
    async fn deposit_event_is_applied_to_head_state() {
        let (handler, _chain_store) = handler();
        let owner = Address::new([3; 20]);
        let events = vec![deposit_event(owner, 0, 100, 1)];

        handler.handle_events("Deposit", &events).await.unwrap();

        let ranges = handler.chain_service.owned_ranges(owner).await.unwrap();
        assert_eq!(ranges.len(), 1);
    }

    #[tokio::test]
    async fn block_submitted_event_updates_header_and_latest_block() {
        let (handler, chain_store) = handler();
        let mut fields = BTreeMap::new();
        fields.insert("number".to_string(), 7u64.to_be_bytes().to_vec());
        fields.insert("root".to_string(), rangechain_primitives::Hash32::new([5; 32]).as_bytes().to_vec());
        let event = AnchorEvent {
            name: "BlockSubmitted".to_string(),
            block_number: 7,
            log_index: 0,
            transaction_hash: rangechain_primitives::Hash32::ZERO,
            return_values: fields,
        };

        handler.handle_events("BlockSubmitted", &[event]).await.unwrap();

        assert_eq!(
            chain_store.get_block_header(7).unwrap(),
            Some(rangechain_primitives::Hash32::new([5; 32]))
        );
        assert_eq!(chain_store.latest_block().await.unwrap(), 7);
    }

    #[tokio::test]
    async fn applied_events_are_broadcast_to_subscribers() {
        let (handler, _chain_store) = handler();
        let mut rx = handler.subscribe();
        let owner = Address::new([4; 20]);

        handler
            .handle_events("Deposit", &[deposit_event(owner, 0, 10, 1)])
            .await
            .unwrap();

        let received = rx.try_recv().unwrap();
        assert!(matches!(received, DomainEvent::Deposit(_)));
    }

    #[tokio::test]
    async fn malformed_event_is_rejected_without_panicking() {
        let (handler, _chain_store) = handler();
        let event = AnchorEvent {
            name: "TotallyUnknown".to_string(),
            block_number: 1,
            log_index: 0,
            transaction_hash: rangechain_primitives::Hash32::ZERO,
            return_values: BTreeMap::new(),
        };
        assert!(handler.handle_events("TotallyUnknown", &[event]).await.is_err());
    }
}
