use async_trait::async_trait;
use rangechain_client_traits::AnchorEvent;

/// A subscriber to one event name's finalised batches.
///
/// Per spec.md §4.F step 8, one listener's failure must not abort the
/// others — so `handle_events` returns a `Result` the watcher logs and
/// moves past, rather than a panic that would take the whole poll down.
#[async_trait]
pub trait EventListener: Send + Sync {
    async fn handle_events(
        &self,
        event_name: &str,
        events: &[AnchorEvent],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
