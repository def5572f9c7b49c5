use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tracing::{error, info, instrument};

use crate::error::ServiceGraphError;
use crate::name::ServiceName;
use crate::service::Service;

const LIFECYCLE_CHANNEL_CAPACITY: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleEvent {
    Started,
    Initialized,
    Stopped,
}

struct Entry {
    service: Arc<dyn Service>,
    /// The same underlying object as `service`, retained as `Any` so
    /// `ServiceGraph::get::<T>` can downcast back to the concrete type a
    /// caller registered without the graph itself needing to know it.
    any: Arc<dyn Any + Send + Sync>,
    lifecycle: broadcast::Sender<LifecycleEvent>,
}

/// A named registry of cooperating services with an explicit dependency
/// DAG, topological start/stop, and per-service lifecycle broadcast
/// channels (spec.md §4.I).
#[derive(Default)]
pub struct ServiceGraph {
    entries: Mutex<HashMap<ServiceName, Entry>>,
    /// Registration order, used to break ties among services with equal
    /// topological precedence (spec.md §5 "registration order breaks
    /// ties").
    registration_order: Mutex<Vec<ServiceName>>,
}

impl ServiceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiates and registers a service. Returns the same `Arc` handed
    /// in, for the caller's own direct use alongside graph-mediated access.
    pub async fn register_service<T: Service + 'static>(
        &self,
        service: Arc<T>,
    ) -> Result<Arc<T>, ServiceGraphError> {
        let name = service.name();
        let mut entries = self.entries.lock().await;
        if entries.contains_key(&name) {
            return Err(ServiceGraphError::AlreadyRegistered(name));
        }
        let (tx, _rx) = broadcast::channel(LIFECYCLE_CHANNEL_CAPACITY);
        let any: Arc<dyn Any + Send + Sync> = service.clone();
        entries.insert(
            name.clone(),
            Entry {
                service: service.clone() as Arc<dyn Service>,
                any,
                lifecycle: tx,
            },
        );
        drop(entries);
        self.registration_order.lock().await.push(name);
        Ok(service)
    }

    pub async fn subscribe(
        &self,
        name: &ServiceName,
    ) -> Result<broadcast::Receiver<LifecycleEvent>, ServiceGraphError> {
        let entries = self.entries.lock().await;
        let entry = entries.get(name).ok_or_else(|| ServiceGraphError::Unknown(name.clone()))?;
        Ok(entry.lifecycle.subscribe())
    }

    /// Typed service discovery: fails if the service is unregistered, not
    /// yet started, or registered under a different concrete type — never
    /// hands back a service that has not finished starting (spec.md §4.I
    /// "Service discovery... rejects if that service is not yet started").
    pub async fn get<T: Service + 'static>(&self, name: &ServiceName) -> Result<Arc<T>, ServiceGraphError> {
        let entries = self.entries.lock().await;
        let entry = entries.get(name).ok_or_else(|| ServiceGraphError::Unknown(name.clone()))?;
        if !entry.service.started() {
            return Err(ServiceGraphError::NotStarted(name.clone()));
        }
        entry
            .any
            .clone()
            .downcast::<T>()
            .map_err(|_| ServiceGraphError::TypeMismatch { name: name.clone() })
    }

    /// Computes the start order: a service only appears once every
    /// dependency it names has already appeared, with registration order
    /// breaking ties among services simultaneously eligible.
    async fn topological_order(&self) -> Result<Vec<ServiceName>, ServiceGraphError> {
        let entries = self.entries.lock().await;
        let order = self.registration_order.lock().await.clone();

        let mut remaining_deps: HashMap<ServiceName, Vec<ServiceName>> = HashMap::new();
        for name in &order {
            let deps = entries
                .get(name)
                .map(|e| e.service.dependencies())
                .unwrap_or_default();
            remaining_deps.insert(name.clone(), deps);
        }

        let mut result = Vec::with_capacity(order.len());
        let mut done: std::collections::HashSet<ServiceName> = std::collections::HashSet::new();

        while result.len() < order.len() {
            let mut progressed = false;
            for name in &order {
                if done.contains(name) {
                    continue;
                }
                let deps = &remaining_deps[name];
                // A dependency nobody registered can never become "done";
                // `start()`'s own per-dependency check reports that case as
                // `DependencyNotStarted`, so it must not block the sort here
                // and masquerade as a cycle among registered services.
                if deps.iter().all(|d| done.contains(d) || !entries.contains_key(d)) {
                    done.insert(name.clone());
                    result.push(name.clone());
                    progressed = true;
                }
            }
            if !progressed {
                let stuck: Vec<ServiceName> = order.iter().filter(|n| !done.contains(*n)).cloned().collect();
                return Err(ServiceGraphError::DependencyCycle(stuck));
            }
        }
        Ok(result)
    }

    /// Starts every registered service, dependencies first. Aborts on the
    /// first failure — every service after it in start order depends
    /// (directly or transitively) on something that did not start.
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<(), ServiceGraphError> {
        let order = self.topological_order().await?;

        for name in &order {
            let service = {
                let entries = self.entries.lock().await;
                entries.get(name).expect("name came from this graph's own order").service.clone()
            };

            for dep in service.dependencies() {
                // A dependency nobody registered is reported the same way
                // as one that simply hasn't started yet, rather than a
                // separate `Unknown` case the caller would need to special-case.
                let dep_started = {
                    let entries = self.entries.lock().await;
                    entries.get(&dep).map(|e| e.service.started()).unwrap_or(false)
                };
                if !dep_started {
                    return Err(ServiceGraphError::DependencyNotStarted {
                        service: name.clone(),
                        dependency: dep,
                    });
                }
            }

            service.start().await.map_err(|source| ServiceGraphError::StartFailed {
                service: name.clone(),
                source,
            })?;
            info!(service = %name, "service started");
            self.broadcast(name, LifecycleEvent::Started).await;
            self.broadcast(name, LifecycleEvent::Initialized).await;
        }
        Ok(())
    }

    /// Stops every registered service in reverse start order. A stop
    /// failure is logged and does not abort the remaining stops (spec.md
    /// §4.I).
    #[instrument(skip(self))]
    pub async fn stop(&self) -> Result<(), ServiceGraphError> {
        let mut order = self.topological_order().await?;
        order.reverse();

        for name in &order {
            let service = {
                let entries = self.entries.lock().await;
                entries.get(name).expect("name came from this graph's own order").service.clone()
            };
            if let Err(err) = service.stop().await {
                error!(service = %name, %err, "service failed to stop, continuing shutdown");
            }
            self.broadcast(name, LifecycleEvent::Stopped).await;
        }
        Ok(())
    }

    async fn broadcast(&self, name: &ServiceName, event: LifecycleEvent) {
        let entries = self.entries.lock().await;
        if let Some(entry) = entries.get(name) {
            // No active subscribers is not an error: lifecycle events are
            // fire-and-forget, per Design Notes "listener errors never
            // poison the sender".
            let _ = entry.lifecycle.send(event);
        }
    }
}
