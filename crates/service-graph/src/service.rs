use std::any::Any;

use async_trait::async_trait;

use crate::name::ServiceName;

/// A unit the graph can start, stop, and discover dependencies on.
///
/// Per the Design Notes ("Inheritance hierarchies... replaced by small
/// trait/interface sets per capability"), this is a single narrow trait
/// every cooperating module implements directly, rather than a base class
/// with no-op defaults — there is nothing optional here.
#[async_trait]
pub trait Service: Any + Send + Sync {
    fn name(&self) -> ServiceName;

    /// Names of the services this one reads from; the graph guarantees
    /// they are started before this service's `start` is called.
    fn dependencies(&self) -> Vec<ServiceName>;

    async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn stop(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    fn started(&self) -> bool;

    /// Enables downcasting a type-erased `Arc<dyn Service>` back to its
    /// concrete type for typed service discovery (`ServiceGraph::get`).
    fn as_any(&self) -> &dyn Any;
}
