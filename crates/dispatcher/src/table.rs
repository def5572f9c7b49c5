use serde_json::Value;

use crate::error::DispatchError;

/// A single registered method: called with the request's `params`,
/// returns the RPC `result` (or a typed failure mapped to the stable
/// error taxonomy).
pub type MethodHandler = Box<dyn Fn(Value) -> Result<Value, DispatchError> + Send + Sync>;

/// A named group of methods sharing a prefix (spec.md §4.J), e.g. the
/// `pg_` accounts group or the `pg_` chain-state group.
///
/// `methods()` is called once at registration time; nothing requires it
/// to be cheap to call repeatedly, so tables are free to build fresh
/// closures (each capturing whatever `Arc` handles they need) every time
/// it is invoked.
pub trait MethodTable: Send + Sync {
    fn prefix(&self) -> &'static str;
    fn methods(&self) -> Vec<(&'static str, MethodHandler)>;
}
