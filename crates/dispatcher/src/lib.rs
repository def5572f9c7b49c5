//! Request-reply dispatch over named methods grouped by prefix, exposed
//! as external RPC (spec.md §4.J).

mod dispatcher;
mod error;
mod params;
mod rpc;
mod table;
mod tables;

pub use dispatcher::Dispatcher;
pub use error::DispatchError;
pub use rpc::{ErrorObject, Request, Response};
pub use table::{MethodHandler, MethodTable};
pub use tables::{ChainStoreMethods, WalletMethods};
