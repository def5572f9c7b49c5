use std::collections::HashMap;

use tracing::{instrument, warn};

use crate::error::DispatchError;
use crate::rpc::{Request, Response};
use crate::table::{MethodHandler, MethodTable};

/// Assembles every registered [`MethodTable`] into one `prefix+name ->
/// callable` map and resolves incoming requests against it (spec.md
/// §4.J).
///
/// Registering two tables whose `prefix+name` collide is a programmer
/// error caught at registration, not silently resolved by
/// last-writer-wins — matching the teacher's fail-fast registration
/// style over a route table built once at startup.
#[derive(Default)]
pub struct Dispatcher {
    methods: HashMap<String, MethodHandler>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            methods: HashMap::new(),
        }
    }

    pub fn register(&mut self, table: &dyn MethodTable) {
        for (name, handler) in table.methods() {
            let full_name = format!("{}{}", table.prefix(), name);
            if self.methods.insert(full_name.clone(), handler).is_some() {
                panic!("duplicate RPC method registered: {full_name}");
            }
        }
    }

    pub fn method_names(&self) -> Vec<&str> {
        self.methods.keys().map(String::as_str).collect()
    }

    #[instrument(skip(self, request))]
    pub fn dispatch(&self, request: Request) -> Response {
        match self.dispatch_method(&request.method, request.params.clone()) {
            Ok(result) => Response::success(request.id, result),
            Err(err) => {
                warn!(method = %request.method, code = err.code(), "dispatch failed");
                Response::error(request.id, err)
            }
        }
    }

    fn dispatch_method(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, DispatchError> {
        let handler = self
            .methods
            .get(method)
            .ok_or_else(|| DispatchError::MethodNotFound(method.to_string()))?;
        handler(params)
    }
}
