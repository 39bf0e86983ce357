pub mod websocket;

use crate::backend::ChatBackend;
use crate::dispatcher::DispatchOptions;
use std::error::Error;
use std::sync::Arc;

pub struct Server {
    addr: String,
    backend: Arc<dyn ChatBackend>,
    options: DispatchOptions,
}

impl Server {
    pub fn new(
        addr: String,
        backend: Arc<dyn ChatBackend>,
        options: DispatchOptions,
    ) -> Self {
        Self {
            addr,
            backend,
            options,
        }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        websocket::start_ws_server(
            &self.addr,
            self.backend.clone(),
            self.options.clone(),
        ).await
    }
}
