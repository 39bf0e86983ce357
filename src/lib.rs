pub mod backend;
pub mod cli;
pub mod dispatcher;
pub mod models;
pub mod server;
pub mod session;
pub mod store;
pub mod ui;

use backend::{ ChatBackend, HttpChatBackend };
use cli::{ Args, UiMode };
use dispatcher::MessageDispatcher;
use log::info;
use server::Server;
use session::Session;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Mode: {}", args.mode);
    info!("Backend URL: {}", args.backend_url);
    info!("Page Content Limit: {}", args.page_content_limit);
    info!("Overlapping Sends: {}", args.allow_overlapping_sends);
    if args.mode == UiMode::Serve {
        info!("Server Address: {}", args.server_addr);
    }
    info!("-------------------------");

    let backend: Arc<dyn ChatBackend> = Arc::new(HttpChatBackend::new(&args.backend_url)?);
    let options = args.dispatch_options();

    match args.mode {
        UiMode::Repl => {
            let dispatcher = MessageDispatcher::new(Session::new(), backend, options);
            ui::run_repl(dispatcher).await
        }
        UiMode::Serve => {
            info!("Starting gateway on: {}", args.server_addr);
            let server = Server::new(args.server_addr.clone(), backend, options);
            server.run().await
        }
    }
}
