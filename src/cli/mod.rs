use crate::dispatcher::{ DispatchOptions, DEFAULT_ERROR_TEXT };
use clap::{ Parser, ValueEnum };
use std::fmt;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiMode {
    /// Interactive terminal chat
    Repl,
    /// WebSocket gateway for embedded page widgets
    Serve,
}

impl fmt::Display for UiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UiMode::Repl => write!(f, "repl"),
            UiMode::Serve => write!(f, "serve"),
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Front end to run (repl, serve)
    #[arg(long, env = "UI_MODE", value_enum, default_value = "repl")]
    pub mode: UiMode,

    // --- Backend Args ---
    /// Chat endpoint every message is POSTed to.
    #[arg(long, env = "CHAT_BACKEND_URL", default_value = "http://127.0.0.1:3000/chat")]
    pub backend_url: String,

    /// Assistant message shown when the backend cannot be reached or answers with an error status.
    #[arg(long, env = "CHAT_ERROR_TEXT", default_value = DEFAULT_ERROR_TEXT)]
    pub error_text: String,

    /// Maximum number of characters of page text forwarded with each message.
    #[arg(long, env = "PAGE_CONTENT_LIMIT", default_value = "4000")]
    pub page_content_limit: usize,

    /// Allow a new message to be sent while the previous one is still waiting for its reply.
    /// Replies are then appended in arrival order, which may differ from send order.
    #[arg(long, env = "ALLOW_OVERLAPPING_SENDS", default_value = "false")]
    pub allow_overlapping_sends: bool,

    // --- Gateway Args ---
    /// Host address and port for the WebSocket gateway to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:4000")]
    pub server_addr: String,

    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,
}

impl Args {
    pub fn dispatch_options(&self) -> DispatchOptions {
        DispatchOptions {
            error_text: self.error_text.clone(),
            page_content_limit: self.page_content_limit,
            allow_overlapping_sends: self.allow_overlapping_sends,
        }
    }
}
