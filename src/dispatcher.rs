use crate::backend::{ ChatBackend, ChatRequest };
use crate::models::chat::{ ChatMessage, ConversationId };
use crate::session::Session;
use crate::store::ConversationStore;
use log::{ debug, error, info };
use std::sync::Arc;

pub const DEFAULT_ERROR_TEXT: &str =
    "Sorry, the assistant could not be reached. Please try again in a moment.";
pub const DEFAULT_PAGE_CONTENT_LIMIT: usize = 4000;

#[derive(Debug, Clone)]
pub struct DispatchOptions {
    pub error_text: String,
    pub page_content_limit: usize,
    /// Let a second send start while one is still awaiting the backend.
    pub allow_overlapping_sends: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            error_text: DEFAULT_ERROR_TEXT.to_string(),
            page_content_limit: DEFAULT_PAGE_CONTENT_LIMIT,
            allow_overlapping_sends: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    EmptyMessage,
    NoActiveConversation,
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The backend answered and its text was appended.
    Delivered,
    /// The call failed and the fixed error text was appended instead.
    Failed,
    Rejected(RejectReason),
}

/// Routes one user message to the active conversation and its reply back.
#[derive(Clone)]
pub struct MessageDispatcher {
    session: Session,
    backend: Arc<dyn ChatBackend>,
    options: DispatchOptions,
}

impl MessageDispatcher {
    pub fn new(session: Session, backend: Arc<dyn ChatBackend>, options: DispatchOptions) -> Self {
        Self { session, backend, options }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn send(&self, text: &str, page_content: Option<&str>) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SendOutcome::Rejected(RejectReason::EmptyMessage);
        }

        let allow_overlap = self.options.allow_overlapping_sends;
        let prepared = self.session.try_update(|state| {
            let Some(target) = state.store.active_id() else {
                return Err(RejectReason::NoActiveConversation);
            };
            if state.in_flight > 0 && !allow_overlap {
                return Err(RejectReason::Busy);
            }
            state.store.append_message(target, ChatMessage::user(text));
            state.in_flight += 1;
            Ok((target, state.session_token.clone()))
        });
        let (target, token) = match prepared {
            Ok(prepared) => prepared,
            Err(reason) => {
                debug!("Send rejected: {:?}", reason);
                return SendOutcome::Rejected(reason);
            }
        };
        let _pending = PendingGuard { session: &self.session };

        let request = ChatRequest {
            message: text.to_string(),
            conversation_id: token,
            page_content: page_content.and_then(|c| clip_page_content(c, self.options.page_content_limit)),
        };

        match self.backend.exchange(&request).await {
            Ok(reply) => {
                let shown = reply.display_text().map(str::to_string);
                self.session.update(|state| {
                    if let Some(token) = reply.conversation_id {
                        state.session_token = Some(token);
                    }
                    match shown {
                        Some(text) => {
                            append_reply(&mut state.store, target, ChatMessage::assistant(text));
                            SendOutcome::Delivered
                        }
                        None => {
                            error!("Backend at {} answered without a reply", self.backend.endpoint());
                            append_reply(&mut state.store, target, ChatMessage::assistant(&self.options.error_text));
                            SendOutcome::Failed
                        }
                    }
                })
            }
            Err(e) => {
                error!("Chat request to {} failed: {}", self.backend.endpoint(), e);
                self.session.update(|state| {
                    append_reply(&mut state.store, target, ChatMessage::assistant(&self.options.error_text));
                });
                SendOutcome::Failed
            }
        }
    }
}

fn append_reply(store: &mut ConversationStore, target: ConversationId, message: ChatMessage) {
    if !store.append_message(target, message) {
        info!("Conversation {} was deleted before its reply arrived", target);
    }
}

/// Releases one in-flight slot on every exit path, cancellation included.
struct PendingGuard<'a> {
    session: &'a Session,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.session.update(|state| {
            state.in_flight = state.in_flight.saturating_sub(1);
        });
    }
}

/// Collapses whitespace and keeps at most `limit` characters. Blank input yields `None`.
pub fn clip_page_content(content: &str, limit: usize) -> Option<String> {
    let clipped: String = content
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(limit)
        .collect();
    let clipped = clipped.trim_end().to_string();
    if clipped.is_empty() { None } else { Some(clipped) }
}
