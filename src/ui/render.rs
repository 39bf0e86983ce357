use crate::models::chat::{ ChatMessage, ConversationId };
use crate::session::SessionSnapshot;

pub const WELCOME: &str = "Welcome! I am your AI assistant. Ask me a question or start a discussion.";
pub const THINKING: &str = "Assistant is thinking…";

pub fn format_message(message: &ChatMessage) -> String {
    format!("{}: {}", message.sender, message.text)
}

pub fn render_conversation_list(snapshot: &SessionSnapshot) -> Vec<String> {
    if snapshot.conversations.is_empty() {
        return vec!["No conversations. Type /new to start one.".to_string()];
    }
    snapshot.conversations
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let marker = if Some(c.id) == snapshot.active { '*' } else { ' ' };
            format!("{} {}. {} ({} messages)", marker, i + 1, c.name, c.message_count)
        })
        .collect()
}

/// Turns successive snapshots into the lines a terminal still has to print.
///
/// Switching conversation prints the whole thread under a header; otherwise
/// only messages appended since the previous snapshot are emitted.
#[derive(Debug, Default)]
pub struct TranscriptRenderer {
    shown: Option<Option<ConversationId>>,
    rendered: usize,
    pending: bool,
}

impl TranscriptRenderer {
    pub fn render(&mut self, snapshot: &SessionSnapshot) -> Vec<String> {
        let mut lines = Vec::new();

        if self.shown != Some(snapshot.active) {
            self.shown = Some(snapshot.active);
            self.rendered = 0;
            self.pending = false;
            match snapshot.conversations.iter().find(|c| Some(c.id) == snapshot.active) {
                Some(conversation) => {
                    lines.push(format!("── {} ──", conversation.name));
                    if snapshot.messages.is_empty() && !snapshot.pending {
                        lines.push(WELCOME.to_string());
                    }
                }
                None => lines.push("No conversation selected. Type /new to start one.".to_string()),
            }
        }

        let start = self.rendered.min(snapshot.messages.len());
        lines.extend(snapshot.messages[start..].iter().map(format_message));
        self.rendered = snapshot.messages.len();

        if snapshot.pending && !self.pending {
            lines.push(THINKING.to_string());
        }
        self.pending = snapshot.pending;
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ConversationSummary;

    fn snapshot(names: &[&str], active: usize, messages: Vec<ChatMessage>, pending: bool) -> SessionSnapshot {
        let conversations: Vec<_> = names
            .iter()
            .map(|name| ConversationSummary {
                id: ConversationId::new(),
                name: name.to_string(),
                message_count: 0,
            })
            .collect();
        SessionSnapshot {
            active: conversations.get(active).map(|c| c.id),
            conversations,
            messages,
            pending,
        }
    }

    #[test]
    fn fresh_conversation_shows_header_and_welcome() {
        let mut renderer = TranscriptRenderer::default();
        let state = snapshot(&["Conversation #1"], 0, vec![], false);
        let lines = renderer.render(&state);
        assert_eq!(lines, vec!["── Conversation #1 ──".to_string(), WELCOME.to_string()]);
        assert!(renderer.render(&state).is_empty());
    }

    #[test]
    fn only_new_messages_and_pending_transitions_are_emitted() {
        let mut renderer = TranscriptRenderer::default();
        let mut state = snapshot(&["A"], 0, vec![], false);
        renderer.render(&state);

        state.messages.push(ChatMessage::user("hello"));
        state.pending = true;
        assert_eq!(renderer.render(&state), vec!["You: hello".to_string(), THINKING.to_string()]);

        state.messages.push(ChatMessage::assistant("hi"));
        state.pending = false;
        assert_eq!(renderer.render(&state), vec!["Assistant: hi".to_string()]);
        assert!(renderer.render(&state).is_empty());
    }

    #[test]
    fn switching_conversation_replays_thread() {
        let mut renderer = TranscriptRenderer::default();
        let mut state = snapshot(&["A", "B"], 0, vec![], false);
        renderer.render(&state);

        state.active = Some(state.conversations[1].id);
        state.messages = vec![ChatMessage::user("one"), ChatMessage::assistant("two")];
        assert_eq!(
            renderer.render(&state),
            vec!["── B ──".to_string(), "You: one".to_string(), "Assistant: two".to_string()]
        );
    }

    #[test]
    fn empty_session_prompts_for_new_conversation() {
        let mut renderer = TranscriptRenderer::default();
        let lines = renderer.render(&snapshot(&[], 0, vec![], false));
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("/new"));
    }

    #[test]
    fn list_marks_active_entry() {
        let state = snapshot(&["A", "B"], 1, vec![], false);
        assert_eq!(
            render_conversation_list(&state),
            vec!["  1. A (0 messages)".to_string(), "* 2. B (0 messages)".to_string()]
        );
    }
}
