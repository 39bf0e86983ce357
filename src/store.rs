use crate::models::chat::{ ChatMessage, Conversation, ConversationId };
use log::debug;

/// Ordered, in-memory set of conversations plus the active selection.
///
/// Every mutation is synchronous and infallible. Operations addressed at an
/// unknown id leave the store untouched and report `false`/`None`.
#[derive(Debug, Default, Clone)]
pub struct ConversationStore {
    conversations: Vec<Conversation>,
    active: Option<ConversationId>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding one auto-created conversation, already active.
    pub fn with_initial_conversation() -> Self {
        let mut store = Self::new();
        store.create();
        store
    }

    pub fn create(&mut self) -> ConversationId {
        let conversation = Conversation::new(format!("Conversation #{}", self.conversations.len() + 1));
        let id = conversation.id;
        debug!("Created conversation {} ({})", id, conversation.name);
        self.conversations.push(conversation);
        self.active = Some(id);
        id
    }

    pub fn rename(&mut self, id: ConversationId, new_name: impl Into<String>) -> bool {
        match self.get_mut(id) {
            Some(conversation) => {
                conversation.name = new_name.into();
                true
            }
            None => {
                debug!("Rename ignored, unknown conversation {}", id);
                false
            }
        }
    }

    pub fn delete(&mut self, id: ConversationId) -> bool {
        let Some(index) = self.position(id) else {
            debug!("Delete ignored, unknown conversation {}", id);
            return false;
        };
        self.conversations.remove(index);

        if self.active == Some(id) {
            // Same slot first, then the one before it.
            let next = self.conversations
                .get(index)
                .or_else(|| index.checked_sub(1).and_then(|i| self.conversations.get(i)));
            self.active = next.map(|c| c.id);
        }
        true
    }

    pub fn select(&mut self, id: ConversationId) -> bool {
        if self.position(id).is_none() {
            debug!("Select ignored, unknown conversation {}", id);
            return false;
        }
        self.active = Some(id);
        true
    }

    pub fn append_message(&mut self, id: ConversationId, message: ChatMessage) -> bool {
        match self.get_mut(id) {
            Some(conversation) => {
                conversation.messages.push(message);
                true
            }
            None => {
                debug!("Append ignored, unknown conversation {}", id);
                false
            }
        }
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn get(&self, id: ConversationId) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn active_id(&self) -> Option<ConversationId> {
        self.active
    }

    pub fn active(&self) -> Option<&Conversation> {
        self.active.and_then(|id| self.get(id))
    }

    pub fn active_messages(&self) -> &[ChatMessage] {
        self.active().map(|c| c.messages.as_slice()).unwrap_or(&[])
    }

    /// Id of the conversation at a 1-based list position.
    pub fn id_at(&self, position: usize) -> Option<ConversationId> {
        position
            .checked_sub(1)
            .and_then(|i| self.conversations.get(i))
            .map(|c| c.id)
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    fn position(&self, id: ConversationId) -> Option<usize> {
        self.conversations.iter().position(|c| c.id == id)
    }

    fn get_mut(&mut self, id: ConversationId) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|c| c.id == id)
    }
}
