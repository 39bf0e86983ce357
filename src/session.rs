use crate::models::chat::{ ChatMessage, ConversationId };
use crate::store::ConversationStore;
use serde::Serialize;
use std::sync::{ Arc, Mutex, MutexGuard, PoisonError };
use tokio::sync::watch;

#[derive(Debug, Default)]
pub struct SessionState {
    pub(crate) store: ConversationStore,
    pub(crate) in_flight: usize,
    pub(crate) session_token: Option<String>,
}

impl SessionState {
    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn pending(&self) -> bool {
        self.in_flight > 0
    }

    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            conversations: self.store
                .conversations()
                .iter()
                .map(|c| ConversationSummary {
                    id: c.id,
                    name: c.name.clone(),
                    message_count: c.messages.len(),
                })
                .collect(),
            active: self.store.active_id(),
            messages: self.store.active_messages().to_vec(),
            pending: self.pending(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConversationSummary {
    pub id: ConversationId,
    pub name: String,
    pub message_count: usize,
}

/// What a front end needs to draw: the list, the active thread and the loading flag.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub conversations: Vec<ConversationSummary>,
    pub active: Option<ConversationId>,
    pub messages: Vec<ChatMessage>,
    pub pending: bool,
}

struct Inner {
    state: Mutex<SessionState>,
    snapshots: watch::Sender<SessionSnapshot>,
}

/// State owned by one front-end instance. Cloning shares the same session.
///
/// Every mutation goes through [`Session::update`], which publishes a fresh
/// [`SessionSnapshot`] to subscribers while still holding the lock, so
/// snapshots are observed in mutation order.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

impl Session {
    pub fn new() -> Self {
        Self::from_store(ConversationStore::with_initial_conversation())
    }

    pub fn from_store(store: ConversationStore) -> Self {
        let state = SessionState { store, ..SessionState::default() };
        let (snapshots, _) = watch::channel(state.snapshot());
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                snapshots,
            }),
        }
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut state = self.lock();
        let result = f(&mut state);
        self.inner.snapshots.send_replace(state.snapshot());
        result
    }

    /// Like `update`, but subscribers only hear about it when `f` succeeds.
    /// `f` must leave the state untouched when it returns `Err`.
    pub fn try_update<T, E>(&self, f: impl FnOnce(&mut SessionState) -> Result<T, E>) -> Result<T, E> {
        let mut state = self.lock();
        let result = f(&mut state)?;
        self.inner.snapshots.send_replace(state.snapshot());
        Ok(result)
    }

    pub fn read<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        f(&self.lock())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.snapshots.subscribe()
    }

    pub fn create_conversation(&self) -> ConversationId {
        self.update(|state| state.store.create())
    }

    pub fn rename_conversation(&self, id: ConversationId, name: impl Into<String>) -> bool {
        let name = name.into();
        self.apply(|state| state.store.rename(id, name))
    }

    pub fn delete_conversation(&self, id: ConversationId) -> bool {
        self.apply(|state| state.store.delete(id))
    }

    pub fn select_conversation(&self, id: ConversationId) -> bool {
        self.apply(|state| state.store.select(id))
    }

    /// Runs a store mutator that reports whether it changed anything.
    fn apply(&self, f: impl FnOnce(&mut SessionState) -> bool) -> bool {
        self.try_update(|state| if f(state) { Ok(()) } else { Err(()) }).is_ok()
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
