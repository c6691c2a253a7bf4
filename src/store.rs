//! Conversation state store
//!
//! Per-chat state with idle expiry. Every access goes through the chat's
//! runtime task, so the store never sees two concurrent writers for one key.

use crate::state_machine::ConvState;
use crate::transport::ChatId;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Current state, creating an idle conversation on first use
    async fn load(&self, chat_id: ChatId) -> ConvState;

    async fn save(&self, chat_id: ChatId, state: ConvState);

    /// Drop conversations untouched for longer than `max_idle`
    async fn evict_idle(&self, max_idle: Duration) -> Vec<ChatId>;

    async fn len(&self) -> usize;
}

struct Entry {
    state: ConvState,
    touched: Instant,
}

/// In-process store; lost on restart
#[derive(Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<ChatId, Entry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for InMemoryStore {
    async fn load(&self, chat_id: ChatId) -> ConvState {
        let mut entries = self.entries.write().await;
        let entry = entries.entry(chat_id).or_insert_with(|| Entry {
            state: ConvState::Idle,
            touched: Instant::now(),
        });
        entry.touched = Instant::now();
        entry.state.clone()
    }

    async fn save(&self, chat_id: ChatId, state: ConvState) {
        self.entries.write().await.insert(
            chat_id,
            Entry {
                state,
                touched: Instant::now(),
            },
        );
    }

    async fn evict_idle(&self, max_idle: Duration) -> Vec<ChatId> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let expired: Vec<ChatId> = entries
            .iter()
            .filter(|(_, entry)| now.duration_since(entry.touched) > max_idle)
            .map(|(chat_id, _)| *chat_id)
            .collect();

        for chat_id in &expired {
            entries.remove(chat_id);
        }
        expired
    }

    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl<T: ConversationStore + ?Sized> ConversationStore for std::sync::Arc<T> {
    async fn load(&self, chat_id: ChatId) -> ConvState {
        (**self).load(chat_id).await
    }

    async fn save(&self, chat_id: ChatId, state: ConvState) {
        (**self).save(chat_id, state).await;
    }

    async fn evict_idle(&self, max_idle: Duration) -> Vec<ChatId> {
        (**self).evict_idle(max_idle).await
    }

    async fn len(&self) -> usize {
        (**self).len().await
    }
}
