//! Runtime for executing conversations
//!
//! One task per chat, fed through a bounded mailbox, so events of a single
//! conversation are handled strictly one at a time while different chats run
//! concurrently.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::ConversationRuntime;

use crate::credential::CredentialIssuer;
use crate::state_machine::Event;
use crate::store::{ConversationStore, InMemoryStore};
use crate::survey::{LoggingSurveyApi, SurveyApi};
use crate::transport::{ChatId, MessageId, TelegramTransport, Transport};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Runtime wired with the production adapters
pub type ProductionManager = RuntimeManager<InMemoryStore, LoggingSurveyApi, TelegramTransport>;

const MAILBOX_CAPACITY: usize = 32;

/// An event addressed to one chat
#[derive(Debug, Clone)]
pub struct Inbound {
    pub chat_id: ChatId,
    /// Message whose button produced the event
    pub origin: Option<MessageId>,
    pub event: Event,
}

#[derive(Debug, Clone, Copy)]
pub struct RuntimeSettings {
    /// Upper bound for one effect, all of its survey calls included
    pub effect_timeout: Duration,
    pub conversation_ttl: Duration,
    pub eviction_interval: Duration,
}

/// Outcome of handing an event to a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Queued,
    /// The conversation is backed up or gone
    Dropped,
}

/// Handle to interact with a running conversation
#[derive(Clone)]
pub struct ConversationHandle {
    pub inbox: mpsc::Sender<Inbound>,
}

/// Manager for all conversation runtimes
pub struct RuntimeManager<S, A, T>
where
    S: ConversationStore + 'static,
    A: SurveyApi + 'static,
    T: Transport + 'static,
{
    store: Arc<S>,
    survey: Arc<A>,
    transport: Arc<T>,
    issuer: Arc<CredentialIssuer>,
    settings: RuntimeSettings,
    runtimes: RwLock<HashMap<ChatId, ConversationHandle>>,
}

impl<S, A, T> RuntimeManager<S, A, T>
where
    S: ConversationStore + 'static,
    A: SurveyApi + 'static,
    T: Transport + 'static,
{
    pub fn new(
        store: Arc<S>,
        survey: Arc<A>,
        transport: Arc<T>,
        issuer: Arc<CredentialIssuer>,
        settings: RuntimeSettings,
    ) -> Self {
        Self {
            store,
            survey,
            transport,
            issuer,
            settings,
            runtimes: RwLock::new(HashMap::new()),
        }
    }

    /// Hand an event to its conversation, starting the runtime if needed
    ///
    /// Never waits on a busy conversation: when its mailbox is full the
    /// event is dropped, so one stuck chat cannot hold up the others.
    pub async fn dispatch(&self, inbound: Inbound) -> Dispatch {
        let chat_id = inbound.chat_id;
        let handle = self.get_or_create(chat_id).await;

        let inbound = match handle.inbox.try_send(inbound) {
            Ok(()) => return Dispatch::Queued,
            Err(mpsc::error::TrySendError::Full(inbound)) => {
                tracing::warn!(
                    chat_id,
                    event = inbound.event.name(),
                    "Conversation mailbox full, dropping event"
                );
                return Dispatch::Dropped;
            }
            Err(mpsc::error::TrySendError::Closed(inbound)) => inbound,
        };

        // The runtime ended between lookup and send; start a fresh one
        tracing::warn!(chat_id, "Conversation runtime gone, restarting");
        self.runtimes.write().await.remove(&chat_id);
        let handle = self.get_or_create(chat_id).await;
        if handle.inbox.try_send(inbound).is_err() {
            tracing::error!(chat_id, "Failed to deliver event to conversation runtime");
            return Dispatch::Dropped;
        }
        Dispatch::Queued
    }

    pub async fn get_or_create(&self, chat_id: ChatId) -> ConversationHandle {
        // Check if already running
        {
            let runtimes = self.runtimes.read().await;
            if let Some(handle) = runtimes.get(&chat_id) {
                return handle.clone();
            }
        }

        let mut runtimes = self.runtimes.write().await;
        // Another dispatch may have started it while we waited for the lock
        if let Some(handle) = runtimes.get(&chat_id) {
            return handle.clone();
        }

        let (inbox, inbox_rx) = mpsc::channel(MAILBOX_CAPACITY);
        let runtime = ConversationRuntime::new(
            chat_id,
            self.store.clone(),
            self.survey.clone(),
            self.transport.clone(),
            self.issuer.clone(),
            self.settings.effect_timeout,
            inbox_rx,
        );

        tokio::spawn(async move {
            runtime.run().await;
            tracing::info!(chat_id, "Conversation runtime finished");
        });

        let handle = ConversationHandle { inbox };
        runtimes.insert(chat_id, handle.clone());
        handle
    }

    /// Drop conversations idle past the TTL along with their runtimes
    pub async fn evict_idle(&self) -> Vec<ChatId> {
        let evicted = self.store.evict_idle(self.settings.conversation_ttl).await;
        if !evicted.is_empty() {
            let mut runtimes = self.runtimes.write().await;
            for chat_id in &evicted {
                // Dropping the last sender ends the runtime task
                runtimes.remove(chat_id);
            }
        }
        evicted
    }

    /// Periodically evict idle conversations until cancelled
    pub fn spawn_eviction_sweeper(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        let period = self.settings.eviction_interval;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately
            interval.tick().await;

            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = interval.tick() => {
                        let evicted = manager.evict_idle().await;
                        if !evicted.is_empty() {
                            let remaining = manager.store.len().await;
                            tracing::info!(
                                evicted = evicted.len(),
                                remaining = remaining,
                                "Evicted idle conversations"
                            );
                        }
                    }
                }
            }
            tracing::info!("Eviction sweeper stopped");
        })
    }

    #[cfg(test)]
    async fn runtime_count(&self) -> usize {
        self.runtimes.read().await.len()
    }
}
