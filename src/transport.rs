//! Chat transport abstraction
//!
//! Outbound rendering types and the delivery trait. The Telegram adapter
//! also feeds inbound updates into the runtime.

mod telegram;

pub use telegram::TelegramTransport;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Chat a conversation is keyed by
pub type ChatId = i64;

/// Message within a chat
pub type MessageId = i64;

/// A labeled button carrying an opaque payload back as a callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub label: String,
    pub payload: String,
}

/// Where a reply lands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    #[default]
    NewMessage,
    /// Edit the message whose button triggered the event
    ReplaceOrigin,
}

/// A rendering instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub actions: Vec<Action>,
    pub placement: Placement,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            actions: vec![],
            placement: Placement::NewMessage,
        }
    }

    #[must_use]
    pub fn with_action(mut self, label: impl Into<String>, payload: impl Into<String>) -> Self {
        self.actions.push(Action {
            label: label.into(),
            payload: payload.into(),
        });
        self
    }

    #[must_use]
    pub fn replacing_origin(mut self) -> Self {
        self.placement = Placement::ReplaceOrigin;
        self
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport request failed: {0}")]
    Request(String),
    #[error("transport rejected request: {0}")]
    Rejected(String),
}

/// Outbound delivery
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a new message, returning its id
    async fn send(&self, chat_id: ChatId, reply: &Reply) -> Result<MessageId, TransportError>;

    /// Replace the text and actions of an existing message
    ///
    /// Succeeds when the message already shows `reply`.
    async fn edit(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        reply: &Reply,
    ) -> Result<(), TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, chat_id: ChatId, reply: &Reply) -> Result<MessageId, TransportError> {
        (**self).send(chat_id, reply).await
    }

    async fn edit(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        reply: &Reply,
    ) -> Result<(), TransportError> {
        (**self).edit(chat_id, message_id, reply).await
    }
}
