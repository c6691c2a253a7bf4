//! Telegram Bot API adapter
//!
//! Long-polls `getUpdates`, turns commands, messages and button presses into
//! runtime events, and renders replies with inline keyboards.

use super::{ChatId, MessageId, Reply, Transport, TransportError};
use crate::runtime::{Inbound, RuntimeManager};
use crate::state_machine::Event;
use crate::store::ConversationStore;
use crate::survey::SurveyApi;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Seconds a `getUpdates` call may wait for new updates
const LONG_POLL_SECS: u64 = 30;
const RETRY_DELAY: Duration = Duration::from_secs(5);
/// Bot API description of an edit that would change nothing
const NOT_MODIFIED: &str = "message is not modified";

pub struct TelegramTransport {
    client: Client,
    /// `<api>/bot<token>`
    endpoint: String,
}

impl std::fmt::Debug for TelegramTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramTransport").finish_non_exhaustive()
    }
}

impl TelegramTransport {
    pub fn new(api_url: &str, token: &str) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(LONG_POLL_SECS * 2))
            .build()
            .map_err(|e| TransportError::Request(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/bot{token}", api_url.trim_end_matches('/')),
        })
    }

    /// Call a Bot API method and unwrap its `result`
    async fn call<B, R>(&self, method: &str, body: &B) -> Result<R, TransportError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned + Send,
    {
        let response: ApiResponse<R> = self
            .client
            .post(format!("{}/{method}", self.endpoint))
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::Request(format!("{method}: {e}")))?
            .json()
            .await
            .map_err(|e| TransportError::Request(format!("{method}: failed to parse response: {e}")))?;

        match response {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse { description, .. } => Err(TransportError::Rejected(format!(
                "{method}: {}",
                description.unwrap_or_else(|| "no description".to_string())
            ))),
        }
    }

    async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TransportError> {
        self.call(
            "getUpdates",
            &GetUpdatesRequest {
                offset,
                timeout: LONG_POLL_SECS,
                allowed_updates: &["message", "callback_query"],
            },
        )
        .await
    }

    /// Stop the client's spinner on a pressed button
    async fn answer_callback(&self, callback_query_id: &str) -> Result<(), TransportError> {
        self.call::<_, bool>(
            "answerCallbackQuery",
            &AnswerCallbackRequest { callback_query_id },
        )
        .await
        .map(|_| ())
    }

    /// Start the long-polling loop
    ///
    /// Runs until `cancel` fires; meant to be awaited from `main`.
    pub async fn start_polling<S, A, T>(
        &self,
        manager: &RuntimeManager<S, A, T>,
        cancel: &CancellationToken,
    ) where
        S: ConversationStore + 'static,
        A: SurveyApi + 'static,
        T: Transport + 'static,
    {
        tracing::info!("Starting Telegram long-polling loop");
        let mut offset = 0;

        loop {
            let updates = tokio::select! {
                () = cancel.cancelled() => break,
                updates = self.get_updates(offset) => updates,
            };

            match updates {
                Ok(updates) => {
                    for update in updates {
                        offset = update.update_id + 1;
                        self.handle_update(manager, update).await;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to fetch Telegram updates");
                    tokio::select! {
                        () = cancel.cancelled() => break,
                        () = tokio::time::sleep(RETRY_DELAY) => {}
                    }
                }
            }
        }

        tracing::info!("Telegram polling stopped");
    }

    async fn handle_update<S, A, T>(&self, manager: &RuntimeManager<S, A, T>, update: Update)
    where
        S: ConversationStore + 'static,
        A: SurveyApi + 'static,
        T: Transport + 'static,
    {
        if let Some(query) = &update.callback_query {
            if let Err(e) = self.answer_callback(&query.id).await {
                tracing::warn!(error = %e, "Failed to acknowledge callback query");
            }
        }

        match update.into_inbound() {
            Some(inbound) => {
                tracing::debug!(
                    chat_id = inbound.chat_id,
                    event = inbound.event.name(),
                    "Received update"
                );
                manager.dispatch(inbound).await;
            }
            None => tracing::debug!("Ignoring update without text or callback data"),
        }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send(&self, chat_id: ChatId, reply: &Reply) -> Result<MessageId, TransportError> {
        let sent: SentMessage = self
            .call(
                "sendMessage",
                &SendMessageRequest {
                    chat_id,
                    text: &reply.text,
                    reply_markup: keyboard(reply),
                },
            )
            .await?;
        Ok(sent.message_id)
    }

    async fn edit(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        reply: &Reply,
    ) -> Result<(), TransportError> {
        // Telegram answers `true` for inline messages and the message otherwise
        let result = self
            .call::<_, serde_json::Value>(
                "editMessageText",
                &EditMessageRequest {
                    chat_id,
                    message_id,
                    text: &reply.text,
                    reply_markup: keyboard(reply),
                },
            )
            .await;

        match result {
            Ok(_) => Ok(()),
            // The message already shows this reply
            Err(TransportError::Rejected(message)) if message.contains(NOT_MODIFIED) => {
                tracing::debug!(chat_id, message_id, "Message already up to date");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// One button per row, as the survey lists answers vertically
fn keyboard(reply: &Reply) -> Option<InlineKeyboardMarkup<'_>> {
    if reply.actions.is_empty() {
        return None;
    }
    Some(InlineKeyboardMarkup {
        inline_keyboard: reply
            .actions
            .iter()
            .map(|action| {
                vec![InlineKeyboardButton {
                    text: &action.label,
                    callback_data: &action.payload,
                }]
            })
            .collect(),
    })
}

/// Argument of a `/start` command; `None` when the text is not one
fn parse_start_command(text: &str) -> Option<Option<String>> {
    let mut parts = text.split_whitespace();
    let command = parts.next()?;
    let name = command.split('@').next()?;
    if name != "/start" {
        return None;
    }
    Some(parts.next().map(str::to_string))
}

// Telegram API types

#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Serialize)]
struct GetUpdatesRequest<'a> {
    offset: i64,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

#[derive(Serialize)]
struct AnswerCallbackRequest<'a> {
    callback_query_id: &'a str,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: ChatId,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<InlineKeyboardMarkup<'a>>,
}

#[derive(Serialize)]
struct EditMessageRequest<'a> {
    chat_id: ChatId,
    message_id: MessageId,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<InlineKeyboardMarkup<'a>>,
}

#[derive(Serialize)]
struct InlineKeyboardMarkup<'a> {
    inline_keyboard: Vec<Vec<InlineKeyboardButton<'a>>>,
}

#[derive(Serialize)]
struct InlineKeyboardButton<'a> {
    text: &'a str,
    callback_data: &'a str,
}

#[derive(Deserialize)]
struct SentMessage {
    message_id: MessageId,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<Message>,
    callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Deserialize)]
struct Message {
    message_id: MessageId,
    chat: Chat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: ChatId,
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    id: String,
    message: Option<Message>,
    data: Option<String>,
}

impl Update {
    fn into_inbound(self) -> Option<Inbound> {
        if let Some(query) = self.callback_query {
            let message = query.message?;
            let data = query.data?;
            return Some(Inbound {
                chat_id: message.chat.id,
                origin: Some(message.message_id),
                event: Event::from_callback(&data),
            });
        }

        let message = self.message?;
        let text = message.text?;
        let event = match parse_start_command(&text) {
            Some(test_id) => Event::StartCommand { test_id },
            None => Event::UserText { text },
        };
        Some(Inbound {
            chat_id: message.chat.id,
            origin: None,
            event,
        })
    }
}
