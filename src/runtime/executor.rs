//! Conversation runtime executor

use super::Inbound;
use crate::credential::CredentialIssuer;
use crate::state_machine::event::SurveyStep;
use crate::state_machine::{render, transition, Effect, Event};
use crate::store::ConversationStore;
use crate::survey::{SurveyApi, SurveyError};
use crate::transport::{ChatId, MessageId, Placement, Reply, Transport};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Generic conversation runtime that can work with any store, survey and
/// transport implementations
pub struct ConversationRuntime<S, A, T>
where
    S: ConversationStore + 'static,
    A: SurveyApi + 'static,
    T: Transport + 'static,
{
    chat_id: ChatId,
    store: Arc<S>,
    survey: Arc<A>,
    transport: Arc<T>,
    issuer: Arc<CredentialIssuer>,
    effect_timeout: Duration,
    inbox: mpsc::Receiver<Inbound>,
}

impl<S, A, T> ConversationRuntime<S, A, T>
where
    S: ConversationStore + 'static,
    A: SurveyApi + 'static,
    T: Transport + 'static,
{
    pub fn new(
        chat_id: ChatId,
        store: Arc<S>,
        survey: Arc<A>,
        transport: Arc<T>,
        issuer: Arc<CredentialIssuer>,
        effect_timeout: Duration,
        inbox: mpsc::Receiver<Inbound>,
    ) -> Self {
        Self {
            chat_id,
            store,
            survey,
            transport,
            issuer,
            effect_timeout,
            inbox,
        }
    }

    pub async fn run(mut self) {
        tracing::debug!(chat_id = self.chat_id, "Starting conversation runtime");

        // Ends once every handle to the mailbox is dropped
        while let Some(inbound) = self.inbox.recv().await {
            self.process(inbound).await;
        }
    }

    /// Handle one inbound event and every result event it leads to
    pub async fn process(&self, inbound: Inbound) {
        let Inbound { origin, event, .. } = inbound;
        let mut state = self.store.load(self.chat_id).await;

        // Chained effects are processed in order, no recursion
        let mut events = VecDeque::from([event]);

        while let Some(event) = events.pop_front() {
            let event_name = event.name();

            let result = match transition(&state, event) {
                Ok(r) => r,
                Err(e) => {
                    tracing::debug!(
                        chat_id = self.chat_id,
                        phase = %state.phase(),
                        event = event_name,
                        error = %e,
                        "Event rejected"
                    );
                    self.deliver(render::fallback(), origin).await;
                    continue;
                }
            };

            if result.new_state.phase() != state.phase() {
                tracing::info!(
                    chat_id = self.chat_id,
                    from = %state.phase(),
                    to = %result.new_state.phase(),
                    question_id = ?result.new_state.current_question().map(|q| &q.question_id),
                    event = event_name,
                    "Conversation advanced"
                );
            }

            state = result.new_state;
            self.store.save(self.chat_id, state.clone()).await;

            for effect in result.effects {
                if let Some(next) = self.execute_effect(effect, origin).await {
                    events.push_back(next);
                }
            }
        }
    }

    async fn execute_effect(&self, effect: Effect, origin: Option<MessageId>) -> Option<Event> {
        match effect {
            Effect::Render { reply } => {
                self.deliver(reply, origin).await;
                None
            }

            Effect::LoadSurvey { test_id } => {
                let credential = match self.issuer.issue(&test_id) {
                    Ok(c) => c,
                    Err(e) => {
                        tracing::error!(chat_id = self.chat_id, error = %e, "Failed to mint credential");
                        return Some(failed(
                            SurveyStep::LoadSurvey,
                            &SurveyError::unknown(e.to_string()),
                        ));
                    }
                };

                let result = self.bounded(self.survey.fetch_summary(&credential)).await;
                Some(match result {
                    Ok(summary) => {
                        tracing::info!(
                            chat_id = self.chat_id,
                            test_id = %test_id,
                            expires_at = %credential.expires_at(),
                            "Survey loaded"
                        );
                        Event::SurveyLoaded {
                            test_id,
                            credential,
                            summary,
                        }
                    }
                    Err(e) => failed(SurveyStep::LoadSurvey, &e),
                })
            }

            Effect::OpenSession {
                credential,
                setup_answers,
            } => {
                let result = self
                    .bounded(async {
                        let session_id = self
                            .survey
                            .create_session(&credential, &setup_answers)
                            .await?;
                        let question = self.survey.start_session(&credential, &session_id).await?;
                        Ok::<_, SurveyError>((session_id, question))
                    })
                    .await;

                Some(match result {
                    Ok((session_id, question)) => Event::SessionOpened {
                        session_id,
                        question,
                    },
                    Err(e) => failed(SurveyStep::OpenSession, &e),
                })
            }

            Effect::SubmitAnswer {
                credential,
                session_id,
                question_id,
                payload,
            } => {
                let result = self
                    .bounded(self.survey.submit_answer(
                        &credential,
                        &session_id,
                        &question_id,
                        &payload,
                    ))
                    .await;

                Some(match result {
                    Ok(()) => Event::AnswerRecorded,
                    Err(e) => failed(SurveyStep::SubmitAnswer, &e),
                })
            }

            Effect::Advance {
                credential,
                session_id,
                is_last,
            } => {
                let result = self
                    .bounded(async {
                        if is_last {
                            self.survey.complete_session(&credential, &session_id).await?;
                            Ok::<_, SurveyError>(None)
                        } else {
                            let next = self
                                .survey
                                .fetch_next_question(&credential, &session_id)
                                .await?;
                            Ok(Some(next))
                        }
                    })
                    .await;

                Some(match result {
                    Ok(next) => Event::Advanced { next },
                    Err(e) => failed(SurveyStep::Advance, &e),
                })
            }
        }
    }

    /// Run survey calls under the effect timeout
    async fn bounded<R>(
        &self,
        calls: impl Future<Output = Result<R, SurveyError>>,
    ) -> Result<R, SurveyError> {
        match tokio::time::timeout(self.effect_timeout, calls).await {
            Ok(result) => result,
            Err(_) => Err(SurveyError::network(format!(
                "Survey request timed out after {}s",
                self.effect_timeout.as_secs()
            ))),
        }
    }

    /// Deliver a reply; failures are logged and never retried
    async fn deliver(&self, reply: Reply, origin: Option<MessageId>) {
        if let (Placement::ReplaceOrigin, Some(message_id)) = (reply.placement, origin) {
            match self.transport.edit(self.chat_id, message_id, &reply).await {
                Ok(()) => return,
                Err(e) => {
                    tracing::warn!(
                        chat_id = self.chat_id,
                        message_id,
                        error = %e,
                        "Failed to edit message, sending a new one"
                    );
                }
            }
        }

        if let Err(e) = self.transport.send(self.chat_id, &reply).await {
            tracing::error!(chat_id = self.chat_id, error = %e, "Failed to deliver reply");
        }
    }
}

fn failed(step: SurveyStep, error: &SurveyError) -> Event {
    Event::RequestFailed {
        step,
        kind: error.kind,
        message: error.message.clone(),
    }
}
