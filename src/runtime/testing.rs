//! Mock implementations for testing
//!
//! These mocks enable runtime testing without real I/O.

use crate::credential::Credential;
use crate::survey::{AnswerPayload, Question, RemoteId, SurveyApi, SurveyError, SurveySummary};
use crate::transport::{ChatId, MessageId, Reply, Transport, TransportError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

// ============================================================================
// Mock Survey Service
// ============================================================================

/// A recorded survey call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurveyCall {
    FetchSummary,
    CreateSession {
        setup_answers: Vec<String>,
    },
    StartSession {
        session_id: RemoteId,
    },
    SubmitAnswer {
        session_id: RemoteId,
        question_id: RemoteId,
        payload: AnswerPayload,
    },
    FetchNextQuestion {
        session_id: RemoteId,
    },
    CompleteSession {
        session_id: RemoteId,
    },
}

/// Mock survey service that returns queued responses
///
/// Start and next share one question queue. Submit and complete succeed
/// unless a failure is queued; the other calls fail when nothing is queued.
#[derive(Default)]
pub struct MockSurveyApi {
    summaries: Mutex<VecDeque<Result<SurveySummary, SurveyError>>>,
    sessions: Mutex<VecDeque<Result<RemoteId, SurveyError>>>,
    questions: Mutex<VecDeque<Result<Question, SurveyError>>>,
    submits: Mutex<VecDeque<Result<(), SurveyError>>>,
    completions: Mutex<VecDeque<Result<(), SurveyError>>>,
    hang_next: AtomicBool,
    hold_next: Mutex<Option<Arc<Notify>>>,
    calls: Mutex<Vec<SurveyCall>>,
}

impl MockSurveyApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_summary(&self, result: Result<SurveySummary, SurveyError>) {
        self.summaries.lock().unwrap().push_back(result);
    }

    pub fn queue_session(&self, result: Result<RemoteId, SurveyError>) {
        self.sessions.lock().unwrap().push_back(result);
    }

    pub fn queue_question(&self, result: Result<Question, SurveyError>) {
        self.questions.lock().unwrap().push_back(result);
    }

    pub fn queue_submit(&self, result: Result<(), SurveyError>) {
        self.submits.lock().unwrap().push_back(result);
    }

    pub fn queue_complete(&self, result: Result<(), SurveyError>) {
        self.completions.lock().unwrap().push_back(result);
    }

    /// Make the next call never return
    pub fn hang_next_call(&self) {
        self.hang_next.store(true, Ordering::SeqCst);
    }

    /// Make the next call wait until the returned handle is notified
    pub fn hold_next_call(&self) -> Arc<Notify> {
        let release = Arc::new(Notify::new());
        *self.hold_next.lock().unwrap() = Some(release.clone());
        release
    }

    /// Get recorded calls
    pub fn calls(&self) -> Vec<SurveyCall> {
        self.calls.lock().unwrap().clone()
    }

    async fn record(&self, call: SurveyCall) {
        self.calls.lock().unwrap().push(call);
        if self.hang_next.swap(false, Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let hold = self.hold_next.lock().unwrap().take();
        if let Some(release) = hold {
            release.notified().await;
        }
    }

    fn next<R>(queue: &Mutex<VecDeque<Result<R, SurveyError>>>) -> Result<R, SurveyError> {
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(SurveyError::network("No mock response queued")))
    }

    fn next_ack(queue: &Mutex<VecDeque<Result<(), SurveyError>>>) -> Result<(), SurveyError> {
        queue.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}

#[async_trait]
impl SurveyApi for MockSurveyApi {
    async fn fetch_summary(&self, _credential: &Credential) -> Result<SurveySummary, SurveyError> {
        self.record(SurveyCall::FetchSummary).await;
        Self::next(&self.summaries)
    }

    async fn create_session(
        &self,
        _credential: &Credential,
        setup_answers: &[String],
    ) -> Result<RemoteId, SurveyError> {
        self.record(SurveyCall::CreateSession {
            setup_answers: setup_answers.to_vec(),
        })
        .await;
        Self::next(&self.sessions)
    }

    async fn start_session(
        &self,
        _credential: &Credential,
        session_id: &RemoteId,
    ) -> Result<Question, SurveyError> {
        self.record(SurveyCall::StartSession {
            session_id: session_id.clone(),
        })
        .await;
        Self::next(&self.questions)
    }

    async fn submit_answer(
        &self,
        _credential: &Credential,
        session_id: &RemoteId,
        question_id: &RemoteId,
        payload: &AnswerPayload,
    ) -> Result<(), SurveyError> {
        self.record(SurveyCall::SubmitAnswer {
            session_id: session_id.clone(),
            question_id: question_id.clone(),
            payload: payload.clone(),
        })
        .await;
        Self::next_ack(&self.submits)
    }

    async fn fetch_next_question(
        &self,
        _credential: &Credential,
        session_id: &RemoteId,
    ) -> Result<Question, SurveyError> {
        self.record(SurveyCall::FetchNextQuestion {
            session_id: session_id.clone(),
        })
        .await;
        Self::next(&self.questions)
    }

    async fn complete_session(
        &self,
        _credential: &Credential,
        session_id: &RemoteId,
    ) -> Result<(), SurveyError> {
        self.record(SurveyCall::CompleteSession {
            session_id: session_id.clone(),
        })
        .await;
        Self::next_ack(&self.completions)
    }
}

// ============================================================================
// Recording Transport
// ============================================================================

/// A delivered reply
#[derive(Debug, Clone)]
pub struct Delivery {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    /// Whether an existing message was edited
    pub edited: bool,
    pub reply: Reply,
}

/// Transport that records every delivery
pub struct RecordingTransport {
    next_id: AtomicI64,
    deliveries: Mutex<Vec<Delivery>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            deliveries: Mutex::new(Vec::new()),
        }
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, chat_id: ChatId, reply: &Reply) -> Result<MessageId, TransportError> {
        let message_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.deliveries.lock().unwrap().push(Delivery {
            chat_id,
            message_id,
            edited: false,
            reply: reply.clone(),
        });
        Ok(message_id)
    }

    async fn edit(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        reply: &Reply,
    ) -> Result<(), TransportError> {
        self.deliveries.lock().unwrap().push(Delivery {
            chat_id,
            message_id,
            edited: true,
            reply: reply.clone(),
        });
        Ok(())
    }
}

/// Poll until `condition` holds, failing the test after a few seconds
pub async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}
