//! Survey service abstraction
//!
//! Typed access to the remote survey API. Every call is one request/response
//! exchange; retry policy belongs to the caller.

mod client;
mod error;
mod types;

pub use client::HttpSurveyClient;
pub use error::{SurveyError, SurveyErrorKind};
pub use types::*;

use crate::credential::Credential;
use async_trait::async_trait;
use std::sync::Arc;

/// Operations of the remote survey service
#[async_trait]
pub trait SurveyApi: Send + Sync {
    /// Summary of the survey the credential was minted for
    async fn fetch_summary(&self, credential: &Credential) -> Result<SurveySummary, SurveyError>;

    /// Open a remote session with the collected setup answers
    async fn create_session(
        &self,
        credential: &Credential,
        setup_answers: &[String],
    ) -> Result<RemoteId, SurveyError>;

    /// Start the session and get its first question
    async fn start_session(
        &self,
        credential: &Credential,
        session_id: &RemoteId,
    ) -> Result<Question, SurveyError>;

    async fn submit_answer(
        &self,
        credential: &Credential,
        session_id: &RemoteId,
        question_id: &RemoteId,
        payload: &AnswerPayload,
    ) -> Result<(), SurveyError>;

    async fn fetch_next_question(
        &self,
        credential: &Credential,
        session_id: &RemoteId,
    ) -> Result<Question, SurveyError>;

    async fn complete_session(
        &self,
        credential: &Credential,
        session_id: &RemoteId,
    ) -> Result<(), SurveyError>;
}

#[async_trait]
impl<T: SurveyApi + ?Sized> SurveyApi for Arc<T> {
    async fn fetch_summary(&self, credential: &Credential) -> Result<SurveySummary, SurveyError> {
        (**self).fetch_summary(credential).await
    }

    async fn create_session(
        &self,
        credential: &Credential,
        setup_answers: &[String],
    ) -> Result<RemoteId, SurveyError> {
        (**self).create_session(credential, setup_answers).await
    }

    async fn start_session(
        &self,
        credential: &Credential,
        session_id: &RemoteId,
    ) -> Result<Question, SurveyError> {
        (**self).start_session(credential, session_id).await
    }

    async fn submit_answer(
        &self,
        credential: &Credential,
        session_id: &RemoteId,
        question_id: &RemoteId,
        payload: &AnswerPayload,
    ) -> Result<(), SurveyError> {
        (**self)
            .submit_answer(credential, session_id, question_id, payload)
            .await
    }

    async fn fetch_next_question(
        &self,
        credential: &Credential,
        session_id: &RemoteId,
    ) -> Result<Question, SurveyError> {
        (**self).fetch_next_question(credential, session_id).await
    }

    async fn complete_session(
        &self,
        credential: &Credential,
        session_id: &RemoteId,
    ) -> Result<(), SurveyError> {
        (**self).complete_session(credential, session_id).await
    }
}

/// Logging wrapper for survey clients
pub struct LoggingSurveyApi {
    inner: Arc<dyn SurveyApi>,
}

impl LoggingSurveyApi {
    pub fn new(inner: Arc<dyn SurveyApi>) -> Self {
        Self { inner }
    }

    fn log<T>(op: &'static str, started: std::time::Instant, result: &Result<T, SurveyError>) {
        let duration = started.elapsed();
        match result {
            Ok(_) => {
                tracing::info!(
                    op,
                    duration_ms = %duration.as_millis(),
                    "Survey request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    op,
                    duration_ms = %duration.as_millis(),
                    kind = ?e.kind,
                    error = %e.message,
                    transient = e.kind.is_transient(),
                    "Survey request failed"
                );
            }
        }
    }
}

#[async_trait]
impl SurveyApi for LoggingSurveyApi {
    async fn fetch_summary(&self, credential: &Credential) -> Result<SurveySummary, SurveyError> {
        let start = std::time::Instant::now();
        let result = self.inner.fetch_summary(credential).await;
        Self::log("fetch_summary", start, &result);
        result
    }

    async fn create_session(
        &self,
        credential: &Credential,
        setup_answers: &[String],
    ) -> Result<RemoteId, SurveyError> {
        let start = std::time::Instant::now();
        let result = self.inner.create_session(credential, setup_answers).await;
        Self::log("create_session", start, &result);
        result
    }

    async fn start_session(
        &self,
        credential: &Credential,
        session_id: &RemoteId,
    ) -> Result<Question, SurveyError> {
        let start = std::time::Instant::now();
        let result = self.inner.start_session(credential, session_id).await;
        Self::log("start_session", start, &result);
        result
    }

    async fn submit_answer(
        &self,
        credential: &Credential,
        session_id: &RemoteId,
        question_id: &RemoteId,
        payload: &AnswerPayload,
    ) -> Result<(), SurveyError> {
        let start = std::time::Instant::now();
        let result = self
            .inner
            .submit_answer(credential, session_id, question_id, payload)
            .await;
        Self::log("submit_answer", start, &result);
        result
    }

    async fn fetch_next_question(
        &self,
        credential: &Credential,
        session_id: &RemoteId,
    ) -> Result<Question, SurveyError> {
        let start = std::time::Instant::now();
        let result = self.inner.fetch_next_question(credential, session_id).await;
        Self::log("fetch_next_question", start, &result);
        result
    }

    async fn complete_session(
        &self,
        credential: &Credential,
        session_id: &RemoteId,
    ) -> Result<(), SurveyError> {
        let start = std::time::Instant::now();
        let result = self.inner.complete_session(credential, session_id).await;
        Self::log("complete_session", start, &result);
        result
    }
}
