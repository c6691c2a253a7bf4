//! reqwest-backed survey service client

use super::types::{CreateSessionRequest, CreatedSession, SubmitAnswerRequest};
use super::{AnswerPayload, Question, RemoteId, SurveyApi, SurveyError, SurveySummary};
use crate::credential::Credential;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Survey service over HTTP/JSON
pub struct HttpSurveyClient {
    client: Client,
    base_url: String,
}

impl HttpSurveyClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SurveyError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SurveyError::unknown(format!("Failed to create HTTP client: {e}")))?;

        // Paths are joined onto the base, so it always ends with a slash
        let base_url = format!("{}/", base_url.trim_end_matches('/'));

        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn session_url(&self, session_id: &RemoteId, action: &str) -> String {
        self.url(&format!("sessions/{session_id}/{action}"))
    }

    /// Send a request and return the body of a 2xx response
    async fn execute(request: RequestBuilder) -> Result<String, SurveyError> {
        let response = request
            .send()
            .await
            .map_err(|e| SurveyError::from_transport(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SurveyError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(SurveyError::from_status(status, &body));
        }

        Ok(body)
    }

    fn decode<T: DeserializeOwned>(body: &str) -> Result<T, SurveyError> {
        serde_json::from_str(body)
            .map_err(|e| SurveyError::decode(format!("Failed to parse response: {e} - body: {body}")))
    }
}

#[async_trait]
impl SurveyApi for HttpSurveyClient {
    async fn fetch_summary(&self, credential: &Credential) -> Result<SurveySummary, SurveyError> {
        let request = self
            .client
            .get(self.url("tests/current/summary"))
            .query(&[("token", credential.token())]);

        let body = Self::execute(request).await?;
        Self::decode(&body)
    }

    async fn create_session(
        &self,
        credential: &Credential,
        setup_answers: &[String],
    ) -> Result<RemoteId, SurveyError> {
        let request = self
            .client
            .post(self.url("sessions"))
            .bearer_auth(credential.token())
            .json(&CreateSessionRequest {
                user_inputs: setup_answers,
            });

        let body = Self::execute(request).await?;
        let created: CreatedSession = Self::decode(&body)?;
        created
            .into_session_id()
            .ok_or_else(|| SurveyError::decode(format!("Response carried no session id: {body}")))
    }

    async fn start_session(
        &self,
        credential: &Credential,
        session_id: &RemoteId,
    ) -> Result<Question, SurveyError> {
        let request = self
            .client
            .post(self.session_url(session_id, "start"))
            .bearer_auth(credential.token())
            .json(&serde_json::json!({}));

        let body = Self::execute(request).await?;
        Self::decode(&body)
    }

    async fn submit_answer(
        &self,
        credential: &Credential,
        session_id: &RemoteId,
        question_id: &RemoteId,
        payload: &AnswerPayload,
    ) -> Result<(), SurveyError> {
        let request = self
            .client
            .post(self.session_url(session_id, "submit_answer"))
            .bearer_auth(credential.token())
            .json(&SubmitAnswerRequest {
                question_id,
                answer_id: payload,
            });

        // The acknowledgement body carries nothing the bot uses
        Self::execute(request).await.map(|_| ())
    }

    async fn fetch_next_question(
        &self,
        credential: &Credential,
        session_id: &RemoteId,
    ) -> Result<Question, SurveyError> {
        let request = self
            .client
            .get(self.session_url(session_id, "next"))
            .bearer_auth(credential.token());

        let body = Self::execute(request).await?;
        Self::decode(&body)
    }

    async fn complete_session(
        &self,
        credential: &Credential,
        session_id: &RemoteId,
    ) -> Result<(), SurveyError> {
        let request = self
            .client
            .post(self.session_url(session_id, "complete"))
            .bearer_auth(credential.token())
            .json(&serde_json::json!({}));

        Self::execute(request).await.map(|_| ())
    }
}
