//! Effects produced by state transitions

use crate::credential::Credential;
use crate::survey::{AnswerPayload, RemoteId};
use crate::transport::Reply;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Mint a credential for the survey and fetch its summary
    LoadSurvey { test_id: String },

    /// Create a remote session and start it
    OpenSession {
        credential: Credential,
        setup_answers: Vec<String>,
    },

    /// Submit the answer to the question on screen
    SubmitAnswer {
        credential: Credential,
        session_id: RemoteId,
        question_id: RemoteId,
        payload: AnswerPayload,
    },

    /// Complete the session after the last question, else fetch the next one
    Advance {
        credential: Credential,
        session_id: RemoteId,
        is_last: bool,
    },

    /// Deliver a message to the user
    Render { reply: Reply },
}

impl Effect {
    pub fn render(reply: Reply) -> Self {
        Effect::Render { reply }
    }
}
