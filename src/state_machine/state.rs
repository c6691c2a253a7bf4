//! Conversation state types

use crate::credential::Credential;
use crate::survey::{Question, RemoteId, SurveySummary};
use std::fmt;

/// The survey a conversation was started for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSurvey {
    pub test_id: String,
    pub credential: Credential,
    pub summary: SurveySummary,
}

/// A survey with an open remote session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub survey: ActiveSurvey,
    pub session_id: RemoteId,
}

/// Conversation state
///
/// Each variant carries only what is valid in that phase, so a question
/// without a session or a pending answer without a text question cannot be
/// represented.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConvState {
    /// No survey started, or the store entry was just created
    #[default]
    Idle,

    /// Setup fields collected (or none required), waiting for "begin"
    ReadyToBegin {
        survey: ActiveSurvey,
        setup_answers: Vec<String>,
    },

    /// Collecting setup field `cursor`
    CollectingInputs {
        survey: ActiveSurvey,
        setup_answers: Vec<String>,
        cursor: usize,
    },

    /// A single or multiple choice question is displayed
    AwaitingChoice {
        session: SessionContext,
        question: Question,
    },

    /// A text question is displayed
    AwaitingText {
        session: SessionContext,
        question: Question,
    },

    /// A text answer was entered and shown back for confirmation
    ConfirmingText {
        session: SessionContext,
        question: Question,
        pending_answer: String,
    },

    /// The service accepted the answer to `question`; the next question or
    /// the session completion is still outstanding
    Answered {
        session: SessionContext,
        question: Question,
    },

    /// Survey finished
    Completed,
}

/// Coarse conversation phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Idle,
    CollectingInputs,
    AwaitingChoice,
    AwaitingText,
    ConfirmingText,
    Completed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Idle => "IDLE",
            Phase::CollectingInputs => "COLLECTING_INPUTS",
            Phase::AwaitingChoice => "AWAITING_CHOICE",
            Phase::AwaitingText => "AWAITING_TEXT",
            Phase::ConfirmingText => "CONFIRMING_TEXT",
            Phase::Completed => "COMPLETED",
        })
    }
}

impl ConvState {
    pub fn phase(&self) -> Phase {
        match self {
            ConvState::Idle | ConvState::ReadyToBegin { .. } => Phase::Idle,
            ConvState::CollectingInputs { .. } => Phase::CollectingInputs,
            ConvState::AwaitingChoice { .. } => Phase::AwaitingChoice,
            ConvState::AwaitingText { .. } => Phase::AwaitingText,
            ConvState::ConfirmingText { .. } => Phase::ConfirmingText,
            // Still on screen until the service hands out what comes next
            ConvState::Answered { question, .. } => {
                if question.kind.is_choice() {
                    Phase::AwaitingChoice
                } else {
                    Phase::ConfirmingText
                }
            }
            ConvState::Completed => Phase::Completed,
        }
    }

    /// State presenting `question`, chosen by its kind
    pub fn presenting(session: SessionContext, question: Question) -> Self {
        if question.kind.is_choice() {
            ConvState::AwaitingChoice { session, question }
        } else {
            ConvState::AwaitingText { session, question }
        }
    }

    /// The question on screen, if any
    pub fn current_question(&self) -> Option<&Question> {
        match self {
            ConvState::AwaitingChoice { question, .. }
            | ConvState::AwaitingText { question, .. }
            | ConvState::ConfirmingText { question, .. }
            | ConvState::Answered { question, .. } => Some(question),
            _ => None,
        }
    }
}
