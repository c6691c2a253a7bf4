//! Pure state transition function

use super::state::{ActiveSurvey, Phase, SessionContext};
use super::{render, ConvState, Effect, Event};
use crate::survey::{AnswerPayload, Question};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConvState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConvState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Event {event} not accepted in phase {phase}")]
    UnexpectedEvent { phase: Phase, event: &'static str },
    #[error("Answer index {index} out of range for {len} answers")]
    AnswerOutOfRange { index: usize, len: usize },
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs. Survey calls
/// are requested as effects and their outcomes come back as events, so a
/// trigger (start, begin, submit) never moves the state by itself.
pub fn transition(state: &ConvState, event: Event) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Start
        // ============================================================
        (_, Event::StartCommand { test_id: Some(test_id) }) => {
            Ok(TransitionResult::new(state.clone()).with_effect(Effect::LoadSurvey { test_id }))
        }

        (_, Event::StartCommand { test_id: None }) => {
            Ok(TransitionResult::new(state.clone()).with_effect(Effect::render(render::wrong_link())))
        }

        // Loading a survey resets the conversation, whatever came before
        (
            _,
            Event::SurveyLoaded {
                test_id,
                credential,
                summary,
            },
        ) => {
            let survey = ActiveSurvey {
                test_id,
                credential,
                summary,
            };
            let welcome = Effect::render(render::welcome(&survey.summary));

            match survey.summary.setup_fields.first() {
                Some(first) => {
                    let first = Effect::render(render::setup_field(first));
                    Ok(TransitionResult::new(ConvState::CollectingInputs {
                        survey,
                        setup_answers: vec![],
                        cursor: 0,
                    })
                    .with_effect(welcome)
                    .with_effect(Effect::render(render::setup_intro()))
                    .with_effect(first))
                }
                None => Ok(TransitionResult::new(ConvState::ReadyToBegin {
                    survey,
                    setup_answers: vec![],
                })
                .with_effect(welcome)
                .with_effect(Effect::render(render::ready_to_begin()))),
            }
        }

        // ============================================================
        // Setup fields
        // ============================================================
        (
            ConvState::CollectingInputs {
                survey,
                setup_answers,
                cursor,
            },
            Event::UserText { text },
        ) => {
            let mut setup_answers = setup_answers.clone();
            setup_answers.push(text);
            let cursor = cursor + 1;

            match survey.summary.setup_fields.get(cursor) {
                Some(next) => Ok(TransitionResult::new(ConvState::CollectingInputs {
                    survey: survey.clone(),
                    setup_answers,
                    cursor,
                })
                .with_effect(Effect::render(render::setup_field(next)))),
                None => Ok(TransitionResult::new(ConvState::ReadyToBegin {
                    survey: survey.clone(),
                    setup_answers,
                })
                .with_effect(Effect::render(render::ready_to_begin()))),
            }
        }

        // ============================================================
        // Session start
        // ============================================================
        (
            ConvState::ReadyToBegin {
                survey,
                setup_answers,
            },
            Event::BeginPressed,
        ) => Ok(
            TransitionResult::new(state.clone()).with_effect(Effect::OpenSession {
                credential: survey.credential.clone(),
                setup_answers: setup_answers.clone(),
            }),
        ),

        (ConvState::ReadyToBegin { survey, .. }, Event::SessionOpened { session_id, question }) => {
            let session = SessionContext {
                survey: survey.clone(),
                session_id,
            };
            Ok(present(session, question))
        }

        // ============================================================
        // Text answers
        // ============================================================
        (
            ConvState::AwaitingText { session, question }
            | ConvState::ConfirmingText {
                session, question, ..
            },
            Event::UserText { text },
        ) => Ok(TransitionResult::new(ConvState::ConfirmingText {
            session: session.clone(),
            question: question.clone(),
            pending_answer: text.clone(),
        })
        .with_effect(Effect::render(render::confirmation(&text)))),

        (
            ConvState::ConfirmingText {
                session,
                question,
                pending_answer,
            },
            Event::SubmitPressed,
        ) => Ok(submit(
            state,
            session,
            question,
            AnswerPayload::Text(pending_answer.clone()),
        )),

        // ============================================================
        // Choice answers
        // ============================================================
        (ConvState::AwaitingChoice { session, question }, Event::TogglePressed { index, was_checked }) => {
            let toggled = question
                .toggled(index, was_checked)
                .ok_or(TransitionError::AnswerOutOfRange {
                    index,
                    len: question.answers.len(),
                })?;
            let reply = render::question(&toggled).replacing_origin();

            Ok(TransitionResult::new(ConvState::AwaitingChoice {
                session: session.clone(),
                question: toggled,
            })
            .with_effect(Effect::render(reply)))
        }

        (ConvState::AwaitingChoice { session, question }, Event::SubmitPressed) => {
            match question.choice_payload() {
                Some(payload) => Ok(submit(state, session, question, payload)),
                None => Err(unexpected(state, &Event::SubmitPressed)),
            }
        }

        // ============================================================
        // Submission outcome
        // ============================================================
        (
            ConvState::AwaitingChoice { session, question }
            | ConvState::ConfirmingText {
                session, question, ..
            },
            Event::AnswerRecorded,
        ) => Ok(TransitionResult::new(ConvState::Answered {
            session: session.clone(),
            question: question.clone(),
        })
        .with_effect(advance(session, question))),

        // Only the follow-up is retried, the answer is already recorded
        (ConvState::Answered { session, question }, Event::SubmitPressed) => {
            Ok(TransitionResult::new(state.clone()).with_effect(advance(session, question)))
        }

        (ConvState::Answered { session, .. }, Event::Advanced { next }) => match next {
            Some(question) => Ok(present(session.clone(), question)),
            None => Ok(TransitionResult::new(ConvState::Completed)
                .with_effect(Effect::render(render::completed().replacing_origin()))),
        },

        // ============================================================
        // Failures leave the state untouched
        // ============================================================
        (_, Event::RequestFailed { step, kind, .. }) => Ok(TransitionResult::new(state.clone())
            .with_effect(Effect::render(render::failure(step, kind)))),

        (_, event) => Err(unexpected(state, &event)),
    }
}

fn unexpected(state: &ConvState, event: &Event) -> TransitionError {
    TransitionError::UnexpectedEvent {
        phase: state.phase(),
        event: event.name(),
    }
}

/// Show a freshly issued question in place of the pressed message
fn present(session: SessionContext, question: Question) -> TransitionResult {
    let reply = render::question(&question).replacing_origin();
    TransitionResult::new(ConvState::presenting(session, question)).with_effect(Effect::render(reply))
}

fn submit(
    state: &ConvState,
    session: &SessionContext,
    question: &Question,
    payload: AnswerPayload,
) -> TransitionResult {
    TransitionResult::new(state.clone()).with_effect(Effect::SubmitAnswer {
        credential: session.survey.credential.clone(),
        session_id: session.session_id.clone(),
        question_id: question.question_id.clone(),
        payload,
    })
}

fn advance(session: &SessionContext, question: &Question) -> Effect {
    Effect::Advance {
        credential: session.survey.credential.clone(),
        session_id: session.session_id.clone(),
        is_last: question.is_last,
    }
}
