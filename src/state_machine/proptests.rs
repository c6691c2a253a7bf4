//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::event::{CallbackData, SurveyStep};
use super::fixtures;
use super::*;
use crate::survey::{AnswerPayload, Question, QuestionKind, SurveyErrorKind};
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_error_kind() -> impl Strategy<Value = SurveyErrorKind> {
    prop_oneof![
        Just(SurveyErrorKind::Network),
        Just(SurveyErrorKind::Auth),
        Just(SurveyErrorKind::NotFound),
        Just(SurveyErrorKind::InvalidRequest),
        Just(SurveyErrorKind::ServerError),
        Just(SurveyErrorKind::Decode),
        Just(SurveyErrorKind::Unknown),
    ]
}

fn arb_step() -> impl Strategy<Value = SurveyStep> {
    prop_oneof![
        Just(SurveyStep::LoadSurvey),
        Just(SurveyStep::OpenSession),
        Just(SurveyStep::SubmitAnswer),
        Just(SurveyStep::Advance),
    ]
}

fn arb_choice_kind() -> impl Strategy<Value = QuestionKind> {
    prop_oneof![Just(QuestionKind::Single), Just(QuestionKind::Multiple)]
}

/// Choice question with 1..6 answers and an arbitrary selection
fn arb_choice_question() -> impl Strategy<Value = Question> {
    (arb_choice_kind(), 1usize..6, any::<bool>()).prop_flat_map(|(kind, len, is_last)| {
        proptest::collection::vec(any::<bool>(), len).prop_map(move |checked| {
            let ids: Vec<i64> = (1..=i64::try_from(len).unwrap_or(1)).collect();
            let mut question = fixtures::choice_question(kind, &ids, is_last);
            for (answer, checked) in question.answers.iter_mut().zip(checked) {
                answer.is_checked = checked;
            }
            // Keep single choice questions valid
            if kind == QuestionKind::Single {
                let mut seen = false;
                for answer in &mut question.answers {
                    answer.is_checked &= !seen;
                    seen |= answer.is_checked;
                }
            }
            question
        })
    })
}

fn arb_state() -> impl Strategy<Value = ConvState> {
    prop_oneof![
        Just(ConvState::Idle),
        Just(ConvState::Completed),
        (0usize..3).prop_map(|n| ConvState::ReadyToBegin {
            survey: fixtures::survey(&vec!["field"; n]),
            setup_answers: vec!["x".to_string(); n],
        }),
        (1usize..4).prop_flat_map(|n| (Just(n), 0..n)).prop_map(|(n, cursor)| {
            ConvState::CollectingInputs {
                survey: fixtures::survey(&vec!["field"; n]),
                setup_answers: vec!["x".to_string(); cursor],
                cursor,
            }
        }),
        arb_choice_question().prop_map(|question| ConvState::AwaitingChoice {
            session: fixtures::session(&[]),
            question,
        }),
        any::<bool>().prop_map(|is_last| ConvState::AwaitingText {
            session: fixtures::session(&[]),
            question: fixtures::text_question(1, is_last),
        }),
        "[a-z ]{1,12}".prop_map(|pending_answer| ConvState::ConfirmingText {
            session: fixtures::session(&[]),
            question: fixtures::text_question(1, false),
            pending_answer,
        }),
        prop_oneof![
            arb_choice_question(),
            any::<bool>().prop_map(|is_last| fixtures::text_question(1, is_last)),
        ]
        .prop_map(|question| ConvState::Answered {
            session: fixtures::session(&[]),
            question,
        }),
    ]
}

fn arb_user_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        proptest::option::of("[0-9]{1,4}").prop_map(|test_id| Event::StartCommand { test_id }),
        "[a-zA-Z ]{0,20}".prop_map(|text| Event::UserText { text }),
        Just(Event::BeginPressed),
        (0usize..8, any::<bool>())
            .prop_map(|(index, was_checked)| Event::TogglePressed { index, was_checked }),
        Just(Event::SubmitPressed),
        "[a-z]{1,8}".prop_map(|data| Event::from_callback(&data)),
    ]
}

fn is_trigger(event: &Event) -> bool {
    matches!(
        event,
        Event::StartCommand { .. } | Event::BeginPressed | Event::SubmitPressed
    )
}

fn checked_count(question: &Question) -> usize {
    question.answers.iter().filter(|a| a.is_checked).count()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    // Setup replies advance the cursor by exactly one and stop at the end
    #[test]
    fn prop_setup_cursor_advances_by_one(
        fields in 1usize..6,
        replies in proptest::collection::vec("[a-zA-Z]{1,10}", 0..8),
    ) {
        let survey = fixtures::survey(&vec!["field"; fields]);
        let mut state = ConvState::CollectingInputs {
            survey,
            setup_answers: vec![],
            cursor: 0,
        };

        for (i, text) in replies.into_iter().enumerate() {
            match transition(&state, Event::UserText { text }) {
                Ok(result) => {
                    state = result.new_state;
                    let collected = i + 1;
                    match &state {
                        ConvState::CollectingInputs { cursor, setup_answers, .. } => {
                            prop_assert_eq!(*cursor, collected);
                            prop_assert!(*cursor < fields);
                            prop_assert_eq!(setup_answers.len(), collected);
                        }
                        ConvState::ReadyToBegin { setup_answers, .. } => {
                            prop_assert_eq!(collected, fields);
                            prop_assert_eq!(setup_answers.len(), fields);
                        }
                        other => prop_assert!(false, "unexpected state {:?}", other),
                    }
                }
                Err(_) => {
                    // Only once every field is collected
                    let ready = matches!(state, ConvState::ReadyToBegin { .. });
                    prop_assert!(ready);
                }
            }
        }
    }

    // A single choice question never has more than one checked answer
    #[test]
    fn prop_single_choice_stays_exclusive(
        len in 1usize..6,
        toggles in proptest::collection::vec((0usize..6, any::<bool>()), 0..20),
    ) {
        let ids: Vec<i64> = (1..=i64::try_from(len).unwrap_or(1)).collect();
        let mut state = ConvState::AwaitingChoice {
            session: fixtures::session(&[]),
            question: fixtures::choice_question(QuestionKind::Single, &ids, false),
        };

        for (index, was_checked) in toggles {
            if let Ok(result) = transition(&state, Event::TogglePressed { index, was_checked }) {
                state = result.new_state;
            }
            let question = state.current_question();
            prop_assert!(question.is_some());
            prop_assert!(question.map_or(0, checked_count) <= 1);
        }
    }

    // Toggling the same answer twice, as rendered, restores it
    #[test]
    fn prop_multiple_double_toggle_restores(
        question in arb_choice_question().prop_filter("multiple", |q| q.kind == QuestionKind::Multiple),
        index in 0usize..6,
    ) {
        prop_assume!(index < question.answers.len());
        let original = question.clone();
        let state = ConvState::AwaitingChoice { session: fixtures::session(&[]), question };

        let first_flag = original.answers[index].is_checked;
        let once = transition(&state, Event::TogglePressed { index, was_checked: first_flag }).unwrap();
        let second_flag = once.new_state.current_question().map(|q| q.answers[index].is_checked);
        prop_assert_eq!(second_flag, Some(!first_flag));

        let twice = transition(&once.new_state, Event::TogglePressed { index, was_checked: !first_flag }).unwrap();
        prop_assert_eq!(twice.new_state.current_question(), Some(&original));
    }

    // Nothing checked still submits: an empty set or an explicit no-answer
    #[test]
    fn prop_empty_selection_submits(kind in arb_choice_kind(), len in 1usize..6) {
        let ids: Vec<i64> = (1..=i64::try_from(len).unwrap_or(1)).collect();
        let state = ConvState::AwaitingChoice {
            session: fixtures::session(&[]),
            question: fixtures::choice_question(kind, &ids, false),
        };

        let result = transition(&state, Event::SubmitPressed).unwrap();
        let expected = match kind {
            QuestionKind::Multiple => AnswerPayload::Multiple(vec![]),
            _ => AnswerPayload::Single(None),
        };
        let submitted = matches!(
            &result.effects[..],
            [Effect::SubmitAnswer { payload, .. }] if payload == &expected
        );
        prop_assert!(submitted);
    }

    // Failed requests never move the conversation
    #[test]
    fn prop_request_failed_keeps_state(
        state in arb_state(),
        step in arb_step(),
        kind in arb_error_kind(),
        message in "[a-z ]{0,20}",
    ) {
        let result = transition(&state, Event::RequestFailed { step, kind, message }).unwrap();
        prop_assert_eq!(&result.new_state, &state);
        let all_render = result.effects.iter().all(|e| matches!(e, Effect::Render { .. }));
        prop_assert!(all_render);
    }

    // A recorded answer is never submitted twice
    #[test]
    fn prop_answered_never_resubmits(state in arb_state(), event in arb_user_event()) {
        if let ConvState::Answered { .. } = state {
            if let Ok(result) = transition(&state, event) {
                let resubmits = result
                    .effects
                    .iter()
                    .any(|e| matches!(e, Effect::SubmitAnswer { .. }));
                prop_assert!(!resubmits);
            }
        }
    }

    // Triggers only request work; the result events move the state
    #[test]
    fn prop_triggers_never_move_state(state in arb_state(), event in arb_user_event()) {
        let trigger = is_trigger(&event);
        if let Ok(result) = transition(&state, event) {
            if trigger {
                prop_assert_eq!(&result.new_state, &state);
            }
        }
    }

    // Every rendered button payload parses back to the same callback
    #[test]
    fn prop_rendered_payloads_round_trip(question in arb_choice_question()) {
        let reply = render::question(&question);
        for action in &reply.actions {
            let parsed = action.payload.parse::<CallbackData>();
            prop_assert!(parsed.is_ok(), "unparseable {:?}", action.payload);
            if let Ok(CallbackData::Toggle { index, was_checked }) = parsed {
                prop_assert_eq!(question.answers[index].is_checked, was_checked);
            }
        }
    }
}
