//! Selection rules for the question on screen

use crate::survey::{AnswerPayload, Question, QuestionKind};

impl Question {
    /// Apply a toggle of the answer at `index`, as seen by the client with
    /// checked flag `was_checked`.
    ///
    /// The index always addresses the stored answers. Checking an answer of a
    /// single choice question clears every other answer first. Returns `None`
    /// when the index is out of range.
    pub fn toggled(&self, index: usize, was_checked: bool) -> Option<Question> {
        if index >= self.answers.len() {
            return None;
        }

        let mut question = self.clone();
        if question.kind == QuestionKind::Single && !was_checked {
            for answer in &mut question.answers {
                answer.is_checked = false;
            }
        }
        question.answers[index].is_checked = !was_checked;
        Some(question)
    }

    pub fn has_selection(&self) -> bool {
        self.answers.iter().any(|a| a.is_checked)
    }

    /// Payload of a choice question, `None` for text questions
    pub fn choice_payload(&self) -> Option<AnswerPayload> {
        let mut checked = self.answers.iter().filter(|a| a.is_checked).map(|a| a.id.clone());
        match self.kind {
            QuestionKind::Text => None,
            QuestionKind::Multiple => Some(AnswerPayload::Multiple(checked.collect())),
            QuestionKind::Single => Some(AnswerPayload::Single(checked.next())),
        }
    }
}
