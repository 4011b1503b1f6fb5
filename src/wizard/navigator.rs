// Cursor-based navigation over the visible cadrage questions
//
// The navigator owns the answer store and a zero-based cursor into the
// visible-question sequence. The sequence itself is recomputed from scratch
// on every transition: question counts are small and an earlier answer can
// toggle the visibility of later questions, so there is nothing to gain
// from incremental dependency tracking.

use crate::error::{ValidationError, ValidationErrorKind};
use crate::models::{AnswerStore, AnswerValue, Question, QuestionType};
use crate::wizard::submission::CadrageSubmission;
use crate::wizard::visibility::resolve_visible;

/// Result of a forward transition
#[derive(Debug, Clone)]
pub enum AdvanceOutcome {
    /// Cursor moved to the next visible question
    Moved,
    /// The questionnaire is exhausted; the payload is ready to submit
    Submitted(CadrageSubmission),
    /// A submission is already in flight; this call was a duplicate event
    /// (double click, re-entrant handler) and changed nothing
    Ignored,
}

/// Result of a backward transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetreatOutcome {
    /// Cursor moved to the previous visible question
    Moved,
    /// Already at the first question: leave the questionnaire and return to
    /// the structure step, discarding the pending answer
    ExitedToStructure,
}

pub struct Navigator {
    /// Ordinary questions plus the reserved verbosity question, in natural order
    questions: Vec<Question>,
    answers: AnswerStore,
    cursor: usize,
    /// Re-entrancy guard: set once the exhausted state produced a submission,
    /// cleared only if that submission fails and must be retried
    submission_in_flight: bool,
}

impl Navigator {
    pub fn new(questions: Vec<Question>) -> Self {
        Self::with_answers(questions, AnswerStore::new())
    }

    /// Rebuild a navigator over previously saved answers (resumed project)
    pub fn with_answers(questions: Vec<Question>, answers: AnswerStore) -> Self {
        Self {
            questions,
            answers,
            cursor: 0,
            submission_in_flight: false,
        }
    }

    /// The currently visible subsequence, recomputed on every call
    pub fn visible(&self) -> Vec<&Question> {
        resolve_visible(&self.questions, &self.answers)
    }

    /// The question under the cursor, or `None` when the sequence is empty
    /// or the cursor has overrun (the exhausted state)
    pub fn current(&self) -> Option<&Question> {
        self.visible().into_iter().nth(self.cursor)
    }

    pub fn is_exhausted(&self) -> bool {
        self.current().is_none()
    }

    /// 1-based position and total, for "Question 2 / 5" display.
    /// `(0, 0)` when no question is visible.
    pub fn position(&self) -> (usize, usize) {
        let total = self.visible().len();
        if total == 0 {
            return (0, 0);
        }
        (self.cursor.min(total - 1) + 1, total)
    }

    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    /// Previously saved answer for the current question, for prefilling
    pub fn saved_answer(&self) -> Option<&AnswerValue> {
        let id = self.current()?.id;
        self.answers.get(&id)
    }

    /// Validate a raw input against a question's type. Free text and numbers
    /// must be non-empty after trimming, single-select needs a selection,
    /// multi-select needs at least one checked option.
    fn validate(question: &Question, raw: Option<AnswerValue>) -> Result<AnswerValue, ValidationError> {
        let empty_kind = match question.question_type {
            QuestionType::Options if question.multi => ValidationErrorKind::EmptyMultiSelect,
            QuestionType::Options => ValidationErrorKind::NoSelection,
            QuestionType::Number | QuestionType::Text => ValidationErrorKind::EmptyText,
        };
        let reject = || ValidationError::new(question.id, empty_kind);

        let raw = raw.ok_or_else(reject)?;
        match raw {
            AnswerValue::Text(value) => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    Err(reject())
                } else {
                    Ok(AnswerValue::Text(trimmed.to_string()))
                }
            }
            AnswerValue::Many(values) => {
                if values.is_empty() {
                    Err(reject())
                } else {
                    Ok(AnswerValue::Many(values))
                }
            }
        }
    }

    /// Persist a raw answer for the current question. An empty or missing
    /// input is not an error for the store: the answer key is simply left
    /// unset, so an optional-seeming step can stay blank. The returned
    /// `ValidationError` lets callers surface an inline hint if they want to.
    pub fn record_answer(&mut self, raw: Option<AnswerValue>) -> Result<(), ValidationError> {
        let Some(question) = self.current() else {
            return Ok(());
        };
        let id = question.id;
        let answer = Self::validate(question, raw)?;
        self.answers.insert(id, answer);
        Ok(())
    }

    /// Save the pending answer and move forward. When the cursor sits on the
    /// last question of the freshly recomputed visible sequence, the
    /// questionnaire is exhausted and the submission payload is produced
    /// exactly once; repeated calls without [`Navigator::submission_failed`]
    /// in between are ignored.
    pub fn advance(&mut self, raw: Option<AnswerValue>) -> AdvanceOutcome {
        if self.submission_in_flight {
            log::debug!("advance ignored: submission already in flight");
            return AdvanceOutcome::Ignored;
        }

        if let Err(e) = self.record_answer(raw) {
            // Blank answers are allowed; the step just stays unanswered
            log::debug!("leaving question {} unanswered: {:?}", e.question_id, e.kind);
        }

        let visible_len = self.visible().len();
        if visible_len == 0 || self.cursor + 1 >= visible_len {
            self.submission_in_flight = true;
            return AdvanceOutcome::Submitted(CadrageSubmission::from_answers(&self.answers));
        }

        self.cursor += 1;
        // The recorded answer may have hidden later questions; keep the
        // cursor inside the recomputed sequence.
        let new_len = self.visible().len();
        if self.cursor >= new_len {
            self.cursor = new_len.saturating_sub(1);
        }
        AdvanceOutcome::Moved
    }

    /// Move backward. From the first question this exits the questionnaire
    /// without touching the store; otherwise the pending answer is saved
    /// when valid and the cursor steps back. Backward motion is always
    /// in-range, so no clamping is needed.
    pub fn retreat(&mut self, raw: Option<AnswerValue>) -> RetreatOutcome {
        if self.cursor == 0 {
            return RetreatOutcome::ExitedToStructure;
        }
        if let Err(e) = self.record_answer(raw) {
            log::debug!("leaving question {} unanswered: {:?}", e.question_id, e.kind);
        }
        self.cursor -= 1;
        RetreatOutcome::Moved
    }

    /// Re-arm the navigator after a failed submission so the user can retry
    pub fn submission_failed(&mut self) {
        self.submission_in_flight = false;
    }
}
