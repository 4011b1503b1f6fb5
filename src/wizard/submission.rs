// Cadrage submission payload and verbosity derivation

use serde::{Deserialize, Serialize};

use crate::models::{AnswerStore, AnswerValue, VERBOSITY_QUESTION_ID};

/// Default verbosity when the reserved question was skipped or invisible
pub const DEFAULT_VERBOSITY: u8 = 2;

/// Derive the tri-level verbosity setting from the reserved answer slot.
///
/// The verbosity options are strings like `"1 — Court (80 mots max)"`, so
/// only the leading character matters: `1` and `3` select the concise and
/// detailed levels, anything else (including a missing or multi-select
/// answer) falls back to the standard level.
pub fn derive_verbosity(answers: &AnswerStore) -> u8 {
    match answers.get(&VERBOSITY_QUESTION_ID) {
        Some(AnswerValue::Text(value)) if value.starts_with('1') => 1,
        Some(AnswerValue::Text(value)) if value.starts_with('3') => 3,
        _ => DEFAULT_VERBOSITY,
    }
}

/// Payload sent to the cadrage endpoint when the questionnaire is exhausted.
/// The verbosity answer (id 99) is a UI-local signal and never appears in
/// the submitted answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CadrageSubmission {
    pub answers: AnswerStore,
    pub verbosity_level: u8,
}

impl CadrageSubmission {
    pub fn from_answers(answers: &AnswerStore) -> Self {
        let verbosity_level = derive_verbosity(answers);
        let mut answers = answers.clone();
        answers.remove(&VERBOSITY_QUESTION_ID);
        Self {
            answers,
            verbosity_level,
        }
    }

    /// Number of content answers carried by this submission
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }
}
