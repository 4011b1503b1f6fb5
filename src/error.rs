// Error taxonomy for the wizard engine

use thiserror::Error;

/// Why a raw answer was rejected by the navigator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Free-text or number input was empty after trimming
    EmptyText,
    /// Single-select question with no option chosen
    NoSelection,
    /// Multi-select question with no options checked
    EmptyMultiSelect,
}

/// A recoverable answer-validation failure. The answer store is never
/// mutated when one of these is produced.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid answer for question {question_id}: {kind:?}")]
pub struct ValidationError {
    pub question_id: u32,
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    pub fn new(question_id: u32, kind: ValidationErrorKind) -> Self {
        Self { question_id, kind }
    }
}

#[derive(Debug, Error)]
pub enum WizardError {
    /// Empty or missing required answer. Recoverable; stays local to the
    /// current navigation step.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A status or submission query failed to reach the backend.
    /// Recoverable; polling retries with the fallback delay, submission
    /// surfaces an inline retryable message.
    #[error("backend unreachable: {0}")]
    Transient(String),

    /// The backend reported the generation job itself as failed. Not
    /// recoverable by the client; surfaced verbatim with a retry affordance
    /// that restarts the whole generation phase.
    #[error("generation failed: {0}")]
    Terminal(String),

    /// Catalog or wizard configuration could not be loaded. Note that a
    /// malformed question *condition* is never an error: it degrades to
    /// an unconditionally visible question.
    #[error("configuration error: {0}")]
    Config(String),
}

impl WizardError {
    /// Whether the caller may retry the failed operation as-is
    pub fn is_retryable(&self) -> bool {
        matches!(self, WizardError::Transient(_))
    }
}
