// Client-side engine for the questionnaire-response wizard.
//
// The wizard drives a user from project selection through upload, structure
// confirmation, the conditional cadrage questionnaire, anonymisation setup,
// and finally the polled generation pipeline. Everything here is control
// logic: rendering, file parsing and the generation job itself live elsewhere.

// Module declarations
pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod generation;
pub mod models;
pub mod wizard;

// Re-export the types most callers need
pub use config::WizardConfig;
pub use error::{ValidationError, WizardError};
pub use models::{
    AnswerStore, AnswerValue, Condition, ConditionOperator, JobStatus, JobStatusReport, Question,
    QuestionType,
};
pub use wizard::navigator::{AdvanceOutcome, Navigator, RetreatOutcome};
pub use wizard::submission::{derive_verbosity, CadrageSubmission};
pub use wizard::{WizardSession, WizardStep};
