//! Wizard session state and step machine
//!
//! A [`WizardSession`] is the explicit session-scoped context created when a
//! wizard run starts (new or resumed project) and discarded when it ends.
//! All mutation happens through navigation transitions; there are no ambient
//! globals.

pub mod anonymization;
pub mod navigator;
pub mod submission;
pub mod visibility;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::QuestionCatalog;
use crate::models::{AnswerStore, DocumentStructure};
use anonymization::AnonymMapping;
use navigator::Navigator;
use submission::DEFAULT_VERBOSITY;

/// Steps of the wizard, in walk order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    /// Project list: pick an existing project or start a new one
    Projects,
    /// Questionnaire file upload
    Upload,
    /// Confirm the auto-detected document structure
    Structure,
    /// Conditional scoping questionnaire
    Cadrage,
    /// Anonymisation mapping table
    Anonymisation,
    /// Generation pipeline with polled progress
    Generation,
}

impl WizardStep {
    /// All steps in walk order
    pub fn all() -> &'static [WizardStep] {
        &[
            WizardStep::Projects,
            WizardStep::Upload,
            WizardStep::Structure,
            WizardStep::Cadrage,
            WizardStep::Anonymisation,
            WizardStep::Generation,
        ]
    }

    /// The next step, if any
    pub fn next(&self) -> Option<WizardStep> {
        match self {
            WizardStep::Projects => Some(WizardStep::Upload),
            WizardStep::Upload => Some(WizardStep::Structure),
            WizardStep::Structure => Some(WizardStep::Cadrage),
            WizardStep::Cadrage => Some(WizardStep::Anonymisation),
            WizardStep::Anonymisation => Some(WizardStep::Generation),
            WizardStep::Generation => None,
        }
    }

    /// The previous step, if any
    pub fn previous(&self) -> Option<WizardStep> {
        match self {
            WizardStep::Projects => None,
            WizardStep::Upload => Some(WizardStep::Projects),
            WizardStep::Structure => Some(WizardStep::Upload),
            WizardStep::Cadrage => Some(WizardStep::Structure),
            WizardStep::Anonymisation => Some(WizardStep::Cadrage),
            WizardStep::Generation => Some(WizardStep::Anonymisation),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            WizardStep::Projects => "Projets",
            WizardStep::Upload => "Dépôt du questionnaire",
            WizardStep::Structure => "Structure du document",
            WizardStep::Cadrage => "Cadrage",
            WizardStep::Anonymisation => "Anonymisation",
            WizardStep::Generation => "Génération",
        }
    }
}

impl Default for WizardStep {
    fn default() -> Self {
        WizardStep::Projects
    }
}

/// Session-scoped wizard state. Created fresh for a new or resumed project,
/// mutated only by the single event-handling task, dropped when the session
/// ends (submission, abandonment or project switch).
pub struct WizardSession {
    /// Session identifier, also used to tag poll queries so that responses
    /// belonging to a superseded session are discarded
    pub id: Uuid,
    pub project_id: Option<String>,
    pub step: WizardStep,
    pub structure: Option<DocumentStructure>,
    /// Present while the cadrage step is active
    pub navigator: Option<Navigator>,
    pub anonym_mappings: Vec<AnonymMapping>,
    pub verbosity_level: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WizardSession {
    /// Fresh session starting at the project list
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            project_id: None,
            step: WizardStep::Projects,
            structure: None,
            navigator: None,
            anonym_mappings: Vec::new(),
            verbosity_level: DEFAULT_VERBOSITY,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reset everything for a brand new project and move to the upload step.
    /// The session id changes so that any in-flight poll responses from the
    /// previous project are discarded on arrival.
    pub fn start_new_project(&mut self) {
        self.id = Uuid::new_v4();
        self.project_id = None;
        self.structure = None;
        self.navigator = None;
        self.anonym_mappings = Vec::new();
        self.verbosity_level = DEFAULT_VERBOSITY;
        self.step = WizardStep::Upload;
        self.touch();
        log::info!("wizard session {} reset for a new project", self.id);
    }

    /// Attach a project after upload/structure detection
    pub fn attach_project(&mut self, project_id: String, structure: Option<DocumentStructure>) {
        self.project_id = Some(project_id);
        self.structure = structure;
        self.step = WizardStep::Structure;
        self.touch();
    }

    /// Enter the cadrage step with the loaded question catalog. Any earlier
    /// navigator (re-entering after a back navigation) is replaced, which
    /// restarts the questionnaire from its first visible question.
    pub fn begin_cadrage(&mut self, catalog: &QuestionCatalog) {
        self.navigator = Some(Navigator::new(catalog.combined()));
        self.step = WizardStep::Cadrage;
        self.touch();
    }

    /// Re-enter cadrage for a resumed project, keeping its saved answers
    pub fn resume_cadrage(&mut self, catalog: &QuestionCatalog, answers: AnswerStore) {
        self.navigator = Some(Navigator::with_answers(catalog.combined(), answers));
        self.step = WizardStep::Cadrage;
        self.touch();
    }

    /// Leave cadrage after a successful submission: remember the derived
    /// verbosity, prefill the anonymisation table and move on.
    pub fn finish_cadrage(&mut self, verbosity_level: u8) {
        self.verbosity_level = verbosity_level;
        self.navigator = None;
        self.anonym_mappings = anonymization::default_suggestions();
        self.step = WizardStep::Anonymisation;
        self.touch();
    }

    /// Back out of cadrage to the structure step, keeping saved answers
    /// out of the session (the navigator is dropped with them)
    pub fn exit_cadrage_to_structure(&mut self) {
        self.navigator = None;
        self.step = WizardStep::Structure;
        self.touch();
    }

    /// Move to the generation step
    pub fn begin_generation(&mut self) {
        self.step = WizardStep::Generation;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for WizardSession {
    fn default() -> Self {
        Self::new()
    }
}
