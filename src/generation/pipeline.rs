// Progress-pipeline mapping for the generation step
//
// The backend reports a single completion percentage; the UI shows a
// discrete list of pipeline steps. Each step carries the percentage at
// which it counts as done, and the whole mapping is a pure function of the
// current percentage, so a poll tick never needs to remember earlier ticks
// and a non-monotonic percentage simply remaps from scratch.

use serde::{Deserialize, Serialize};

/// One named phase of the backend generation job
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStep {
    pub label: String,
    /// Percentage at and above which this step displays as done.
    /// Strictly increasing across the step list.
    pub done_pct: u8,
}

impl PipelineStep {
    pub fn new(label: impl Into<String>, done_pct: u8) -> Self {
        Self {
            label: label.into(),
            done_pct,
        }
    }
}

/// Display state of a mapped step
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Done,
    Active,
    Pending,
}

/// A step resolved against the current percentage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MappedStage {
    pub label: String,
    pub state: StepState,
}

/// Map a scalar percentage onto the step list. Single linear scan: every
/// step whose threshold is reached is done, the first step that is not done
/// becomes active, and everything after it is pending regardless of its own
/// threshold. At or above the last threshold there is no active step.
pub fn map_stages(steps: &[PipelineStep], pct: u8) -> Vec<MappedStage> {
    let mut found_active = false;
    steps
        .iter()
        .map(|step| {
            let state = if pct >= step.done_pct {
                StepState::Done
            } else if !found_active {
                found_active = true;
                StepState::Active
            } else {
                StepState::Pending
            };
            MappedStage {
                label: step.label.clone(),
                state,
            }
        })
        .collect()
}

/// The nine phases of the generation job, with the percentages the backend
/// reports when each one finishes.
pub fn default_pipeline() -> Vec<PipelineStep> {
    vec![
        PipelineStep::new("Copie de travail", 12),
        PipelineStep::new("Anonymisation du document", 22),
        PipelineStep::new("Extraction des questions", 32),
        PipelineStep::new("Sélection des références", 48),
        PipelineStep::new("Génération des réponses via Claude", 68),
        PipelineStep::new("Écriture dans le document", 78),
        PipelineStep::new("Dé-anonymisation", 86),
        PipelineStep::new("Points d'attention via Claude", 93),
        PipelineStep::new("Finalisation", 99),
    ]
}
