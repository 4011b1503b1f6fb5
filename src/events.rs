// Event names and payload structures emitted by the wizard engine
// These are what a front end subscribes to for real-time updates

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::generation::{GenerationEvent, MappedStage};
use crate::wizard::submission::CadrageSubmission;

// Event name constants
pub const EVENT_CADRAGE_SUBMITTED: &str = "cadrage:submitted";
pub const EVENT_STAGE_CHANGED: &str = "generation:stage_changed";
pub const EVENT_GENERATION_COMPLETED: &str = "generation:completed";
pub const EVENT_GENERATION_FAILED: &str = "generation:failed";

/// Payload for cadrage submission events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CadrageSubmittedPayload {
    pub project_id: String,
    pub verbosity_level: u8,
    pub answered_count: usize,
    pub timestamp: String,
}

/// Payload for per-tick stage updates during generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageChangedPayload {
    pub project_id: String,
    pub pct: u8,
    pub step_label: String,
    pub stages: Vec<MappedStage>,
}

/// Payload for terminal generation success
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationCompletedPayload {
    pub project_id: String,
    pub timestamp: String,
}

/// Payload for terminal generation failure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationFailedPayload {
    pub project_id: String,
    pub message: String,
    pub timestamp: String,
}

impl CadrageSubmittedPayload {
    pub fn new(project_id: &str, submission: &CadrageSubmission) -> Self {
        Self {
            project_id: project_id.to_string(),
            verbosity_level: submission.verbosity_level,
            answered_count: submission.answered_count(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Wire form of a generation event: event name plus JSON payload, ready for
/// a front-end event bus. Serialization of these payloads cannot fail; a
/// null payload would only ever appear if a payload type stopped being
/// serializable.
pub fn wire_event(event: &GenerationEvent) -> (&'static str, serde_json::Value) {
    fn to_value<T: Serialize>(payload: T) -> serde_json::Value {
        serde_json::to_value(payload).unwrap_or(serde_json::Value::Null)
    }
    match event {
        GenerationEvent::StageChanged {
            project_id,
            pct,
            step_label,
            stages,
            ..
        } => (
            EVENT_STAGE_CHANGED,
            to_value(StageChangedPayload {
                project_id: project_id.clone(),
                pct: *pct,
                step_label: step_label.clone(),
                stages: stages.clone(),
            }),
        ),
        GenerationEvent::Completed { project_id, .. } => (
            EVENT_GENERATION_COMPLETED,
            to_value(GenerationCompletedPayload {
                project_id: project_id.clone(),
                timestamp: Utc::now().to_rfc3339(),
            }),
        ),
        GenerationEvent::Failed {
            project_id,
            message,
            ..
        } => (
            EVENT_GENERATION_FAILED,
            to_value(GenerationFailedPayload {
                project_id: project_id.clone(),
                message: message.clone(),
                timestamp: Utc::now().to_rfc3339(),
            }),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::StepState;

    #[test]
    fn test_event_constants() {
        assert_eq!(EVENT_CADRAGE_SUBMITTED, "cadrage:submitted");
        assert_eq!(EVENT_STAGE_CHANGED, "generation:stage_changed");
        assert_eq!(EVENT_GENERATION_COMPLETED, "generation:completed");
        assert_eq!(EVENT_GENERATION_FAILED, "generation:failed");
    }

    #[test]
    fn test_cadrage_submitted_payload_serialization() {
        let payload = CadrageSubmittedPayload {
            project_id: "p-123".to_string(),
            verbosity_level: 3,
            answered_count: 5,
            timestamp: "2024-01-01T00:00:00Z".to_string(),
        };

        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"projectId\":\"p-123\""));
        assert!(json.contains("\"verbosityLevel\":3"));
        assert!(json.contains("\"answeredCount\":5"));
    }

    #[test]
    fn test_stage_changed_payload_serialization() {
        let payload = StageChangedPayload {
            project_id: "p-123".to_string(),
            pct: 50,
            step_label: "Génération des réponses via Claude".to_string(),
            stages: vec![MappedStage {
                label: "Copie de travail".to_string(),
                state: StepState::Done,
            }],
        };

        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"pct\":50"));
        assert!(json.contains("\"stepLabel\""));
        assert!(json.contains("\"state\":\"done\""));
    }

    #[test]
    fn test_wire_event_names_and_payloads() {
        use uuid::Uuid;

        let event = GenerationEvent::Completed {
            poll_id: Uuid::new_v4(),
            project_id: "p-9".to_string(),
        };
        let (name, payload) = wire_event(&event);
        assert_eq!(name, EVENT_GENERATION_COMPLETED);
        assert_eq!(payload["projectId"], "p-9");

        let event = GenerationEvent::Failed {
            poll_id: Uuid::new_v4(),
            project_id: "p-9".to_string(),
            message: "Quota épuisé".to_string(),
        };
        let (name, payload) = wire_event(&event);
        assert_eq!(name, EVENT_GENERATION_FAILED);
        assert_eq!(payload["message"], "Quota épuisé");
    }

    #[test]
    fn test_generation_failed_payload_serialization() {
        let payload = GenerationFailedPayload {
            project_id: "p-123".to_string(),
            message: "Claude indisponible".to_string(),
            timestamp: "2024-01-01T00:00:00Z".to_string(),
        };

        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"message\":\"Claude indisponible\""));
    }
}
