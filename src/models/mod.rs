// Data models matching the backend API types (snake_case on the wire)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reserved question id carrying the verbosity choice. Its answer is a
/// UI-local signal and is stripped from the submitted payload.
pub const VERBOSITY_QUESTION_ID: u32 = 99;

/// Input kind of a cadrage question
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Options,
    Number,
    Text,
}

impl Default for QuestionType {
    fn default() -> Self {
        QuestionType::Text
    }
}

/// Comparison applied to the referenced answer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    Contains,
}

/// Visibility condition referencing an earlier question's answer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Condition {
    pub question_id: u32,
    pub operator: ConditionOperator,
    pub value: String,
}

/// A single cadrage question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    pub text: String,
    #[serde(rename = "type", default)]
    pub question_type: QuestionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub multi: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

/// An answer as entered by the user. Numbers travel as strings, matching
/// the wire format; multi-select answers keep their selection order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    Many(Vec<String>),
}

impl AnswerValue {
    /// Scalar view of this answer; `None` for multi-select values
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(value) => Some(value),
            AnswerValue::Many(_) => None,
        }
    }

    /// An empty string or an empty selection counts as "no answer"
    pub fn is_empty_answer(&self) -> bool {
        match self {
            AnswerValue::Text(value) => value.trim().is_empty(),
            AnswerValue::Many(values) => values.is_empty(),
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::Text(value.to_string())
    }
}

impl From<Vec<String>> for AnswerValue {
    fn from(values: Vec<String>) -> Self {
        AnswerValue::Many(values)
    }
}

/// Question id -> answer. Absence of a key means "unanswered". A BTreeMap
/// keeps serialization order stable.
pub type AnswerStore = BTreeMap<u32, AnswerValue>;

/// Lifecycle states of a project job on the backend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Created,
    StructureDetected,
    Cadrage,
    Anonymizing,
    Generating,
    Completed,
    Error,
}

impl JobStatus {
    /// Terminal states stop the polling loop
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }
}

/// One response from the generation status endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusReport {
    pub status: JobStatus,
    #[serde(default)]
    pub progress_pct: u8,
    #[serde(default)]
    pub progress_step: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Detected layout of one xlsx sheet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetStructure {
    pub name: String,
    #[serde(default = "default_true")]
    pub has_questions: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_column: Option<String>,
    pub question_column: String,
    #[serde(default)]
    pub response_columns: Vec<String>,
    #[serde(default = "default_header_row")]
    pub header_row: u32,
    #[serde(default = "default_first_data_row")]
    pub first_data_row: u32,
}

fn default_true() -> bool {
    true
}

fn default_header_row() -> u32 {
    1
}

fn default_first_data_row() -> u32 {
    2
}

/// Auto-detected document structure, confirmed by the user in the structure
/// step. The wizard only carries it between steps; editing is plain field
/// binding in the front end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentStructure {
    pub format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheets: Option<Vec<SheetStructure>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_marker: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_deserializes_from_api_shape() {
        let json = r#"{
            "id": 2,
            "text": "Quel est le contexte ?",
            "type": "options",
            "options": ["Oui", "Non"],
            "multi": false,
            "condition": {"question_id": 1, "operator": "contains", "value": "Défense"}
        }"#;

        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.id, 2);
        assert_eq!(q.question_type, QuestionType::Options);
        let cond = q.condition.unwrap();
        assert_eq!(cond.question_id, 1);
        assert_eq!(cond.operator, ConditionOperator::Contains);
        assert_eq!(cond.value, "Défense");
    }

    #[test]
    fn test_question_defaults_without_condition() {
        let json = r#"{"id": 1, "text": "Combien ?", "type": "number"}"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.question_type, QuestionType::Number);
        assert!(q.options.is_none());
        assert!(!q.multi);
        assert!(q.condition.is_none());
    }

    #[test]
    fn test_answer_value_untagged_round_trip() {
        let scalar: AnswerValue = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(scalar, AnswerValue::Text("42".to_string()));

        let multi: AnswerValue = serde_json::from_str(r#"["a", "b"]"#).unwrap();
        assert_eq!(
            multi,
            AnswerValue::Many(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_answer_store_serializes_ids_as_string_keys() {
        let mut answers = AnswerStore::new();
        answers.insert(1, AnswerValue::from("Oui"));
        answers.insert(3, AnswerValue::Many(vec!["x".to_string()]));

        let json = serde_json::to_string(&answers).unwrap();
        assert_eq!(json, r#"{"1":"Oui","3":["x"]}"#);
    }

    #[test]
    fn test_empty_answer_detection() {
        assert!(AnswerValue::from("   ").is_empty_answer());
        assert!(AnswerValue::Many(vec![]).is_empty_answer());
        assert!(!AnswerValue::from("réponse").is_empty_answer());
        assert!(!AnswerValue::Many(vec!["x".to_string()]).is_empty_answer());
    }

    #[test]
    fn test_job_status_terminal_states() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Error.is_terminal());
        assert!(!JobStatus::Generating.is_terminal());
        assert!(!JobStatus::Anonymizing.is_terminal());
    }

    #[test]
    fn test_status_report_tolerates_missing_fields() {
        let report: JobStatusReport =
            serde_json::from_str(r#"{"status": "generating"}"#).unwrap();
        assert_eq!(report.status, JobStatus::Generating);
        assert_eq!(report.progress_pct, 0);
        assert!(report.progress_step.is_empty());
        assert!(report.error_message.is_none());
    }

    #[test]
    fn test_sheet_structure_defaults() {
        let sheet: SheetStructure =
            serde_json::from_str(r#"{"name": "Sheet1", "question_column": "A"}"#).unwrap();
        assert!(sheet.has_questions);
        assert_eq!(sheet.header_row, 1);
        assert_eq!(sheet.first_data_row, 2);
        assert!(sheet.response_columns.is_empty());
    }
}
