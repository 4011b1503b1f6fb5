//! Question catalog loading
//!
//! Cadrage questions are configured as a YAML list of raw entries whose
//! `condition` field uses a small DSL referencing the previous question:
//! `previous == "value"` or `previous contains "value"`. The catalog
//! resolves those into [`Condition`]s against 1-based question ids and
//! synthesises the reserved verbosity question (id 99) from the configured
//! verbosity levels. The same shape is served by the backend questions
//! endpoint, so the catalog also deserializes straight from the API.

use std::collections::BTreeMap;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::WizardError;
use crate::models::{
    Condition, ConditionOperator, Question, QuestionType, VERBOSITY_QUESTION_ID,
};

/// Text of the reserved verbosity question
pub const VERBOSITY_QUESTION_TEXT: &str =
    "Quel niveau de détail souhaitez-vous pour les réponses ?";

/// Raw question entry as written in the catalog file
#[derive(Debug, Clone, Deserialize)]
struct RawQuestion {
    text: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    options: Option<Vec<String>>,
    #[serde(default)]
    multi: bool,
    condition: Option<String>,
}

/// One configured verbosity level
#[derive(Debug, Clone, Deserialize)]
struct RawVerbosityLevel {
    label: String,
    max_words: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawVerbositySection {
    #[serde(default)]
    levels: BTreeMap<String, RawVerbosityLevel>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    questions: Vec<RawQuestion>,
    #[serde(default)]
    verbosity: RawVerbositySection,
}

/// The resolved catalog: ordinary questions plus the verbosity question.
/// Matches the wire shape of the backend questions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionCatalog {
    pub questions: Vec<Question>,
    pub verbosity_question: Question,
}

impl QuestionCatalog {
    /// The full list walked by the navigator: ordinary questions in catalog
    /// order, then the verbosity question last.
    pub fn combined(&self) -> Vec<Question> {
        let mut all = self.questions.clone();
        all.push(self.verbosity_question.clone());
        all
    }
}

/// Parse a condition DSL string against the previous question's id.
/// Anything that does not yield a quoted value degrades to an empty value
/// rather than failing; a syntactically hopeless entry returns `None` and
/// leaves the question unconditionally visible.
fn parse_condition(raw: &str, previous_id: u32) -> Option<Condition> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let operator = if raw.contains("contains") {
        ConditionOperator::Contains
    } else if raw.contains("==") {
        ConditionOperator::Equals
    } else {
        log::warn!("unrecognised condition {:?}; question left visible", raw);
        return None;
    };

    // First quoted string is the comparison value
    let value_re = Regex::new(r#""([^"]+)""#).ok()?;
    let value = value_re
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    Some(Condition {
        question_id: previous_id,
        operator,
        value,
    })
}

fn build_questions(raw: &[RawQuestion]) -> Vec<Question> {
    raw.iter()
        .enumerate()
        .map(|(idx, q)| {
            let id = idx as u32 + 1;
            let question_type = if q.options.is_some() {
                QuestionType::Options
            } else {
                match q.kind.as_deref() {
                    Some("number") => QuestionType::Number,
                    _ => QuestionType::Text,
                }
            };
            // "previous" resolves to the question right before this one;
            // idx is already that question's 1-based id
            let condition = q
                .condition
                .as_deref()
                .and_then(|raw| parse_condition(raw, idx as u32));

            Question {
                id,
                text: q.text.clone(),
                question_type,
                options: q.options.clone(),
                multi: q.multi,
                condition,
            }
        })
        .collect()
}

fn build_verbosity_question(section: &RawVerbositySection) -> Question {
    let mut levels: Vec<(&String, &RawVerbosityLevel)> = section.levels.iter().collect();
    levels.sort_by_key(|(lvl, _)| lvl.parse::<u32>().unwrap_or(u32::MAX));

    let options: Vec<String> = if levels.is_empty() {
        // No configured levels: fall back to the standard three
        vec![
            "1 — Court (80 mots max)".to_string(),
            "2 — Standard (150 mots max)".to_string(),
            "3 — Détaillé (300 mots max)".to_string(),
        ]
    } else {
        levels
            .iter()
            .map(|(lvl, data)| format!("{} — {} ({} mots max)", lvl, data.label, data.max_words))
            .collect()
    };

    Question {
        id: VERBOSITY_QUESTION_ID,
        text: VERBOSITY_QUESTION_TEXT.to_string(),
        question_type: QuestionType::Options,
        options: Some(options),
        multi: false,
        condition: None,
    }
}

/// Parse a catalog from YAML text
pub fn parse_catalog(yaml: &str) -> Result<QuestionCatalog, WizardError> {
    let raw: RawCatalog = serde_yaml::from_str(yaml)
        .map_err(|e| WizardError::Config(format!("invalid catalog: {}", e)))?;
    Ok(QuestionCatalog {
        questions: build_questions(&raw.questions),
        verbosity_question: build_verbosity_question(&raw.verbosity),
    })
}

/// Load a catalog from a YAML file
pub fn load_catalog(path: &Path) -> Result<QuestionCatalog, WizardError> {
    let yaml = std::fs::read_to_string(path).map_err(|e| {
        WizardError::Config(format!("cannot read catalog {}: {}", path.display(), e))
    })?;
    parse_catalog(&yaml)
}
