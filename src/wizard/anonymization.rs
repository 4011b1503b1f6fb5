// Anonymisation mapping list for the anonymisation step
//
// The wizard only manages the real-term -> alias table; the substitution
// itself happens on the backend.

use serde::{Deserialize, Serialize};

/// One real-term -> alias substitution row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnonymMapping {
    pub real: String,
    pub alias: String,
}

impl AnonymMapping {
    pub fn new(real: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            real: real.into(),
            alias: alias.into(),
        }
    }

    /// A row is only sent when both sides are filled in
    pub fn is_complete(&self) -> bool {
        !self.real.trim().is_empty() && !self.alias.trim().is_empty()
    }
}

/// Prefilled suggestions shown when entering the anonymisation step: the
/// client and market names are the terms most tenders need masked.
pub fn default_suggestions() -> Vec<AnonymMapping> {
    vec![
        AnonymMapping::new("", "CLIENT"),
        AnonymMapping::new("", "MARCHE"),
    ]
}

/// Drop incomplete rows and trim the kept ones
pub fn sanitize(mappings: &[AnonymMapping]) -> Vec<AnonymMapping> {
    mappings
        .iter()
        .filter(|m| m.is_complete())
        .map(|m| AnonymMapping::new(m.real.trim(), m.alias.trim()))
        .collect()
}

/// Body for the anonymisation endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnonymizeBody {
    pub mappings: Vec<AnonymMapping>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_suggestions_have_empty_real_terms() {
        let suggestions = default_suggestions();
        assert_eq!(suggestions.len(), 2);
        assert!(suggestions.iter().all(|m| m.real.is_empty()));
        assert_eq!(suggestions[0].alias, "CLIENT");
        assert_eq!(suggestions[1].alias, "MARCHE");
    }

    #[test]
    fn test_sanitize_drops_incomplete_rows() {
        let mappings = vec![
            AnonymMapping::new("Ministère des Armées", "CLIENT"),
            AnonymMapping::new("", "MARCHE"),
            AnonymMapping::new("Projet Alpha", "  "),
            AnonymMapping::new("  Lot 2  ", " MARCHE "),
        ];

        let clean = sanitize(&mappings);
        assert_eq!(clean.len(), 2);
        assert_eq!(clean[0], AnonymMapping::new("Ministère des Armées", "CLIENT"));
        assert_eq!(clean[1], AnonymMapping::new("Lot 2", "MARCHE"));
    }

    #[test]
    fn test_anonymize_body_wire_shape() {
        let body = AnonymizeBody {
            mappings: vec![AnonymMapping::new("ACME", "CLIENT")],
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"mappings":[{"real":"ACME","alias":"CLIENT"}]}"#);
    }
}
