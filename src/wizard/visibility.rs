// Visibility resolution for conditional cadrage questions
//
// A question is visible when it has no condition or its condition holds
// against the current answers. Visibility is never cached: an earlier answer
// can change which later questions apply, so the navigator recomputes the
// visible sequence after every answer mutation.

use crate::models::{AnswerStore, AnswerValue, Condition, ConditionOperator, Question};

/// Evaluate a condition against the current answers.
///
/// An unanswered referent behaves as the empty scalar: `equals` holds only
/// for an empty condition value, `contains` likewise (every string contains
/// the empty string). A condition referencing a not-yet-asked question is
/// therefore simply unsatisfied rather than an error.
pub fn condition_satisfied(condition: &Condition, answers: &AnswerStore) -> bool {
    let referenced = answers.get(&condition.question_id);
    match condition.operator {
        ConditionOperator::Equals => match referenced {
            Some(AnswerValue::Text(value)) => value == &condition.value,
            // A multi-select answer never equals a scalar condition value
            Some(AnswerValue::Many(_)) => false,
            None => condition.value.is_empty(),
        },
        ConditionOperator::Contains => match referenced {
            Some(AnswerValue::Many(values)) => {
                values.iter().any(|v| v.contains(&condition.value))
            }
            Some(AnswerValue::Text(value)) => value.contains(&condition.value),
            None => condition.value.is_empty(),
        },
    }
}

/// Filter the full question list down to the currently visible subsequence,
/// preserving input order.
pub fn resolve_visible<'a>(questions: &'a [Question], answers: &AnswerStore) -> Vec<&'a Question> {
    questions
        .iter()
        .filter(|q| match &q.condition {
            None => true,
            Some(condition) => condition_satisfied(condition, answers),
        })
        .collect()
}
