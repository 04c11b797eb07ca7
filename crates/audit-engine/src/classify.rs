//! Conformity classification of committed answers.
//!
//! Rules apply in priority order:
//! 1. a checklist answer is non-conforming (its items are the deficiencies);
//! 2. a quality sub-answer marked non-conforming makes the answer
//!    non-conforming;
//! 3. closed taxonomies, free text, and dates record facts and conform;
//! 4. booleans conform on "Oui" and "N/A", and on "Non" only when the
//!    template flags "Non" as an accepted business fact.
//!
//! Callers never classify an empty checklist: nothing ticked means nothing
//! missing, and the traversal records it as conforming directly.

use audit_core::{QualityDetail, QualityVerdict, QuestionKind, QuestionTemplate, RawValue, Tristate};

/// Whether `value` (with its optional quality detail) conforms for `question`.
pub fn classify(question: &QuestionTemplate, value: &RawValue, quality: Option<&QualityDetail>) -> bool {
    if matches!(value, RawValue::Checklist(_)) {
        return false;
    }

    if quality.is_some_and(|q| q.verdict == QualityVerdict::NonConforming) {
        return false;
    }

    match &question.kind {
        QuestionKind::SingleChoice {
            taxonomy: Some(_), ..
        }
        | QuestionKind::FreeText
        | QuestionKind::Date => true,
        QuestionKind::SingleChoice {
            taxonomy: None,
            nonconforming,
            ..
        } => value
            .match_key()
            .map_or(true, |key| !nonconforming.iter().any(|n| n == key)),
        QuestionKind::Boolean { .. } => match value {
            RawValue::Boolean(Tristate::Yes | Tristate::NotApplicable) => true,
            RawValue::Boolean(Tristate::No) => question.accepts_no,
            _ => false,
        },
        QuestionKind::Checklist { .. } => false,
    }
}

/// Whether an anomalous answer to `question` may be committed without a
/// justification and obligation class.
pub fn is_exempt(question: &QuestionTemplate) -> bool {
    match &question.kind {
        QuestionKind::Checklist { .. } | QuestionKind::FreeText | QuestionKind::Date => true,
        QuestionKind::SingleChoice { taxonomy, .. } => taxonomy.is_some(),
        QuestionKind::Boolean { .. } => question.accepts_no,
    }
}
