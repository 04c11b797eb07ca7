//! Operator answers: the submitted value object and the committed record.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Tri-state value of a boolean question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tristate {
    Yes,
    No,
    NotApplicable,
}

impl Tristate {
    /// The label matched against skip triggers and follow-up rules.
    pub fn label(&self) -> &'static str {
        match self {
            Tristate::Yes => "Oui",
            Tristate::No => "Non",
            Tristate::NotApplicable => "N/A",
        }
    }
}

impl fmt::Display for Tristate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Tristate {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "oui" | "o" | "yes" | "y" | "true" => Ok(Tristate::Yes),
            "non" | "n" | "no" | "false" => Ok(Tristate::No),
            "n/a" | "na" | "sans objet" | "not applicable" | "non applicable" => {
                Ok(Tristate::NotApplicable)
            }
            _ => Err(ModelError::InvalidTristate(s.to_string())),
        }
    }
}

/// The raw value an operator gives to a question. Its shape follows the
/// question kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RawValue {
    Boolean(Tristate),
    Choice(String),
    Text(String),
    /// ISO date, `YYYY-MM-DD`.
    Date(String),
    /// Selected checklist items, in the order the operator ticked them.
    Checklist(Vec<String>),
}

impl RawValue {
    /// Build a date value, rejecting anything that is not a real calendar day.
    pub fn date(s: &str) -> Result<Self, ModelError> {
        let s = s.trim();
        if is_iso_date(s) {
            Ok(RawValue::Date(s.to_string()))
        } else {
            Err(ModelError::InvalidDate(s.to_string()))
        }
    }

    /// Scalar form used by equality rules and skip triggers.
    ///
    /// Checklists have no scalar form.
    pub fn match_key(&self) -> Option<&str> {
        match self {
            RawValue::Boolean(t) => Some(t.label()),
            RawValue::Choice(s) | RawValue::Text(s) | RawValue::Date(s) => Some(s.as_str()),
            RawValue::Checklist(_) => None,
        }
    }

    /// Number of ticked items for checklists, zero for every other kind.
    pub fn selected_count(&self) -> usize {
        match self {
            RawValue::Checklist(items) => items.len(),
            _ => 0,
        }
    }

    /// Semantic equality: checklist selections compare as sets.
    pub fn same_as(&self, other: &RawValue) -> bool {
        match (self, other) {
            (RawValue::Checklist(a), RawValue::Checklist(b)) => {
                let a: BTreeSet<&String> = a.iter().collect();
                let b: BTreeSet<&String> = b.iter().collect();
                a == b
            }
            _ => self == other,
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Boolean(t) => write!(f, "{t}"),
            RawValue::Choice(s) | RawValue::Text(s) | RawValue::Date(s) => write!(f, "{s}"),
            RawValue::Checklist(items) if items.is_empty() => write!(f, "(none)"),
            RawValue::Checklist(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

fn is_iso_date(s: &str) -> bool {
    let parts: Vec<&str> = s.split('-').collect();
    if parts.len() != 3 || parts[0].len() != 4 || parts[1].len() != 2 || parts[2].len() != 2 {
        return false;
    }
    let (Ok(y), Ok(m), Ok(d)) = (
        parts[0].parse::<u32>(),
        parts[1].parse::<u32>(),
        parts[2].parse::<u32>(),
    ) else {
        return false;
    };
    let leap = y % 4 == 0 && (y % 100 != 0 || y % 400 == 0);
    let days_in_month = match m {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if leap => 29,
        2 => 28,
        _ => return false,
    };
    (1..=days_in_month).contains(&d)
}

/// Outcome of a quality sub-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityVerdict {
    Conforming,
    NonConforming,
}

impl FromStr for QualityVerdict {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "conforme" | "conforming" | "ok" => Ok(QualityVerdict::Conforming),
            "non-conforme" | "non conforme" | "non-conforming" | "ko" => {
                Ok(QualityVerdict::NonConforming)
            }
            _ => Err(ModelError::InvalidVerdict(s.to_string())),
        }
    }
}

/// Structured detail attached to an affirmative answer whose template
/// declares a quality check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityDetail {
    pub verdict: QualityVerdict,
    /// Criteria the operator flagged as failing.
    #[serde(default)]
    pub failed: BTreeSet<String>,
}

impl QualityDetail {
    pub fn conforming() -> Self {
        Self {
            verdict: QualityVerdict::Conforming,
            failed: BTreeSet::new(),
        }
    }

    pub fn non_conforming<I, S>(failed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            verdict: QualityVerdict::NonConforming,
            failed: failed.into_iter().map(Into::into).collect(),
        }
    }
}

/// Whether an anomaly weighs on the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObligationClass {
    Mandatory,
    Optional,
}

impl fmt::Display for ObligationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObligationClass::Mandatory => write!(f, "mandatory"),
            ObligationClass::Optional => write!(f, "optional"),
        }
    }
}

impl FromStr for ObligationClass {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mandatory" | "obligatoire" => Ok(ObligationClass::Mandatory),
            "optional" | "facultatif" | "optionnel" => Ok(ObligationClass::Optional),
            _ => Err(ModelError::InvalidObligation(s.to_string())),
        }
    }
}

/// A fully formed answer as handed to the engine by a presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// The operator's answer.
    pub value: RawValue,
    /// Quality sub-answer, for affirmative answers to checked questions.
    pub quality: Option<QualityDetail>,
    /// Explanation of an anomaly.
    pub justification: Option<String>,
    /// Whether the anomaly counts toward the verdict.
    pub obligation: Option<ObligationClass>,
}

impl Submission {
    pub fn new(value: RawValue) -> Self {
        Self {
            value,
            quality: None,
            justification: None,
            obligation: None,
        }
    }

    /// Shorthand for a boolean answer.
    pub fn boolean(value: Tristate) -> Self {
        Self::new(RawValue::Boolean(value))
    }

    /// Shorthand for a single-choice answer.
    pub fn choice(option: impl Into<String>) -> Self {
        Self::new(RawValue::Choice(option.into()))
    }

    /// Shorthand for a checklist answer.
    pub fn checklist<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(RawValue::Checklist(
            items.into_iter().map(Into::into).collect(),
        ))
    }

    /// Builder: attach a quality sub-answer.
    pub fn with_quality(mut self, quality: QualityDetail) -> Self {
        self.quality = Some(quality);
        self
    }

    /// Builder: attach justification and obligation class.
    pub fn justified(mut self, text: impl Into<String>, obligation: ObligationClass) -> Self {
        self.justification = Some(text.into());
        self.obligation = Some(obligation);
        self
    }
}

/// A committed answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Value as validated and normalized at commit time.
    pub raw_value: RawValue,
    pub quality: Option<QualityDetail>,
    /// Required when the answer does not conform.
    pub justification: Option<String>,
    pub obligation: Option<ObligationClass>,
    /// Classifier verdict, computed once at commit time.
    pub conforms: bool,
    /// Revision only: the operator changed the parent's answer.
    #[serde(default)]
    pub was_modified: bool,
    /// Revision only: the parent's value, when modified.
    #[serde(default)]
    pub original_raw_value: Option<RawValue>,
    /// Revision only: the parent's quality sub-answer, when modified.
    #[serde(default)]
    pub original_quality: Option<QualityDetail>,
}

impl Answer {
    pub fn from_submission(submission: Submission, conforms: bool) -> Self {
        Self {
            raw_value: submission.value,
            quality: submission.quality,
            justification: submission.justification,
            obligation: submission.obligation,
            conforms,
            was_modified: false,
            original_raw_value: None,
            original_quality: None,
        }
    }

    /// Anomalies that weigh on the verdict.
    pub fn is_mandatory_anomaly(&self) -> bool {
        !self.conforms && self.obligation == Some(ObligationClass::Mandatory)
    }

    /// Anomalies recorded but not blocking.
    pub fn is_optional_anomaly(&self) -> bool {
        !self.conforms && self.obligation != Some(ObligationClass::Mandatory)
    }

    /// Compare the operator-facing content of two answers: raw value
    /// (checklists as sets), quality sub-answer, and justification.
    pub fn same_content(&self, other: &Answer) -> bool {
        self.raw_value.same_as(&other.raw_value)
            && self.quality == other.quality
            && self.justification == other.justification
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tristate_parsing() {
        assert_eq!("Oui".parse::<Tristate>().unwrap(), Tristate::Yes);
        assert_eq!("non".parse::<Tristate>().unwrap(), Tristate::No);
        assert_eq!("N/A".parse::<Tristate>().unwrap(), Tristate::NotApplicable);
        assert!("peut-etre".parse::<Tristate>().is_err());
    }

    #[test]
    fn match_keys() {
        assert_eq!(RawValue::Boolean(Tristate::Yes).match_key(), Some("Oui"));
        assert_eq!(RawValue::Choice("Papier".into()).match_key(), Some("Papier"));
        assert_eq!(RawValue::Checklist(vec!["A".into()]).match_key(), None);
    }

    #[test]
    fn checklist_comparison_ignores_order() {
        let a = RawValue::Checklist(vec!["A".into(), "B".into()]);
        let b = RawValue::Checklist(vec!["B".into(), "A".into()]);
        let c = RawValue::Checklist(vec!["A".into()]);
        assert!(a.same_as(&b));
        assert!(!a.same_as(&c));
        assert_ne!(a, b);
    }

    #[test]
    fn date_validation() {
        assert!(RawValue::date("2024-02-29").is_ok());
        assert!(RawValue::date("2023-02-29").is_err());
        assert!(RawValue::date("2024-13-01").is_err());
        assert!(RawValue::date("01/02/2024").is_err());
        assert!(RawValue::date("2024-1-01").is_err());
    }

    #[test]
    fn obligation_parsing() {
        assert_eq!(
            "obligatoire".parse::<ObligationClass>().unwrap(),
            ObligationClass::Mandatory
        );
        assert_eq!(
            "optional".parse::<ObligationClass>().unwrap(),
            ObligationClass::Optional
        );
        assert!("sometimes".parse::<ObligationClass>().is_err());
    }

    #[test]
    fn anomaly_classes() {
        let base = Answer::from_submission(Submission::boolean(Tristate::No), false);
        assert!(base.is_optional_anomaly());
        assert!(!base.is_mandatory_anomaly());

        let mandatory = Answer::from_submission(
            Submission::boolean(Tristate::No).justified("absent", ObligationClass::Mandatory),
            false,
        );
        assert!(mandatory.is_mandatory_anomaly());
    }

    #[test]
    fn same_content_covers_justification() {
        let a = Answer::from_submission(
            Submission::boolean(Tristate::No).justified("x", ObligationClass::Mandatory),
            false,
        );
        let mut b = a.clone();
        assert!(a.same_content(&b));
        b.justification = Some("y".into());
        assert!(!a.same_content(&b));
    }

    #[test]
    fn raw_value_json_shape() {
        let json = serde_json::to_string(&RawValue::Boolean(Tristate::Yes)).unwrap();
        assert_eq!(json, r#"{"kind":"boolean","value":"Yes"}"#);
    }
}
