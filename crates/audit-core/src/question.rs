//! Question templates: the immutable, catalog-owned description of one
//! question in a document questionnaire.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::answer::{RawValue, Tristate};

/// Index of a question inside its document template's arena.
///
/// Top-level questions occupy the first slots in presentation order;
/// follow-up questions are appended after them when the template is
/// flattened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateRef(pub usize);

impl fmt::Display for TemplateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Closed business classifications. Every option of such a question is a
/// valid outcome, so they never count as anomalies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Taxonomy {
    DocumentMedium,
    MonetaryBracket,
    VigilanceLevel,
    GdaStatus,
    OperationType,
    OperationStatus,
    RedemptionMotive,
    FundsOrigin,
    SuspicionDeclaration,
    RiskLevel,
    EsgRespect,
    ProfileOrigin,
}

impl fmt::Display for Taxonomy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Taxonomy::DocumentMedium => "document medium",
            Taxonomy::MonetaryBracket => "monetary bracket",
            Taxonomy::VigilanceLevel => "vigilance level",
            Taxonomy::GdaStatus => "GDA status",
            Taxonomy::OperationType => "operation type",
            Taxonomy::OperationStatus => "operation status",
            Taxonomy::RedemptionMotive => "redemption motive",
            Taxonomy::FundsOrigin => "origin of funds",
            Taxonomy::SuspicionDeclaration => "suspicion declaration",
            Taxonomy::RiskLevel => "risk level",
            Taxonomy::EsgRespect => "ESG respect",
            Taxonomy::ProfileOrigin => "profile origin",
        };
        f.write_str(name)
    }
}

/// The answer shape a question expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    Boolean {
        #[serde(default)]
        allow_not_applicable: bool,
    },
    SingleChoice {
        options: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        taxonomy: Option<Taxonomy>,
        /// Options that denote a deficiency. Ignored for taxonomies.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        nonconforming: Vec<String>,
    },
    /// Every ticked item is a deficiency.
    Checklist { options: Vec<String> },
    FreeText,
    Date,
}

impl QuestionKind {
    /// Options offered to the operator, empty for open kinds.
    pub fn options(&self) -> Vec<String> {
        match self {
            QuestionKind::Boolean {
                allow_not_applicable,
            } => {
                let mut opts = vec![
                    Tristate::Yes.label().to_string(),
                    Tristate::No.label().to_string(),
                ];
                if *allow_not_applicable {
                    opts.push(Tristate::NotApplicable.label().to_string());
                }
                opts
            }
            QuestionKind::SingleChoice { options, .. } | QuestionKind::Checklist { options } => {
                options.clone()
            }
            QuestionKind::FreeText | QuestionKind::Date => Vec::new(),
        }
    }

    /// Short name of the kind, as shown in listings.
    pub fn name(&self) -> &'static str {
        match self {
            QuestionKind::Boolean { .. } => "boolean",
            QuestionKind::SingleChoice { .. } => "single-choice",
            QuestionKind::Checklist { .. } => "checklist",
            QuestionKind::FreeText => "free-text",
            QuestionKind::Date => "date",
        }
    }

    pub fn taxonomy(&self) -> Option<Taxonomy> {
        match self {
            QuestionKind::SingleChoice { taxonomy, .. } => *taxonomy,
            _ => None,
        }
    }
}

/// How a prior answer is tested by visibility and follow-up rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "match", rename_all = "snake_case")]
pub enum MatchRule {
    Equals { value: String },
    OneOf { values: Vec<String> },
    /// The referenced checklist has at least one ticked item.
    AnySelected,
}

impl MatchRule {
    pub fn equals(value: impl Into<String>) -> Self {
        MatchRule::Equals {
            value: value.into(),
        }
    }

    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MatchRule::OneOf {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, value: &RawValue) -> bool {
        match self {
            MatchRule::Equals { value: expected } => value.match_key() == Some(expected.as_str()),
            MatchRule::OneOf { values } => value
                .match_key()
                .is_some_and(|key| values.iter().any(|v| v == key)),
            MatchRule::AnySelected => value.selected_count() > 0,
        }
    }
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchRule::Equals { value } => write!(f, "= {value}"),
            MatchRule::OneOf { values } => write!(f, "in {{{}}}", values.join(", ")),
            MatchRule::AnySelected => write!(f, "has selection"),
        }
    }
}

/// When a question is shown.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "when", rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Always,
    OnlyForControls { controls: BTreeSet<String> },
    ExceptForControls { controls: BTreeSet<String> },
    /// Shown when the question `offset` places earlier matches `rule`.
    Answer { offset: usize, rule: MatchRule },
}

/// Nested sub-question shown only when the primary answer is affirmative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityCheck {
    pub prompt: String,
    /// Criteria the operator can flag as failing.
    pub criteria: Vec<String>,
    /// Whether an affirmative answer must carry a quality verdict.
    #[serde(default = "default_true")]
    pub required: bool,
}

fn default_true() -> bool {
    true
}

/// Flattened follow-up: splice `question` right after the owning question
/// when its answer matches `trigger`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpRule {
    /// Answer that injects the follow-up.
    pub trigger: MatchRule,
    /// Arena slot of the follow-up question.
    pub question: TemplateRef,
}

/// One question of a document template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionTemplate {
    /// This question's own slot in the template arena.
    pub position: TemplateRef,
    /// Text shown to the operator.
    pub prompt: String,
    pub help_text: Option<String>,
    /// Answer shape and allowed values.
    pub kind: QuestionKind,
    /// Whether an empty free-text or date answer is refused.
    pub required: bool,
    /// When the question is shown.
    pub visibility: Visibility,
    /// Answers that end the document immediately.
    pub skip_on: Vec<String>,
    /// Sub-check asked on an affirmative answer.
    pub quality: Option<QualityCheck>,
    /// Question spliced in after this one on a matching answer.
    pub follow_up: Option<FollowUpRule>,
    /// A "No" here is a neutral business fact, not a deficiency.
    pub accepts_no: bool,
}

impl QuestionTemplate {
    /// Whether `value` is one of this question's skip triggers.
    pub fn skips_on(&self, value: &RawValue) -> bool {
        value
            .match_key()
            .is_some_and(|key| self.skip_on.iter().any(|s| s == key))
    }

    /// Whether `value` opens the quality sub-check.
    pub fn is_affirmative(&self, value: &RawValue) -> bool {
        matches!(value, RawValue::Boolean(Tristate::Yes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_rules() {
        let oui = RawValue::Boolean(Tristate::Yes);
        assert!(MatchRule::equals("Oui").matches(&oui));
        assert!(!MatchRule::equals("Non").matches(&oui));
        assert!(MatchRule::one_of(["Non", "Oui"]).matches(&oui));
        assert!(!MatchRule::AnySelected.matches(&oui));
    }

    #[test]
    fn any_selected_counts_items_not_equality() {
        let ticked = RawValue::Checklist(vec!["Signature".into()]);
        let empty = RawValue::Checklist(vec![]);
        assert!(MatchRule::AnySelected.matches(&ticked));
        assert!(!MatchRule::AnySelected.matches(&empty));
        assert!(!MatchRule::equals("Signature").matches(&ticked));
    }

    #[test]
    fn boolean_options_follow_na_flag() {
        let strict = QuestionKind::Boolean {
            allow_not_applicable: false,
        };
        let lenient = QuestionKind::Boolean {
            allow_not_applicable: true,
        };
        assert_eq!(strict.options(), vec!["Oui", "Non"]);
        assert_eq!(lenient.options(), vec!["Oui", "Non", "N/A"]);
    }

    #[test]
    fn visibility_defaults_to_always() {
        assert_eq!(Visibility::default(), Visibility::Always);
    }

    #[test]
    fn kind_serializes_with_type_tag() {
        let kind = QuestionKind::Checklist {
            options: vec!["A".into()],
        };
        let json = serde_json::to_string(&kind).unwrap();
        assert!(json.contains(r#""type":"checklist""#));
    }
}
