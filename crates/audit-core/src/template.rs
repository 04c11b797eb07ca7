//! Document templates and the nested authoring form they are built from.
//!
//! Catalog authors describe follow-up chains as nested [`QuestionSpec`]s.
//! [`DocumentTemplate::new`] flattens them breadth-first into a single arena:
//! top-level questions keep their presentation order at the front, and each
//! follow-up becomes a [`FollowUpRule`] pointing at its arena slot.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::hash::{content_hash, hash_hex};
use crate::question::{
    FollowUpRule, MatchRule, QualityCheck, QuestionKind, QuestionTemplate, Taxonomy, TemplateRef,
    Visibility,
};
use crate::DocumentTypeId;

/// Authoring form of a follow-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpSpec {
    pub trigger: MatchRule,
    pub question: Box<QuestionSpec>,
}

/// Authoring form of a question, with follow-ups nested inline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSpec {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    pub kind: QuestionKind,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skip_on: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<QualityCheck>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up: Option<FollowUpSpec>,
    #[serde(default)]
    pub accepts_no: bool,
}

fn default_required() -> bool {
    true
}

impl QuestionSpec {
    fn with_kind(prompt: impl Into<String>, kind: QuestionKind) -> Self {
        Self {
            prompt: prompt.into(),
            help_text: None,
            kind,
            required: true,
            visibility: Visibility::Always,
            skip_on: Vec::new(),
            quality: None,
            follow_up: None,
            accepts_no: false,
        }
    }

    /// A yes/no question.
    pub fn boolean(prompt: impl Into<String>) -> Self {
        Self::with_kind(
            prompt,
            QuestionKind::Boolean {
                allow_not_applicable: false,
            },
        )
    }

    /// A single-choice question with no business taxonomy.
    pub fn choice<I, S>(prompt: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_kind(
            prompt,
            QuestionKind::SingleChoice {
                options: options.into_iter().map(Into::into).collect(),
                taxonomy: None,
                nonconforming: Vec::new(),
            },
        )
    }

    /// A single-choice question recording a closed business classification.
    pub fn taxonomy<I, S>(prompt: impl Into<String>, taxonomy: Taxonomy, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_kind(
            prompt,
            QuestionKind::SingleChoice {
                options: options.into_iter().map(Into::into).collect(),
                taxonomy: Some(taxonomy),
                nonconforming: Vec::new(),
            },
        )
    }

    /// A checklist of possible deficiencies.
    pub fn checklist<I, S>(prompt: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_kind(
            prompt,
            QuestionKind::Checklist {
                options: options.into_iter().map(Into::into).collect(),
            },
        )
    }

    pub fn free_text(prompt: impl Into<String>) -> Self {
        Self::with_kind(prompt, QuestionKind::FreeText)
    }

    pub fn date(prompt: impl Into<String>) -> Self {
        Self::with_kind(prompt, QuestionKind::Date)
    }

    /// Builder: set help text.
    pub fn help(mut self, text: impl Into<String>) -> Self {
        self.help_text = Some(text.into());
        self
    }

    /// Builder: allow an empty free-text or date answer.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Builder: accept "N/A" on a boolean question.
    pub fn allow_na(mut self) -> Self {
        if let QuestionKind::Boolean {
            allow_not_applicable,
        } = &mut self.kind
        {
            *allow_not_applicable = true;
        }
        self
    }

    /// Builder: mark single-choice options that denote a deficiency.
    pub fn nonconforming<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let QuestionKind::SingleChoice { nonconforming, .. } = &mut self.kind {
            nonconforming.extend(values.into_iter().map(Into::into));
        }
        self
    }

    /// Builder: answers that end the document.
    pub fn skip_on<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_on.extend(values.into_iter().map(Into::into));
        self
    }

    /// Builder: attach a quality sub-check shown on "Oui".
    pub fn with_quality<I, S>(mut self, prompt: impl Into<String>, criteria: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.quality = Some(QualityCheck {
            prompt: prompt.into(),
            criteria: criteria.into_iter().map(Into::into).collect(),
            required: true,
        });
        self
    }

    /// Builder: splice `question` after this one when `trigger` matches.
    pub fn follow_up(mut self, trigger: MatchRule, question: QuestionSpec) -> Self {
        self.follow_up = Some(FollowUpSpec {
            trigger,
            question: Box::new(question),
        });
        self
    }

    /// Builder: "Non" is an expected business fact here.
    pub fn accepts_no(mut self) -> Self {
        self.accepts_no = true;
        self
    }

    /// Builder: show only when the question `offset` places back matches.
    pub fn visible_if(mut self, offset: usize, rule: MatchRule) -> Self {
        self.visibility = Visibility::Answer { offset, rule };
        self
    }

    /// Builder: show only for the listed control types.
    pub fn only_for<I, S>(mut self, controls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.visibility = Visibility::OnlyForControls {
            controls: controls.into_iter().map(Into::into).collect(),
        };
        self
    }

    /// Builder: hide for the listed control types.
    pub fn except_for<I, S>(mut self, controls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.visibility = Visibility::ExceptForControls {
            controls: controls.into_iter().map(Into::into).collect(),
        };
        self
    }

    fn into_template(self, position: TemplateRef) -> (QuestionTemplate, Option<FollowUpSpec>) {
        let template = QuestionTemplate {
            position,
            prompt: self.prompt,
            help_text: self.help_text,
            kind: self.kind,
            required: self.required,
            visibility: self.visibility,
            skip_on: self.skip_on,
            quality: self.quality,
            follow_up: None,
            accepts_no: self.accepts_no,
        };
        (template, self.follow_up)
    }

    fn from_template(template: &QuestionTemplate) -> Self {
        Self {
            prompt: template.prompt.clone(),
            help_text: template.help_text.clone(),
            kind: template.kind.clone(),
            required: template.required,
            visibility: template.visibility.clone(),
            skip_on: template.skip_on.clone(),
            quality: template.quality.clone(),
            follow_up: None,
            accepts_no: template.accepts_no,
        }
    }
}

/// The immutable question arena of one document type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTemplate {
    pub id: DocumentTypeId,
    pub title: String,
    questions: Vec<QuestionTemplate>,
    sequence: Vec<TemplateRef>,
}

impl DocumentTemplate {
    /// Build a template from nested question specs, flattening follow-ups.
    pub fn new(id: impl Into<String>, title: impl Into<String>, specs: Vec<QuestionSpec>) -> Self {
        let top_level = specs.len();
        let mut questions = Vec::with_capacity(top_level);
        let mut queue = VecDeque::new();

        for (i, spec) in specs.into_iter().enumerate() {
            let (template, follow_up) = spec.into_template(TemplateRef(i));
            questions.push(template);
            if let Some(fu) = follow_up {
                queue.push_back((i, fu));
            }
        }

        while let Some((owner, fu)) = queue.pop_front() {
            let slot = questions.len();
            let (template, next) = fu.question.into_template(TemplateRef(slot));
            questions.push(template);
            questions[owner].follow_up = Some(FollowUpRule {
                trigger: fu.trigger,
                question: TemplateRef(slot),
            });
            if let Some(next) = next {
                queue.push_back((slot, next));
            }
        }

        Self {
            id: id.into(),
            title: title.into(),
            questions,
            sequence: (0..top_level).map(TemplateRef).collect(),
        }
    }

    /// Look up a question by arena slot.
    pub fn question(&self, r: TemplateRef) -> Option<&QuestionTemplate> {
        self.questions.get(r.0)
    }

    /// Top-level questions, in presentation order.
    pub fn sequence(&self) -> &[TemplateRef] {
        &self.sequence
    }

    /// Every question of the arena, follow-ups included.
    pub fn questions(&self) -> &[QuestionTemplate] {
        &self.questions
    }

    /// Number of top-level questions.
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Hex SHA-256 of the serialized template.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        content_hash(self).map(|h| hash_hex(&h))
    }

    /// Rebuild the nested authoring form, e.g. for export.
    ///
    /// Follow-up chains are walked at most `questions.len()` deep, so a
    /// malformed arena with a cycle cannot recurse forever.
    pub fn to_specs(&self) -> Vec<QuestionSpec> {
        self.sequence
            .iter()
            .filter_map(|r| self.spec_at(*r, self.questions.len()))
            .collect()
    }

    fn spec_at(&self, r: TemplateRef, budget: usize) -> Option<QuestionSpec> {
        let template = self.question(r)?;
        let mut spec = QuestionSpec::from_template(template);
        if let (Some(rule), Some(remaining)) = (&template.follow_up, budget.checked_sub(1)) {
            if let Some(nested) = self.spec_at(rule.question, remaining) {
                spec.follow_up = Some(FollowUpSpec {
                    trigger: rule.trigger.clone(),
                    question: Box::new(nested),
                });
            }
        }
        Some(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chained() -> DocumentTemplate {
        DocumentTemplate::new(
            "lettre-mission",
            "Lettre de mission",
            vec![
                QuestionSpec::boolean("Document présent ?")
                    .skip_on(["Non"])
                    .follow_up(
                        MatchRule::equals("Oui"),
                        QuestionSpec::taxonomy(
                            "Support ?",
                            Taxonomy::DocumentMedium,
                            ["Papier", "Électronique"],
                        )
                        .follow_up(
                            MatchRule::equals("Électronique"),
                            QuestionSpec::boolean("Signature électronique certifiée ?"),
                        ),
                    ),
                QuestionSpec::date("Date de signature"),
            ],
        )
    }

    #[test]
    fn top_level_questions_keep_their_positions() {
        let t = chained();
        assert_eq!(t.len(), 2);
        assert_eq!(t.sequence(), &[TemplateRef(0), TemplateRef(1)]);
        assert_eq!(t.question(TemplateRef(1)).unwrap().prompt, "Date de signature");
    }

    #[test]
    fn follow_up_chains_are_flattened() {
        let t = chained();
        assert_eq!(t.questions().len(), 4);
        let first = t.question(TemplateRef(0)).unwrap();
        let rule = first.follow_up.as_ref().unwrap();
        assert_eq!(rule.question, TemplateRef(2));
        let medium = t.question(TemplateRef(2)).unwrap();
        assert_eq!(medium.position, TemplateRef(2));
        assert_eq!(medium.follow_up.as_ref().unwrap().question, TemplateRef(3));
        assert!(t.question(TemplateRef(3)).unwrap().follow_up.is_none());
    }

    #[test]
    fn specs_round_trip_through_flattening() {
        let t = chained();
        let rebuilt = DocumentTemplate::new(t.id.clone(), t.title.clone(), t.to_specs());
        assert_eq!(rebuilt, t);
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = chained();
        let mut specs = a.to_specs();
        specs[1].prompt = "Date de la signature".into();
        let b = DocumentTemplate::new(a.id.clone(), a.title.clone(), specs);
        assert_eq!(a.fingerprint().unwrap(), chained().fingerprint().unwrap());
        assert_ne!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    }

    #[test]
    fn builders_only_touch_matching_kinds() {
        let q = QuestionSpec::free_text("Commentaire").allow_na().nonconforming(["x"]);
        assert_eq!(q.kind, QuestionKind::FreeText);
        let q = QuestionSpec::boolean("Signé ?").allow_na();
        assert_eq!(
            q.kind,
            QuestionKind::Boolean {
                allow_not_applicable: true
            }
        );
    }
}
