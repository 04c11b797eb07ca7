//! Per-document traversal state machine.
//!
//! A [`DocumentProgress`] owns one document's working sequence and cursor.
//! The cursor is either waiting for an answer at an index, holding an
//! anomalous draft until the operator justifies it, or past the end.
//! Every committed answer sits strictly before the cursor.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use audit_core::{
    Answer, DocumentTemplate, DocumentTypeId, ObligationClass, QualityVerdict, QuestionKind,
    QuestionTemplate, RawValue, Submission, Tristate,
};

use crate::classify::{classify, is_exempt};
use crate::error::{EngineError, Result};
use crate::evaluator::{
    finalize_answer, is_visible, next_visible, remove_follow_ups, Finalized, NextStep, SlotId,
    WorkingQuestion,
};
use crate::revision::mark_against_prior;

/// Where a document's traversal stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Cursor {
    AwaitingAnswer { index: usize },
    /// An anomalous answer was submitted without a justification; it is
    /// held here and nothing else moves until it is justified or replaced.
    AwaitingJustification { index: usize, draft: Answer },
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    Completed,
}

/// Outcome of a submit or justify call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceResult {
    /// The answer was committed; the next question is at `index`.
    Next { index: usize },
    /// The answer is an anomaly and needs a justification before it can be
    /// committed.
    JustificationRequired { index: usize },
    /// The answer was committed and no visible question remains.
    DocumentComplete,
}

/// Answered and visible counts, for progress display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub answered: usize,
    /// Answered plus the unanswered questions currently visible.
    pub visible: usize,
}

/// Traversal state of one document within a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentProgress {
    document: DocumentTypeId,
    /// Fingerprint of the template the sequence was built from.
    fingerprint: String,
    sequence: Vec<WorkingQuestion>,
    cursor: Cursor,
    next_slot: SlotId,
}

impl DocumentProgress {
    /// Start a document: copy its top-level questions and place the cursor
    /// on the first one visible for `control_type`.
    pub fn open(template: &DocumentTemplate, control_type: &str) -> Result<Self> {
        let fingerprint = template
            .fingerprint()
            .map_err(|e| EngineError::Serialization(e.to_string()))?;
        let sequence: Vec<WorkingQuestion> = template
            .sequence()
            .iter()
            .enumerate()
            .map(|(i, r)| WorkingQuestion::top_level(i as SlotId, *r))
            .collect();
        let next_slot = sequence.len() as SlotId;
        let cursor = match next_visible(template, &sequence, 0, control_type) {
            NextStep::Ask(index) => Cursor::AwaitingAnswer { index },
            NextStep::Complete => Cursor::Complete,
        };
        log::debug!(
            "opened document '{}' ({} question(s))",
            template.id,
            sequence.len()
        );
        Ok(Self {
            document: template.id.clone(),
            fingerprint,
            sequence,
            cursor,
            next_slot,
        })
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Fail with [`EngineError::CatalogDrift`] if `template` is not the one
    /// this document was opened with.
    pub fn check_template(&self, template: &DocumentTemplate) -> Result<()> {
        let current = template
            .fingerprint()
            .map_err(|e| EngineError::Serialization(e.to_string()))?;
        if current != self.fingerprint {
            return Err(EngineError::CatalogDrift {
                document: self.document.clone(),
            });
        }
        Ok(())
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn status(&self) -> DocumentStatus {
        match self.cursor {
            Cursor::Complete => DocumentStatus::Completed,
            _ => DocumentStatus::Pending,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status() == DocumentStatus::Completed
    }

    pub fn sequence(&self) -> &[WorkingQuestion] {
        &self.sequence
    }

    /// Index the operator is on, if any.
    pub fn current_index(&self) -> Option<usize> {
        match &self.cursor {
            Cursor::AwaitingAnswer { index } | Cursor::AwaitingJustification { index, .. } => {
                Some(*index)
            }
            Cursor::Complete => None,
        }
    }

    pub fn current_question<'t>(&self, template: &'t DocumentTemplate) -> Option<&'t QuestionTemplate> {
        let index = self.current_index()?;
        template.question(self.sequence.get(index)?.template)
    }

    /// The anomalous answer waiting for a justification.
    pub fn pending_draft(&self) -> Option<&Answer> {
        match &self.cursor {
            Cursor::AwaitingJustification { draft, .. } => Some(draft),
            _ => None,
        }
    }

    pub fn answer_at(&self, index: usize) -> Option<&Answer> {
        self.sequence.get(index).and_then(|e| e.answer.as_ref())
    }

    /// Committed answers by working index.
    pub fn answers(&self) -> impl Iterator<Item = (usize, &Answer)> {
        self.sequence
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.answer.as_ref().map(|a| (i, a)))
    }

    pub fn answered_count(&self) -> usize {
        self.answers().count()
    }

    pub fn mandatory_anomalies(&self) -> usize {
        self.answers().filter(|(_, a)| a.is_mandatory_anomaly()).count()
    }

    pub fn optional_anomalies(&self) -> usize {
        self.answers().filter(|(_, a)| a.is_optional_anomaly()).count()
    }

    pub fn progress(&self, template: &DocumentTemplate, control_type: &str) -> Progress {
        let answered = self.answered_count();
        let upcoming = match self.current_index() {
            Some(from) => (from..self.sequence.len())
                .filter(|&i| is_visible(template, &self.sequence, i, control_type))
                .count(),
            None => 0,
        };
        Progress {
            answered,
            visible: answered + upcoming,
        }
    }

    /// Validate, classify, and commit an answer for the current question.
    ///
    /// `prior` is the parent session's answer at the same place when the
    /// session is a revision.
    pub fn submit(
        &mut self,
        template: &DocumentTemplate,
        control_type: &str,
        submission: Submission,
        prior: Option<&Answer>,
    ) -> Result<AdvanceResult> {
        let index = self
            .current_index()
            .ok_or_else(|| EngineError::DocumentComplete(self.document.clone()))?;
        let question = self.question_at(template, index)?;
        let submission = validate(question, submission)?;

        let conforms = match &submission.value {
            RawValue::Checklist(items) if items.is_empty() => true,
            value => classify(question, value, submission.quality.as_ref()),
        };
        let answer = Answer::from_submission(submission, conforms);

        if !conforms && !is_exempt(question) && !is_justified(&answer) {
            log::info!(
                "{}[{index}]: '{}' is an anomaly, justification required",
                self.document,
                answer.raw_value
            );
            self.cursor = Cursor::AwaitingJustification {
                index,
                draft: answer,
            };
            return Ok(AdvanceResult::JustificationRequired { index });
        }

        Ok(self.commit(template, control_type, index, answer, prior))
    }

    /// Attach a justification to the pending draft and commit it.
    pub fn justify(
        &mut self,
        template: &DocumentTemplate,
        control_type: &str,
        justification: &str,
        obligation: ObligationClass,
        prior: Option<&Answer>,
    ) -> Result<AdvanceResult> {
        let Cursor::AwaitingJustification { index, draft } = &self.cursor else {
            return Err(EngineError::NoPendingJustification(self.document.clone()));
        };
        let text = justification.trim();
        if text.is_empty() {
            return Err(EngineError::validation(
                "justification",
                "an anomaly needs a justification",
            ));
        }

        let index = *index;
        let mut answer = draft.clone();
        answer.justification = Some(text.to_string());
        answer.obligation = Some(obligation);
        Ok(self.commit(template, control_type, index, answer, prior))
    }

    /// Step back to the previous answered question and discard its answer.
    ///
    /// Walking back into an injected follow-up continues up to the
    /// question that injected it, and the whole follow-up chain is
    /// dropped. From a pending justification, the draft is discarded and
    /// the same question is asked again. Returns the index landed on, or
    /// `None` when nothing has been answered yet.
    pub fn go_back(&mut self) -> Option<usize> {
        let limit = match &self.cursor {
            Cursor::AwaitingJustification { index, .. } => {
                let index = *index;
                self.cursor = Cursor::AwaitingAnswer { index };
                return Some(index);
            }
            Cursor::AwaitingAnswer { index } => *index,
            Cursor::Complete => self.sequence.len(),
        };

        let mut target = (0..limit)
            .rev()
            .find(|&i| self.sequence[i].answer.is_some())?;
        while let Some(parent) = self.sequence[target].injected_by {
            match self.sequence.iter().position(|e| e.slot == parent) {
                Some(at) => target = at,
                None => break,
            }
        }

        let slot = self.sequence[target].slot;
        remove_follow_ups(&mut self.sequence, slot);
        self.sequence[target].answer = None;
        self.cursor = Cursor::AwaitingAnswer { index: target };
        log::debug!("{}: back to index {target}", self.document);
        Some(target)
    }

    fn question_at<'t>(
        &self,
        template: &'t DocumentTemplate,
        index: usize,
    ) -> Result<&'t QuestionTemplate> {
        self.sequence
            .get(index)
            .and_then(|entry| template.question(entry.template))
            .ok_or_else(|| EngineError::CatalogDrift {
                document: self.document.clone(),
            })
    }

    fn commit(
        &mut self,
        template: &DocumentTemplate,
        control_type: &str,
        index: usize,
        mut answer: Answer,
        prior: Option<&Answer>,
    ) -> AdvanceResult {
        if mark_against_prior(&mut answer, prior) {
            log::info!("{}[{index}]: answer differs from the revised session", self.document);
        }
        if let Some(entry) = self.sequence.get_mut(index) {
            entry.answer = Some(answer);
        }

        let step = match finalize_answer(template, &mut self.sequence, index, &mut self.next_slot) {
            Finalized::Skipped => {
                log::info!("{}[{index}]: skip trigger, ending document", self.document);
                NextStep::Complete
            }
            Finalized::Injected(_) | Finalized::Plain => {
                next_visible(template, &self.sequence, index + 1, control_type)
            }
        };

        match step {
            NextStep::Ask(next) => {
                self.cursor = Cursor::AwaitingAnswer { index: next };
                AdvanceResult::Next { index: next }
            }
            NextStep::Complete => {
                self.cursor = Cursor::Complete;
                log::info!(
                    "document '{}' complete ({} answer(s))",
                    self.document,
                    self.answered_count()
                );
                AdvanceResult::DocumentComplete
            }
        }
    }
}

fn is_justified(answer: &Answer) -> bool {
    answer.justification.is_some() && answer.obligation.is_some()
}

/// Check a submission's shape against the question and normalize it:
/// trims text, de-duplicates checklist items, and drops quality detail
/// that the answer does not call for.
pub fn validate(question: &QuestionTemplate, mut submission: Submission) -> Result<Submission> {
    match (&question.kind, &mut submission.value) {
        (
            QuestionKind::Boolean {
                allow_not_applicable,
            },
            RawValue::Boolean(value),
        ) => {
            if *value == Tristate::NotApplicable && !allow_not_applicable {
                return Err(EngineError::validation(
                    "value",
                    "N/A is not accepted for this question",
                ));
            }
        }
        (QuestionKind::SingleChoice { options, .. }, RawValue::Choice(choice)) => {
            if choice.trim().is_empty() {
                return Err(EngineError::validation("option", "no option chosen"));
            }
            if !options.contains(choice) {
                return Err(EngineError::validation(
                    "option",
                    format!("'{choice}' is not one of: {}", options.join(", ")),
                ));
            }
        }
        (QuestionKind::Checklist { options }, RawValue::Checklist(items)) => {
            if let Some(unknown) = items.iter().find(|item| !options.contains(item)) {
                return Err(EngineError::validation(
                    "items",
                    format!("'{unknown}' is not one of: {}", options.join(", ")),
                ));
            }
            let mut seen = HashSet::new();
            items.retain(|item| seen.insert(item.clone()));
        }
        (QuestionKind::FreeText, RawValue::Text(text)) => {
            *text = text.trim().to_string();
            if question.required && text.is_empty() {
                return Err(EngineError::validation("text", "an answer is required"));
            }
        }
        (QuestionKind::Date, RawValue::Date(date)) => {
            let trimmed = date.trim().to_string();
            if trimmed.is_empty() {
                if question.required {
                    return Err(EngineError::validation("date", "a date is required"));
                }
            } else if let Err(e) = RawValue::date(&trimmed) {
                return Err(EngineError::validation("date", e.to_string()));
            }
            *date = trimmed;
        }
        (kind, value) => {
            return Err(EngineError::validation(
                "value",
                format!("expected a {} answer, got '{value}'", kind.name()),
            ));
        }
    }

    match (&question.quality, question.is_affirmative(&submission.value)) {
        (Some(check), true) => match &submission.quality {
            None if check.required => {
                return Err(EngineError::validation(
                    "quality",
                    format!("'{}' must be answered", check.prompt),
                ));
            }
            None => {}
            Some(detail) => {
                if let Some(unknown) = detail.failed.iter().find(|c| !check.criteria.contains(c)) {
                    return Err(EngineError::validation(
                        "quality",
                        format!("unknown criterion '{unknown}'"),
                    ));
                }
                if detail.verdict == QualityVerdict::NonConforming && detail.failed.is_empty() {
                    return Err(EngineError::validation(
                        "quality",
                        "a non-conforming verdict needs at least one failed criterion",
                    ));
                }
            }
        },
        _ => submission.quality = None,
    }
    if let Some(detail) = submission.quality.as_mut() {
        if detail.verdict == QualityVerdict::Conforming {
            detail.failed.clear();
        }
    }

    submission.justification = submission
        .justification
        .take()
        .map(|j| j.trim().to_string())
        .filter(|j| !j.is_empty());

    Ok(submission)
}

#[cfg(test)]
mod tests {
    use super::*;
    use audit_core::{MatchRule, QualityDetail, QuestionSpec, Taxonomy};

    fn template() -> DocumentTemplate {
        DocumentTemplate::new(
            "piece-identite",
            "Pièce d'identité",
            vec![
                QuestionSpec::boolean("La pièce d'identité est-elle présente ?")
                    .with_quality("Qualité", ["Lisible", "En cours de validité"])
                    .follow_up(
                        MatchRule::equals("Oui"),
                        QuestionSpec::taxonomy("Support", Taxonomy::DocumentMedium, ["Papier", "Numérique"]),
                    ),
                QuestionSpec::checklist("Éléments manquants", ["Signature", "Date"]),
                QuestionSpec::boolean("La copie est-elle certifiée ?").allow_na(),
            ],
        )
    }

    fn open() -> (DocumentTemplate, DocumentProgress) {
        let t = template();
        let p = DocumentProgress::open(&t, "lcb-ft").unwrap();
        (t, p)
    }

    #[test]
    fn opens_on_first_question() {
        let (_, p) = open();
        assert_eq!(p.cursor(), &Cursor::AwaitingAnswer { index: 0 });
        assert_eq!(p.status(), DocumentStatus::Pending);
        assert_eq!(p.sequence().len(), 3);
    }

    #[test]
    fn affirmative_answer_injects_follow_up() {
        let (t, mut p) = open();
        let sub = Submission::boolean(Tristate::Yes).with_quality(QualityDetail::conforming());
        let r = p.submit(&t, "lcb-ft", sub, None).unwrap();
        assert_eq!(r, AdvanceResult::Next { index: 1 });
        assert_eq!(p.sequence().len(), 4);
        assert!(p.sequence()[1].is_injected());
    }

    #[test]
    fn missing_quality_detail_is_rejected() {
        let (t, mut p) = open();
        let err = p
            .submit(&t, "lcb-ft", Submission::boolean(Tristate::Yes), None)
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation { ref field, .. } if field == "quality"));
        assert_eq!(p.cursor(), &Cursor::AwaitingAnswer { index: 0 });
    }

    #[test]
    fn anomaly_waits_for_justification() {
        let (t, mut p) = open();
        let r = p
            .submit(&t, "lcb-ft", Submission::boolean(Tristate::No), None)
            .unwrap();
        assert_eq!(r, AdvanceResult::JustificationRequired { index: 0 });
        assert_eq!(p.answered_count(), 0);
        assert!(p.pending_draft().is_some());

        let err = p
            .justify(&t, "lcb-ft", "   ", ObligationClass::Mandatory, None)
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation { .. }));

        let r = p
            .justify(&t, "lcb-ft", "Pièce non fournie", ObligationClass::Mandatory, None)
            .unwrap();
        assert_eq!(r, AdvanceResult::Next { index: 1 });
        let answer = p.answer_at(0).unwrap();
        assert!(!answer.conforms);
        assert_eq!(answer.justification.as_deref(), Some("Pièce non fournie"));
        assert_eq!(p.mandatory_anomalies(), 1);
    }

    #[test]
    fn justify_without_draft_fails() {
        let (t, mut p) = open();
        let err = p
            .justify(&t, "lcb-ft", "x", ObligationClass::Optional, None)
            .unwrap_err();
        assert!(matches!(err, EngineError::NoPendingJustification(_)));
    }

    #[test]
    fn empty_checklist_conforms_and_filled_one_is_exempt() {
        let (t, mut p) = open();
        p.submit(&t, "lcb-ft", Submission::boolean(Tristate::No).justified("absent", ObligationClass::Optional), None)
            .unwrap();

        let mut empty = p.clone();
        empty
            .submit(&t, "lcb-ft", Submission::checklist(Vec::<String>::new()), None)
            .unwrap();
        assert!(empty.answer_at(1).unwrap().conforms);

        let r = p
            .submit(&t, "lcb-ft", Submission::checklist(["Signature", "Signature"]), None)
            .unwrap();
        assert_eq!(r, AdvanceResult::Next { index: 2 });
        let answer = p.answer_at(1).unwrap();
        assert!(!answer.conforms);
        assert_eq!(answer.raw_value, RawValue::Checklist(vec!["Signature".into()]));
    }

    #[test]
    fn shape_mismatch_and_na_rules() {
        let (t, mut p) = open();
        let err = p
            .submit(&t, "lcb-ft", Submission::choice("Oui"), None)
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation { ref field, .. } if field == "value"));

        let err = p
            .submit(&t, "lcb-ft", Submission::boolean(Tristate::NotApplicable), None)
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation { .. }));
    }

    #[test]
    fn last_answer_completes_document() {
        let (t, mut p) = open();
        p.submit(&t, "lcb-ft", Submission::boolean(Tristate::No).justified("absent", ObligationClass::Optional), None)
            .unwrap();
        p.submit(&t, "lcb-ft", Submission::checklist(Vec::<String>::new()), None)
            .unwrap();
        let r = p
            .submit(&t, "lcb-ft", Submission::boolean(Tristate::NotApplicable), None)
            .unwrap();
        assert_eq!(r, AdvanceResult::DocumentComplete);
        assert!(p.is_complete());
        assert!(matches!(
            p.submit(&t, "lcb-ft", Submission::boolean(Tristate::Yes), None),
            Err(EngineError::DocumentComplete(_))
        ));
    }

    #[test]
    fn go_back_removes_follow_up_and_discards_trigger() {
        let (t, mut p) = open();
        let sub = Submission::boolean(Tristate::Yes).with_quality(QualityDetail::conforming());
        p.submit(&t, "lcb-ft", sub, None).unwrap();
        assert_eq!(p.sequence().len(), 4);

        assert_eq!(p.go_back(), Some(0));
        assert_eq!(p.sequence().len(), 3);
        assert_eq!(p.answered_count(), 0);
        assert_eq!(p.go_back(), None);
    }

    #[test]
    fn go_back_past_a_follow_up_chain_lands_on_its_trigger() {
        let t = DocumentTemplate::new(
            "doc",
            "Doc",
            vec![
                QuestionSpec::boolean("Q0").accepts_no().follow_up(
                    MatchRule::equals("Oui"),
                    QuestionSpec::boolean("Q0b")
                        .accepts_no()
                        .follow_up(MatchRule::equals("Oui"), QuestionSpec::free_text("Q0c")),
                ),
                QuestionSpec::boolean("Q1").accepts_no(),
            ],
        );
        let mut p = DocumentProgress::open(&t, "lcb-ft").unwrap();
        p.submit(&t, "lcb-ft", Submission::boolean(Tristate::Yes), None).unwrap();
        p.submit(&t, "lcb-ft", Submission::boolean(Tristate::Yes), None).unwrap();
        let r = p
            .submit(&t, "lcb-ft", Submission::new(RawValue::Text("Détail".into())), None)
            .unwrap();
        assert_eq!(r, AdvanceResult::Next { index: 3 });
        assert_eq!(p.sequence().len(), 4);

        assert_eq!(p.go_back(), Some(0));
        assert_eq!(p.cursor(), &Cursor::AwaitingAnswer { index: 0 });
        assert_eq!(p.sequence().len(), 2);
        assert!(p.sequence().iter().all(|e| !e.is_injected()));
        assert_eq!(p.answered_count(), 0);
    }

    #[test]
    fn detail_is_asked_only_when_something_was_selected() {
        let t = DocumentTemplate::new(
            "doc",
            "Doc",
            vec![
                QuestionSpec::checklist("Éléments manquants", ["Signature", "Date"]),
                QuestionSpec::free_text("Précisez").visible_if(1, MatchRule::AnySelected),
                QuestionSpec::boolean("Dossier classé ?").accepts_no(),
            ],
        );
        let mut p = DocumentProgress::open(&t, "lcb-ft").unwrap();
        let mut empty = p.clone();

        let r = empty
            .submit(&t, "lcb-ft", Submission::checklist(Vec::<String>::new()), None)
            .unwrap();
        assert_eq!(r, AdvanceResult::Next { index: 2 });
        assert_eq!(empty.progress(&t, "lcb-ft").visible, 2);

        let r = p
            .submit(&t, "lcb-ft", Submission::checklist(["Date"]), None)
            .unwrap();
        assert_eq!(r, AdvanceResult::Next { index: 1 });
        assert_eq!(p.current_question(&t).unwrap().prompt, "Précisez");
    }

    #[test]
    fn excluded_control_types_skip_the_question() {
        let t = DocumentTemplate::new(
            "doc",
            "Doc",
            vec![
                QuestionSpec::boolean("Q0").accepts_no(),
                QuestionSpec::boolean("Hors opération").except_for(["operation"]),
                QuestionSpec::boolean("Q2").accepts_no(),
            ],
        );

        let mut operation = DocumentProgress::open(&t, "operation").unwrap();
        let r = operation
            .submit(&t, "operation", Submission::boolean(Tristate::Yes), None)
            .unwrap();
        assert_eq!(r, AdvanceResult::Next { index: 2 });

        let mut kyc = DocumentProgress::open(&t, "lcb-ft").unwrap();
        let r = kyc
            .submit(&t, "lcb-ft", Submission::boolean(Tristate::Yes), None)
            .unwrap();
        assert_eq!(r, AdvanceResult::Next { index: 1 });
    }

    #[test]
    fn go_back_from_justification_keeps_question() {
        let (t, mut p) = open();
        p.submit(&t, "lcb-ft", Submission::boolean(Tristate::No), None)
            .unwrap();
        assert_eq!(p.go_back(), Some(0));
        assert_eq!(p.cursor(), &Cursor::AwaitingAnswer { index: 0 });
        assert!(p.pending_draft().is_none());
    }

    #[test]
    fn template_change_is_detected() {
        let (_, p) = open();
        let other = DocumentTemplate::new(
            "piece-identite",
            "Pièce d'identité",
            vec![QuestionSpec::boolean("Autre question")],
        );
        assert!(matches!(
            p.check_template(&other),
            Err(EngineError::CatalogDrift { .. })
        ));
        assert!(p.check_template(&template()).is_ok());
    }

    #[test]
    fn progress_counts() {
        let (t, mut p) = open();
        assert_eq!(p.progress(&t, "lcb-ft"), Progress { answered: 0, visible: 3 });
        let sub = Submission::boolean(Tristate::Yes).with_quality(QualityDetail::conforming());
        p.submit(&t, "lcb-ft", sub, None).unwrap();
        assert_eq!(p.progress(&t, "lcb-ft"), Progress { answered: 1, visible: 4 });
    }
}
