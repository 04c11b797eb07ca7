//! Revision sessions: re-opening a completed session and tracking which
//! answers the operator changed.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use audit_core::{Answer, DocumentTypeId, TemplateRef};

/// Address of one answer: document type plus working-sequence index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldKey {
    pub document: DocumentTypeId,
    /// Working-sequence index, follow-ups included.
    pub index: usize,
}

impl FieldKey {
    pub fn new(document: impl Into<DocumentTypeId>, index: usize) -> Self {
        Self {
            document: document.into(),
            index,
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.document, self.index)
    }
}

/// One answer of the parent session and the question it answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorAnswer {
    /// Question the parent answered at this index.
    pub template: TemplateRef,
    pub answer: Answer,
}

/// Answers of the parent session, by document and working index.
pub type PriorAnswers = BTreeMap<DocumentTypeId, BTreeMap<usize, PriorAnswer>>;

/// Revision state carried by a session opened from a completed one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionInfo {
    /// Id of the completed session being revised.
    pub parent: Uuid,
    /// Deep copy of the parent's answers.
    pub prior: PriorAnswers,
    /// Answers that differ from the parent's.
    pub modified: BTreeSet<FieldKey>,
}

impl RevisionInfo {
    pub fn new(parent: Uuid, prior: PriorAnswers) -> Self {
        Self {
            parent,
            prior,
            modified: BTreeSet::new(),
        }
    }

    /// The parent's answer at `index`, provided it answered the same
    /// question. Working indexes shift when a revised answer injects or
    /// drops follow-ups, so an index alone does not identify a question.
    pub fn prior_answer(
        &self,
        document: &str,
        index: usize,
        template: TemplateRef,
    ) -> Option<&Answer> {
        self.prior
            .get(document)?
            .get(&index)
            .filter(|prior| prior.template == template)
            .map(|prior| &prior.answer)
    }

    /// Keep `modified` in step with a freshly committed answer.
    pub fn record(&mut self, key: FieldKey, answer: &Answer) {
        if answer.was_modified {
            self.modified.insert(key);
        } else {
            self.modified.remove(&key);
        }
    }

    /// Forget modifications at or after `from` in `document`, whose answers
    /// were just discarded.
    pub fn forget_from(&mut self, document: &str, from: usize) {
        self.modified
            .retain(|key| key.document != document || key.index < from);
    }
}

/// Compare `answer` with the parent's answer at the same place and mark it
/// modified when the operator-facing content differs.
///
/// A place the parent never answered does not count as a modification.
/// Returns whether the answer is marked modified.
pub fn mark_against_prior(answer: &mut Answer, prior: Option<&Answer>) -> bool {
    match prior {
        Some(prior) if !answer.same_content(prior) => {
            answer.was_modified = true;
            answer.original_raw_value = Some(prior.raw_value.clone());
            answer.original_quality = prior.quality.clone();
            true
        }
        _ => {
            answer.was_modified = false;
            answer.original_raw_value = None;
            answer.original_quality = None;
            false
        }
    }
}
