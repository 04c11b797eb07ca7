//! A control session: one dossier audited against one control program.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use audit_catalog::CatalogLookup;
use audit_core::{
    Answer, ControlTypeId, Dossier, DocumentTemplate, DocumentTypeId, ObligationClass, Submission,
};

use crate::error::{EngineError, Result};
use crate::history::{now_iso8601, CompletionRecord, DocumentRecord, RecordedAnswer};
use crate::revision::{FieldKey, RevisionInfo};
use crate::traversal::{AdvanceResult, DocumentProgress, DocumentStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Suspended,
    Completed,
}

/// Metadata recorded when a session is checkpointed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspensionInfo {
    /// ISO-8601 UTC time of the checkpoint.
    pub suspended_at: String,
    /// Free text given by the operator.
    pub reason: Option<String>,
    /// Document and working index the operator was on.
    pub document: Option<DocumentTypeId>,
    pub index: Option<usize>,
}

/// Per-document line of [`ControlSession::overview`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentOverview {
    pub document: DocumentTypeId,
    /// `None` when the document has not been opened yet.
    pub status: Option<DocumentStatus>,
    pub answered: usize,
    /// Mandatory and optional anomalies together.
    pub anomalies: usize,
    /// Answers changed from the parent session.
    pub modified: usize,
}

/// Live state of a control session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlSession {
    pub id: Uuid,
    pub dossier: Dossier,
    /// Stable hash of the dossier, used to key suspensions.
    pub dossier_key: String,
    pub control_type: ControlTypeId,
    /// Documents the control requires, in catalog order.
    pub required: Vec<DocumentTypeId>,
    pub status: SessionStatus,
    /// ISO-8601 UTC creation time.
    pub started_at: String,
    /// Opened documents only.
    documents: BTreeMap<DocumentTypeId, DocumentProgress>,
    active: Option<DocumentTypeId>,
    /// Set while the session is checkpointed.
    pub suspension: Option<SuspensionInfo>,
    /// Set when the session revises a completed one.
    pub revision: Option<RevisionInfo>,
}

impl ControlSession {
    pub fn new(
        dossier: Dossier,
        control_type: impl Into<ControlTypeId>,
        required: Vec<DocumentTypeId>,
    ) -> Self {
        let dossier_key = dossier.key();
        Self {
            id: Uuid::new_v4(),
            dossier,
            dossier_key,
            control_type: control_type.into(),
            required,
            status: SessionStatus::InProgress,
            started_at: now_iso8601(),
            documents: BTreeMap::new(),
            active: None,
            suspension: None,
            revision: None,
        }
    }

    /// Builder: mark this session as a revision.
    pub fn with_revision(mut self, revision: RevisionInfo) -> Self {
        self.revision = Some(revision);
        self
    }

    pub fn is_revision(&self) -> bool {
        self.revision.is_some()
    }

    /// Open (or re-enter) a required document and make it the active one.
    pub fn open_document(
        &mut self,
        catalog: &impl CatalogLookup,
        document: &str,
    ) -> Result<&DocumentProgress> {
        let (_, progress) = self.document_mut(catalog, document)?;
        Ok(progress)
    }

    pub fn document(&self, document: &str) -> Option<&DocumentProgress> {
        self.documents.get(document)
    }

    /// Opened documents, by id.
    pub fn documents(&self) -> impl Iterator<Item = &DocumentProgress> {
        self.documents.values()
    }

    /// The document the operator last worked on.
    pub fn active_document(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn submit(
        &mut self,
        catalog: &impl CatalogLookup,
        document: &str,
        submission: Submission,
    ) -> Result<AdvanceResult> {
        let control_type = self.control_type.clone();
        let index = self.document_mut(catalog, document)?.1.current_index();
        let prior = index.and_then(|i| self.prior_answer(document, i)).cloned();

        let (template, progress) = self.document_mut(catalog, document)?;
        let result = progress.submit(template, &control_type, submission, prior.as_ref())?;
        if let Some(index) = index {
            self.record_modification(document, index, result);
        }
        Ok(result)
    }

    pub fn justify(
        &mut self,
        catalog: &impl CatalogLookup,
        document: &str,
        justification: &str,
        obligation: ObligationClass,
    ) -> Result<AdvanceResult> {
        let control_type = self.control_type.clone();
        let index = self.document_mut(catalog, document)?.1.current_index();
        let prior = index.and_then(|i| self.prior_answer(document, i)).cloned();

        let (template, progress) = self.document_mut(catalog, document)?;
        let result =
            progress.justify(template, &control_type, justification, obligation, prior.as_ref())?;
        if let Some(index) = index {
            self.record_modification(document, index, result);
        }
        Ok(result)
    }

    /// Step back within `document`. Returns the index landed on.
    pub fn go_back(&mut self, catalog: &impl CatalogLookup, document: &str) -> Result<Option<usize>> {
        let (_, progress) = self.document_mut(catalog, document)?;
        let landed = progress.go_back();
        if let (Some(index), Some(revision)) = (landed, self.revision.as_mut()) {
            revision.forget_from(document, index);
        }
        Ok(landed)
    }

    /// Whether every required document is complete.
    pub fn is_complete(&self) -> bool {
        self.required
            .iter()
            .all(|d| self.documents.get(d).is_some_and(DocumentProgress::is_complete))
    }

    /// Required documents not yet complete, in catalog order.
    pub fn pending_documents(&self) -> Vec<DocumentTypeId> {
        self.required
            .iter()
            .filter(|d| !self.documents.get(*d).is_some_and(DocumentProgress::is_complete))
            .cloned()
            .collect()
    }

    /// Mandatory anomalies across the required documents.
    pub fn anomaly_count(&self) -> usize {
        self.required_progress().map(DocumentProgress::mandatory_anomalies).sum()
    }

    pub fn optional_anomaly_count(&self) -> usize {
        self.required_progress().map(DocumentProgress::optional_anomalies).sum()
    }

    pub fn modified_field_keys(&self) -> BTreeSet<FieldKey> {
        self.revision
            .as_ref()
            .map(|r| r.modified.clone())
            .unwrap_or_default()
    }

    /// The parent session's answer to the question at this place, for
    /// prefilling a revision. `None` when the parent answered a different
    /// question there.
    pub fn prior_answer(&self, document: &str, index: usize) -> Option<&Answer> {
        let template = self.documents.get(document)?.sequence().get(index)?.template;
        self.revision.as_ref()?.prior_answer(document, index, template)
    }

    pub fn overview(&self) -> Vec<DocumentOverview> {
        self.required
            .iter()
            .map(|document| {
                let progress = self.documents.get(document);
                DocumentOverview {
                    document: document.clone(),
                    status: progress.map(DocumentProgress::status),
                    answered: progress.map_or(0, DocumentProgress::answered_count),
                    anomalies: progress.map_or(0, |p| p.mandatory_anomalies() + p.optional_anomalies()),
                    modified: self
                        .revision
                        .as_ref()
                        .map_or(0, |r| r.modified.iter().filter(|k| &k.document == document).count()),
                }
            })
            .collect()
    }

    /// Check every opened document against the catalog's current template.
    pub fn verify_templates(&self, catalog: &impl CatalogLookup) -> Result<()> {
        for progress in self.documents.values() {
            let template = catalog.document_template(progress.document())?;
            progress.check_template(template)?;
        }
        Ok(())
    }

    /// Build the completion record for this session's answers.
    pub fn summarize(&self, catalog: &impl CatalogLookup) -> Result<CompletionRecord> {
        let mut documents = Vec::with_capacity(self.required.len());
        for document in &self.required {
            let template = catalog.document_template(document)?;
            let answers = match self.documents.get(document) {
                Some(progress) => recorded_answers(template, progress),
                None => Vec::new(),
            };
            documents.push(DocumentRecord {
                document: document.clone(),
                title: template.title.clone(),
                answers,
            });
        }

        Ok(CompletionRecord {
            session_id: self.id,
            dossier: self.dossier.clone(),
            dossier_key: self.dossier_key.clone(),
            control_type: self.control_type.clone(),
            started_at: self.started_at.clone(),
            completed_at: now_iso8601(),
            documents,
            anomaly_count: self.anomaly_count(),
            optional_anomaly_count: self.optional_anomaly_count(),
            revision_of: self.revision.as_ref().map(|r| r.parent),
            modified_fields: self.modified_field_keys(),
        })
    }

    pub(crate) fn mark_suspended(&mut self, reason: Option<String>) {
        let index = self
            .active
            .as_deref()
            .and_then(|d| self.documents.get(d))
            .and_then(DocumentProgress::current_index);
        self.suspension = Some(SuspensionInfo {
            suspended_at: now_iso8601(),
            reason,
            document: self.active.clone(),
            index,
        });
        self.status = SessionStatus::Suspended;
    }

    pub(crate) fn mark_resumed(&mut self) {
        self.suspension = None;
        self.status = SessionStatus::InProgress;
    }

    pub(crate) fn mark_completed(&mut self) {
        self.status = SessionStatus::Completed;
    }

    fn required_progress(&self) -> impl Iterator<Item = &DocumentProgress> {
        self.required.iter().filter_map(|d| self.documents.get(d))
    }

    fn document_mut<'c, C: CatalogLookup>(
        &mut self,
        catalog: &'c C,
        document: &str,
    ) -> Result<(&'c DocumentTemplate, &mut DocumentProgress)> {
        if self.status != SessionStatus::InProgress {
            return Err(EngineError::SessionClosed(self.id));
        }
        if !self.required.iter().any(|d| d == document) {
            return Err(EngineError::DocumentNotRequired {
                document: document.to_string(),
                control_type: self.control_type.clone(),
            });
        }
        let template = catalog.document_template(document)?;
        let progress = match self.documents.entry(document.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                log::info!("session {}: opening document '{document}'", self.id);
                entry.insert(DocumentProgress::open(template, &self.control_type)?)
            }
        };
        if self.active.as_deref() != Some(document) {
            self.active = Some(document.to_string());
        }
        Ok((template, progress))
    }

    fn record_modification(&mut self, document: &str, index: usize, result: AdvanceResult) {
        if matches!(result, AdvanceResult::JustificationRequired { .. }) {
            return;
        }
        let Some(revision) = self.revision.as_mut() else {
            return;
        };
        if let Some(answer) = self.documents.get(document).and_then(|p| p.answer_at(index)) {
            revision.record(FieldKey::new(document, index), answer);
        }
    }
}

fn recorded_answers(template: &DocumentTemplate, progress: &DocumentProgress) -> Vec<RecordedAnswer> {
    progress
        .sequence()
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let answer = entry.answer.as_ref()?;
            let prompt = template
                .question(entry.template)
                .map(|q| q.prompt.clone())
                .unwrap_or_default();
            Some(RecordedAnswer {
                index,
                template: entry.template,
                prompt,
                injected: entry.is_injected(),
                answer: answer.clone(),
            })
        })
        .collect()
}
