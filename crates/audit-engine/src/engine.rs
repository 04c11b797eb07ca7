//! The engine facade: session lifecycle over a catalog and two stores.

use std::collections::HashSet;

use uuid::Uuid;

use audit_catalog::CatalogLookup;
use audit_core::{Dossier, ObligationClass, Submission};

use crate::error::{EngineError, Result};
use crate::history::CompletionRecord;
use crate::revision::RevisionInfo;
use crate::serialize::SessionSnapshot;
use crate::session::{ControlSession, SessionStatus};
use crate::store::{HistoryStore, SuspensionKey, SuspensionStore};
use crate::traversal::AdvanceResult;

/// What [`AuditEngine::start_session`] found.
#[derive(Debug)]
pub enum StartOutcome {
    Started(ControlSession),
    /// A suspended session exists for this dossier and control. The caller
    /// must [`AuditEngine::resume`] it or [`AuditEngine::discard_suspension`].
    ResumePending(PendingSuspension),
}

/// Summary of a checkpoint waiting to be resumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSuspension {
    pub session_id: Uuid,
    pub started_at: String,
    pub suspended_at: Option<String>,
    /// Reason given at suspension.
    pub reason: Option<String>,
    /// Parent session, when the checkpoint is a revision.
    pub revision_of: Option<Uuid>,
    /// Answers committed before the checkpoint.
    pub answered: usize,
}

impl From<&ControlSession> for PendingSuspension {
    fn from(session: &ControlSession) -> Self {
        let suspension = session.suspension.as_ref();
        Self {
            session_id: session.id,
            started_at: session.started_at.clone(),
            suspended_at: suspension.map(|s| s.suspended_at.clone()),
            reason: suspension.and_then(|s| s.reason.clone()),
            revision_of: session.revision.as_ref().map(|r| r.parent),
            answered: session.documents().map(|d| d.answered_count()).sum(),
        }
    }
}

/// Drives control sessions against a catalog, a suspension store, and a
/// history store.
///
/// Sessions are plain values owned by the caller; the engine holds no
/// session state except the set of revisions currently open, so it can
/// refuse a second revision of the same parent.
pub struct AuditEngine<C, S, H> {
    catalog: C,
    suspensions: S,
    history: H,
    open_revisions: HashSet<Uuid>,
}

impl<C, S, H> AuditEngine<C, S, H>
where
    C: CatalogLookup,
    S: SuspensionStore,
    H: HistoryStore,
{
    pub fn new(catalog: C, suspensions: S, history: H) -> Self {
        Self {
            catalog,
            suspensions,
            history,
            open_revisions: HashSet::new(),
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn suspensions(&self) -> &S {
        &self.suspensions
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    /// Hand back the catalog and stores.
    pub fn into_parts(self) -> (C, S, H) {
        (self.catalog, self.suspensions, self.history)
    }

    /// Start auditing `dossier` against `control_type`, unless a suspended
    /// session already exists for the pair.
    pub fn start_session(&mut self, dossier: Dossier, control_type: &str) -> Result<StartOutcome> {
        let required = self.catalog.required_documents(control_type, &dossier)?;
        let key = SuspensionKey::new(dossier.key(), control_type);
        if let Some(snapshot) = self.load_suspension(&key)? {
            log::info!(
                "dossier {dossier} / {control_type}: suspended session {} pending",
                snapshot.session.id
            );
            return Ok(StartOutcome::ResumePending(PendingSuspension::from(
                &snapshot.session,
            )));
        }

        let session = ControlSession::new(dossier, control_type, required);
        log::info!(
            "started session {} for dossier {} / {control_type} ({} document(s))",
            session.id,
            session.dossier,
            session.required.len()
        );
        Ok(StartOutcome::Started(session))
    }

    /// Restore the suspended session for `dossier` and `control_type`.
    ///
    /// The checkpoint stays in the store until the session completes, so an
    /// interrupted resume loses nothing.
    pub fn resume(&mut self, dossier: &Dossier, control_type: &str) -> Result<ControlSession> {
        let key = SuspensionKey::new(dossier.key(), control_type);
        let snapshot = self
            .load_suspension(&key)?
            .ok_or_else(|| EngineError::NoSuspension {
                dossier_key: key.dossier_key.clone(),
                control_type: key.control_type.clone(),
            })?;

        let mut session = snapshot.session;
        session.verify_templates(&self.catalog)?;
        session.mark_resumed();
        if let Some(revision) = &session.revision {
            self.open_revisions.insert(revision.parent);
        }
        log::info!("resumed session {}", session.id);
        Ok(session)
    }

    /// Drop the suspended session for the pair. Returns whether one existed.
    pub fn discard_suspension(&mut self, dossier: &Dossier, control_type: &str) -> Result<bool> {
        let key = SuspensionKey::new(dossier.key(), control_type);
        let removed = self.suspensions.remove(&key)?;
        if removed {
            log::warn!("discarded suspended session for dossier {dossier} / {control_type}");
        }
        Ok(removed)
    }

    pub fn open_document(&self, session: &mut ControlSession, document: &str) -> Result<()> {
        session.open_document(&self.catalog, document)?;
        Ok(())
    }

    pub fn submit_answer(
        &self,
        session: &mut ControlSession,
        document: &str,
        submission: Submission,
    ) -> Result<AdvanceResult> {
        session.submit(&self.catalog, document, submission)
    }

    /// Commit the current question of a revision with the parent's answer.
    pub fn keep_prior_answer(
        &self,
        session: &mut ControlSession,
        document: &str,
    ) -> Result<AdvanceResult> {
        let index = session
            .open_document(&self.catalog, document)?
            .current_index()
            .ok_or_else(|| EngineError::DocumentComplete(document.to_string()))?;
        let prior = session
            .prior_answer(document, index)
            .ok_or_else(|| EngineError::validation("value", "no prior answer at this question"))?;
        let submission = Submission {
            value: prior.raw_value.clone(),
            quality: prior.quality.clone(),
            justification: prior.justification.clone(),
            obligation: prior.obligation,
        };
        session.submit(&self.catalog, document, submission)
    }

    pub fn justify(
        &self,
        session: &mut ControlSession,
        document: &str,
        justification: &str,
        obligation: ObligationClass,
    ) -> Result<AdvanceResult> {
        session.justify(&self.catalog, document, justification, obligation)
    }

    pub fn go_back(&self, session: &mut ControlSession, document: &str) -> Result<Option<usize>> {
        session.go_back(&self.catalog, document)
    }

    /// Checkpoint `session` into the suspension store.
    ///
    /// Re-suspending the same session overwrites its checkpoint; a
    /// checkpoint of a different session under the same dossier and
    /// control is refused.
    pub fn suspend(&mut self, session: &mut ControlSession, reason: Option<String>) -> Result<()> {
        if session.status != SessionStatus::InProgress {
            return Err(EngineError::SessionClosed(session.id));
        }
        let key = SuspensionKey::new(session.dossier_key.clone(), session.control_type.clone());
        if let Some(existing) = self.load_suspension(&key)? {
            if existing.session.id != session.id {
                return Err(EngineError::DuplicateSuspension {
                    dossier_key: key.dossier_key,
                    control_type: key.control_type,
                });
            }
        }

        let mut checkpoint = session.clone();
        checkpoint.mark_suspended(reason);
        let bytes = SessionSnapshot::new(checkpoint.clone()).to_bytes()?;
        self.suspensions.put(&key, bytes)?;
        *session = checkpoint;
        log::info!("suspended session {}", session.id);
        Ok(())
    }

    /// Close a finished session: append its record to history and clear its
    /// checkpoint.
    pub fn complete(&mut self, session: &mut ControlSession) -> Result<CompletionRecord> {
        if session.status != SessionStatus::InProgress {
            return Err(EngineError::SessionClosed(session.id));
        }
        if !session.is_complete() {
            return Err(EngineError::IncompleteSession {
                pending: session.pending_documents(),
            });
        }

        let record = session.summarize(&self.catalog)?;
        self.history.append(&record)?;

        let key = SuspensionKey::new(session.dossier_key.clone(), session.control_type.clone());
        if let Some(existing) = self.load_suspension(&key)? {
            if existing.session.id == session.id {
                self.suspensions.remove(&key)?;
            }
        }
        if let Some(revision) = &session.revision {
            self.open_revisions.remove(&revision.parent);
        }
        session.mark_completed();
        log::info!(
            "completed session {}: {} ({} mandatory anomal{})",
            session.id,
            record.verdict(),
            record.anomaly_count,
            if record.anomaly_count == 1 { "y" } else { "ies" }
        );
        Ok(record)
    }

    /// Open a revision of a completed session.
    pub fn start_revision(&mut self, parent: &CompletionRecord) -> Result<ControlSession> {
        if self.open_revisions.contains(&parent.session_id) {
            return Err(EngineError::DuplicateRevision {
                parent: parent.session_id,
            });
        }
        let key = SuspensionKey::new(parent.dossier_key.clone(), parent.control_type.clone());
        if let Some(existing) = self.load_suspension(&key)? {
            let revises = existing.session.revision.as_ref().map(|r| r.parent);
            if revises == Some(parent.session_id) {
                return Err(EngineError::DuplicateRevision {
                    parent: parent.session_id,
                });
            }
            return Err(EngineError::DuplicateSuspension {
                dossier_key: key.dossier_key,
                control_type: key.control_type,
            });
        }

        let required = self
            .catalog
            .required_documents(&parent.control_type, &parent.dossier)?;
        let revision = RevisionInfo::new(parent.session_id, parent.prior_answers());
        let session = ControlSession::new(parent.dossier.clone(), parent.control_type.clone(), required)
            .with_revision(revision);
        self.open_revisions.insert(parent.session_id);
        log::info!(
            "started revision {} of session {}",
            session.id,
            parent.session_id
        );
        Ok(session)
    }

    /// Open a revision of the completed session `session_id` from history.
    pub fn start_revision_of(&mut self, session_id: Uuid) -> Result<ControlSession> {
        let parent = self
            .history
            .find(session_id)?
            .ok_or(EngineError::UnknownSession(session_id))?;
        self.start_revision(&parent)
    }

    fn load_suspension(&self, key: &SuspensionKey) -> Result<Option<SessionSnapshot>> {
        match self.suspensions.get(key)? {
            Some(bytes) => Ok(Some(SessionSnapshot::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }
}
