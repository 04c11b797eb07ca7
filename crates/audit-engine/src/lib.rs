//! Questionnaire traversal engine for dossier compliance audits.
//!
//! A [`ControlSession`] audits one dossier against one control program.
//! For each required document the operator is walked through a working
//! copy of the document's question template: questions appear or hide
//! depending on the control and earlier answers, follow-ups are spliced in
//! after the answer that triggers them, and a skip trigger ends the
//! document early. Every committed answer is classified as conforming or
//! not, and anomalies must be justified before traversal moves on.
//!
//! [`AuditEngine`] ties sessions to a catalog and to the two persistence
//! seams: a [`SuspensionStore`] for checkpoints and a [`HistoryStore`]
//! for completed sessions. Completed sessions can be reopened as
//! revisions, which track every answer that differs from the original.

pub mod classify;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod history;
pub mod revision;
pub mod serialize;
pub mod session;
pub mod store;
pub mod traversal;

pub use classify::{classify, is_exempt};
pub use engine::{AuditEngine, PendingSuspension, StartOutcome};
pub use error::{EngineError, Result};
pub use evaluator::{next_visible, NextStep, SlotId, WorkingQuestion};
pub use history::{now_iso8601, CompletionRecord, DocumentRecord, RecordedAnswer, Verdict};
pub use revision::{FieldKey, PriorAnswer, PriorAnswers, RevisionInfo};
pub use serialize::SessionSnapshot;
pub use session::{ControlSession, DocumentOverview, SessionStatus, SuspensionInfo};
pub use store::{
    HistoryStore, MemoryHistoryStore, MemorySuspensionStore, StoreError, SuspensionKey,
    SuspensionStore,
};
pub use traversal::{AdvanceResult, Cursor, DocumentProgress, DocumentStatus, Progress};
