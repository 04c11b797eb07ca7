//! Error types for the audit engine.

use uuid::Uuid;

use audit_catalog::CatalogError;

use crate::store::StoreError;

/// Errors from the audit engine.
///
/// Everything except [`EngineError::UnknownCatalogEntry`] and
/// [`EngineError::CatalogDrift`] is recoverable by the operator: the
/// session is left unchanged and the call can be retried with corrected
/// input.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The submitted value does not fit the question's kind.
    #[error("invalid answer: {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("a suspended session already exists for dossier {dossier_key} / control {control_type}")]
    DuplicateSuspension {
        dossier_key: String,
        control_type: String,
    },

    #[error("a revision of session {parent} is already open")]
    DuplicateRevision { parent: Uuid },

    #[error("session is not complete: {} document(s) pending ({})", pending.len(), pending.join(", "))]
    IncompleteSession { pending: Vec<String> },

    #[error("unknown {kind} '{id}' in catalog")]
    UnknownCatalogEntry { kind: &'static str, id: String },

    #[error("template of document '{document}' changed since the session was suspended")]
    CatalogDrift { document: String },

    #[error("no suspended session for dossier {dossier_key} / control {control_type}")]
    NoSuspension {
        dossier_key: String,
        control_type: String,
    },

    #[error("document '{document}' is not required by control '{control_type}'")]
    DocumentNotRequired {
        document: String,
        control_type: String,
    },

    #[error("document '{0}' is already complete")]
    DocumentComplete(String),

    #[error("document '{0}' is not waiting for a justification")]
    NoPendingJustification(String),

    #[error("session {0} is not in progress")]
    SessionClosed(Uuid),

    #[error("no completed session {0} in history")]
    UnknownSession(Uuid),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("invalid session snapshot magic bytes")]
    InvalidMagic,

    #[error("unsupported session snapshot version {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },

    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityFailed { expected: String, actual: String },

    #[error("session snapshot too short: need at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    pub(crate) fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<CatalogError> for EngineError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::UnknownDocument(id) => EngineError::UnknownCatalogEntry {
                kind: "document type",
                id,
            },
            CatalogError::UnknownControl(id) => EngineError::UnknownCatalogEntry {
                kind: "control type",
                id,
            },
            other => EngineError::Deserialization(other.to_string()),
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
