//! Core data model for the dossier audit engine.
//!
//! A compliance audit walks an operator through one questionnaire per
//! document type required by a control program. This crate holds the
//! immutable side of that model ([`DocumentTemplate`] and its
//! [`QuestionTemplate`]s), the values an operator submits ([`Submission`],
//! [`Answer`]), and the identity of the audited client file ([`Dossier`]).
//!
//! Templates are authored as nested [`QuestionSpec`]s and flattened at
//! construction time into an arena addressed by [`TemplateRef`], so that
//! follow-up chains of any depth are injected by the same rule.

pub mod answer;
pub mod dossier;
pub mod error;
pub mod hash;
pub mod question;
pub mod template;

pub use answer::{
    Answer, ObligationClass, QualityDetail, QualityVerdict, RawValue, Submission, Tristate,
};
pub use dossier::{dossier_key, Dossier};
pub use error::ModelError;
pub use question::{
    FollowUpRule, MatchRule, QualityCheck, QuestionKind, QuestionTemplate, Taxonomy, TemplateRef,
    Visibility,
};
pub use template::{DocumentTemplate, FollowUpSpec, QuestionSpec};

/// Identifier of a document type in the catalog (e.g. `"piece-identite"`).
pub type DocumentTypeId = String;

/// Identifier of a control program (e.g. `"lcb-ft"`).
pub type ControlTypeId = String;
