//! Completion records: the immutable outcome of a finished session, as
//! handed to the history store.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use audit_core::{Answer, ControlTypeId, Dossier, DocumentTypeId, TemplateRef};

use crate::revision::{FieldKey, PriorAnswer, PriorAnswers};

/// Overall outcome of a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Conforming,
    NonConforming,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Conforming => write!(f, "conforme"),
            Verdict::NonConforming => write!(f, "non conforme"),
        }
    }
}

/// One committed answer, with enough context to read it without the
/// catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedAnswer {
    /// Working-sequence index at completion.
    pub index: usize,
    /// Question the answer belongs to.
    pub template: TemplateRef,
    pub prompt: String,
    /// Whether the question was spliced in as a follow-up.
    #[serde(default)]
    pub injected: bool,
    pub answer: Answer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub document: DocumentTypeId,
    /// Catalog title at completion time.
    pub title: String,
    /// Committed answers in working order.
    pub answers: Vec<RecordedAnswer>,
}

/// Summary of a completed control session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub session_id: Uuid,
    pub dossier: Dossier,
    /// Stable hash of `dossier`.
    pub dossier_key: String,
    pub control_type: ControlTypeId,
    /// ISO-8601 UTC session creation time.
    pub started_at: String,
    /// ISO-8601 UTC completion time.
    pub completed_at: String,
    /// Required documents in catalog order.
    pub documents: Vec<DocumentRecord>,
    /// Non-conforming answers classed mandatory.
    pub anomaly_count: usize,
    /// Non-conforming answers classed optional.
    #[serde(default)]
    pub optional_anomaly_count: usize,
    /// Parent session, when this one was a revision.
    #[serde(default)]
    pub revision_of: Option<Uuid>,
    /// Answers changed from the parent session.
    #[serde(default)]
    pub modified_fields: BTreeSet<FieldKey>,
}

impl CompletionRecord {
    pub fn verdict(&self) -> Verdict {
        if self.anomaly_count == 0 {
            Verdict::Conforming
        } else {
            Verdict::NonConforming
        }
    }

    pub fn document(&self, id: &str) -> Option<&DocumentRecord> {
        self.documents.iter().find(|d| d.document == id)
    }

    pub fn answer(&self, document: &str, index: usize) -> Option<&Answer> {
        self.document(document)?
            .answers
            .iter()
            .find(|a| a.index == index)
            .map(|a| &a.answer)
    }

    /// Deep copy of every answer, keyed for a revision session.
    pub fn prior_answers(&self) -> PriorAnswers {
        self.documents
            .iter()
            .map(|doc| {
                let answers = doc
                    .answers
                    .iter()
                    .map(|a| {
                        let prior = PriorAnswer {
                            template: a.template,
                            answer: a.answer.clone(),
                        };
                        (a.index, prior)
                    })
                    .collect();
                (doc.document.clone(), answers)
            })
            .collect()
    }

    pub fn answer_count(&self) -> usize {
        self.documents.iter().map(|d| d.answers.len()).sum()
    }
}

/// Current UTC time as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn now_iso8601() -> String {
    use std::time::SystemTime;
    let secs = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format_epoch_secs(secs)
}

/// Format seconds since the Unix epoch as an ISO-8601 UTC timestamp.
pub fn format_epoch_secs(secs: u64) -> String {
    let days = (secs / 86_400) as i64;
    let rem = secs % 86_400;
    let (year, month, day) = civil_from_days(days);
    format!(
        "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}Z",
        rem / 3600,
        (rem % 3600) / 60,
        rem % 60
    )
}

/// Days since 1970-01-01 to a proleptic Gregorian date.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}
