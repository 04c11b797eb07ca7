//! `audit history`: completed sessions and their answers.

use anyhow::{bail, Context, Result};
use uuid::Uuid;

use audit_core::Dossier;
use audit_engine::{CompletionRecord, HistoryStore};
use audit_store::JsonlHistoryStore;

/// List completed sessions, optionally for one dossier.
pub fn list(history: &JsonlHistoryStore, dossier: Option<&Dossier>) -> Result<()> {
    let records = match dossier {
        Some(d) => history.for_dossier(&d.key())?,
        None => history.list()?,
    };
    if records.is_empty() {
        println!("No completed sessions.");
        return Ok(());
    }

    println!(
        "{:<36}  {:<16}  {:<14}  {:<20}  {:<13}  {:>5}  REVISES",
        "SESSION", "DOSSIER", "CONTROL", "COMPLETED", "VERDICT", "ANOM."
    );
    println!("{}", "-".repeat(124));
    for record in &records {
        println!(
            "{:<36}  {:<16}  {:<14}  {:<20}  {:<13}  {:>5}  {}",
            record.session_id.to_string(),
            record.dossier.to_string(),
            record.control_type,
            record.completed_at,
            record.verdict().to_string(),
            record.anomaly_count,
            record
                .revision_of
                .map(|p| short_id(&p))
                .unwrap_or_else(|| "-".to_string())
        );
    }
    Ok(())
}

/// Print every answer of one completed session.
pub fn show(history: &JsonlHistoryStore, session_id: &str) -> Result<()> {
    let id = Uuid::parse_str(session_id)
        .with_context(|| format!("'{session_id}' is not a session id"))?;
    let Some(record) = history.find(id)? else {
        bail!("no completed session {id} in {}", history.path().display());
    };
    print_record(&record);
    Ok(())
}

fn print_record(record: &CompletionRecord) {
    println!("Session:   {}", record.session_id);
    println!("Dossier:   {}", record.dossier);
    for (key, value) in &record.dossier.attributes {
        println!("  {key}: {value}");
    }
    println!("Control:   {}", record.control_type);
    println!("Period:    {} .. {}", record.started_at, record.completed_at);
    println!(
        "Verdict:   {} ({} mandatory, {} optional anomalies)",
        record.verdict(),
        record.anomaly_count,
        record.optional_anomaly_count
    );
    if let Some(parent) = record.revision_of {
        println!("Revises:   {parent}");
    }

    for document in &record.documents {
        println!();
        println!("== {} ({}) ==", document.title, document.document);
        if document.answers.is_empty() {
            println!("  (no answers)");
        }
        for entry in &document.answers {
            let answer = &entry.answer;
            let marker = if answer.conforms { " " } else { "!" };
            let indent = if entry.injected { "    " } else { "  " };
            println!("{marker}{indent}Q{}. {}  => {}", entry.index + 1, entry.prompt, answer.raw_value);
            if let Some(quality) = &answer.quality {
                if !quality.failed.is_empty() {
                    let failed: Vec<&str> = quality.failed.iter().map(String::as_str).collect();
                    println!("{indent}     failed criteria: {}", failed.join(", "));
                }
            }
            if let Some(justification) = &answer.justification {
                let obligation = answer
                    .obligation
                    .map(|o| o.to_string())
                    .unwrap_or_default();
                println!("{indent}     justification ({obligation}): {justification}");
            }
            if answer.was_modified {
                if let Some(original) = &answer.original_raw_value {
                    println!("{indent}     modified, was: {original}");
                }
            }
        }
    }
}

fn short_id(id: &Uuid) -> String {
    id.to_string().chars().take(8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_ids_are_eight_chars() {
        let id = Uuid::new_v4();
        let short = short_id(&id);
        assert_eq!(short.len(), 8);
        assert!(id.to_string().starts_with(&short));
    }

    #[test]
    fn show_rejects_bad_ids() {
        let dir = tempfile::tempdir().unwrap();
        let history = JsonlHistoryStore::new(dir.path());
        assert!(show(&history, "not-a-uuid").is_err());
        let missing = Uuid::new_v4().to_string();
        assert!(show(&history, &missing).is_err());
    }

    #[test]
    fn empty_history_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let history = JsonlHistoryStore::new(dir.path());
        list(&history, None).unwrap();
        list(&history, Some(&Dossier::new("D-1"))).unwrap();
    }
}
