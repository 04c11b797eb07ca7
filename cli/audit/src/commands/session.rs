//! Session commands: start, resume, answer, justify, back, status,
//! suspend, complete, revise, discard.
//!
//! Each command loads the session in progress from the workspace, applies
//! one engine operation, saves it back and prints where the operator
//! stands.

use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use uuid::Uuid;

use audit_catalog::CatalogLookup;
use audit_core::{
    Dossier, ObligationClass, QualityDetail, QualityVerdict, QuestionKind, QuestionTemplate,
    RawValue, Submission, Tristate,
};
use audit_engine::{
    AdvanceResult, ControlSession, DocumentProgress, DocumentStatus, PendingSuspension,
    SessionSnapshot, StartOutcome, SuspensionStore,
};

use crate::workspace::{Engine, Workspace};

/// What the operator typed for the current question.
#[derive(Debug, Default)]
pub struct AnswerInput {
    pub value: Option<String>,
    pub quality: Option<String>,
    pub failed: Vec<String>,
    pub justification: Option<String>,
    pub obligation: Option<String>,
    /// Reuse the revised session's answer.
    pub keep: bool,
}

pub fn start(ws: &Workspace, dossier: Dossier, control: &str) -> Result<()> {
    ws.ensure_no_current()?;
    let mut engine = ws.engine()?;
    match engine.start_session(dossier, control)? {
        StartOutcome::Started(mut session) => {
            println!("Started session {}", session.id);
            println!("  dossier:   {}", session.dossier);
            println!("  control:   {}", session.control_type);
            println!("  documents: {}", session.required.join(", "));
            println!();
            show_next_document(&engine, &mut session)?;
            ws.save_current(&session)
        }
        StartOutcome::ResumePending(pending) => {
            print_pending(&pending);
            bail!("a suspended session exists for this dossier (run `audit resume` or `audit discard`)")
        }
    }
}

pub fn resume(ws: &Workspace, dossier: &Dossier, control: &str) -> Result<()> {
    ws.ensure_no_current()?;
    let mut engine = ws.engine()?;
    let mut session = engine.resume(dossier, control)?;
    println!("Resumed session {} on dossier {}", session.id, session.dossier);
    println!();
    let document = pick_document(&session, None, false)?;
    show_position(&engine, &mut session, &document)?;
    ws.save_current(&session)
}

pub fn discard(ws: &Workspace, dossier: &Dossier, control: &str) -> Result<()> {
    let mut engine = ws.engine()?;
    let removed = engine.discard_suspension(dossier, control)?;
    if let Some(current) = ws.load_current()? {
        if current.dossier_key == dossier.key() && current.control_type == control {
            ws.clear_current()?;
            println!("Dropped session {} in progress", current.id);
        }
    }
    if removed {
        println!("Discarded suspended session for dossier {dossier} / {control}");
    } else {
        println!("No suspended session for dossier {dossier} / {control}");
    }
    Ok(())
}

pub fn answer(ws: &Workspace, document: Option<&str>, input: AnswerInput) -> Result<()> {
    let mut session = ws.require_current()?;
    let engine = ws.engine()?;
    let document = pick_document(&session, document, false)?;

    let result = if input.keep {
        engine.keep_prior_answer(&mut session, &document)?
    } else {
        let question = current_question(&engine, &mut session, &document)?;
        let submission = build_submission(&question, &input)?;
        engine.submit_answer(&mut session, &document, submission)?
    };
    report(&engine, &mut session, &document, result)?;
    ws.save_current(&session)
}

pub fn justify(ws: &Workspace, document: Option<&str>, text: &str, obligation: &str) -> Result<()> {
    let mut session = ws.require_current()?;
    let engine = ws.engine()?;
    let document = pick_document(&session, document, false)?;
    let obligation = ObligationClass::from_str(obligation)?;

    let result = engine.justify(&mut session, &document, text, obligation)?;
    report(&engine, &mut session, &document, result)?;
    ws.save_current(&session)
}

pub fn back(ws: &Workspace, document: Option<&str>) -> Result<()> {
    let mut session = ws.require_current()?;
    let engine = ws.engine()?;
    let document = pick_document(&session, document, true)?;

    match engine.go_back(&mut session, &document)? {
        Some(index) => {
            println!("Back to question {} of '{document}'", index + 1);
            println!();
            show_position(&engine, &mut session, &document)?;
        }
        None => println!("Nothing to go back to in '{document}'"),
    }
    ws.save_current(&session)
}

pub fn status(ws: &Workspace) -> Result<()> {
    let Some(session) = ws.load_current()? else {
        println!("No session in progress.");
        return print_suspensions(ws);
    };

    println!("Session:  {}", session.id);
    println!("Dossier:  {}", session.dossier);
    println!("Control:  {}", session.control_type);
    println!("Started:  {}", session.started_at);
    if let Some(revision) = &session.revision {
        println!("Revision of: {}", revision.parent);
    }
    println!();
    println!(
        "{:<28}  {:<12}  {:>8}  {:>9}  {:>8}",
        "DOCUMENT", "STATUS", "ANSWERED", "ANOMALIES", "MODIFIED"
    );
    println!("{}", "-".repeat(73));
    for doc in session.overview() {
        let status = match doc.status {
            None => "not opened",
            Some(DocumentStatus::Pending) => "in progress",
            Some(DocumentStatus::Completed) => "complete",
        };
        println!(
            "{:<28}  {:<12}  {:>8}  {:>9}  {:>8}",
            doc.document, status, doc.answered, doc.anomalies, doc.modified
        );
    }
    println!();
    println!(
        "{} mandatory anomal{}, {} optional",
        session.anomaly_count(),
        if session.anomaly_count() == 1 { "y" } else { "ies" },
        session.optional_anomaly_count()
    );
    if session.is_complete() {
        println!("All documents complete (run `audit complete`).");
    }
    Ok(())
}

pub fn suspend(ws: &Workspace, reason: Option<String>) -> Result<()> {
    let mut session = ws.require_current()?;
    let mut engine = ws.engine()?;
    engine.suspend(&mut session, reason)?;
    ws.clear_current()?;
    println!("Suspended session {} on dossier {}", session.id, session.dossier);
    let attrs: String = session
        .dossier
        .attributes
        .iter()
        .map(|(k, v)| format!(" --attr '{k}={v}'"))
        .collect();
    println!(
        "Resume with: audit resume {} {}{attrs}",
        session.control_type, session.dossier
    );
    Ok(())
}

pub fn complete(ws: &Workspace) -> Result<()> {
    let mut session = ws.require_current()?;
    let mut engine = ws.engine()?;
    let record = engine.complete(&mut session)?;
    ws.clear_current()?;

    println!("Completed session {}", record.session_id);
    println!("  verdict:   {}", record.verdict());
    println!("  answers:   {}", record.answer_count());
    println!("  anomalies: {} mandatory, {} optional", record.anomaly_count, record.optional_anomaly_count);
    if let Some(parent) = record.revision_of {
        println!("  revises:   {parent}");
        if record.modified_fields.is_empty() {
            println!("  modified:  none");
        } else {
            let fields: Vec<String> = record.modified_fields.iter().map(ToString::to_string).collect();
            println!("  modified:  {}", fields.join(", "));
        }
    }
    Ok(())
}

pub fn revise(ws: &Workspace, session_id: &str) -> Result<()> {
    ws.ensure_no_current()?;
    let id = Uuid::parse_str(session_id).with_context(|| format!("'{session_id}' is not a session id"))?;
    let mut engine = ws.engine()?;
    let mut session = engine.start_revision_of(id)?;
    println!("Started revision {} of session {id}", session.id);
    println!("Use `audit answer --keep` to confirm an unchanged answer.");
    println!();
    show_next_document(&engine, &mut session)?;
    ws.save_current(&session)
}

/// The document a command applies to: the one given, else the active one,
/// else the first pending one.
fn pick_document(session: &ControlSession, explicit: Option<&str>, allow_complete: bool) -> Result<String> {
    if let Some(document) = explicit {
        return Ok(document.to_string());
    }
    if let Some(active) = session.active_document() {
        let complete = session.document(active).is_some_and(DocumentProgress::is_complete);
        if allow_complete || !complete {
            return Ok(active.to_string());
        }
    }
    match session.pending_documents().into_iter().next() {
        Some(document) => Ok(document),
        None => bail!("every document is complete (run `audit complete`)"),
    }
}

fn current_question(engine: &Engine, session: &mut ControlSession, document: &str) -> Result<QuestionTemplate> {
    let template = engine.catalog().document_template(document)?;
    let progress = session.open_document(engine.catalog(), document)?;
    match progress.current_question(template) {
        Some(question) => Ok(question.clone()),
        None => bail!("document '{document}' is complete"),
    }
}

fn build_submission(question: &QuestionTemplate, input: &AnswerInput) -> Result<Submission> {
    let Some(value) = input.value.as_deref() else {
        bail!("an answer value is required (or --keep in a revision)");
    };
    let mut submission = Submission::new(parse_value(question, value)?);

    if let Some(verdict) = input.quality.as_deref() {
        let verdict = QualityVerdict::from_str(verdict)?;
        submission = submission.with_quality(QualityDetail {
            verdict,
            failed: input.failed.iter().cloned().collect(),
        });
    } else if !input.failed.is_empty() {
        submission = submission.with_quality(QualityDetail::non_conforming(input.failed.iter().cloned()));
    }

    if let Some(text) = input.justification.as_deref() {
        let obligation = match input.obligation.as_deref() {
            Some(o) => ObligationClass::from_str(o)?,
            None => ObligationClass::Mandatory,
        };
        submission = submission.justified(text, obligation);
    }
    Ok(submission)
}

/// Read operator text as a value of the question's kind.
///
/// Choices may be given by label (case-insensitive) or by 1-based number;
/// checklist items are comma-separated, and `-` or an empty string ticks
/// nothing.
pub(crate) fn parse_value(question: &QuestionTemplate, input: &str) -> Result<RawValue> {
    match &question.kind {
        QuestionKind::Boolean { .. } => Ok(RawValue::Boolean(Tristate::from_str(input)?)),
        QuestionKind::SingleChoice { options, .. } => {
            Ok(RawValue::Choice(resolve_option(options, input)))
        }
        QuestionKind::Checklist { options } => {
            let input = input.trim();
            if input.is_empty() || input == "-" {
                return Ok(RawValue::Checklist(Vec::new()));
            }
            Ok(RawValue::Checklist(
                input
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(|item| resolve_option(options, item))
                    .collect(),
            ))
        }
        QuestionKind::FreeText => Ok(RawValue::Text(input.to_string())),
        QuestionKind::Date => Ok(RawValue::date(input)?),
    }
}

fn resolve_option(options: &[String], input: &str) -> String {
    let input = input.trim();
    if let Some(exact) = options.iter().find(|o| o.as_str() == input) {
        return exact.clone();
    }
    if let Some(folded) = options.iter().find(|o| o.to_lowercase() == input.to_lowercase()) {
        return folded.clone();
    }
    match input.parse::<usize>() {
        Ok(n) if (1..=options.len()).contains(&n) => options[n - 1].clone(),
        // Left as typed; the engine rejects it with the valid options.
        _ => input.to_string(),
    }
}

fn report(engine: &Engine, session: &mut ControlSession, document: &str, result: AdvanceResult) -> Result<()> {
    match result {
        AdvanceResult::Next { .. } | AdvanceResult::JustificationRequired { .. } => {
            show_position(engine, session, document)
        }
        AdvanceResult::DocumentComplete => {
            println!("Document '{document}' complete.");
            println!();
            show_next_document(engine, session)
        }
    }
}

fn show_next_document(engine: &Engine, session: &mut ControlSession) -> Result<()> {
    match session.pending_documents().into_iter().next() {
        Some(document) => show_position(engine, session, &document),
        None => {
            println!("All documents complete (run `audit complete`).");
            Ok(())
        }
    }
}

/// Print the question under the cursor of `document`.
fn show_position(engine: &Engine, session: &mut ControlSession, document: &str) -> Result<()> {
    let catalog = engine.catalog();
    let template = catalog.document_template(document)?;
    session.open_document(catalog, document)?;
    let progress = session
        .document(document)
        .ok_or_else(|| anyhow!("document '{document}' is not open"))?;

    let (Some(index), Some(question)) = (progress.current_index(), progress.current_question(template)) else {
        println!("Document '{document}' complete.");
        return Ok(());
    };
    let counts = progress.progress(template, &session.control_type);

    println!("[{}] {} ({}/{} answered)", document, template.title, counts.answered, counts.visible);
    println!("Q{}. {}", index + 1, question.prompt);
    if let Some(help) = &question.help_text {
        println!("    {help}");
    }
    let options = question.kind.options();
    if !options.is_empty() {
        let numbered: Vec<String> = options
            .iter()
            .enumerate()
            .map(|(i, o)| format!("{}) {o}", i + 1))
            .collect();
        println!("    {}", numbered.join("  "));
    }
    if let Some(quality) = &question.quality {
        println!("    if yes, {}: {}", quality.prompt, quality.criteria.join(", "));
    }

    if let Some(draft) = progress.pending_draft() {
        println!();
        println!("Anomaly on answer '{}': a justification is required.", draft.raw_value);
        println!("  audit justify \"<text>\" [--obligation optional]");
    } else if let Some(prior) = session.prior_answer(document, index) {
        println!("    previously: {} (audit answer --keep)", prior.raw_value);
    }
    Ok(())
}

fn print_pending(pending: &PendingSuspension) {
    println!("Suspended session {}", pending.session_id);
    println!("  started:   {}", pending.started_at);
    if let Some(at) = &pending.suspended_at {
        println!("  suspended: {at}");
    }
    if let Some(reason) = &pending.reason {
        println!("  reason:    {reason}");
    }
    if let Some(parent) = pending.revision_of {
        println!("  revises:   {parent}");
    }
    println!("  answered:  {}", pending.answered);
}

fn print_suspensions(ws: &Workspace) -> Result<()> {
    let engine = ws.engine()?;
    let store = engine.suspensions();
    let keys = store.keys()?;
    if keys.is_empty() {
        return Ok(());
    }
    println!();
    println!("{:<20}  {:<16}  {:<20}  {:>8}", "DOSSIER", "CONTROL", "SUSPENDED", "ANSWERED");
    println!("{}", "-".repeat(70));
    for key in keys {
        let Some(bytes) = store.get(&key)? else {
            continue;
        };
        match SessionSnapshot::from_bytes(&bytes) {
            Ok(snapshot) => {
                let pending = PendingSuspension::from(&snapshot.session);
                println!(
                    "{:<20}  {:<16}  {:<20}  {:>8}",
                    snapshot.session.dossier.to_string(),
                    key.control_type,
                    pending.suspended_at.unwrap_or_default(),
                    pending.answered
                );
            }
            Err(e) => log::warn!("unreadable checkpoint {}/{}: {e}", key.control_type, key.dossier_key),
        }
    }
    Ok(())
}
