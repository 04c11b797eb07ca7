//! Visibility evaluation and follow-up injection over a working sequence.
//!
//! A working sequence starts as a copy of the document's top-level
//! questions and grows as follow-ups are spliced in after their trigger.
//! Every entry carries a slot id that is stable for the life of the
//! document, so the link from a follow-up to its trigger survives
//! insertions and removals elsewhere in the sequence.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use audit_core::{Answer, DocumentTemplate, TemplateRef, Visibility};

/// Stable identifier of a working-sequence entry within one document.
pub type SlotId = u32;

/// One entry of a document's working sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingQuestion {
    /// Survives splicing, unlike the entry's index.
    pub slot: SlotId,
    /// Question this entry asks.
    pub template: TemplateRef,
    /// Slot of the entry whose answer injected this one, `None` for
    /// top-level questions.
    pub injected_by: Option<SlotId>,
    pub answer: Option<Answer>,
}

impl WorkingQuestion {
    pub fn top_level(slot: SlotId, template: TemplateRef) -> Self {
        Self {
            slot,
            template,
            injected_by: None,
            answer: None,
        }
    }

    pub fn is_injected(&self) -> bool {
        self.injected_by.is_some()
    }
}

/// Where traversal goes next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    Ask(usize),
    Complete,
}

/// What committing an answer did to the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finalized {
    /// A skip trigger matched; the document is over.
    Skipped,
    /// A follow-up was spliced in at the given index.
    Injected(usize),
    Plain,
}

/// First visible entry at or after `from`.
pub fn next_visible(
    template: &DocumentTemplate,
    sequence: &[WorkingQuestion],
    from: usize,
    control_type: &str,
) -> NextStep {
    (from..sequence.len())
        .find(|&index| is_visible(template, sequence, index, control_type))
        .map_or(NextStep::Complete, NextStep::Ask)
}

/// Whether the entry at `index` is shown, given the answers before it.
pub fn is_visible(
    template: &DocumentTemplate,
    sequence: &[WorkingQuestion],
    index: usize,
    control_type: &str,
) -> bool {
    let Some(entry) = sequence.get(index) else {
        return false;
    };
    let Some(question) = template.question(entry.template) else {
        return false;
    };
    match &question.visibility {
        Visibility::Always => true,
        Visibility::OnlyForControls { controls } => controls.contains(control_type),
        Visibility::ExceptForControls { controls } => !controls.contains(control_type),
        Visibility::Answer { offset, rule } => referenced_answer(sequence, index, *offset)
            .is_some_and(|answer| rule.matches(&answer.raw_value)),
    }
}

/// The answer `offset` places before `index`.
///
/// Top-level questions count top-level entries only, so a template offset
/// keeps its meaning whatever follow-ups were injected in between. Injected
/// questions count raw entries.
pub fn referenced_answer(
    sequence: &[WorkingQuestion],
    index: usize,
    offset: usize,
) -> Option<&Answer> {
    if offset == 0 || index >= sequence.len() {
        return None;
    }
    let top_level = !sequence[index].is_injected();
    sequence[..index]
        .iter()
        .rev()
        .filter(|entry| !top_level || !entry.is_injected())
        .nth(offset - 1)
        .and_then(|entry| entry.answer.as_ref())
}

/// Remove every entry transitively injected by `root`. The root itself
/// stays. Returns the number of entries removed.
pub fn remove_follow_ups(sequence: &mut Vec<WorkingQuestion>, root: SlotId) -> usize {
    // Follow-ups always sit after their trigger, so one forward pass sees
    // each parent before its children.
    let mut doomed: HashSet<SlotId> = HashSet::from([root]);
    let before = sequence.len();
    sequence.retain(|entry| match entry.injected_by {
        Some(parent) if doomed.contains(&parent) => {
            doomed.insert(entry.slot);
            false
        }
        _ => true,
    });
    before - sequence.len()
}

/// Splice the follow-up of the entry at `index` right after it, when the
/// committed answer matches the trigger.
pub fn inject_follow_up(
    template: &DocumentTemplate,
    sequence: &mut Vec<WorkingQuestion>,
    index: usize,
    next_slot: &mut SlotId,
) -> Option<usize> {
    let entry = sequence.get(index)?;
    let rule = template.question(entry.template)?.follow_up.as_ref()?;
    let answer = entry.answer.as_ref()?;
    if !rule.trigger.matches(&answer.raw_value) {
        return None;
    }

    let injected = WorkingQuestion {
        slot: *next_slot,
        template: rule.question,
        injected_by: Some(entry.slot),
        answer: None,
    };
    *next_slot += 1;
    sequence.insert(index + 1, injected);
    Some(index + 1)
}

/// Apply the structural consequences of the answer just committed at
/// `index`: drop stale follow-ups, then either end the document on a skip
/// trigger or inject the matching follow-up.
pub fn finalize_answer(
    template: &DocumentTemplate,
    sequence: &mut Vec<WorkingQuestion>,
    index: usize,
    next_slot: &mut SlotId,
) -> Finalized {
    let Some(entry) = sequence.get(index) else {
        return Finalized::Plain;
    };
    let slot = entry.slot;
    let removed = remove_follow_ups(sequence, slot);
    if removed > 0 {
        log::debug!("dropped {removed} stale follow-up(s) after index {index}");
    }

    let skip = sequence.get(index).and_then(|entry| {
        let question = template.question(entry.template)?;
        let answer = entry.answer.as_ref()?;
        Some(question.skips_on(&answer.raw_value))
    });
    if skip == Some(true) {
        return Finalized::Skipped;
    }

    match inject_follow_up(template, sequence, index, next_slot) {
        Some(at) => Finalized::Injected(at),
        None => Finalized::Plain,
    }
}
