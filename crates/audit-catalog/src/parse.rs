//! TOML loading, serialization, and validation for catalog files.
//!
//! A catalog file lists documents (with follow-ups nested inline, flattened
//! on load) and control definitions:
//!
//! ```toml
//! [[documents]]
//! id = "kyc"
//! title = "Recueil client"
//!
//! [[documents.questions]]
//! prompt = "Présent ?"
//! kind = { type = "boolean" }
//! skip_on = ["Non"]
//!
//! [[controls]]
//! id = "lcb-ft"
//! label = "LCB-FT"
//! documents = ["kyc"]
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use audit_core::{DocumentTemplate, MatchRule, QuestionKind, QuestionSpec, Visibility};

use crate::catalog::Catalog;
use crate::control::ControlDefinition;
use crate::error::{CatalogError, Result};

/// On-disk form of a document template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFile {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub questions: Vec<QuestionSpec>,
}

/// On-disk form of a catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub documents: Vec<DocumentFile>,
    #[serde(default)]
    pub controls: Vec<ControlDefinition>,
}

impl CatalogFile {
    /// Flatten into a catalog, rejecting duplicate ids.
    pub fn into_catalog(self) -> Result<Catalog> {
        let mut catalog = Catalog::new();
        for doc in self.documents {
            catalog.add_document(DocumentTemplate::new(doc.id, doc.title, doc.questions))?;
        }
        for control in self.controls {
            catalog.add_control(control)?;
        }
        Ok(catalog)
    }

    /// Nested form of an existing catalog.
    pub fn from_catalog(catalog: &Catalog) -> Self {
        Self {
            documents: catalog
                .documents()
                .map(|d| DocumentFile {
                    id: d.id.clone(),
                    title: d.title.clone(),
                    questions: d.to_specs(),
                })
                .collect(),
            controls: catalog.controls().cloned().collect(),
        }
    }
}

/// A validation issue found in a catalog.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Severity: "error" or "warning".
    pub severity: &'static str,
    /// Human-readable description.
    pub message: String,
}

/// Load a catalog from a `.catalog.toml` file.
pub fn load_catalog_toml(path: &Path) -> Result<Catalog> {
    if !path.exists() {
        return Err(CatalogError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    let catalog = parse_catalog_toml(&content)?;
    log::debug!(
        "loaded catalog {} ({} documents, {} controls)",
        path.display(),
        catalog.document_count(),
        catalog.control_count()
    );
    Ok(catalog)
}

/// Parse a catalog from a TOML string.
pub fn parse_catalog_toml(toml_str: &str) -> Result<Catalog> {
    let file: CatalogFile = toml::from_str(toml_str)?;
    file.into_catalog()
}

/// Serialize a catalog to pretty TOML.
pub fn catalog_to_toml(catalog: &Catalog) -> Result<String> {
    let toml_str = toml::to_string_pretty(&CatalogFile::from_catalog(catalog))?;
    Ok(toml_str)
}

/// Validate a catalog for structural correctness.
///
/// Returns `Ok(())` if valid, or `Err(issues)` with a list of problems.
/// Warnings alone also produce `Err`; callers filter on severity.
pub fn validate_catalog(catalog: &Catalog) -> std::result::Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    for doc in catalog.documents() {
        validate_document(doc, &mut issues);
    }

    for control in catalog.controls() {
        // 1. Every referenced document exists
        for doc in control.all_documents() {
            if catalog.document(doc).is_none() {
                issues.push(error(format!(
                    "control '{}' requires unknown document '{doc}'",
                    control.id
                )));
            }
        }

        // 2. Variant rules inspect at least one field and have keywords
        if let Some(rule) = &control.variants {
            if rule.fields.is_empty() {
                issues.push(error(format!(
                    "control '{}' has variants but inspects no dossier field",
                    control.id
                )));
            }
            for v in rule.variants.iter().filter(|v| v.keywords.is_empty()) {
                issues.push(error(format!(
                    "control '{}' variant '{}' has no keywords",
                    control.id, v.name
                )));
            }
        }

        if control.all_documents().is_empty() {
            issues.push(warning(format!("control '{}' requires no document", control.id)));
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

fn validate_document(doc: &DocumentTemplate, issues: &mut Vec<ValidationIssue>) {
    if doc.is_empty() {
        issues.push(warning(format!("document '{}' has no question", doc.id)));
    }

    let top_level: BTreeSet<usize> = doc.sequence().iter().map(|r| r.0).collect();

    for q in doc.questions() {
        let at = format!("document '{}' question {} ('{}')", doc.id, q.position, q.prompt);
        let options = q.kind.options();

        // 3. Closed kinds offer options
        if matches!(
            q.kind,
            QuestionKind::SingleChoice { .. } | QuestionKind::Checklist { .. }
        ) && options.is_empty()
        {
            issues.push(error(format!("{at}: no options")));
        }

        // 4. Skip triggers are reachable answers
        for s in &q.skip_on {
            if matches!(q.kind, QuestionKind::Checklist { .. }) {
                issues.push(error(format!("{at}: checklists cannot carry skip triggers")));
            } else if !options.is_empty() && !options.contains(s) {
                issues.push(error(format!("{at}: skip value '{s}' is not an option")));
            }
        }

        // 5. Follow-up triggers fit the question kind
        if let Some(rule) = &q.follow_up {
            check_rule(&at, &rule.trigger, &q.kind, &options, issues);
        }

        // 6. Conditional offsets point inside the sequence
        if let Visibility::Answer { offset, rule } = &q.visibility {
            if *offset == 0 {
                issues.push(error(format!("{at}: conditional offset must be at least 1")));
            } else if top_level.contains(&q.position.0) {
                match q.position.0.checked_sub(*offset) {
                    None => issues.push(error(format!(
                        "{at}: conditional offset {offset} reaches before the first question"
                    ))),
                    Some(target) => {
                        if let Some(referenced) = doc.question(doc.sequence()[target]) {
                            let ref_opts = referenced.kind.options();
                            check_rule(&at, rule, &referenced.kind, &ref_opts, issues);
                        }
                    }
                }
            }
        }

        // 7. Quality checks only open on boolean questions
        if q.quality.is_some() && !matches!(q.kind, QuestionKind::Boolean { .. }) {
            issues.push(warning(format!(
                "{at}: quality check on a {} question is never shown",
                q.kind.name()
            )));
        }

        // 8. Nonconforming options exist and are not on a taxonomy
        if let QuestionKind::SingleChoice {
            nonconforming,
            taxonomy,
            ..
        } = &q.kind
        {
            for n in nonconforming {
                if !options.contains(n) {
                    issues.push(error(format!("{at}: nonconforming value '{n}' is not an option")));
                }
            }
            if taxonomy.is_some() && !nonconforming.is_empty() {
                issues.push(warning(format!(
                    "{at}: nonconforming values are ignored on a taxonomy question"
                )));
            }
        }
    }
}

fn check_rule(
    at: &str,
    rule: &MatchRule,
    kind: &QuestionKind,
    options: &[String],
    issues: &mut Vec<ValidationIssue>,
) {
    let is_checklist = matches!(kind, QuestionKind::Checklist { .. });
    match rule {
        MatchRule::AnySelected if !is_checklist => {
            issues.push(error(format!(
                "{at}: 'any selected' rule on a {} question",
                kind.name()
            )));
        }
        MatchRule::Equals { .. } | MatchRule::OneOf { .. } if is_checklist => {
            issues.push(error(format!("{at}: value rule on a checklist question")));
        }
        MatchRule::Equals { value } if !options.is_empty() && !options.contains(value) => {
            issues.push(error(format!("{at}: rule value '{value}' is not an option")));
        }
        MatchRule::OneOf { values } if !options.is_empty() => {
            for v in values.iter().filter(|v| !options.contains(v)) {
                issues.push(error(format!("{at}: rule value '{v}' is not an option")));
            }
        }
        _ => {}
    }
}

fn error(message: String) -> ValidationIssue {
    ValidationIssue {
        severity: "error",
        message,
    }
}

fn warning(message: String) -> ValidationIssue {
    ValidationIssue {
        severity: "warning",
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogLookup;
    use audit_core::{Dossier, TemplateRef};

    const SAMPLE: &str = r#"
[[documents]]
id = "kyc"
title = "Recueil client"

[[documents.questions]]
prompt = "Le recueil est-il présent ?"
kind = { type = "boolean" }
skip_on = ["Non"]

[documents.questions.follow_up]
trigger = { match = "equals", value = "Oui" }

[documents.questions.follow_up.question]
prompt = "Support ?"
kind = { type = "single_choice", options = ["Papier", "Électronique"], taxonomy = "document_medium" }

[[documents.questions]]
prompt = "Rubriques incomplètes"
kind = { type = "checklist", options = ["Revenus", "Patrimoine"] }

[[documents.questions]]
prompt = "Préciser"
kind = { type = "free_text" }
visibility = { when = "answer", offset = 1, rule = { match = "any_selected" } }

[[controls]]
id = "lcb-ft"
label = "LCB-FT"
documents = ["kyc"]
"#;

    #[test]
    fn parse_sample() {
        let catalog = parse_catalog_toml(SAMPLE).unwrap();
        let kyc = catalog.document("kyc").unwrap();
        assert_eq!(kyc.len(), 3);
        assert_eq!(kyc.questions().len(), 4);
        let first = kyc.question(TemplateRef(0)).unwrap();
        assert_eq!(first.skip_on, vec!["Non"]);
        assert_eq!(first.follow_up.as_ref().unwrap().question, TemplateRef(3));
        assert!(validate_catalog(&catalog).is_ok());
        assert_eq!(
            catalog.required_documents("lcb-ft", &Dossier::new("D1")).unwrap(),
            vec!["kyc"]
        );
    }

    #[test]
    fn builtin_round_trips_through_toml() {
        let original = Catalog::builtin();
        let toml_str = catalog_to_toml(&original).unwrap();
        let parsed = parse_catalog_toml(&toml_str).unwrap();
        assert_eq!(parsed.document_count(), original.document_count());
        for doc in original.documents() {
            assert_eq!(parsed.document(&doc.id), Some(doc));
        }
        for control in original.controls() {
            assert_eq!(parsed.control(&control.id), Some(control));
        }
    }

    #[test]
    fn duplicate_document_rejected() {
        let doubled = format!(
            "{SAMPLE}\n[[documents]]\nid = \"kyc\"\ntitle = \"again\"\n"
        );
        assert!(matches!(
            parse_catalog_toml(&doubled),
            Err(CatalogError::Duplicate { .. })
        ));
    }

    #[test]
    fn reject_invalid_toml() {
        assert!(matches!(
            parse_catalog_toml("this is not valid toml [[["),
            Err(CatalogError::Toml(_))
        ));
    }

    #[test]
    fn validation_catches_bad_wiring() {
        let mut catalog = Catalog::new();
        catalog
            .add_document(DocumentTemplate::new(
                "bad",
                "Bad",
                vec![
                    QuestionSpec::boolean("Présent ?")
                        .skip_on(["Peut-être"])
                        .follow_up(MatchRule::AnySelected, QuestionSpec::free_text("?")),
                    QuestionSpec::free_text("Détail").visible_if(5, MatchRule::equals("Oui")),
                ],
            ))
            .unwrap();
        catalog
            .add_control(ControlDefinition::new("c", "C", ["bad", "ghost"]))
            .unwrap();

        let issues = validate_catalog(&catalog).unwrap_err();
        let messages: Vec<&str> = issues.iter().map(|i| i.message.as_str()).collect();
        assert!(messages.iter().any(|m| m.contains("skip value 'Peut-être'")));
        assert!(messages.iter().any(|m| m.contains("'any selected' rule")));
        assert!(messages.iter().any(|m| m.contains("reaches before the first question")));
        assert!(messages.iter().any(|m| m.contains("unknown document 'ghost'")));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cif.catalog.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let catalog = load_catalog_toml(&path).unwrap();
        assert_eq!(catalog.control_count(), 1);

        let missing = dir.path().join("missing.catalog.toml");
        assert!(matches!(
            load_catalog_toml(&missing),
            Err(CatalogError::NotFound { .. })
        ));
    }
}
