//! `audit catalog` and `audit controls`: catalog inspection.

use std::path::Path;

use anyhow::{bail, Context, Result};

use audit_catalog::{
    catalog_to_toml, load_catalog_toml, validate_catalog, Catalog, CatalogLookup, Detection,
};
use audit_core::{DocumentTemplate, Dossier, QuestionTemplate, Visibility};

/// List document types and control programs.
pub fn list(catalog: &Catalog) -> Result<()> {
    println!("Document types:");
    println!();
    println!("  {:<28}  {:>9}  TITLE", "ID", "QUESTIONS");
    for doc in catalog.documents() {
        println!("  {:<28}  {:>9}  {}", doc.id, doc.len(), doc.title);
    }
    println!();
    println!("Controls:");
    println!();
    for control in catalog.controls() {
        let variants = control
            .variants
            .as_ref()
            .map(|r| format!(" ({} variants)", r.variants.len()))
            .unwrap_or_default();
        println!("  {:<28}  {}{variants}", control.id, control.label);
    }
    println!();
    println!("Use 'audit catalog show <document>' for the questions of a document.");
    Ok(())
}

/// Print a document's questions, follow-ups indented under their trigger.
pub fn show(catalog: &Catalog, document: &str) -> Result<()> {
    let Some(template) = catalog.document(document) else {
        bail!("unknown document type '{document}'. Use 'audit catalog list' to see the catalog.");
    };

    println!("=== {} ({}) ===", template.title, template.id);
    println!();
    for (n, r) in template.sequence().iter().enumerate() {
        if let Some(question) = template.question(*r) {
            print_question(template, question, &format!("{}.", n + 1), 1);
        }
    }
    Ok(())
}

fn print_question(template: &DocumentTemplate, question: &QuestionTemplate, label: &str, depth: usize) {
    let indent = "  ".repeat(depth);
    let optional = if question.required { "" } else { ", optional" };
    println!("{indent}{label} {} [{}{optional}]", question.prompt, question.kind.name());

    let options = question.kind.options();
    if !options.is_empty() {
        println!("{indent}   options: {}", options.join(" | "));
    }
    match &question.visibility {
        Visibility::Always => {}
        Visibility::OnlyForControls { controls } => {
            println!("{indent}   only for: {}", join(controls.iter()));
        }
        Visibility::ExceptForControls { controls } => {
            println!("{indent}   except for: {}", join(controls.iter()));
        }
        Visibility::Answer { offset, rule } => {
            println!("{indent}   shown when the answer {offset} place(s) back {rule}");
        }
    }
    if !question.skip_on.is_empty() {
        println!("{indent}   ends the document on: {}", question.skip_on.join(", "));
    }
    if let Some(quality) = &question.quality {
        println!("{indent}   quality: {} ({})", quality.prompt, quality.criteria.join(", "));
    }
    if let Some(rule) = &question.follow_up {
        if let Some(next) = template.question(rule.question) {
            print_question(template, next, &format!("-> if {}:", rule.trigger), depth + 1);
        }
    }
}

fn join<'a>(items: impl Iterator<Item = &'a String>) -> String {
    items.map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// Validate a catalog file, or the workspace catalog when `path` is `None`.
///
/// Returns whether the catalog is free of errors.
pub fn validate(catalog: Option<&Catalog>, path: Option<&Path>) -> Result<bool> {
    let loaded;
    let catalog = match (path, catalog) {
        (Some(path), _) => {
            loaded = load_catalog_toml(path)
                .with_context(|| format!("loading catalog {}", path.display()))?;
            &loaded
        }
        (None, Some(catalog)) => catalog,
        (None, None) => bail!("specify a catalog file or run inside an audit workspace"),
    };

    match validate_catalog(catalog) {
        Ok(()) => {
            println!(
                "catalog OK: {} document types, {} controls",
                catalog.document_count(),
                catalog.control_count()
            );
            Ok(true)
        }
        Err(issues) => {
            let mut errors = 0;
            for issue in &issues {
                println!("{}: {}", issue.severity, issue.message);
                if issue.severity == "error" {
                    errors += 1;
                }
            }
            println!();
            println!("{errors} error(s), {} warning(s)", issues.len() - errors);
            Ok(errors == 0)
        }
    }
}

/// Write the catalog as TOML to `output`, or stdout.
pub fn export(catalog: &Catalog, output: Option<&Path>) -> Result<()> {
    let text = catalog_to_toml(catalog).context("serializing catalog")?;
    match output {
        Some(path) => {
            std::fs::write(path, &text).with_context(|| format!("writing {}", path.display()))?;
            println!("Exported catalog to {}", path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}

/// Show which documents `control` requires for `dossier`.
pub fn controls(catalog: &Catalog, control: &str, dossier: &Dossier) -> Result<()> {
    let Some(definition) = catalog.control(control) else {
        bail!("unknown control type '{control}'. Use 'audit catalog list' to see the catalog.");
    };
    let required = catalog.required_documents(control, dossier)?;

    println!("Control:  {} ({})", definition.label, definition.id);
    println!("Dossier:  {dossier}");
    match definition.detect(dossier) {
        Detection::NotApplicable => {}
        Detection::Resolved(name) => println!("Variant:  {name}"),
        Detection::Ambiguous(names) => {
            println!("Variant:  ambiguous ({}), all variants required", names.join(", "));
        }
        Detection::Unresolved => println!("Variant:  not detected, all variants required"),
    }
    println!();
    for document in &required {
        let title = catalog
            .document(document)
            .map(|t| t.title.as_str())
            .unwrap_or("?");
        println!("  {document:<28}  {title}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_validates() {
        let catalog = Catalog::builtin();
        assert!(validate(Some(&catalog), None).unwrap());
    }

    #[test]
    fn exported_catalog_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cif.catalog.toml");
        export(&Catalog::builtin(), Some(&path)).unwrap();
        assert!(validate(None, Some(&path)).unwrap());
        let reloaded = load_catalog_toml(&path).unwrap();
        assert_eq!(reloaded.document_count(), Catalog::builtin().document_count());
    }

    #[test]
    fn validate_requires_a_catalog() {
        assert!(validate(None, None).is_err());
    }

    #[test]
    fn unknown_entries_are_reported() {
        let catalog = Catalog::builtin();
        assert!(show(&catalog, "bulletin-meteo").is_err());
        assert!(controls(&catalog, "audit-fiscal", &Dossier::new("D-1")).is_err());
    }

    #[test]
    fn every_builtin_document_can_be_shown() {
        let catalog = Catalog::builtin();
        let ids: Vec<String> = catalog.documents().map(|d| d.id.clone()).collect();
        for id in ids {
            show(&catalog, &id).unwrap();
        }
    }
}
