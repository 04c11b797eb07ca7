//! The catalog registry and the lookup interface the engine consumes.

use std::collections::BTreeMap;

use audit_core::{Dossier, DocumentTemplate, DocumentTypeId};

use crate::control::ControlDefinition;
use crate::error::{CatalogError, Result};

/// Read-only access to templates and control programs.
///
/// The engine receives an implementation explicitly; there is no global
/// registry.
pub trait CatalogLookup {
    /// The question template of a document type.
    fn document_template(&self, document: &str) -> Result<&DocumentTemplate>;

    /// The ordered document types a control requires for `dossier`.
    fn required_documents(&self, control: &str, dossier: &Dossier) -> Result<Vec<DocumentTypeId>>;
}

/// In-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    documents: BTreeMap<String, DocumentTemplate>,
    controls: BTreeMap<String, ControlDefinition>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document template. Fails if the id is already taken.
    pub fn add_document(&mut self, template: DocumentTemplate) -> Result<()> {
        if self.documents.contains_key(&template.id) {
            return Err(CatalogError::Duplicate {
                kind: "document",
                id: template.id,
            });
        }
        self.documents.insert(template.id.clone(), template);
        Ok(())
    }

    /// Register a control program. Fails if the id is already taken.
    pub fn add_control(&mut self, control: ControlDefinition) -> Result<()> {
        if self.controls.contains_key(&control.id) {
            return Err(CatalogError::Duplicate {
                kind: "control",
                id: control.id,
            });
        }
        self.controls.insert(control.id.clone(), control);
        Ok(())
    }

    /// Assemble a catalog from trusted parts; later ids replace earlier ones.
    pub(crate) fn from_parts(
        documents: impl IntoIterator<Item = DocumentTemplate>,
        controls: impl IntoIterator<Item = ControlDefinition>,
    ) -> Self {
        Self {
            documents: documents.into_iter().map(|d| (d.id.clone(), d)).collect(),
            controls: controls.into_iter().map(|c| (c.id.clone(), c)).collect(),
        }
    }

    pub fn document(&self, id: &str) -> Option<&DocumentTemplate> {
        self.documents.get(id)
    }

    pub fn control(&self, id: &str) -> Option<&ControlDefinition> {
        self.controls.get(id)
    }

    /// Document templates, sorted by id.
    pub fn documents(&self) -> impl Iterator<Item = &DocumentTemplate> {
        self.documents.values()
    }

    /// Control programs, sorted by id.
    pub fn controls(&self) -> impl Iterator<Item = &ControlDefinition> {
        self.controls.values()
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn control_count(&self) -> usize {
        self.controls.len()
    }
}

impl CatalogLookup for Catalog {
    fn document_template(&self, document: &str) -> Result<&DocumentTemplate> {
        self.documents
            .get(document)
            .ok_or_else(|| CatalogError::UnknownDocument(document.to_string()))
    }

    fn required_documents(&self, control: &str, dossier: &Dossier) -> Result<Vec<DocumentTypeId>> {
        let definition = self
            .controls
            .get(control)
            .ok_or_else(|| CatalogError::UnknownControl(control.to_string()))?;
        let docs = definition.required_documents(dossier);
        if let Some(missing) = docs.iter().find(|d| !self.documents.contains_key(*d)) {
            return Err(CatalogError::UnknownDocument(missing.clone()));
        }
        Ok(docs)
    }
}
