//! Control programs and the documents they require.
//!
//! A control may split into variants picked from the dossier's free-text
//! fields (an operation audit differs for contributions and redemptions).
//! Detection is keyword based. When no variant matches, or several do, the
//! union of every variant's documents is required so nothing is left
//! unaudited.

use serde::{Deserialize, Serialize};

use audit_core::{Dossier, DocumentTypeId};

/// One sub-type of a control program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub name: String,
    /// Lower-case, accent-free keywords searched in the dossier fields.
    pub keywords: Vec<String>,
    pub documents: Vec<DocumentTypeId>,
}

/// Which dossier fields to inspect and which variants they select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantRule {
    pub fields: Vec<String>,
    pub variants: Vec<Variant>,
}

/// Outcome of variant detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// The control has no variants.
    NotApplicable,
    /// Exactly one variant matched.
    Resolved(String),
    /// Several variants matched.
    Ambiguous(Vec<String>),
    /// No variant matched.
    Unresolved,
}

/// A named audit program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlDefinition {
    pub id: String,
    pub label: String,
    /// Documents required whatever the variant.
    pub documents: Vec<DocumentTypeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variants: Option<VariantRule>,
}

impl ControlDefinition {
    pub fn new<I, S>(id: impl Into<String>, label: impl Into<String>, documents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            label: label.into(),
            documents: documents.into_iter().map(Into::into).collect(),
            variants: None,
        }
    }

    /// Builder: attach a variant rule.
    pub fn with_variants(mut self, rule: VariantRule) -> Self {
        self.variants = Some(rule);
        self
    }

    /// Detect which variant applies to `dossier`.
    pub fn detect(&self, dossier: &Dossier) -> Detection {
        let Some(rule) = &self.variants else {
            return Detection::NotApplicable;
        };

        let haystack: String = rule
            .fields
            .iter()
            .filter_map(|f| dossier.attribute(f))
            .map(normalize)
            .collect::<Vec<_>>()
            .join(" ");

        let matched: Vec<String> = rule
            .variants
            .iter()
            .filter(|v| v.keywords.iter().any(|k| haystack.contains(&normalize(k))))
            .map(|v| v.name.clone())
            .collect();

        match matched.len() {
            0 => Detection::Unresolved,
            1 => Detection::Resolved(matched.into_iter().next().unwrap_or_default()),
            _ => Detection::Ambiguous(matched),
        }
    }

    /// Required documents for `dossier`, common documents first, without
    /// duplicates.
    pub fn required_documents(&self, dossier: &Dossier) -> Vec<DocumentTypeId> {
        let mut docs: Vec<DocumentTypeId> = Vec::new();
        let mut push = |id: &DocumentTypeId| {
            if !docs.contains(id) {
                docs.push(id.clone());
            }
        };
        self.documents.iter().for_each(&mut push);

        if let Some(rule) = &self.variants {
            let detection = self.detect(dossier);
            for variant in &rule.variants {
                let selected = match &detection {
                    Detection::Resolved(name) => *name == variant.name,
                    _ => true,
                };
                if selected {
                    variant.documents.iter().for_each(&mut push);
                }
            }
            if !matches!(detection, Detection::Resolved(_)) {
                log::warn!(
                    "control '{}': variant not resolved for dossier {} ({detection:?}), requiring all variants",
                    self.id,
                    dossier.reference
                );
            }
        }
        docs
    }

    /// Every document this control may require, across all variants.
    pub fn all_documents(&self) -> Vec<&DocumentTypeId> {
        let mut docs: Vec<&DocumentTypeId> = self.documents.iter().collect();
        if let Some(rule) = &self.variants {
            for d in rule.variants.iter().flat_map(|v| v.documents.iter()) {
                if !docs.contains(&d) {
                    docs.push(d);
                }
            }
        }
        docs
    }
}

/// Lower-case and strip the French diacritics that appear in operation
/// labels, so "Rachat partiel" and "RACHAT" both match "rachat".
fn normalize(s: &str) -> String {
    s.chars()
        .flat_map(|c| c.to_lowercase())
        .map(|c| match c {
            'à' | 'â' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'î' | 'ï' => 'i',
            'ô' | 'ö' => 'o',
            'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}
