//! The audited client file and its stable identity.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::hash::{digest, hash_hex};

/// A client file under audit: an operator-facing reference plus whatever
/// attributes the dossier source exposes (client name, advisor, operation
/// type, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dossier {
    /// Operator-facing dossier reference.
    pub reference: String,
    /// Extra identifying attributes (client name, contract number).
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl Dossier {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Builder: set an attribute.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Identity key used by the suspension store. See [`dossier_key`].
    pub fn key(&self) -> String {
        dossier_key(self)
    }
}

impl fmt::Display for Dossier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reference)
    }
}

/// Stable identity of a dossier.
///
/// Every field is written with a length prefix before hashing, so no two
/// distinct (reference, attributes) combinations share an encoding.
pub fn dossier_key(dossier: &Dossier) -> String {
    let mut buf = Vec::new();
    push_field(&mut buf, &dossier.reference);
    buf.extend_from_slice(&(dossier.attributes.len() as u64).to_le_bytes());
    for (k, v) in &dossier.attributes {
        push_field(&mut buf, k);
        push_field(&mut buf, v);
    }
    hash_hex(&digest(&buf))
}

fn push_field(buf: &mut Vec<u8>, field: &str) {
    buf.extend_from_slice(&(field.len() as u64).to_le_bytes());
    buf.extend_from_slice(field.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_stable() {
        let a = Dossier::new("D-2024-001").with("client", "Martin");
        let b = Dossier::new("D-2024-001").with("client", "Martin");
        assert_eq!(a.key(), b.key());
        assert_eq!(a.key().len(), 64);
    }

    #[test]
    fn key_ignores_insertion_order() {
        let a = Dossier::new("D1").with("a", "1").with("b", "2");
        let b = Dossier::new("D1").with("b", "2").with("a", "1");
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn concatenation_does_not_collide() {
        let a = Dossier::new("D1").with("ab", "c");
        let b = Dossier::new("D1").with("a", "bc");
        assert_ne!(a.key(), b.key());

        let c = Dossier::new("D1a").with("x", "y");
        let d = Dossier::new("D1").with("ax", "y");
        assert_ne!(c.key(), d.key());
    }

    #[test]
    fn attribute_lookup() {
        let d = Dossier::new("D1").with("type_operation", "Rachat partiel");
        assert_eq!(d.attribute("type_operation"), Some("Rachat partiel"));
        assert_eq!(d.attribute("missing"), None);
        assert_eq!(d.to_string(), "D1");
    }
}
