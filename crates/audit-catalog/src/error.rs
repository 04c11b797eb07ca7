//! Error types for catalog operations.

use std::path::PathBuf;

/// Errors that can occur while loading or querying a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// TOML deserialization error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// I/O error reading/writing catalog files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog file not found.
    #[error("catalog file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Document type id not present in the catalog.
    #[error("unknown document type '{0}'")]
    UnknownDocument(String),

    /// Control type id not present in the catalog.
    #[error("unknown control type '{0}'")]
    UnknownControl(String),

    /// The same id is declared twice.
    #[error("duplicate {kind} id '{id}'")]
    Duplicate { kind: &'static str, id: String },
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CatalogError::UnknownControl("audit-x".into());
        assert_eq!(err.to_string(), "unknown control type 'audit-x'");
        let err = CatalogError::NotFound {
            path: PathBuf::from("/tmp/missing.catalog.toml"),
        };
        assert!(err.to_string().contains("missing.catalog.toml"));
    }
}
