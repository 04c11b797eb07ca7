//! Catalog of document templates and control programs.
//!
//! The catalog is static configuration: a registry from document-type id to
//! its question template, and from control-type id to the documents it
//! requires. Control programs may depend on the dossier itself, e.g. an
//! operation audit picks contribution or redemption documents by reading
//! the dossier's operation fields.
//!
//! The engine only sees the [`CatalogLookup`] trait; [`Catalog`] is the
//! in-memory implementation, seeded from [`Catalog::builtin`] or a
//! `.catalog.toml` file.

pub mod builtin;
pub mod catalog;
pub mod control;
pub mod error;
pub mod parse;

pub use catalog::{Catalog, CatalogLookup};
pub use control::{ControlDefinition, Detection, Variant, VariantRule};
pub use error::{CatalogError, Result};
pub use parse::{
    catalog_to_toml, load_catalog_toml, parse_catalog_toml, validate_catalog, CatalogFile,
    DocumentFile, ValidationIssue,
};
