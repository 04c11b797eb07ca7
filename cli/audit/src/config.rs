//! `audit.toml` parsing and workspace configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use audit_catalog::{load_catalog_toml, Catalog};

pub const CONFIG_FILE: &str = "audit.toml";

/// The top-level configuration of an audit workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub catalog: Option<CatalogConfig>,
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    pub name: String,
    /// Where sessions, checkpoints and history live, relative to the
    /// directory holding `audit.toml`.
    #[serde(default = "default_state_dir")]
    pub state_dir: String,
}

fn default_state_dir() -> String {
    ".audit".to_string()
}

/// Catalog source. Without one the built-in catalog is used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `env_logger` filter, e.g. `info` or `audit_engine=debug`.
    #[serde(default)]
    pub level: Option<String>,
}

impl AuditConfig {
    /// Search upward from `start_dir` for an `audit.toml`, parse it and
    /// return it with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let config: AuditConfig = toml::from_str(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                return Ok(Some((config, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing audit.toml")
    }

    pub fn state_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.workspace.state_dir)
    }

    pub fn catalog_path(&self, root: &Path) -> Option<PathBuf> {
        self.catalog
            .as_ref()
            .and_then(|c| c.path.as_deref())
            .map(|p| root.join(p))
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }

    /// The configured catalog, or the built-in one.
    pub fn load_catalog(&self, root: &Path) -> Result<Catalog> {
        match self.catalog_path(root) {
            Some(path) => load_catalog_toml(&path)
                .with_context(|| format!("loading catalog {}", path.display())),
            None => Ok(Catalog::builtin()),
        }
    }

    /// Default `audit.toml` written by `audit init`.
    pub fn template(name: &str) -> String {
        format!(
            r#"[workspace]
name = "{name}"
state_dir = ".audit"

# [catalog]
# path = "controls.catalog.toml"

[logging]
level = "warn"
"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let config = AuditConfig::from_str(
            r#"
[workspace]
name = "cabinet-dupont"
state_dir = "var/audit"

[catalog]
path = "catalog/cif.catalog.toml"

[logging]
level = "audit_engine=debug"
"#,
        )
        .unwrap();
        assert_eq!(config.workspace.name, "cabinet-dupont");
        assert_eq!(config.state_dir(Path::new("/w")), Path::new("/w/var/audit"));
        assert_eq!(
            config.catalog_path(Path::new("/w")),
            Some(PathBuf::from("/w/catalog/cif.catalog.toml"))
        );
        assert_eq!(config.log_level(), Some("audit_engine=debug"));
    }

    #[test]
    fn parse_minimal_config() {
        let config = AuditConfig::from_str("[workspace]\nname = \"min\"\n").unwrap();
        assert_eq!(config.workspace.state_dir, ".audit");
        assert!(config.catalog_path(Path::new("/w")).is_none());
        assert!(config.log_level().is_none());
        let catalog = config.load_catalog(Path::new("/w")).unwrap();
        assert!(catalog.document_count() > 0);
    }

    #[test]
    fn reject_config_without_workspace() {
        assert!(AuditConfig::from_str("[logging]\nlevel = \"info\"\n").is_err());
    }

    #[test]
    fn template_is_valid_toml() {
        let config = AuditConfig::from_str(&AuditConfig::template("demo")).unwrap();
        assert_eq!(config.workspace.name, "demo");
        assert_eq!(config.workspace.state_dir, ".audit");
        assert_eq!(config.log_level(), Some("warn"));
        assert!(config.catalog.is_none());
    }

    #[test]
    fn find_and_load_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), AuditConfig::template("parent")).unwrap();
        let nested = dir.path().join("dossiers").join("2024");
        std::fs::create_dir_all(&nested).unwrap();

        let (config, found) = AuditConfig::find_and_load(&nested).unwrap().unwrap();
        assert_eq!(config.workspace.name, "parent");
        assert_eq!(found, dir.path());
    }

    #[test]
    fn missing_catalog_file_is_an_error() {
        let config = AuditConfig::from_str(
            "[workspace]\nname = \"x\"\n[catalog]\npath = \"nope.catalog.toml\"\n",
        )
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        assert!(config.load_catalog(dir.path()).is_err());
    }
}
