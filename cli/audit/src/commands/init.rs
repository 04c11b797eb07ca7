//! `audit init`: workspace scaffolding.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::config::{AuditConfig, CONFIG_FILE};

/// Turn `dir` into an audit workspace named `name`.
pub fn run(dir: &Path, name: &str) -> Result<()> {
    create_workspace(dir, name)?;
    println!("Initialized audit workspace '{name}'");
    println!("  {CONFIG_FILE}");
    println!("  .audit/");
    println!("  .gitignore");
    Ok(())
}

pub(crate) fn create_workspace(dir: &Path, name: &str) -> Result<()> {
    let config_path = dir.join(CONFIG_FILE);
    if config_path.exists() {
        bail!("{} already exists", config_path.display());
    }

    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let template = AuditConfig::template(name);
    fs::write(&config_path, &template).context("writing audit.toml")?;

    let config: AuditConfig = toml::from_str(&template).context("parsing generated audit.toml")?;
    let state_dir = config.state_dir(dir);
    fs::create_dir_all(&state_dir)
        .with_context(|| format!("creating {}", state_dir.display()))?;

    // Session data names real clients; keep it out of version control.
    let gitignore = dir.join(".gitignore");
    if !gitignore.exists() {
        fs::write(&gitignore, format!("{}/\n", config.workspace.state_dir))
            .context("writing .gitignore")?;
    }
    log::debug!("initialized workspace at {}", dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_creates_workspace() {
        let dir = tempfile::tempdir().unwrap();
        create_workspace(dir.path(), "cabinet").unwrap();

        assert!(dir.path().join("audit.toml").is_file());
        assert!(dir.path().join(".audit").is_dir());
        let ignore = fs::read_to_string(dir.path().join(".gitignore")).unwrap();
        assert_eq!(ignore, ".audit/\n");

        let (config, _) = AuditConfig::find_and_load(dir.path()).unwrap().unwrap();
        assert_eq!(config.workspace.name, "cabinet");
    }

    #[test]
    fn init_refuses_existing_workspace() {
        let dir = tempfile::tempdir().unwrap();
        create_workspace(dir.path(), "first").unwrap();
        let err = create_workspace(dir.path(), "second").unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn init_keeps_existing_gitignore() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".gitignore"), "target/\n").unwrap();
        create_workspace(dir.path(), "kept").unwrap();
        let ignore = fs::read_to_string(dir.path().join(".gitignore")).unwrap();
        assert_eq!(ignore, "target/\n");
    }
}
