//! The loaded workspace: configuration, catalog, stores and the session in
//! progress.
//!
//! The CLI is invoked once per operator action, so the session being
//! worked on is kept between invocations in `<state_dir>/current.das`.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use audit_catalog::Catalog;
use audit_engine::{AuditEngine, ControlSession, SessionSnapshot};
use audit_store::{DirSuspensionStore, JsonlHistoryStore};

use crate::config::AuditConfig;

const CURRENT_SESSION: &str = "current.das";

pub type Engine = AuditEngine<Catalog, DirSuspensionStore, JsonlHistoryStore>;

pub struct Workspace {
    pub root: PathBuf,
    pub config: AuditConfig,
    pub state_dir: PathBuf,
}

impl Workspace {
    pub fn new(config: AuditConfig, root: PathBuf) -> Self {
        let state_dir = config.state_dir(&root);
        Self {
            root,
            config,
            state_dir,
        }
    }

    pub fn catalog(&self) -> Result<Catalog> {
        self.config.load_catalog(&self.root)
    }

    pub fn engine(&self) -> Result<Engine> {
        Ok(AuditEngine::new(
            self.catalog()?,
            DirSuspensionStore::new(&self.state_dir),
            JsonlHistoryStore::new(&self.state_dir),
        ))
    }

    pub fn history(&self) -> JsonlHistoryStore {
        JsonlHistoryStore::new(&self.state_dir)
    }

    fn current_path(&self) -> PathBuf {
        self.state_dir.join(CURRENT_SESSION)
    }

    pub fn load_current(&self) -> Result<Option<ControlSession>> {
        let path = self.current_path();
        if !path.is_file() {
            return Ok(None);
        }
        let data = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
        let snapshot = SessionSnapshot::from_bytes(&data)
            .with_context(|| format!("loading session from {}", path.display()))?;
        Ok(Some(snapshot.session))
    }

    /// The session in progress, or an error telling the operator how to
    /// get one.
    pub fn require_current(&self) -> Result<ControlSession> {
        match self.load_current()? {
            Some(session) => Ok(session),
            None => bail!("no session in progress (run `audit start` or `audit resume` first)"),
        }
    }

    /// Refuse to replace a session that is still open.
    pub fn ensure_no_current(&self) -> Result<()> {
        if let Some(session) = self.load_current()? {
            bail!(
                "session {} on dossier {} / {} is still open (run `audit suspend` or `audit complete` first)",
                session.id,
                session.dossier,
                session.control_type
            );
        }
        Ok(())
    }

    pub fn save_current(&self, session: &ControlSession) -> Result<()> {
        std::fs::create_dir_all(&self.state_dir)
            .with_context(|| format!("creating {}", self.state_dir.display()))?;
        let bytes = SessionSnapshot::new(session.clone()).to_bytes()?;
        let path = self.current_path();
        std::fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    pub fn clear_current(&self) -> Result<()> {
        let path = self.current_path();
        if path.is_file() {
            std::fs::remove_file(&path).with_context(|| format!("removing {}", path.display()))?;
        }
        Ok(())
    }
}
