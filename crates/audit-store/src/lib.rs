//! Filesystem implementations of the audit engine's persistence seams.
//!
//! Layout under a state directory:
//! ```text
//! <state_dir>/
//!   suspended/
//!     <control-type>/
//!       <dossier-key>.das   Session snapshot
//!   history.jsonl           One completion record per line
//! ```

pub mod history;
pub mod suspension;

pub use history::JsonlHistoryStore;
pub use suspension::DirSuspensionStore;

use std::path::Path;

use audit_engine::StoreError;

pub(crate) fn io_error(path: &Path, what: &str, err: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        detail: format!("{what}: {err}"),
    }
}
