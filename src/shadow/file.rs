//! Recording a single file save into the active store.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info};

use crate::error::Error;
use crate::repo::RepoContext;
use crate::shadow::lifecycle::is_active;

/// Result of shadowing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShadowOutcome {
    /// Content matched what the store already had; no commit made.
    Unchanged { path: PathBuf },
    /// A new shadow commit was made.
    Recorded { path: PathBuf, commit: String },
}

/// Record the bytes of `source` as the new content of `target`.
///
/// `target` is mapped to its path relative to the host root and mirrored
/// into the active store, recreating parent directories as needed. A commit
/// is made only if git sees a difference from the store's last recorded
/// content for that path.
pub fn shadow_file(ctx: &RepoContext, target: &Path, source: &Path) -> Result<ShadowOutcome, Error> {
    if !is_active(ctx) {
        return Err(Error::MissingShadowArea(ctx.current_dir()));
    }
    let rel = ctx.relative_path(target)?;
    let dest = ctx.current_dir().join(&rel);

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(source, &dest)?;

    let store = ctx.store();
    let rel_arg = rel.as_os_str();
    store.run([OsStr::new("add"), OsStr::new("--force"), OsStr::new("--"), rel_arg])?;

    match store.exit_code([
        OsStr::new("diff"),
        OsStr::new("--cached"),
        OsStr::new("--quiet"),
        OsStr::new("--"),
        rel_arg,
    ])? {
        0 => {
            debug!(path = %rel.display(), "Content unchanged");
            return Ok(ShadowOutcome::Unchanged { path: rel });
        }
        1 => {}
        code => {
            return Err(Error::SubprocessFailure {
                command: format!("git diff --cached --quiet -- {}", rel.display()),
                code: Some(code),
                stderr: String::new(),
            });
        }
    }

    let message = format!("shadow: {}\n\nsaved {}", rel.display(), Utc::now().to_rfc3339());
    store.run([
        OsStr::new("commit"),
        OsStr::new("--quiet"),
        OsStr::new("--no-verify"),
        OsStr::new("-m"),
        OsStr::new(&message),
        OsStr::new("--"),
        rel_arg,
    ])?;
    let commit = store.run(["rev-parse", "HEAD"])?;

    info!(path = %rel.display(), commit = %commit, "Recorded shadow commit");
    Ok(ShadowOutcome::Recorded { path: rel, commit })
}
