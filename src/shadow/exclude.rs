//! Host exclusion of transient shadow state.
//!
//! The active store and staging directories live inside the host working
//! tree; a managed block in `<git dir>/info/exclude` keeps them out of the
//! user's `git add -A`. The archive slot is deliberately not excluded.

use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::block;
use crate::error::Error;
use crate::repo::RepoContext;

fn exclude_path(ctx: &RepoContext) -> PathBuf {
    ctx.git_dir().join("info").join("exclude")
}

/// Exclude patterns for this repository's shadow area.
fn entries(ctx: &RepoContext) -> String {
    let dir = ctx.config().shadow.dir.trim_matches('/');
    format!("/{dir}/current/\n/{dir}/.*")
}

/// Add or refresh the exclude block.
pub fn update_exclude(ctx: &RepoContext) -> Result<(), Error> {
    let path = exclude_path(ctx);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let existing = if path.exists() {
        Some(fs::read_to_string(&path)?)
    } else {
        None
    };
    let content = block::upsert(existing.as_deref(), "", &entries(ctx));
    if existing.as_deref() != Some(content.as_str()) {
        fs::write(&path, content)?;
        info!(path = %path.display(), "Updated exclude block");
    }
    Ok(())
}

/// Remove the exclude block. Returns whether one was present.
pub fn remove_exclude(ctx: &RepoContext) -> Result<bool, Error> {
    let path = exclude_path(ctx);
    if !path.exists() {
        return Ok(false);
    }

    let content = fs::read_to_string(&path)?;
    let Some(stripped) = block::strip(&content) else {
        return Ok(false);
    };
    if stripped.owned && block::is_vacant(&stripped.content) {
        fs::remove_file(&path)?;
    } else {
        fs::write(&path, stripped.content)?;
    }
    info!(path = %path.display(), "Removed exclude block");
    Ok(true)
}
