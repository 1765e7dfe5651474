//! Watch daemon - shadows every save in a host working tree.

use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::error::Error;
use crate::repo::RepoContext;
use crate::shadow::{self, ShadowOutcome};
use crate::watcher::FileWatcher;

/// Run the watcher until the event channel closes.
pub fn run(path: &Path) -> Result<(), Error> {
    let ctx = RepoContext::discover(path)?;
    if !shadow::is_active(&ctx) {
        return Err(Error::MissingShadowArea(ctx.current_dir()));
    }

    let debounce = Duration::from_millis(ctx.config().watch.debounce_ms);
    let mut watcher = FileWatcher::new(ctx.root(), debounce)?;
    watcher.start()?;
    info!(root = %watcher.root().display(), "Starting git-shadow watcher");

    while let Some(paths) = watcher.recv() {
        if !shadow::is_active(&ctx) {
            warn!("Shadow repository is gone, skipping events");
            continue;
        }
        for path in paths {
            if let Err(e) = process_path(&ctx, &path) {
                error!(path = %path.display(), error = %e, "Failed to shadow file");
            }
        }
    }
    Ok(())
}

/// Shadow one changed path if it is a save worth recording.
fn process_path(ctx: &RepoContext, path: &Path) -> Result<Option<ShadowOutcome>, Error> {
    if !should_shadow(ctx, path)? {
        return Ok(None);
    }
    shadow::shadow_file(ctx, path, path).map(Some)
}

/// Regular files in the host tree that the host does not ignore.
fn should_shadow(ctx: &RepoContext, path: &Path) -> Result<bool, Error> {
    if !path.is_file() {
        return Ok(false);
    }
    let rel = match ctx.relative_path(path) {
        Ok(rel) => rel,
        Err(Error::OutsideRepository { .. } | Error::ReservedPath(_)) => return Ok(false),
        Err(e) => return Err(e),
    };
    let code = ctx.host().exit_code([
        OsStr::new("check-ignore"),
        OsStr::new("-q"),
        OsStr::new("--"),
        rel.as_os_str(),
    ])?;
    Ok(code != 0)
}
