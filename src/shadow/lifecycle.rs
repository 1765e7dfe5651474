//! Shadow store lifecycle: creation, rotation at host commits, activation.
//!
//! Layout under the shadow area (`<root>/.shadow` by default):
//!
//! - `current/`  working tree plus `.git` of the active store
//! - `git/`      history of the store retired by the last host commit,
//!   tracked by the host so each host commit carries its own bundle
//! - `.<name>/`  staging directories, only present mid-operation
//!
//! An archive no host commit picked up (the commit was aborted after
//! pre-commit ran) is fetched into the next archived store under
//! `refs/shadow/previous/` rather than dropped.

use std::ffi::OsStr;
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::Error;
use crate::git::Git;
use crate::hooks::{self, Removal};
use crate::repo::RepoContext;
use crate::shadow::exclude;

/// Refspec folding an uncommitted archive into the outgoing store.
const PREVIOUS_REFSPEC: &str = "+refs/*:refs/shadow/previous/*";

/// Attributes that make a store record bytes exactly as saved.
const STORE_ATTRIBUTES: &str = "* -text -filter -ident\n";

/// Whether an active store exists.
pub fn is_active(ctx: &RepoContext) -> bool {
    ctx.current_git_dir().is_dir()
}

/// Create the shadow area with a fresh store as `current`.
///
/// Fails with `AlreadyExists` if the area exists and `force` is false, in
/// which case nothing is touched. With `force` the whole area is deleted
/// first.
pub fn create(ctx: &RepoContext, force: bool) -> Result<(), Error> {
    let area = ctx.shadow_dir();
    if area.exists() {
        if !force {
            return Err(Error::AlreadyExists(area));
        }
        fs::remove_dir_all(&area)?;
        info!(path = %area.display(), "Deleted existing shadow area");
    }

    install_current(ctx)?;
    info!(path = %ctx.current_dir().display(), "Created shadow repository");
    Ok(())
}

/// Make sure a store is active, creating one if needed. Never touches an
/// existing store or the archive slot. Returns whether one was created.
pub fn ensure_current(ctx: &RepoContext) -> Result<bool, Error> {
    if is_active(ctx) {
        info!(path = %ctx.current_dir().display(), "Shadow repository already exists");
        return Ok(false);
    }

    let current = ctx.current_dir();
    if current.exists() {
        // Working tree without history is debris from an interrupted run.
        warn!(path = %current.display(), "Replacing incomplete shadow repository");
        fs::remove_dir_all(&current)?;
    }
    install_current(ctx)?;
    info!(path = %current.display(), "Created shadow repository");
    Ok(true)
}

/// Retire the active store into the archive slot and start a new one.
///
/// Runs from the host's pre-commit hook: the archive is staged into the
/// host index so it lands in the commit being made. The replacement store
/// is fully built before anything is moved, and the moves are undone if
/// any step fails, so on error the previous layout is left in place.
pub fn rotate_on_commit(ctx: &RepoContext) -> Result<(), Error> {
    if !is_active(ctx) {
        return Err(Error::MissingShadowArea(ctx.current_dir()));
    }
    if archive_uncommitted(ctx)? {
        carry_forward_archive(ctx)?;
    }

    let next = ctx.staging_dir("next");
    build_staged_store(ctx, &next)?;

    let pending = ctx.staging_dir("archive");
    let previous = ctx.staging_dir("archive-old");
    let retired = ctx.staging_dir("retired");
    for stale in [&pending, &previous, &retired] {
        remove_if_exists(stale)?;
    }

    let mut journal = Journal::default();
    if let Err(e) = swap_stores(ctx, &mut journal, &next, &pending, &previous, &retired) {
        journal.rollback();
        if let Err(cleanup) = remove_if_exists(&next) {
            warn!(error = %cleanup, "Failed to remove staged shadow repository");
        }
        return Err(e);
    }

    for leftover in [&retired, &previous] {
        if let Err(e) = remove_if_exists(leftover) {
            warn!(path = %leftover.display(), error = %e, "Failed to clean up after rotation");
        }
    }
    info!(archive = %ctx.archive_dir().display(), "Rotated shadow repository");
    Ok(())
}

fn swap_stores(
    ctx: &RepoContext,
    journal: &mut Journal,
    next: &Path,
    pending: &Path,
    previous: &Path,
    retired: &Path,
) -> Result<(), Error> {
    let current = ctx.current_dir();
    let archive = ctx.archive_dir();

    journal.rename(&ctx.current_git_dir(), pending)?;
    if archive.exists() {
        journal.rename(&archive, previous)?;
    }
    journal.rename(pending, &archive)?;
    journal.rename(&current, retired)?;
    journal.rename(next, &current)?;

    // --all records files that vanished from the slot since the last
    // archive; --force overrides any ignore rule covering the area.
    let pathspec = ctx.archive_pathspec();
    ctx.host()
        .run(["add", "--all", "--force", "--", pathspec.as_str()])?;
    Ok(())
}

/// Whether the archive slot differs from what the host's HEAD recorded.
fn archive_uncommitted(ctx: &RepoContext) -> Result<bool, Error> {
    if !ctx.archive_dir().exists() {
        return Ok(false);
    }
    let host = ctx.host();
    if host.exit_code(["rev-parse", "--verify", "--quiet", "HEAD"])? != 0 {
        return Ok(true);
    }

    let pathspec = ctx.archive_pathspec();
    let untracked = host.output(["ls-files", "--others", "-z", "--", pathspec.as_str()])?;
    if !untracked.is_empty() {
        return Ok(true);
    }
    match host.exit_code(["diff", "--quiet", "HEAD", "--", pathspec.as_str()])? {
        0 => Ok(false),
        1 => Ok(true),
        code => Err(Error::SubprocessFailure {
            command: format!("git diff --quiet HEAD -- {}", pathspec),
            code: Some(code),
            stderr: String::new(),
        }),
    }
}

/// Fetch every ref of the archive slot into the active store.
fn carry_forward_archive(ctx: &RepoContext) -> Result<(), Error> {
    let archive = ctx.archive_dir();
    if Git::bare(&archive).run(["for-each-ref", "--count=1"])?.is_empty() {
        return Ok(());
    }
    ctx.store().run([
        OsStr::new("fetch"),
        OsStr::new("--quiet"),
        OsStr::new("--no-tags"),
        archive.as_os_str(),
        OsStr::new(PREVIOUS_REFSPEC),
    ])?;
    warn!(archive = %archive.display(), "Archive was never committed; kept under refs/shadow/previous");
    Ok(())
}

/// Stage the archive slot in the host's own index.
///
/// A commit limited to paths takes its tree from a temporary index, so
/// what pre-commit staged there never reaches the real one. Run after the
/// commit to bring the real index back in line with HEAD. Returns whether
/// there was an archive to stage.
pub fn restage_archive(ctx: &RepoContext) -> Result<bool, Error> {
    if !ctx.archive_dir().exists() {
        return Ok(false);
    }
    let pathspec = ctx.archive_pathspec();
    Git::isolated(ctx.root()).run(["add", "--all", "--force", "--", pathspec.as_str()])?;
    Ok(true)
}

/// Establish shadowing: fresh shadow area, host excludes, and hooks.
pub fn activate(ctx: &RepoContext, install_hooks: bool) -> Result<(), Error> {
    create(ctx, true)?;
    exclude::update_exclude(ctx)?;
    if install_hooks {
        hooks::install_hooks(ctx)?;
    }
    info!(root = %ctx.root().display(), "Activated git-shadow");
    Ok(())
}

/// Tear down shadowing: hooks, excludes, then the whole shadow area.
pub fn deactivate(ctx: &RepoContext) -> Result<Vec<(&'static str, Removal)>, Error> {
    let removals = hooks::uninstall_hooks(ctx)?;
    exclude::remove_exclude(ctx)?;

    let area = ctx.shadow_dir();
    if area.exists() {
        fs::remove_dir_all(&area)?;
        info!(path = %area.display(), "Deleted shadow area");
    }
    Ok(removals)
}

/// Build a store in a staging directory and move it into `current`.
fn install_current(ctx: &RepoContext) -> Result<(), Error> {
    let staging = ctx.staging_dir("next");
    build_staged_store(ctx, &staging)?;
    fs::rename(&staging, ctx.current_dir())?;
    Ok(())
}

/// Build a complete store at `dir`, removing it again on failure.
fn build_staged_store(ctx: &RepoContext, dir: &Path) -> Result<(), Error> {
    remove_if_exists(dir)?;
    if let Err(e) = build_store(ctx, dir) {
        if let Err(cleanup) = remove_if_exists(dir) {
            warn!(path = %dir.display(), error = %cleanup, "Failed to remove partial store");
        }
        return Err(e);
    }
    Ok(())
}

fn build_store(ctx: &RepoContext, dir: &Path) -> Result<(), Error> {
    fs::create_dir_all(dir)?;
    let store = Git::store(dir);
    let commit = &ctx.config().commit;

    store.run(["init", "--quiet"])?;
    store.run(["config", "user.name", commit.author_name.as_str()])?;
    store.run(["config", "user.email", commit.author_email.as_str()])?;
    store.run(["config", "commit.gpgsign", "false"])?;
    store.run(["config", "core.autocrlf", "false"])?;
    let info = dir.join(".git/info");
    fs::create_dir_all(&info)?;
    fs::write(info.join("attributes"), STORE_ATTRIBUTES)?;

    if ctx.config().shadow.seed_tracked_files {
        seed_tracked_files(ctx, &store)?;
    }
    Ok(())
}

/// Copy the host's tracked files into a new store and commit them as its
/// baseline. Nothing is committed if the host tracks no files.
fn seed_tracked_files(ctx: &RepoContext, store: &Git) -> Result<(), Error> {
    let listing = ctx.host().output(["ls-files", "-z"])?;
    let area = Path::new(&ctx.config().shadow.dir);

    let mut seeded = 0usize;
    for entry in listing.split(|b| *b == 0).filter(|e| !e.is_empty()) {
        let rel = Path::new(OsStr::from_bytes(entry));
        if rel.starts_with(area) {
            continue;
        }
        let source = ctx.root().join(rel);
        // Deleted in the working tree, or a submodule.
        if !source.is_file() {
            continue;
        }
        let dest = store.cwd().join(rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&source, &dest)?;
        seeded += 1;
    }

    if seeded == 0 {
        return Ok(());
    }
    store.run(["add", "--all", "--force"])?;
    store.run([
        "commit",
        "--quiet",
        "--no-verify",
        "-m",
        "shadow: seed tracked files",
    ])?;
    info!(files = seeded, "Seeded shadow repository");
    Ok(())
}

fn remove_if_exists(path: &Path) -> Result<(), Error> {
    if path.exists() {
        fs::remove_dir_all(path)?;
    }
    Ok(())
}

/// Renames performed so far, undone in reverse on failure.
#[derive(Debug, Default)]
struct Journal {
    done: Vec<(PathBuf, PathBuf)>,
}

impl Journal {
    fn rename(&mut self, from: &Path, to: &Path) -> Result<(), Error> {
        fs::rename(from, to)?;
        self.done.push((from.to_path_buf(), to.to_path_buf()));
        Ok(())
    }

    fn rollback(self) {
        for (from, to) in self.done.into_iter().rev() {
            if let Err(e) = fs::rename(&to, &from) {
                warn!(from = %to.display(), to = %from.display(), error = %e, "Rollback rename failed");
            }
        }
    }
}
