//! Show shadowing state for a repository.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Error;
use crate::hooks::{self, HOOK_EVENTS};
use crate::repo::RepoContext;
use crate::shadow;

/// Snapshot of a repository's shadowing state.
#[derive(Debug, Clone, Serialize)]
pub struct Status {
    pub root: PathBuf,
    pub active: bool,
    /// Commits in the active store; `None` when inactive.
    pub commits: Option<usize>,
    pub archived: bool,
    pub hooks: Vec<HookStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HookStatus {
    pub event: &'static str,
    pub installed: bool,
}

/// Collect the status of a repository.
pub fn collect(ctx: &RepoContext) -> Result<Status, Error> {
    let active = shadow::is_active(ctx);
    let commits = if active {
        Some(ctx.store().commit_count()?)
    } else {
        None
    };

    Ok(Status {
        root: ctx.root().to_path_buf(),
        active,
        commits,
        archived: ctx.archive_dir().is_dir(),
        hooks: HOOK_EVENTS
            .into_iter()
            .map(|event| HookStatus {
                event,
                installed: hooks::hook_installed(ctx, event),
            })
            .collect(),
    })
}

/// Run the status command.
pub fn run(path: &Path, json: bool) -> Result<(), Error> {
    let ctx = RepoContext::discover(path)?;
    let status = collect(&ctx)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("Repository: {}", status.root.display());
    match status.commits {
        Some(n) => println!("Shadowing:  active ({} commits since last host commit)", n),
        None => println!("Shadowing:  inactive"),
    }
    println!(
        "Archive:    {}",
        if status.archived { "present" } else { "none" }
    );
    for hook in &status.hooks {
        let mark = if hook.installed { "installed" } else { "missing" };
        println!("Hook {:<13} {}", hook.event, mark);
    }
    Ok(())
}
