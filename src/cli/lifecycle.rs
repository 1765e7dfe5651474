//! Activation, deactivation and the hook entry points.

use std::path::Path;

use tracing::info;

use crate::error::Error;
use crate::hooks::{self, Removal};
use crate::repo::RepoContext;
use crate::shadow;

/// Run the activate command.
pub fn activate(path: &Path, install_hooks: bool) -> Result<(), Error> {
    let ctx = RepoContext::discover(path)?;
    shadow::activate(&ctx, install_hooks)?;

    println!("Shadowing {}", ctx.root().display());
    if install_hooks {
        println!("Git hooks installed.");
    }
    Ok(())
}

/// Run the deactivate command.
pub fn deactivate(path: &Path) -> Result<(), Error> {
    let ctx = RepoContext::discover(path)?;
    let removals = shadow::deactivate(&ctx)?;

    print_removals(&removals);
    println!("Shadow history removed from {}", ctx.root().display());
    Ok(())
}

/// Pre-commit hook: fold the active store into the commit.
pub fn pre_commit(path: &Path) -> Result<(), Error> {
    let ctx = RepoContext::discover(path)?;
    shadow::rotate_on_commit(&ctx)
}

/// Post-commit hook: ensure a store is active and the real index holds the
/// archive the commit recorded.
pub fn post_commit(path: &Path) -> Result<(), Error> {
    let ctx = RepoContext::discover(path)?;
    let created = shadow::ensure_current(&ctx)?;
    info!(event = "post-commit", created, "Shadow repository ready");
    if shadow::restage_archive(&ctx)? {
        info!(archive = %ctx.archive_dir().display(), "Archive staged in host index");
    }
    Ok(())
}

/// Pre-checkout hook: ensure a store is active.
pub fn ensure_current(path: &Path, event: &str) -> Result<(), Error> {
    let ctx = RepoContext::discover(path)?;
    let created = shadow::ensure_current(&ctx)?;
    info!(event, created, "Shadow repository ready");
    Ok(())
}

/// Run the add-hooks command.
pub fn add_hooks(path: &Path) -> Result<(), Error> {
    let ctx = RepoContext::discover(path)?;
    hooks::install_hooks(&ctx)?;
    println!("Git hooks installed in {}", ctx.hooks_dir().display());
    Ok(())
}

/// Run the remove-hooks command.
pub fn remove_hooks(path: &Path) -> Result<(), Error> {
    let ctx = RepoContext::discover(path)?;
    let removals = hooks::uninstall_hooks(&ctx)?;
    print_removals(&removals);
    Ok(())
}

fn print_removals(removals: &[(&str, Removal)]) {
    for (event, removal) in removals {
        match removal {
            Removal::Deleted => println!("  {}: deleted", event),
            Removal::Stripped => println!("  {}: git-shadow lines removed", event),
            Removal::Untouched => {}
        }
    }
}
