//! Git hook installation and removal.
//!
//! Each hook gets one marker-delimited block invoking `<command> <event>`.
//! Anything else in the hook script belongs to the user and is left alone.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use tracing::info;

use crate::block;
use crate::error::Error;
use crate::repo::RepoContext;

/// Host lifecycle events git-shadow hooks into.
pub const HOOK_EVENTS: [&str; 3] = ["pre-commit", "post-commit", "pre-checkout"];

/// Interpreter line for hook files git-shadow creates.
const SHEBANG: &str = "#!/bin/sh\n";

/// What happened to one hook file during removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// No block was present.
    Untouched,
    /// Block stripped, user content kept.
    Stripped,
    /// The file was git-shadow's alone and has been deleted.
    Deleted,
}

/// Hook line for an event.
fn invocation(command: &str, event: &str) -> String {
    format!("{} {}", command, event)
}

/// Check if the managed block is present in a hook.
pub fn hook_installed(ctx: &RepoContext, event: &str) -> bool {
    fs::read_to_string(ctx.hooks_dir().join(event))
        .map(|content| block::contains(&content))
        .unwrap_or(false)
}

/// Install git-shadow into every hook in [`HOOK_EVENTS`].
pub fn install_hooks(ctx: &RepoContext) -> Result<(), Error> {
    let hooks_dir = ctx.hooks_dir();
    fs::create_dir_all(hooks_dir)?;

    for event in HOOK_EVENTS {
        let line = invocation(&ctx.config().hooks.command, event);
        install_hook(&hooks_dir.join(event), &line)?;
        info!(hook = event, "Installed hook");
    }
    Ok(())
}

/// Install a single hook, preserving existing content.
fn install_hook(path: &Path, line: &str) -> Result<(), Error> {
    let existing = if path.exists() {
        Some(fs::read_to_string(path)?)
    } else {
        None
    };
    let content = block::upsert(existing.as_deref(), SHEBANG, line);
    if existing.as_deref() != Some(content.as_str()) {
        fs::write(path, &content)?;
    }

    // Make executable
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o755);
    fs::set_permissions(path, perms)?;

    Ok(())
}

/// Remove git-shadow from every hook in [`HOOK_EVENTS`].
pub fn uninstall_hooks(ctx: &RepoContext) -> Result<Vec<(&'static str, Removal)>, Error> {
    let mut results = Vec::with_capacity(HOOK_EVENTS.len());
    for event in HOOK_EVENTS {
        let removal = uninstall_hook(&ctx.hooks_dir().join(event))?;
        if removal != Removal::Untouched {
            info!(hook = event, ?removal, "Removed hook");
        }
        results.push((event, removal));
    }
    Ok(results)
}

fn uninstall_hook(path: &Path) -> Result<Removal, Error> {
    if !path.exists() {
        return Ok(Removal::Untouched);
    }

    let content = fs::read_to_string(path)?;
    let Some(stripped) = block::strip(&content) else {
        return Ok(Removal::Untouched);
    };

    if stripped.owned && block::is_vacant(&stripped.content) {
        fs::remove_file(path)?;
        Ok(Removal::Deleted)
    } else {
        fs::write(path, stripped.content)?;
        Ok(Removal::Stripped)
    }
}
