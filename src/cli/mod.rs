//! CLI commands for git-shadow.

pub mod config;
pub mod lifecycle;
pub mod passthrough;
pub mod shadow;
pub mod status;
pub mod unpack;
pub mod watch;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::error::Error;

/// git-shadow - record every save between your commits
#[derive(Parser)]
#[command(name = "git-shadow")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start shadowing a repository (resets any existing shadow area)
    Activate {
        /// Path inside the repository
        path: Option<PathBuf>,

        /// Don't install git hooks
        #[arg(long)]
        no_hooks: bool,
    },

    /// Stop shadowing and delete all shadow history
    Deactivate {
        /// Path inside the repository
        path: Option<PathBuf>,
    },

    /// Record a file's current content in the shadow repository
    Shadow {
        /// File whose path is mirrored in the shadow repository
        target: PathBuf,

        /// File to read content from (defaults to target)
        source: Option<PathBuf>,
    },

    /// Shadow every save in the working tree until interrupted
    Watch {
        /// Path inside the repository
        path: Option<PathBuf>,
    },

    /// Show shadowing state
    Status {
        /// Path inside the repository
        path: Option<PathBuf>,

        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract the shadow history archived in a host commit
    Unpack {
        /// Host commit carrying the archive
        commit: String,

        /// Directory to write the git dir to
        dest: PathBuf,

        /// Path inside the repository
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Show effective configuration
    Config {
        /// Path inside the repository
        path: Option<PathBuf>,

        /// Write it to the repository's shadow.toml
        #[arg(long)]
        write: bool,
    },

    /// Install git-shadow hooks
    AddHooks {
        /// Path inside the repository
        path: Option<PathBuf>,
    },

    /// Remove git-shadow hooks
    RemoveHooks {
        /// Path inside the repository
        path: Option<PathBuf>,
    },

    /// Hook: archive shadow history into the commit being made
    #[command(hide = true)]
    PreCommit { path: Option<PathBuf> },

    /// Hook: make sure a shadow repository exists after a commit
    #[command(hide = true)]
    PostCommit { path: Option<PathBuf> },

    /// Hook: make sure a shadow repository exists around a checkout
    #[command(hide = true)]
    PreCheckout { path: Option<PathBuf> },

    /// Any other command runs git inside the shadow repository
    #[command(external_subcommand)]
    External(Vec<String>),
}

/// Directory argument, defaulting to the working directory.
pub fn dir_arg(path: Option<PathBuf>) -> PathBuf {
    path.unwrap_or_else(|| PathBuf::from("."))
}

/// Resolve a user-supplied path against the working directory.
pub fn absolute(path: &Path) -> Result<PathBuf, Error> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
