//! git-shadow library.
//!
//! Keeps a fine-grained shadow history of file saves between git commits,
//! and folds it into each host commit.

pub mod block;
pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod hooks;
pub mod repo;
pub mod shadow;
pub mod watcher;

pub use error::Error;
