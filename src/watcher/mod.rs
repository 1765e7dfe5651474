//! Save watching for the host working tree.

pub mod file_watcher;

pub use file_watcher::FileWatcher;
