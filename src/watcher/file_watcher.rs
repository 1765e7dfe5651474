//! File watcher for saves in a host working tree.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, Debouncer};
use tracing::{debug, info, warn};

use crate::Error;

/// Watches a directory tree and yields debounced batches of changed paths.
pub struct FileWatcher {
    debouncer: Debouncer<RecommendedWatcher>,
    rx: mpsc::Receiver<DebounceEventResult>,
    root: PathBuf,
}

impl FileWatcher {
    /// Create a watcher for `root`; nothing is watched until [`start`](Self::start).
    pub fn new(root: &Path, debounce: Duration) -> Result<Self, Error> {
        let (tx, rx) = mpsc::channel();
        let debouncer = new_debouncer(debounce, tx)?;

        Ok(Self {
            debouncer,
            rx,
            root: root.to_path_buf(),
        })
    }

    /// Start watching recursively.
    pub fn start(&mut self) -> Result<(), Error> {
        self.debouncer
            .watcher()
            .watch(&self.root, RecursiveMode::Recursive)?;
        info!(path = %self.root.display(), "Watching for saves");
        Ok(())
    }

    /// Block until the next batch of changed paths. Returns `None` once
    /// the watcher has shut down.
    pub fn recv(&self) -> Option<Vec<PathBuf>> {
        loop {
            match self.rx.recv().ok()? {
                Ok(events) => {
                    let paths: BTreeSet<PathBuf> = events.into_iter().map(|e| e.path).collect();
                    debug!(count = paths.len(), "File events");
                    return Some(paths.into_iter().collect());
                }
                Err(e) => {
                    warn!(error = %e, "Watch error");
                }
            }
        }
    }

    /// Try to receive a batch without blocking.
    #[cfg(test)]
    fn try_recv(&self) -> Option<Vec<PathBuf>> {
        match self.rx.try_recv().ok()? {
            Ok(events) => Some(events.into_iter().map(|e| e.path).collect()),
            Err(e) => {
                warn!(error = %e, "Watch error");
                None
            }
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
