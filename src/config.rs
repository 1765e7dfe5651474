//! Configuration for git-shadow.
//!
//! Looked up per repository in `<git dir>/shadow.toml`, then in the user
//! config dir (`~/.config/git-shadow/config.toml` on Linux), then defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Error;

/// Repository-level config file name, relative to the host git dir.
const REPO_CONFIG_FILE: &str = "shadow.toml";

/// Effective git-shadow configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub shadow: ShadowConfig,

    #[serde(default)]
    pub hooks: HooksConfig,

    #[serde(default)]
    pub commit: CommitConfig,

    #[serde(default)]
    pub watch: WatchConfig,
}

/// Shadow area layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShadowConfig {
    /// Shadow area directory, relative to the host root.
    #[serde(default = "default_dir")]
    pub dir: String,

    /// Name of the archive slot inside the shadow area.
    #[serde(default = "default_archive")]
    pub archive: String,

    /// Seed every new store with the host's tracked files.
    #[serde(default = "default_true")]
    pub seed_tracked_files: bool,
}

/// Hook script contents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HooksConfig {
    /// Command written into hook scripts, followed by the event name.
    #[serde(default = "default_command")]
    pub command: String,
}

/// Identity used for shadow commits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommitConfig {
    #[serde(default = "default_author_name")]
    pub author_name: String,

    #[serde(default = "default_author_email")]
    pub author_email: String,
}

/// Save watcher settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_dir() -> String {
    ".shadow".to_string()
}

fn default_archive() -> String {
    "git".to_string()
}

fn default_command() -> String {
    "git shadow".to_string()
}

fn default_author_name() -> String {
    "git-shadow".to_string()
}

fn default_author_email() -> String {
    "git-shadow@localhost".to_string()
}

fn default_debounce_ms() -> u64 {
    500
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            archive: default_archive(),
            seed_tracked_files: true,
        }
    }
}

impl Default for HooksConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
        }
    }
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            author_name: default_author_name(),
            author_email: default_author_email(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Config {
    /// Path to the repository-level config file.
    pub fn repo_path(git_dir: &Path) -> PathBuf {
        git_dir.join(REPO_CONFIG_FILE)
    }

    /// Path to the user-level config file, if a config dir is known.
    pub fn user_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("git-shadow").join("config.toml"))
    }

    /// Load the effective config for a host repository.
    pub fn load(git_dir: &Path) -> Result<Self, Error> {
        let candidates = std::iter::once(Self::repo_path(git_dir)).chain(Self::user_path());
        for path in candidates {
            if path.exists() {
                debug!(path = %path.display(), "Loading config");
                return Self::load_file(&path);
            }
        }
        Ok(Self::default())
    }

    /// Parse a single config file.
    pub fn load_file(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Write this config as the repository-level config file.
    pub fn save(&self, git_dir: &Path) -> Result<PathBuf, Error> {
        let path = Self::repo_path(git_dir);
        std::fs::write(&path, self.to_toml()?)?;
        Ok(path)
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, Error> {
        toml::to_string_pretty(self).map_err(|e| Error::ConfigParse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.shadow.dir, ".shadow");
        assert_eq!(config.shadow.archive, "git");
        assert!(config.shadow.seed_tracked_files);
        assert_eq!(config.hooks.command, "git shadow");
        assert_eq!(config.watch.debounce_ms, 500);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shadow.toml");
        std::fs::write(&path, "[hooks]\ncommand = \"/opt/bin/git-shadow\"\n").unwrap();

        let config = Config::load_file(&path).unwrap();
        assert_eq!(config.hooks.command, "/opt/bin/git-shadow");
        assert_eq!(config.shadow.dir, ".shadow");
        assert_eq!(config.commit.author_name, "git-shadow");
    }

    #[test]
    fn test_repo_file_takes_precedence() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            Config::repo_path(dir.path()),
            "[shadow]\nseed_tracked_files = false\n",
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert!(!config.shadow.seed_tracked_files);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.watch.debounce_ms = 125;
        config.save(dir.path()).unwrap();

        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(Config::repo_path(dir.path()), "[shadow\n").unwrap();

        let err = Config::load(dir.path()).unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }
}
