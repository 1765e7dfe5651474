//! Host repository discovery and the paths derived from it.

use std::path::{Component, Path, PathBuf};

use crate::config::Config;
use crate::error::Error;
use crate::git::Git;

/// Directory inside the shadow area holding the active store.
const CURRENT_DIR: &str = "current";

/// Resolve the root of the git repository enclosing `path`.
///
/// `path` may name a file or a directory; a file that does not exist yet
/// is resolved through its parent.
pub fn locate_root(path: &Path) -> Result<PathBuf, Error> {
    let dir = if path.is_dir() {
        path
    } else {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    };
    if !dir.is_dir() {
        return Err(Error::NotARepository(path.to_path_buf()));
    }

    match Git::host(dir).run(["rev-parse", "--show-toplevel"]) {
        Ok(top) if !top.is_empty() => Ok(PathBuf::from(top)),
        Ok(_) | Err(Error::SubprocessFailure { .. }) => {
            Err(Error::NotARepository(path.to_path_buf()))
        }
        Err(e) => Err(e),
    }
}

fn locate_git_dir(path: &Path) -> Result<(PathBuf, PathBuf), Error> {
    let root = locate_root(path)?;
    let git_dir = Git::host(&root).run(["rev-parse", "--absolute-git-dir"])?;
    Ok((root, PathBuf::from(git_dir)))
}

/// Everything an operation needs to know about one host repository.
///
/// Built once per invocation and passed explicitly; nothing reads the
/// process working directory after this point.
#[derive(Debug, Clone)]
pub struct RepoContext {
    root: PathBuf,
    git_dir: PathBuf,
    hooks_dir: PathBuf,
    config: Config,
}

impl RepoContext {
    /// Discover the host repository enclosing `path` and load its config.
    pub fn discover(path: &Path) -> Result<Self, Error> {
        let (root, git_dir) = locate_git_dir(path)?;
        let config = Config::load(&git_dir)?;
        Self::with_config(root, git_dir, config)
    }

    /// Discover with an explicit config instead of loading one.
    pub fn discover_with(path: &Path, config: Config) -> Result<Self, Error> {
        let (root, git_dir) = locate_git_dir(path)?;
        Self::with_config(root, git_dir, config)
    }

    fn with_config(root: PathBuf, git_dir: PathBuf, config: Config) -> Result<Self, Error> {
        // Honours core.hooksPath; relative output is relative to the root.
        let hooks = PathBuf::from(Git::host(&root).run(["rev-parse", "--git-path", "hooks"])?);
        let hooks_dir = if hooks.is_absolute() {
            hooks
        } else {
            root.join(hooks)
        };
        Ok(Self {
            root,
            git_dir,
            hooks_dir,
            config,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    pub fn hooks_dir(&self) -> &Path {
        &self.hooks_dir
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The shadow area, e.g. `<root>/.shadow`.
    pub fn shadow_dir(&self) -> PathBuf {
        self.root.join(&self.config.shadow.dir)
    }

    /// Working tree of the active store.
    pub fn current_dir(&self) -> PathBuf {
        self.shadow_dir().join(CURRENT_DIR)
    }

    /// Version history of the active store.
    pub fn current_git_dir(&self) -> PathBuf {
        self.current_dir().join(".git")
    }

    /// Archive slot holding the previous store's history.
    pub fn archive_dir(&self) -> PathBuf {
        self.shadow_dir().join(&self.config.shadow.archive)
    }

    /// Archive slot path relative to the host root, as git sees it.
    pub fn archive_pathspec(&self) -> String {
        format!("{}/{}", self.config.shadow.dir, self.config.shadow.archive)
    }

    /// Transient directory inside the shadow area. Dot-prefixed so the
    /// host exclude block covers it.
    pub fn staging_dir(&self, name: &str) -> PathBuf {
        self.shadow_dir().join(format!(".{}", name))
    }

    pub fn host(&self) -> Git {
        Git::host(&self.root)
    }

    pub fn store(&self) -> Git {
        Git::store(self.current_dir())
    }

    /// Map a path to its location relative to the host root.
    ///
    /// Relative inputs are taken relative to the root. Fails for paths
    /// outside the root and for paths inside git metadata or the shadow
    /// area.
    pub fn relative_path(&self, path: &Path) -> Result<PathBuf, Error> {
        let absolute = if path.is_absolute() {
            normalize(path)
        } else {
            normalize(&self.root.join(path))
        };
        let resolved = resolve_existing_parent(&absolute);

        let rel = resolved
            .strip_prefix(&self.root)
            .map_err(|_| Error::OutsideRepository {
                path: path.to_path_buf(),
                root: self.root.clone(),
            })?
            .to_path_buf();

        let reserved = rel.as_os_str().is_empty()
            || resolved.starts_with(&self.git_dir)
            || resolved.starts_with(self.shadow_dir())
            || rel.components().any(|c| c.as_os_str() == ".git");
        if reserved {
            return Err(Error::ReservedPath(path.to_path_buf()));
        }
        Ok(rel)
    }
}

/// Lexically collapse `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Canonicalize the parent directory when it exists, so symlinked
/// prefixes (e.g. a temp dir) compare equal to git's reported root.
fn resolve_existing_parent(path: &Path) -> PathBuf {
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => match parent.canonicalize() {
            Ok(parent) => parent.join(name),
            Err(_) => path.to_path_buf(),
        },
        _ => path.to_path_buf(),
    }
}
