//! Thin wrapper over the `git` executable.
//!
//! Every call is synchronous and its exit status is authoritative: a
//! non-zero exit becomes `Error::SubprocessFailure`.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use tracing::debug;

use crate::error::Error;

/// Variables git exports to hooks that pin a repository location.
const LOCATION_ENV: &[&str] = &[
    "GIT_DIR",
    "GIT_WORK_TREE",
    "GIT_INDEX_FILE",
    "GIT_PREFIX",
    "GIT_OBJECT_DIRECTORY",
    "GIT_ALTERNATE_OBJECT_DIRECTORIES",
    "GIT_COMMON_DIR",
    "GIT_NAMESPACE",
];

/// A git invocation target.
#[derive(Debug, Clone)]
pub struct Git {
    cwd: PathBuf,
    git_dir: Option<PathBuf>,
    isolated: bool,
}

impl Git {
    /// Run against the host repository, inheriting hook environment.
    pub fn host(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            git_dir: None,
            isolated: false,
        }
    }

    /// Run against the repository found from `cwd` on disk, ignoring any
    /// repository or index pinned by the environment.
    pub fn isolated(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            git_dir: None,
            isolated: true,
        }
    }

    /// Run inside a shadow store's working tree.
    pub fn store(work_tree: impl Into<PathBuf>) -> Self {
        Self::isolated(work_tree)
    }

    /// Run against a bare git dir (an archived store).
    pub fn bare(git_dir: impl Into<PathBuf>) -> Self {
        let git_dir = git_dir.into();
        Self {
            cwd: git_dir.clone(),
            git_dir: Some(git_dir),
            isolated: true,
        }
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    fn command<I, S>(&self, args: I) -> (Command, String)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new("git");
        if self.isolated {
            for var in LOCATION_ENV {
                cmd.env_remove(var);
            }
        }
        cmd.arg("-C").arg(&self.cwd);
        if let Some(git_dir) = &self.git_dir {
            cmd.arg("--git-dir").arg(git_dir);
        }

        let mut rendered = String::from("git");
        for arg in args {
            rendered.push(' ');
            rendered.push_str(&arg.as_ref().to_string_lossy());
            cmd.arg(arg);
        }
        debug!(cwd = %self.cwd.display(), command = %rendered, "Running git");
        (cmd, rendered)
    }

    /// Run and return raw stdout, failing on non-zero exit.
    pub fn output<I, S>(&self, args: I) -> Result<Vec<u8>, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let (mut cmd, rendered) = self.command(args);
        let output = cmd.stdin(Stdio::null()).output()?;

        if !output.status.success() {
            return Err(Error::SubprocessFailure {
                command: rendered,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }

    /// Run and return trimmed stdout as text.
    pub fn run<I, S>(&self, args: I) -> Result<String, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let stdout = self.output(args)?;
        Ok(String::from_utf8_lossy(&stdout).trim().to_string())
    }

    /// Run and return the exit code, failing only if git could not be
    /// spawned or was killed. Used for `--quiet` style predicates.
    pub fn exit_code<I, S>(&self, args: I) -> Result<i32, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let (mut cmd, rendered) = self.command(args);
        let output = cmd.stdin(Stdio::null()).output()?;
        output.status.code().ok_or_else(|| Error::SubprocessFailure {
            command: rendered,
            code: None,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    /// Run with inherited stdio, returning git's exit status as-is.
    pub fn passthrough<I, S>(&self, args: I) -> Result<ExitStatus, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let (mut cmd, _) = self.command(args);
        Ok(cmd.status()?)
    }

    /// Number of commits reachable from HEAD; zero for an unborn HEAD.
    pub fn commit_count(&self) -> Result<usize, Error> {
        if self.exit_code(["rev-parse", "--verify", "--quiet", "HEAD"])? != 0 {
            return Ok(0);
        }
        let count = self.run(["rev-list", "--count", "HEAD"])?;
        count
            .parse()
            .map_err(|_| Error::other(format!("unexpected rev-list output: {}", count)))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn test_run_returns_trimmed_stdout() {
        let (_dir, root) = init_repo();
        let top = Git::host(&root).run(["rev-parse", "--show-toplevel"]).unwrap();
        assert_eq!(PathBuf::from(top), root);
    }

    #[test]
    fn test_failure_carries_command_and_stderr() {
        let (_dir, root) = init_repo();
        let err = Git::host(&root).run(["rev-parse", "--verify", "nope"]).unwrap_err();
        match err {
            Error::SubprocessFailure { command, code, .. } => {
                assert_eq!(command, "git rev-parse --verify nope");
                assert_ne!(code, Some(0));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_commit_count_unborn_and_after_commit() {
        let (_dir, root) = init_repo();
        let git = Git::host(&root);
        assert_eq!(git.commit_count().unwrap(), 0);

        commit_file(&root, "a", "1");
        commit_file(&root, "b", "2");
        assert_eq!(git.commit_count().unwrap(), 2);
    }
}
