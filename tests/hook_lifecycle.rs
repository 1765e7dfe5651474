//! Drives the git-shadow binary through real host commits, with the hooks
//! pointing at the binary under test.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const BIN: &str = env!("CARGO_BIN_EXE_git-shadow");

fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(["-c", "user.name=Test", "-c", "user.email=test@example.com"])
        .args(["-c", "commit.gpgsign=false"])
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {} failed:\nstdout: {}\nstderr: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn shadow(dir: &Path, args: &[&str]) -> Output {
    Command::new(BIN)
        .args(args)
        .current_dir(dir)
        .env("RUST_LOG", "git_shadow=debug")
        .output()
        .unwrap()
}

fn shadow_ok(dir: &Path, args: &[&str]) -> String {
    let output = shadow(dir, args);
    assert!(
        output.status.success(),
        "git-shadow {} failed:\nstdout: {}\nstderr: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn status(root: &Path) -> serde_json::Value {
    serde_json::from_str(&shadow_ok(root, &["status", "--json"])).unwrap()
}

/// Host repo with one committed file and hooks calling the test binary.
fn setup() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let root = dir.path().canonicalize().unwrap();
    git(&root, &["init", "--quiet"]);
    fs::write(root.join("a"), "1").unwrap();
    git(&root, &["add", "a"]);
    git(&root, &["commit", "--quiet", "-m", "first"]);

    fs::write(
        root.join(".git/shadow.toml"),
        format!("[hooks]\ncommand = \"'{}'\"\n", BIN),
    )
    .unwrap();
    (dir, root)
}

#[test]
fn host_commit_archives_shadow_history() {
    let (_dir, root) = setup();
    shadow_ok(&root, &["activate"]);
    assert_eq!(status(&root)["commits"], 1);

    for content in ["2", "3", "3"] {
        fs::write(root.join("a"), content).unwrap();
        shadow_ok(&root, &["shadow", "a"]);
    }
    assert_eq!(status(&root)["commits"], 3);

    git(&root, &["commit", "--quiet", "-am", "second"]);

    // The commit carries the archive; a fresh store holds only the seed.
    let tracked = git(&root, &["ls-tree", "-r", "--name-only", "HEAD"]);
    assert!(tracked.lines().any(|l| l == ".shadow/git/HEAD"));
    assert!(!tracked.lines().any(|l| l.starts_with(".shadow/current")));
    let after = status(&root);
    assert_eq!(after["active"], true);
    assert_eq!(after["commits"], 1);
    assert_eq!(after["archived"], true);

    let out = TempDir::new().unwrap();
    let dest = out.path().join("history.git");
    shadow_ok(&root, &["unpack", "HEAD", dest.to_str().unwrap()]);
    let dest_arg = format!("--git-dir={}", dest.display());
    assert_eq!(git(&root, &[dest_arg.as_str(), "rev-list", "--count", "HEAD"]), "3");
    assert_eq!(git(&root, &[dest_arg.as_str(), "show", "HEAD:a"]), "3");
    assert_eq!(git(&root, &[dest_arg.as_str(), "show", "HEAD~1:a"]), "2");

    // Nothing is left uncommitted by the rotation itself.
    assert_eq!(git(&root, &["status", "--porcelain"]), "");
}

#[test]
fn aborted_commit_keeps_shadow_history() {
    let (_dir, root) = setup();
    shadow_ok(&root, &["activate"]);
    for content in ["S1-a", "S1-b"] {
        fs::write(root.join("a"), content).unwrap();
        shadow_ok(&root, &["shadow", "a"]);
    }

    let reject = root.join(".git/hooks/commit-msg");
    fs::write(&reject, "#!/bin/sh\nexit 1\n").unwrap();
    fs::set_permissions(&reject, fs::Permissions::from_mode(0o755)).unwrap();
    let output = Command::new("git")
        .args(["-c", "user.name=Test", "-c", "user.email=test@example.com"])
        .args(["commit", "--quiet", "-am", "rejected"])
        .current_dir(&root)
        .output()
        .unwrap();
    assert!(!output.status.success());
    fs::remove_file(&reject).unwrap();

    fs::write(root.join("a"), "S2-a").unwrap();
    shadow_ok(&root, &["shadow", "a"]);
    git(&root, &["commit", "--quiet", "-am", "second"]);

    let out = TempDir::new().unwrap();
    let dest = out.path().join("history.git");
    shadow_ok(&root, &["unpack", "HEAD", dest.to_str().unwrap()]);
    let dest_arg = format!("--git-dir={}", dest.display());
    assert_eq!(git(&root, &[dest_arg.as_str(), "show", "HEAD:a"]), "S2-a");

    let carried = git(
        &root,
        &[dest_arg.as_str(), "for-each-ref", "--format=%(refname)", "refs/shadow/previous/heads"],
    );
    let tip = format!("{}:a", carried);
    let before = format!("{}~1:a", carried);
    assert_eq!(git(&root, &[dest_arg.as_str(), "show", tip.as_str()]), "S1-b");
    assert_eq!(git(&root, &[dest_arg.as_str(), "show", before.as_str()]), "S1-a");
}

#[test]
fn path_limited_commit_leaves_index_clean() {
    let (_dir, root) = setup();
    shadow_ok(&root, &["activate"]);
    fs::write(root.join("a"), "2").unwrap();
    shadow_ok(&root, &["shadow", "a"]);

    git(&root, &["commit", "--quiet", "-m", "second", "--", "a"]);

    let tracked = git(&root, &["ls-tree", "-r", "--name-only", "HEAD"]);
    assert!(tracked.lines().any(|l| l == ".shadow/git/HEAD"));
    assert_eq!(git(&root, &["status", "--porcelain"]), "");
}

#[test]
fn passthrough_runs_git_in_active_store() {
    let (_dir, root) = setup();
    shadow_ok(&root, &["activate"]);

    let log = shadow_ok(&root, &["log", "--format=%s"]);
    assert_eq!(log, "shadow: seed tracked files");
}

#[test]
fn pre_commit_without_store_aborts_commit() {
    let (_dir, root) = setup();
    shadow_ok(&root, &["activate"]);
    fs::remove_dir_all(root.join(".shadow")).unwrap();
    fs::write(root.join("a"), "2").unwrap();

    let output = Command::new("git")
        .args(["-c", "user.name=Test", "-c", "user.email=test@example.com"])
        .args(["commit", "--quiet", "-am", "second"])
        .current_dir(&root)
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No active shadow repository"));
    assert_eq!(git(&root, &["rev-list", "--count", "HEAD"]), "1");
}

#[test]
fn deactivate_removes_hooks_and_area() {
    let (_dir, root) = setup();
    shadow_ok(&root, &["activate"]);
    shadow_ok(&root, &["deactivate"]);

    let after = status(&root);
    assert_eq!(after["active"], false);
    assert!(!root.join(".shadow").exists());
    assert!(!root.join(".git/hooks/pre-commit").exists());
}

#[test]
fn commands_fail_outside_repository() {
    let dir = TempDir::new().unwrap();
    let output = shadow(dir.path(), &["status"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Not inside a git repository"));
}
