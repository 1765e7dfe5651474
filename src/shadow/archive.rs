//! Reading back a shadow history archived inside a host commit.

use std::ffi::OsStr;
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Error;
use crate::repo::RepoContext;

/// Directories a git dir needs that git never tracks, since they can be
/// empty.
const SKELETON_DIRS: &[&str] = &["objects", "refs/heads", "refs/tags"];

/// Write the archive slot of host commit `commit` out to `dest` as a git
/// dir usable with `git --git-dir <dest>`. Returns the number of files
/// written.
pub fn unpack(ctx: &RepoContext, commit: &str, dest: &Path) -> Result<usize, Error> {
    let pathspec = ctx.archive_pathspec();
    let host = ctx.host();
    let listing = host.output(["ls-tree", "-r", "-z", "--full-tree", commit, "--", pathspec.as_str()])?;

    let prefix = PathBuf::from(&pathspec);
    let mut written = 0usize;
    for entry in listing.split(|b| *b == 0).filter(|e| !e.is_empty()) {
        let (oid, path) = parse_tree_entry(entry)?;
        let Ok(rel) = path.strip_prefix(&prefix) else {
            continue;
        };
        let target = dest.join(rel);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, host.output(["cat-file", "blob", oid])?)?;
        written += 1;
    }

    if written == 0 {
        return Err(Error::MissingShadowArea(PathBuf::from(format!(
            "{}:{}",
            commit, pathspec
        ))));
    }
    for dir in SKELETON_DIRS {
        fs::create_dir_all(dest.join(dir))?;
    }

    info!(commit, dest = %dest.display(), files = written, "Unpacked archived shadow history");
    Ok(written)
}

/// Split one `ls-tree -z` record: `<mode> <type> <oid>\t<path>`.
fn parse_tree_entry(entry: &[u8]) -> Result<(&str, &Path), Error> {
    let malformed = || Error::other(format!("malformed ls-tree entry: {}", String::from_utf8_lossy(entry)));

    let tab = entry.iter().position(|b| *b == b'\t').ok_or_else(malformed)?;
    let meta = std::str::from_utf8(&entry[..tab]).map_err(|_| malformed())?;
    let oid = meta.split(' ').nth(2).ok_or_else(malformed)?;
    let path = Path::new(OsStr::from_bytes(&entry[tab + 1..]));
    Ok((oid, path))
}
