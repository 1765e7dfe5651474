//! Extract an archived shadow history.

use std::path::Path;

use crate::cli::absolute;
use crate::error::Error;
use crate::repo::RepoContext;
use crate::shadow;

/// Run the unpack command.
pub fn run(path: &Path, commit: &str, dest: &Path) -> Result<(), Error> {
    let ctx = RepoContext::discover(path)?;
    let dest = absolute(dest)?;
    if dest.exists() && dest.read_dir()?.next().is_some() {
        return Err(Error::AlreadyExists(dest));
    }

    let files = shadow::unpack(&ctx, commit, &dest)?;
    println!("Unpacked {} files to {}", files, dest.display());
    println!("Browse with: git --git-dir {} log", dest.display());
    Ok(())
}
