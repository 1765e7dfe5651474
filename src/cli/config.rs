//! Show or write the effective configuration.

use std::path::Path;

use crate::error::Error;
use crate::repo::RepoContext;

/// Run the config command.
pub fn run(path: &Path, write: bool) -> Result<(), Error> {
    let ctx = RepoContext::discover(path)?;
    if write {
        let written = ctx.config().save(ctx.git_dir())?;
        println!("Wrote {}", written.display());
    } else {
        print!("{}", ctx.config().to_toml()?);
    }
    Ok(())
}
