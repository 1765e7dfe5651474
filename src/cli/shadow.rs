//! Shadow a single file.

use std::path::Path;

use crate::cli::absolute;
use crate::error::Error;
use crate::repo::RepoContext;
use crate::shadow::{self, ShadowOutcome};

/// Run the shadow command.
pub fn run(target: &Path, source: Option<&Path>) -> Result<(), Error> {
    let target = absolute(target)?;
    let source = match source {
        Some(source) => absolute(source)?,
        None => target.clone(),
    };

    let ctx = RepoContext::discover(&target)?;
    match shadow::shadow_file(&ctx, &target, &source)? {
        ShadowOutcome::Recorded { path, commit } => {
            println!("{} {}", &commit[..commit.len().min(12)], path.display());
        }
        ShadowOutcome::Unchanged { path } => {
            println!("unchanged {}", path.display());
        }
    }
    Ok(())
}
