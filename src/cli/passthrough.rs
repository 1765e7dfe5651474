//! Run arbitrary git commands inside the active shadow repository.

use std::path::Path;
use std::process::ExitCode;

use crate::error::Error;
use crate::repo::RepoContext;
use crate::shadow;

/// Forward `args` to git in the active store, returning git's exit code.
pub fn run(path: &Path, args: &[String]) -> Result<ExitCode, Error> {
    let ctx = RepoContext::discover(path)?;
    if !shadow::is_active(&ctx) {
        return Err(Error::MissingShadowArea(ctx.current_dir()));
    }

    let status = ctx.store().passthrough(args)?;
    let code = status.code().unwrap_or(1);
    Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
}
