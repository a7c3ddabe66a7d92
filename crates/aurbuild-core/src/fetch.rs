//! AUR source fetching.

use std::path::PathBuf;

use aurbuild_schema::{BUILD_RECIPE, PackageName};
use thiserror::Error;

use crate::context::RunContext;
use crate::reporter::Reporter;
use crate::toolchain::{ToolError, Toolchain};

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("git clone failed: {0}")]
    Clone(#[source] ToolError),

    #[error("git pull failed: {0}")]
    Update(#[source] ToolError),

    #[error("no PKGBUILD found for {0}")]
    MissingRecipe(PackageName),
}

/// Clone `name` from the AUR, or fast-forward the cached clone.
///
/// Returns the clone directory.
///
/// # Errors
///
/// Returns [`FetchError`] if git fails or the clone has no `PKGBUILD`
/// (the AUR answers clones of unknown packages with an empty repository).
pub fn fetch_source(
    toolchain: &dyn Toolchain,
    ctx: &RunContext,
    name: &PackageName,
    reporter: &dyn Reporter,
) -> Result<PathBuf, FetchError> {
    let dir = ctx.clone_path(name);

    if dir.exists() {
        reporter.detail("Updating cache");
        toolchain.update_source(&dir).map_err(FetchError::Update)?;
    } else {
        reporter.detail("Cloning from AUR");
        toolchain
            .clone_source(&ctx.clone_url(name), &dir)
            .map_err(FetchError::Clone)?;
    }

    if !dir.join(BUILD_RECIPE).is_file() {
        return Err(FetchError::MissingRecipe(name.clone()));
    }
    Ok(dir)
}
