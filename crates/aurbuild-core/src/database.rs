//! Repository database updates via `repo-add`.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::context::RunContext;
use crate::reporter::Reporter;
use crate::toolchain::{ToolError, Toolchain};

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("failed to update repository database: {0}")]
    Index(#[source] ToolError),
}

/// Add freshly built `files` (bare file names inside the repository
/// directory) to the database in a single `repo-add` call.
///
/// An empty list is a no-op. A leftover lock file from a crashed run is
/// removed first, and the `*.old` backups `repo-add` leaves behind are
/// deleted afterwards.
///
/// # Errors
///
/// Returns [`DatabaseError`] if `repo-add` fails. Package files stay in
/// place; the next run finds them for the same upstream version and
/// indexes them without rebuilding.
pub fn update_database(
    toolchain: &dyn Toolchain,
    ctx: &RunContext,
    files: &[String],
    reporter: &dyn Reporter,
) -> Result<(), DatabaseError> {
    if files.is_empty() {
        reporter.info("Repository update not needed");
        return Ok(());
    }

    reporter.info(&format!(
        "Updating repository database with {} new packages...",
        files.len()
    ));

    let lock = ctx.db_lock_path();
    if lock.exists() {
        reporter.warning(&format!("Removing stale lock file: {}", lock.display()));
        if let Err(e) = std::fs::remove_file(&lock) {
            tracing::warn!("Failed to remove {}: {e}", lock.display());
        }
    }

    let repo_dir = ctx.repo_dir();
    toolchain
        .index_database(&repo_dir, &ctx.db_file_name(), files)
        .map_err(DatabaseError::Index)?;

    for backup in remove_backups(&repo_dir) {
        tracing::debug!("Removed {}", backup.display());
    }

    reporter.success("Repository database updated");
    Ok(())
}

/// Delete every `*.old` file under `dir`, returning the removed paths.
fn remove_backups(dir: &Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "old"))
        .filter_map(|e| match std::fs::remove_file(e.path()) {
            Ok(()) => Some(e.into_path()),
            Err(err) => {
                tracing::warn!("Failed to remove {}: {err}", e.path().display());
                None
            }
        })
        .collect()
}
