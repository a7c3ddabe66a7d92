//! Package builds.
//!
//! A build runs in the package's clone directory:
//!
//! 1. Read `makedepends` from `makepkg --printsrcinfo`.
//! 2. Install them with a single `pacman -S --needed` call.
//! 3. Run `makepkg` (no prompts, no runtime deps, forced, cleaned up).
//! 4. Move every `*.pkg.tar.zst` / `*.pkg.tar.xz` into the repository
//!    directory so nothing accumulates in the clone.

use std::path::{Path, PathBuf};

use aurbuild_schema::{Arch, BuiltArtifact, PackageFormat, PackageName};
use thiserror::Error;

use crate::context::RunContext;
use crate::reporter::Reporter;
use crate::toolchain::{ToolError, Toolchain};

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("failed to extract makedepends: {0}")]
    Srcinfo(#[source] ToolError),

    #[error("failed to install build dependencies: {0}")]
    Dependencies(#[source] ToolError),

    #[error("makepkg failed: {0}")]
    Makepkg(#[source] ToolError),

    #[error("failed to read build directory {path}: {source}")]
    Scan {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no package files found after build")]
    NoArtifacts,
}

/// Build-time dependencies declared in `.SRCINFO`.
///
/// Picks up `makedepends` and the architecture-specific
/// `makedepends_<arch>` lines, deduplicated in order of appearance.
pub fn parse_makedepends(srcinfo: &str, arch: Arch) -> Vec<String> {
    let arch_key = format!("makedepends_{}", arch.as_str());
    let mut deps: Vec<String> = Vec::new();
    for line in srcinfo.lines() {
        let Some((key, value)) = line.trim().split_once(" = ") else {
            continue;
        };
        if key != "makedepends" && key != arch_key {
            continue;
        }
        let value = value.trim();
        if !value.is_empty() && !deps.iter().any(|d| d == value) {
            deps.push(value.to_string());
        }
    }
    deps
}

/// Package files left in `dir` by `makepkg`, sorted by name.
fn harvest(dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let entries = std::fs::read_dir(dir).map_err(|source| BuildError::Scan {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .and_then(PackageFormat::from_file_name)
                .is_some()
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Install build dependencies, build, and publish the resulting packages.
///
/// Returns the artifacts that made it into the repository directory. A
/// package file that cannot be copied is reported and left out, without
/// failing the other files of the same build.
///
/// # Errors
///
/// Returns [`BuildError`] if dependency extraction or installation fails,
/// `makepkg` fails, or the build produces no package files.
pub fn build_package(
    toolchain: &dyn Toolchain,
    ctx: &RunContext,
    name: &PackageName,
    source_dir: &Path,
    reporter: &dyn Reporter,
) -> Result<Vec<BuiltArtifact>, BuildError> {
    reporter.detail("Checking for build dependencies");
    let srcinfo = toolchain
        .print_srcinfo(source_dir)
        .map_err(BuildError::Srcinfo)?;
    let deps = parse_makedepends(&srcinfo, ctx.settings.arch);
    if deps.is_empty() {
        reporter.detail("No build dependencies found");
    } else {
        reporter.detail(&format!("Installing: {}", deps.join(" ")));
        toolchain
            .install_dependencies(&deps)
            .map_err(BuildError::Dependencies)?;
    }

    reporter.detail("Building...");
    toolchain
        .build_package(source_dir)
        .map_err(BuildError::Makepkg)?;

    let produced = harvest(source_dir)?;
    if produced.is_empty() {
        return Err(BuildError::NoArtifacts);
    }

    let repo_dir = ctx.repo_dir();
    let mut artifacts = Vec::new();
    for src in produced {
        let Some(file_name) = src.file_name().and_then(|n| n.to_str()).map(str::to_string)
        else {
            continue;
        };
        let dest = repo_dir.join(&file_name);

        if let Err(e) = std::fs::copy(&src, &dest) {
            reporter.error(&format!("Failed to copy {file_name}: {e}"));
            continue;
        }
        reporter.success(&format!("Packaged: {file_name}"));

        if let Err(e) = std::fs::remove_file(&src) {
            reporter.warning(&format!("Failed to remove build output {file_name}: {e}"));
        }

        artifacts.push(BuiltArtifact {
            package: name.clone(),
            path: std::path::absolute(&dest).unwrap_or(dest),
            file_name,
        });
    }
    Ok(artifacts)
}
