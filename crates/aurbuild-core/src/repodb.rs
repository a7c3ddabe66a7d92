//! Read-only access to the pacman repository database.
//!
//! `repo-add` keeps one top-level directory per package in the database
//! archive, named `<pkgname>-<pkgver>-<pkgrel>`, each holding a `desc`
//! file. Only those directory names are needed here, so the archive is
//! streamed entry by entry and never extracted.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use aurbuild_schema::{PackageName, PkgVersion};
use flate2::read::GzDecoder;
use thiserror::Error;

/// Magic bytes for gzip compression
const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Magic bytes for ZSTD compression (Little Endian: 0xFD2FB528 -> 28 B5 2F FD)
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

#[derive(Error, Debug)]
pub enum RepoDbError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One package entry of the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedPackage {
    pub name: PackageName,
    pub version: PkgVersion,
}

/// Split a database directory name into package name and version.
///
/// The last two `-`-separated fields are `pkgver` and `pkgrel`; the rest
/// is the package name, which may itself contain `-`.
fn parse_entry_dir(dir: &str) -> Option<IndexedPackage> {
    let mut parts = dir.rsplitn(3, '-');
    let pkgrel = parts.next()?;
    let pkgver = parts.next()?;
    let name = parts.next()?;
    if name.is_empty() {
        return None;
    }
    let version = PkgVersion::parse(&format!("{pkgver}-{pkgrel}")).ok()?;
    Some(IndexedPackage {
        name: PackageName::new(name),
        version,
    })
}

/// Open a database archive, picking the decompressor from its magic bytes.
fn open_archive(path: &Path) -> Result<tar::Archive<Box<dyn Read>>, RepoDbError> {
    let mut reader = BufReader::new(File::open(path)?);
    let (is_gzip, is_zstd) = {
        let magic = reader.fill_buf()?;
        (magic.starts_with(&GZIP_MAGIC), magic.starts_with(&ZSTD_MAGIC))
    };

    let decoded: Box<dyn Read> = if is_gzip {
        Box::new(GzDecoder::new(reader))
    } else if is_zstd {
        Box::new(zstd::stream::read::Decoder::with_buffer(reader)?)
    } else {
        Box::new(reader)
    };
    Ok(tar::Archive::new(decoded))
}

/// Stream the archive and call `visit` for each `<dir>/desc` entry until
/// it returns `Some`.
fn scan<T>(
    path: &Path,
    mut visit: impl FnMut(IndexedPackage) -> Option<T>,
) -> Result<Option<T>, RepoDbError> {
    let mut archive = open_archive(path)?;
    for entry in archive.entries()? {
        let entry = entry?;
        let entry_path = entry.path()?;
        let mut components = entry_path.components();
        let (Some(dir), Some(file), None) =
            (components.next(), components.next(), components.next())
        else {
            continue;
        };
        if file.as_os_str() != "desc" {
            continue;
        }
        let Some(pkg) = dir.as_os_str().to_str().and_then(parse_entry_dir) else {
            continue;
        };
        if let Some(found) = visit(pkg) {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

/// Version of `name` currently indexed in the database at `db_path`.
///
/// Returns `None` when the database does not exist yet, does not list the
/// package, or cannot be read. A repository with no packages has no
/// database file, so absence is never an error.
pub fn local_version(db_path: &Path, name: &PackageName) -> Option<PkgVersion> {
    if !db_path.exists() {
        return None;
    }
    match scan(db_path, |pkg| (pkg.name == *name).then_some(pkg.version)) {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!("Unreadable repository database {}: {e}", db_path.display());
            None
        }
    }
}

/// Every package the database indexes, in archive order.
///
/// # Errors
///
/// Returns an error if the archive exists but cannot be decoded.
pub fn indexed_packages(db_path: &Path) -> Result<Vec<IndexedPackage>, RepoDbError> {
    if !db_path.exists() {
        return Ok(Vec::new());
    }
    let mut packages = Vec::new();
    scan(db_path, |pkg| {
        packages.push(pkg);
        None::<()>
    })?;
    Ok(packages)
}
