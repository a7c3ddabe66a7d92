//! Package list document, package names, and built artifacts.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::path::PathBuf;

/// Top-level structure of the package list document (`config.yml`).
///
/// ```yaml
/// meta:
///   repo-name: myrepo
///   repo-url: https://example.com/myrepo
///   project-url: https://github.com/me/myrepo
/// packages:
///   aur:
///     - name: yay
///     - name: paru
///       force: true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageList {
    /// Repository metadata.
    #[serde(default)]
    pub meta: RepoMeta,
    /// Declared packages, grouped by source.
    #[serde(default)]
    pub packages: PackageSources,
}

/// Repository metadata from the `meta` table.
///
/// Fields default to empty so that a missing key and an empty value are
/// rejected by the same validation step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RepoMeta {
    /// Repository name; also the database file stem (`<name>.db.tar.gz`).
    #[serde(default)]
    pub repo_name: String,
    /// Public URL the repository is served from.
    #[serde(default)]
    pub repo_url: String,
    /// URL of the project that maintains the package list.
    #[serde(default)]
    pub project_url: String,
}

/// Declared packages per source. Only the AUR is supported.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageSources {
    /// Packages built from AUR recipes, in build order.
    #[serde(default)]
    pub aur: Vec<PackageSpec>,
}

/// One declared package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSpec {
    /// AUR package base name.
    pub name: PackageName,
    /// Rebuild even when the indexed version is current.
    #[serde(default)]
    pub force: bool,
}

impl PackageSpec {
    /// Declare a package without the force flag.
    pub fn new(name: impl Into<PackageName>) -> Self {
        Self {
            name: name.into(),
            force: false,
        }
    }

    /// Declare a package that is always rebuilt.
    pub fn forced(name: impl Into<PackageName>) -> Self {
        Self {
            name: name.into(),
            force: true,
        }
    }
}

/// An AUR package name without surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PackageName(String);

impl PackageName {
    /// Wrap a package name. Surrounding whitespace is dropped.
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_string())
    }

    /// Return the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PackageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Deref for PackageName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<std::path::Path> for PackageName {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}

impl Borrow<str> for PackageName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for PackageName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for PackageName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl From<&str> for PackageName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PackageName {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl From<PackageName> for String {
    fn from(name: PackageName) -> Self {
        name.0
    }
}

/// Compression format of a built package archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackageFormat {
    /// Zstandard-compressed package (`.pkg.tar.zst`), the `makepkg` default.
    #[serde(rename = "pkg.tar.zst")]
    Zst,
    /// XZ-compressed package (`.pkg.tar.xz`), still produced by older setups.
    #[serde(rename = "pkg.tar.xz")]
    Xz,
}

impl PackageFormat {
    /// Every format the build executor harvests.
    pub const ALL: [Self; 2] = [Self::Zst, Self::Xz];

    /// File name suffix, including the leading dot.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Zst => ".pkg.tar.zst",
            Self::Xz => ".pkg.tar.xz",
        }
    }

    /// Detect the format from a file name.
    ///
    /// # Example
    ///
    /// ```
    /// use aurbuild_schema::PackageFormat;
    ///
    /// assert_eq!(
    ///     PackageFormat::from_file_name("yay-12.3.5-1-x86_64.pkg.tar.zst"),
    ///     Some(PackageFormat::Zst)
    /// );
    /// assert_eq!(PackageFormat::from_file_name("yay-12.3.5-1-x86_64.pkg.tar.zst.sig"), None);
    /// ```
    pub fn from_file_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| name.ends_with(f.suffix()))
    }
}

/// A package archive produced by a build and copied into the output tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltArtifact {
    /// Package base the archive was built from.
    pub package: PackageName,
    /// Bare file name (`yay-12.3.5-1-x86_64.pkg.tar.zst`).
    pub file_name: String,
    /// Absolute path inside the repository directory.
    pub path: PathBuf,
}
