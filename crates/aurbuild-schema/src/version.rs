//! Pacman package versions.
//!
//! A full package version is `[epoch:]pkgver-pkgrel`. The release is the
//! field after the last `-`; everything before it is the upstream version
//! (including an optional epoch). A string with no `-` at all is not a
//! package version.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when parsing a [`PkgVersion`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// The input contains no `-` separating version from release.
    #[error("missing release separator in version '{0}'")]
    MissingRelease(String),

    /// One side of the separator is empty (`-1`, `1.0-`).
    #[error("empty component in version '{0}'")]
    EmptyComponent(String),
}

/// A `pkgver-pkgrel` pair as written by `makepkg` and `repo-add`.
///
/// # Example
///
/// ```
/// use aurbuild_schema::PkgVersion;
///
/// let v: PkgVersion = "1:2.4.0-3".parse().unwrap();
/// assert_eq!(v.pkgver(), "1:2.4.0");
/// assert_eq!(v.pkgrel(), "3");
/// assert_eq!(v.epoch(), Some("1"));
/// assert_eq!(v.to_string(), "1:2.4.0-3");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PkgVersion {
    pkgver: String,
    pkgrel: String,
}

impl PkgVersion {
    /// Parse a version string.
    ///
    /// At least one `-` must be present; the input is split on the last one.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::MissingRelease`] when there is no separator
    /// and [`VersionError::EmptyComponent`] when either side is empty.
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        let s = s.trim();
        let Some((pkgver, pkgrel)) = s.rsplit_once('-') else {
            return Err(VersionError::MissingRelease(s.to_string()));
        };
        if pkgver.is_empty() || pkgrel.is_empty() {
            return Err(VersionError::EmptyComponent(s.to_string()));
        }
        Ok(Self {
            pkgver: pkgver.to_string(),
            pkgrel: pkgrel.to_string(),
        })
    }

    /// Upstream version, including the epoch prefix if any.
    pub fn pkgver(&self) -> &str {
        &self.pkgver
    }

    /// Package release number.
    pub fn pkgrel(&self) -> &str {
        &self.pkgrel
    }

    /// Epoch, when the upstream version carries an `N:` prefix.
    pub fn epoch(&self) -> Option<&str> {
        self.pkgver.split_once(':').map(|(epoch, _)| epoch)
    }
}

impl std::fmt::Display for PkgVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.pkgver, self.pkgrel)
    }
}

impl std::str::FromStr for PkgVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PkgVersion {
    type Error = VersionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<PkgVersion> for String {
    fn from(v: PkgVersion) -> Self {
        v.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let v = PkgVersion::parse("1.0-1").unwrap();
        assert_eq!(v.pkgver(), "1.0");
        assert_eq!(v.pkgrel(), "1");
        assert_eq!(v.epoch(), None);
    }

    #[test]
    fn test_parse_splits_on_last_separator() {
        let v = PkgVersion::parse("r123.abc-def-2").unwrap();
        assert_eq!(v.pkgver(), "r123.abc-def");
        assert_eq!(v.pkgrel(), "2");
    }

    #[test]
    fn test_parse_rejects_missing_release() {
        assert_eq!(
            PkgVersion::parse("1.0"),
            Err(VersionError::MissingRelease("1.0".to_string()))
        );
        assert!(PkgVersion::parse("").is_err());
    }

    #[test]
    fn test_parse_rejects_empty_components() {
        assert!(matches!(
            PkgVersion::parse("-1"),
            Err(VersionError::EmptyComponent(_))
        ));
        assert!(matches!(
            PkgVersion::parse("1.0-"),
            Err(VersionError::EmptyComponent(_))
        ));
    }

    #[test]
    fn test_equality_is_component_wise() {
        assert_eq!(
            PkgVersion::parse("2.0-1").unwrap(),
            PkgVersion::parse(" 2.0-1 ").unwrap()
        );
        assert_ne!(
            PkgVersion::parse("2.0-1").unwrap(),
            PkgVersion::parse("2.0-2").unwrap()
        );
    }
}
