//! Staleness decisions.
//!
//! Rules are evaluated in a fixed order. A version mismatch or the force
//! flag always wins over the artifact-file check, which only guards
//! against a database that claims a version whose package file is gone.

use std::path::Path;

use aurbuild_schema::{PackageFormat, PackageName, PackageSpec, PkgVersion};

/// What to do with a declared package this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildDecision {
    Skip,
    Build,
}

/// Why a [`BuildDecision`] was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionReason {
    /// Upstream version unknown; keep what the repository has.
    KeepExisting,
    /// Upstream version unknown and nothing indexed; try anyway.
    UnknownUpstream,
    /// Never built or indexed.
    NotInRepository,
    /// Indexed version differs from upstream.
    VersionMismatch,
    /// Force flag set in the package list.
    Forced,
    /// Indexed, but the package file is missing from the repository.
    ArtifactMissing,
    /// Indexed version is current and its package file exists.
    UpToDate,
}

impl DecisionReason {
    pub fn decision(self) -> BuildDecision {
        match self {
            Self::KeepExisting | Self::UpToDate => BuildDecision::Skip,
            Self::UnknownUpstream
            | Self::NotInRepository
            | Self::VersionMismatch
            | Self::Forced
            | Self::ArtifactMissing => BuildDecision::Build,
        }
    }

    /// One-line explanation for the run log.
    pub fn describe(self) -> &'static str {
        match self {
            Self::KeepExisting => "Could not get version from AUR. Keeping repo version.",
            Self::UnknownUpstream => "Package not found in AUR, trying anyway.",
            Self::NotInRepository => "Package not in repo, building.",
            Self::VersionMismatch => "Version mismatch, updating.",
            Self::Forced => "Force flag set, rebuilding.",
            Self::ArtifactMissing => "Package file missing, rebuilding.",
            Self::UpToDate => "Up-to-date, skipping.",
        }
    }
}

/// Upstream and indexed versions of one package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionInfo {
    /// `None` when the package is unknown upstream or the lookup failed.
    pub upstream: Option<PkgVersion>,
    /// `None` when the package was never indexed.
    pub local: Option<PkgVersion>,
}

/// Result of the decision table for one package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub action: BuildDecision,
    pub reason: DecisionReason,
}

impl From<DecisionReason> for Decision {
    fn from(reason: DecisionReason) -> Self {
        Self {
            action: reason.decision(),
            reason,
        }
    }
}

/// Decide whether `spec` needs a build.
///
/// `artifact_present` reports whether a package file for the indexed
/// version exists in the repository directory; it is only consulted when
/// every other rule says the package is current.
pub fn decide(spec: &PackageSpec, info: &VersionInfo, artifact_present: bool) -> Decision {
    let reason = match (&info.upstream, &info.local) {
        (None, Some(_)) => DecisionReason::KeepExisting,
        (None, None) => DecisionReason::UnknownUpstream,
        (Some(_), None) => DecisionReason::NotInRepository,
        (Some(upstream), Some(local)) if upstream != local => DecisionReason::VersionMismatch,
        _ if spec.force => DecisionReason::Forced,
        _ if !artifact_present => DecisionReason::ArtifactMissing,
        _ => DecisionReason::UpToDate,
    };
    reason.into()
}

/// Whether `<repo_dir>/<name>-<version>-*.pkg.tar.*` matches any file.
pub fn artifact_present(repo_dir: &Path, name: &PackageName, version: &PkgVersion) -> bool {
    !artifact_files(repo_dir, name, version).is_empty()
}

/// Package files for `name` at `version` already in `repo_dir`, as bare
/// file names in sorted order. Signatures and other sidecar files are
/// left out.
pub fn artifact_files(repo_dir: &Path, name: &PackageName, version: &PkgVersion) -> Vec<String> {
    let Some(dir) = repo_dir.to_str() else {
        return Vec::new();
    };
    let pattern = format!(
        "{}/{}-{}-*.pkg.tar.*",
        glob::Pattern::escape(dir),
        glob::Pattern::escape(name),
        glob::Pattern::escape(&version.to_string())
    );
    let paths = match glob::glob(&pattern) {
        Ok(paths) => paths,
        Err(e) => {
            tracing::warn!("Invalid artifact pattern {pattern}: {e}");
            return Vec::new();
        }
    };
    paths
        .filter_map(Result::ok)
        .filter(|p| p.is_file())
        .filter_map(|p| p.file_name()?.to_str().map(str::to_string))
        .filter(|file| PackageFormat::from_file_name(file).is_some())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Option<PkgVersion> {
        Some(PkgVersion::parse(s).unwrap())
    }

    fn info(upstream: Option<PkgVersion>, local: Option<PkgVersion>) -> VersionInfo {
        VersionInfo { upstream, local }
    }

    #[test]
    fn test_unknown_upstream_keeps_existing() {
        let d = decide(&PackageSpec::new("foo"), &info(None, v("1.0-1")), true);
        assert_eq!(d.action, BuildDecision::Skip);
        assert_eq!(d.reason, DecisionReason::KeepExisting);

        // Force does not override an unknown upstream version.
        let d = decide(&PackageSpec::forced("foo"), &info(None, v("1.0-1")), false);
        assert_eq!(d.reason, DecisionReason::KeepExisting);
    }

    #[test]
    fn test_unknown_upstream_without_local_builds() {
        let d = decide(&PackageSpec::new("foo"), &info(None, None), false);
        assert_eq!(d.action, BuildDecision::Build);
        assert_eq!(d.reason, DecisionReason::UnknownUpstream);
    }

    #[test]
    fn test_new_package_builds() {
        for force in [false, true] {
            let spec = PackageSpec {
                name: "foo".into(),
                force,
            };
            let d = decide(&spec, &info(v("1.0-1"), None), false);
            assert_eq!(d.reason, DecisionReason::NotInRepository);
            assert_eq!(d.action, BuildDecision::Build);
        }
    }

    #[test]
    fn test_mismatch_beats_force_and_artifact() {
        let d = decide(&PackageSpec::forced("bar"), &info(v("2.0-1"), v("1.0-1")), true);
        assert_eq!(d.reason, DecisionReason::VersionMismatch);
        assert_eq!(d.action, BuildDecision::Build);
    }

    #[test]
    fn test_force_rebuilds_current_version() {
        let d = decide(&PackageSpec::forced("foo"), &info(v("1.0-1"), v("1.0-1")), true);
        assert_eq!(d.reason, DecisionReason::Forced);
        assert_eq!(d.action, BuildDecision::Build);
    }

    #[test]
    fn test_missing_artifact_rebuilds() {
        let d = decide(&PackageSpec::new("foo"), &info(v("1.0-1"), v("1.0-1")), false);
        assert_eq!(d.reason, DecisionReason::ArtifactMissing);
        assert_eq!(d.action, BuildDecision::Build);
    }

    #[test]
    fn test_current_version_skips() {
        let d = decide(&PackageSpec::new("foo"), &info(v("1.0-1"), v("1.0-1")), true);
        assert_eq!(d.reason, DecisionReason::UpToDate);
        assert_eq!(d.action, BuildDecision::Skip);
    }

    #[test]
    fn test_artifact_present_glob() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("foo-1.0-1-x86_64.pkg.tar.zst"), b"").unwrap();
        std::fs::write(dir.path().join("foo-bar-1.0-1-any.pkg.tar.zst"), b"").unwrap();

        let name = PackageName::new("foo");
        assert!(artifact_present(dir.path(), &name, &PkgVersion::parse("1.0-1").unwrap()));
        assert!(!artifact_present(dir.path(), &name, &PkgVersion::parse("1.0-2").unwrap()));
        assert!(!artifact_present(
            dir.path(),
            &PackageName::new("bar"),
            &PkgVersion::parse("1.0-1").unwrap()
        ));
    }

    #[test]
    fn test_artifact_files_skip_signatures() {
        let dir = tempfile::tempdir().unwrap();
        for file in [
            "foo-1.0-1-x86_64.pkg.tar.zst",
            "foo-1.0-1-x86_64.pkg.tar.zst.sig",
            "foo-1.0-1-any.pkg.tar.xz",
        ] {
            std::fs::write(dir.path().join(file), b"").unwrap();
        }

        let files = artifact_files(
            dir.path(),
            &PackageName::new("foo"),
            &PkgVersion::parse("1.0-1").unwrap(),
        );
        assert_eq!(
            files,
            vec!["foo-1.0-1-any.pkg.tar.xz", "foo-1.0-1-x86_64.pkg.tar.zst"]
        );
    }

    #[test]
    fn test_artifact_present_missing_dir() {
        let name = PackageName::new("foo");
        assert!(!artifact_present(
            Path::new("/nonexistent/repo"),
            &name,
            &PkgVersion::parse("1.0-1").unwrap()
        ));
    }
}
