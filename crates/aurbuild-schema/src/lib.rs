//! Shared types for `aurbuild`.
//!
//! These are plain values with no I/O: the package list document, the
//! typed package version, target architectures, and the artifacts that
//! flow from the build executor into the repository database updater.

pub mod arch;
pub mod types;
pub mod version;

// Re-exports
pub use arch::*;
pub use types::*;
pub use version::{PkgVersion, VersionError};

/// Base URL of the Arch User Repository.
pub const AUR_BASE_URL: &str = "https://aur.archlinux.org";

/// Name of the build recipe every AUR clone must contain.
pub const BUILD_RECIPE: &str = "PKGBUILD";
