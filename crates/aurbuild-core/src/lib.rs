//! Core library for `aurbuild`.
//!
//! The pipeline reads a package list, asks the AUR for the latest version
//! of every declared package, compares it with what the local pacman
//! repository database already indexes, rebuilds only the stale packages,
//! and re-indexes the repository.
//!
//! External programs (`git`, `makepkg`, `pacman`, `repo-add`) sit behind
//! the [`Toolchain`] trait and the AUR RPC endpoint behind
//! [`UpstreamIndex`], so the whole pipeline can run against fakes.

pub mod build;
pub mod cache;
pub mod config;
pub mod context;
pub mod database;
pub mod decide;
pub mod fetch;
pub mod landing;
pub mod pipeline;
pub mod repodb;
pub mod reporter;
pub mod toolchain;
pub mod upstream;

#[cfg(test)]
mod testing;

pub use config::{ConfigError, RepositoryConfig};
pub use context::{RunContext, RunSettings};
pub use decide::{BuildDecision, Decision, DecisionReason, VersionInfo};
pub use pipeline::{
    PackageOutcome, PackageReport, Pipeline, PipelineError, RunSummary, load_context,
};
pub use reporter::{NullReporter, Reporter};
pub use toolchain::{SystemToolchain, ToolError, Toolchain};
pub use upstream::{AurRpc, UpstreamError, UpstreamIndex};

/// User Agent string for requests to the AUR
pub const USER_AGENT: &str = concat!("aurbuild/", env!("CARGO_PKG_VERSION"));
