//! The incremental build run.
//!
//! A run is strictly sequential:
//!
//! 1. Preflight the toolchain and create the output and clone directories.
//! 2. Look up every selected package upstream in one batch. A failed
//!    lookup makes every upstream version unknown instead of aborting.
//! 3. For each package in declaration order: read the indexed version,
//!    decide, and if needed fetch and build. Package files for the new
//!    version left by a failed database update are indexed as they are. Per-package failures are
//!    recorded and the loop moves on.
//! 4. Index everything built in one `repo-add` call.
//! 5. Drop clones of packages no longer declared.
//! 6. Regenerate the landing page.
//!
//! Only a missing tool or an unusable workspace is fatal, and both are
//! detected before anything is written.

use std::path::{Path, PathBuf};

use aurbuild_schema::{PackageName, PackageSpec, PkgVersion};
use thiserror::Error;

use crate::build::{BuildError, build_package};
use crate::cache::reconcile_cache;
use crate::config::{ConfigError, RepositoryConfig};
use crate::context::{RunContext, RunSettings};
use crate::database::update_database;
use crate::decide::{
    BuildDecision, Decision, DecisionReason, VersionInfo, artifact_files, artifact_present, decide,
};
use crate::fetch::{FetchError, fetch_source};
use crate::landing::generate_landing_page;
use crate::repodb;
use crate::reporter::Reporter;
use crate::toolchain::{ToolError, Toolchain};
use crate::upstream::{UpstreamIndex, UpstreamVersions};

/// Errors that stop the run before any package is processed.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("package '{0}' is not declared in the package list")]
    UnknownFilter(PackageName),

    #[error(transparent)]
    MissingTool(#[from] ToolError),

    #[error("failed to create {path}: {source}")]
    Workspace {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Why a single package failed.
#[derive(Error, Debug)]
enum PackageError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("none of the built package files could be published")]
    NothingPublished,
}

/// Load and validate the package list and bundle it with `settings`.
///
/// # Errors
///
/// Returns [`PipelineError::Config`] for an unreadable or invalid package
/// list, and [`PipelineError::UnknownFilter`] when the filter names an
/// undeclared package.
pub fn load_context(config_path: &Path, settings: RunSettings) -> Result<RunContext, PipelineError> {
    let config = RepositoryConfig::load(config_path)?;
    if let Some(filter) = &settings.filter {
        if !config.packages.iter().any(|spec| spec.name == *filter) {
            return Err(PipelineError::UnknownFilter(filter.clone()));
        }
    }
    Ok(RunContext::new(config, settings))
}

/// How a processed package ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageOutcome {
    /// Built; file names published to the repository directory.
    Built { artifacts: Vec<String> },
    Skipped,
    /// Would have been built, but this is a dry run.
    WouldBuild,
    Failed { reason: String },
}

/// Decision and outcome for one package.
#[derive(Debug, Clone)]
pub struct PackageReport {
    pub name: PackageName,
    pub versions: VersionInfo,
    pub decision: Decision,
    pub outcome: PackageOutcome,
}

/// Everything a run did.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub reports: Vec<PackageReport>,
    /// Package files handed to `repo-add`.
    pub indexed: Vec<String>,
    /// The database update failed; `indexed` files are on disk but not in
    /// the database.
    pub database_failed: bool,
}

impl RunSummary {
    fn count(&self, pred: impl Fn(&PackageOutcome) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn built(&self) -> usize {
        self.count(|o| matches!(o, PackageOutcome::Built { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, PackageOutcome::Skipped))
    }

    pub fn would_build(&self) -> usize {
        self.count(|o| matches!(o, PackageOutcome::WouldBuild))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, PackageOutcome::Failed { .. }))
    }

    /// Process exit code: 1 when any package failed.
    pub fn exit_code(&self) -> i32 {
        i32::from(self.failed() > 0)
    }
}

/// One run over the declared packages.
pub struct Pipeline<'a> {
    ctx: &'a RunContext,
    upstream: &'a dyn UpstreamIndex,
    toolchain: &'a dyn Toolchain,
    reporter: &'a dyn Reporter,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        ctx: &'a RunContext,
        upstream: &'a dyn UpstreamIndex,
        toolchain: &'a dyn Toolchain,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            ctx,
            upstream,
            toolchain,
            reporter,
        }
    }

    /// Run every step and report the summary.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if a required tool is missing or the
    /// output directories cannot be created. Package failures are part of
    /// the returned [`RunSummary`] instead.
    pub async fn run(&self) -> Result<RunSummary, PipelineError> {
        let dry_run = self.ctx.settings.dry_run;
        if dry_run {
            self.reporter
                .info("Dry run: nothing will be fetched, built, or written");
        } else {
            self.prepare()?;
        }

        let selected: Vec<&PackageSpec> = self.ctx.selected_packages().collect();
        let upstream = self.resolve_upstream(&selected).await;

        let mut summary = RunSummary::default();
        self.reporter.section("Checking packages");
        for spec in selected {
            let report = self.process(spec, &upstream);
            if let PackageOutcome::Built { artifacts } = &report.outcome {
                summary.indexed.extend(artifacts.iter().cloned());
            }
            summary.reports.push(report);
        }

        if !dry_run {
            self.reporter.section("Updating repository database");
            if let Err(e) =
                update_database(self.toolchain, self.ctx, &summary.indexed, self.reporter)
            {
                self.reporter.error(&e.to_string());
                summary.database_failed = true;
            }

            self.reporter.section("Cleaning up AUR cache");
            reconcile_cache(
                &self.ctx.settings.clone_dir,
                &self.ctx.config.package_names(),
                self.reporter,
            );

            generate_landing_page(self.ctx, self.reporter);
        }

        self.reporter.summary(&summary);
        Ok(summary)
    }

    fn prepare(&self) -> Result<(), PipelineError> {
        self.toolchain.preflight()?;
        for dir in [self.ctx.repo_dir(), self.ctx.settings.clone_dir.clone()] {
            std::fs::create_dir_all(&dir)
                .map_err(|source| PipelineError::Workspace { path: dir, source })?;
        }
        Ok(())
    }

    async fn resolve_upstream(&self, selected: &[&PackageSpec]) -> UpstreamVersions {
        let names: Vec<PackageName> = selected.iter().map(|spec| spec.name.clone()).collect();
        self.reporter
            .info(&format!("Checking AUR versions for {} packages", names.len()));
        match self.upstream.latest_versions(&names).await {
            Ok(versions) => versions,
            Err(e) => {
                tracing::warn!("Upstream lookup failed: {e}");
                self.reporter.warning(&format!(
                    "AUR lookup failed ({e}); treating all upstream versions as unknown"
                ));
                UpstreamVersions::new()
            }
        }
    }

    fn upstream_version(&self, name: &PackageName, versions: &UpstreamVersions) -> Option<PkgVersion> {
        let raw = versions.get(name.as_str())?;
        match PkgVersion::parse(raw) {
            Ok(version) => Some(version),
            Err(e) => {
                self.reporter
                    .warning(&format!("Ignoring AUR version '{raw}': {e}"));
                None
            }
        }
    }

    fn process(&self, spec: &PackageSpec, upstream: &UpstreamVersions) -> PackageReport {
        let name = &spec.name;
        self.reporter.package(name);

        let versions = VersionInfo {
            upstream: self.upstream_version(name, upstream),
            local: repodb::local_version(&self.ctx.db_path(), name),
        };
        self.reporter.detail(&format!(
            "AUR: {} | Repo: {}",
            versions
                .upstream
                .as_ref()
                .map_or_else(|| "unknown".to_string(), ToString::to_string),
            versions
                .local
                .as_ref()
                .map_or_else(|| "none".to_string(), ToString::to_string),
        ));

        let present = versions
            .local
            .as_ref()
            .is_some_and(|local| artifact_present(&self.ctx.repo_dir(), name, local));
        let decision = decide(spec, &versions, present);

        let outcome = match decision.action {
            BuildDecision::Skip => {
                self.reporter.success(decision.reason.describe());
                PackageOutcome::Skipped
            }
            BuildDecision::Build if self.ctx.settings.dry_run => {
                self.reporter.info(decision.reason.describe());
                PackageOutcome::WouldBuild
            }
            BuildDecision::Build => {
                self.reporter.info(decision.reason.describe());
                let unindexed = self.unindexed_artifacts(name, &versions, decision.reason);
                if !unindexed.is_empty() {
                    self.reporter
                        .info("Package file already present, indexing without rebuild");
                    return PackageReport {
                        name: name.clone(),
                        versions,
                        decision,
                        outcome: PackageOutcome::Built {
                            artifacts: unindexed,
                        },
                    };
                }
                match self.fetch_and_build(name) {
                    Ok(artifacts) => PackageOutcome::Built { artifacts },
                    Err(e) => {
                        self.reporter
                            .error(&format!("Build failed for {name}: {e}"));
                        PackageOutcome::Failed {
                            reason: e.to_string(),
                        }
                    }
                }
            }
        };

        PackageReport {
            name: name.clone(),
            versions,
            decision,
            outcome,
        }
    }

    /// Files for the upstream version left behind by a run whose database
    /// update failed. Forced rebuilds never reuse them.
    fn unindexed_artifacts(
        &self,
        name: &PackageName,
        versions: &VersionInfo,
        reason: DecisionReason,
    ) -> Vec<String> {
        if !matches!(
            reason,
            DecisionReason::NotInRepository | DecisionReason::VersionMismatch
        ) {
            return Vec::new();
        }
        versions
            .upstream
            .as_ref()
            .map(|upstream| artifact_files(&self.ctx.repo_dir(), name, upstream))
            .unwrap_or_default()
    }

    fn fetch_and_build(&self, name: &PackageName) -> Result<Vec<String>, PackageError> {
        let dir = fetch_source(self.toolchain, self.ctx, name, self.reporter)?;
        let artifacts = build_package(self.toolchain, self.ctx, name, &dir, self.reporter)?;
        if artifacts.is_empty() {
            return Err(PackageError::NothingPublished);
        }
        Ok(artifacts.into_iter().map(|a| a.file_name).collect())
    }
}
