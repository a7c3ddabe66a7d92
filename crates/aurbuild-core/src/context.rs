//! Immutable per-run state.
//!
//! A [`RunContext`] is built once at startup from the validated package
//! list and the command-line settings, then borrowed by every component.
//! It also owns the on-disk layout:
//!
//! ```text
//! <build_root>/
//! ├── index.html
//! ├── icon.png
//! └── <arch>/
//!     ├── <repo>.db.tar.gz      # repository database
//!     ├── <repo>.files.tar.gz   # file list database
//!     └── *.pkg.tar.zst         # built packages
//! <clone_dir>/<package>/        # AUR clones
//! ```

use std::path::PathBuf;
use std::time::Duration;

use aurbuild_schema::{AUR_BASE_URL, Arch, PackageName};

use crate::config::RepositoryConfig;

/// How long the batched AUR lookup may take.
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings that come from the command line rather than the package list.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Root of the published tree.
    pub build_root: PathBuf,
    /// Repository architecture.
    pub arch: Arch,
    /// Cache of AUR clones.
    pub clone_dir: PathBuf,
    /// AUR base URL (RPC endpoint and git remotes).
    pub aur_url: String,
    /// Landing page template.
    pub index_template: PathBuf,
    /// Landing page icon.
    pub icon: PathBuf,
    /// Timeout for the upstream version lookup.
    pub upstream_timeout: Duration,
    /// Decide only; never fetch, build, or write.
    pub dry_run: bool,
    /// Restrict this run to a single declared package.
    pub filter: Option<PackageName>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            build_root: PathBuf::from("build"),
            arch: Arch::default(),
            clone_dir: PathBuf::from("aur"),
            aur_url: AUR_BASE_URL.to_string(),
            index_template: PathBuf::from("src/index.html"),
            icon: PathBuf::from("src/icon.png"),
            upstream_timeout: UPSTREAM_TIMEOUT,
            dry_run: false,
            filter: None,
        }
    }
}

/// Everything a run needs to know, fixed for the lifetime of the run.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Validated package list.
    pub config: RepositoryConfig,
    /// Command-line settings.
    pub settings: RunSettings,
}

impl RunContext {
    /// Bundle a loaded config with the run settings.
    pub fn new(config: RepositoryConfig, settings: RunSettings) -> Self {
        Self { config, settings }
    }

    /// Repository name from the package list.
    pub fn repo_name(&self) -> &str {
        &self.config.meta.repo_name
    }

    /// Directory holding packages and databases: `<build_root>/<arch>`.
    pub fn repo_dir(&self) -> PathBuf {
        self.settings.build_root.join(self.settings.arch.as_str())
    }

    /// Database file name as passed to `repo-add`: `<repo>.db.tar.gz`.
    pub fn db_file_name(&self) -> String {
        format!("{}.db.tar.gz", self.repo_name())
    }

    /// Full path of the repository database.
    pub fn db_path(&self) -> PathBuf {
        self.repo_dir().join(self.db_file_name())
    }

    /// Lock file `repo-add` holds while it rewrites the database.
    pub fn db_lock_path(&self) -> PathBuf {
        self.repo_dir().join(format!("{}.lck", self.db_file_name()))
    }

    /// Clone directory for one package.
    pub fn clone_path(&self, name: &PackageName) -> PathBuf {
        self.settings.clone_dir.join(name)
    }

    /// Git remote of a package on the AUR.
    pub fn clone_url(&self, name: &PackageName) -> String {
        format!("{}/{name}.git", self.settings.aur_url.trim_end_matches('/'))
    }

    /// Web page of a package on the AUR.
    pub fn package_url(&self, name: &str) -> String {
        format!(
            "{}/packages/{name}",
            self.settings.aur_url.trim_end_matches('/')
        )
    }

    /// Generated landing page.
    pub fn index_html_path(&self) -> PathBuf {
        self.settings.build_root.join("index.html")
    }

    /// Published icon.
    pub fn icon_path(&self) -> PathBuf {
        self.settings.build_root.join("icon.png")
    }

    /// Packages this run processes, in declaration order.
    pub fn selected_packages(&self) -> impl Iterator<Item = &aurbuild_schema::PackageSpec> {
        let filter = self.settings.filter.as_ref();
        self.config
            .packages
            .iter()
            .filter(move |spec| filter.is_none_or(|f| *f == spec.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aurbuild_schema::{PackageSpec, RepoMeta};

    fn ctx(filter: Option<&str>) -> RunContext {
        let config = RepositoryConfig {
            meta: RepoMeta {
                repo_name: "myrepo".to_string(),
                repo_url: "https://example.com/repo".to_string(),
                project_url: "https://example.com".to_string(),
            },
            packages: vec![PackageSpec::new("foo"), PackageSpec::new("bar")],
        };
        let settings = RunSettings {
            filter: filter.map(PackageName::from),
            aur_url: "https://aur.example.org/".to_string(),
            ..RunSettings::default()
        };
        RunContext::new(config, settings)
    }

    #[test]
    fn test_layout() {
        let ctx = ctx(None);
        assert_eq!(ctx.repo_dir(), PathBuf::from("build/x86_64"));
        assert_eq!(ctx.db_path(), PathBuf::from("build/x86_64/myrepo.db.tar.gz"));
        assert_eq!(
            ctx.db_lock_path(),
            PathBuf::from("build/x86_64/myrepo.db.tar.gz.lck")
        );
        assert_eq!(ctx.clone_path(&"foo".into()), PathBuf::from("aur/foo"));
        assert_eq!(ctx.index_html_path(), PathBuf::from("build/index.html"));
    }

    #[test]
    fn test_urls_trim_trailing_slash() {
        let ctx = ctx(None);
        assert_eq!(
            ctx.clone_url(&"foo".into()),
            "https://aur.example.org/foo.git"
        );
        assert_eq!(ctx.package_url("foo"), "https://aur.example.org/packages/foo");
    }

    #[test]
    fn test_filter_selects_one_package() {
        let all: Vec<_> = ctx(None).selected_packages().map(|s| s.name.to_string()).collect();
        assert_eq!(all, ["foo", "bar"]);

        let ctx = ctx(Some("bar"));
        let one: Vec<_> = ctx.selected_packages().map(|s| s.name.to_string()).collect();
        assert_eq!(one, ["bar"]);
    }
}
