//! Test doubles shared by the module tests.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use aurbuild_schema::{BUILD_RECIPE, PackageFormat, PackageName, PackageSpec, RepoMeta};

use crate::config::RepositoryConfig;
use crate::context::{RunContext, RunSettings};
use crate::repodb::indexed_packages;
use crate::repodb::tests::write_gz_db;
use crate::toolchain::{ToolError, Toolchain};
use crate::upstream::{UpstreamError, UpstreamIndex, UpstreamVersions};

/// A context rooted in `root` with `myrepo` metadata.
pub(crate) fn fake_ctx(root: &Path, packages: Vec<PackageSpec>) -> RunContext {
    let config = RepositoryConfig {
        meta: RepoMeta {
            repo_name: "myrepo".to_string(),
            repo_url: "https://example.com/myrepo".to_string(),
            project_url: "https://example.com/project".to_string(),
        },
        packages,
    };
    let settings = RunSettings {
        build_root: root.join("build"),
        clone_dir: root.join("aur"),
        aur_url: "https://aur.example.org".to_string(),
        index_template: root.join("src/index.html"),
        icon: root.join("src/icon.png"),
        ..RunSettings::default()
    };
    RunContext::new(config, settings)
}

fn failure(program: &'static str) -> ToolError {
    ToolError::Failed {
        program,
        code: Some(1),
        output: "simulated failure".to_string(),
    }
}

fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `foo-1.0-1-x86_64.pkg.tar.zst` -> `foo-1.0-1`
fn db_entry(file_name: &str) -> Option<String> {
    let format = PackageFormat::from_file_name(file_name)?;
    let stem = file_name.strip_suffix(format.suffix())?;
    stem.rsplit_once('-').map(|(entry, _arch)| entry.to_string())
}

/// A toolchain that writes files instead of running programs.
///
/// Clones get a `PKGBUILD`, builds leave one
/// `<name>-<version>-x86_64.pkg.tar.zst`, and indexing merges the files
/// into a gzip database the way `repo-add` does.
#[derive(Debug, Default)]
pub(crate) struct FakeToolchain {
    calls: Mutex<Vec<String>>,
    srcinfo: HashMap<String, String>,
    versions: HashMap<String, String>,
    missing_tool: Option<&'static str>,
    fail_clone: HashSet<String>,
    fail_build: HashSet<String>,
    empty_clone: HashSet<String>,
    no_output: HashSet<String>,
    fail_install: bool,
    fail_index: bool,
}

impl FakeToolchain {
    pub(crate) fn with_srcinfo(mut self, name: &str, srcinfo: &str) -> Self {
        self.srcinfo.insert(name.to_string(), srcinfo.to_string());
        self
    }

    pub(crate) fn with_version(mut self, name: &str, version: &str) -> Self {
        self.versions.insert(name.to_string(), version.to_string());
        self
    }

    pub(crate) fn missing(mut self, tool: &'static str) -> Self {
        self.missing_tool = Some(tool);
        self
    }

    pub(crate) fn failing_clone(mut self, name: &str) -> Self {
        self.fail_clone.insert(name.to_string());
        self
    }

    pub(crate) fn failing_build(mut self, name: &str) -> Self {
        self.fail_build.insert(name.to_string());
        self
    }

    pub(crate) fn empty_clone(mut self, name: &str) -> Self {
        self.empty_clone.insert(name.to_string());
        self
    }

    pub(crate) fn without_output(mut self, name: &str) -> Self {
        self.no_output.insert(name.to_string());
        self
    }

    pub(crate) fn failing_install(mut self) -> Self {
        self.fail_install = true;
        self
    }

    pub(crate) fn failing_index(mut self) -> Self {
        self.fail_index = true;
        self
    }

    /// Every call made so far, e.g. `"clone foo"` or `"index a b"`.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Toolchain for FakeToolchain {
    fn preflight(&self) -> Result<(), ToolError> {
        self.record("preflight".to_string());
        match self.missing_tool {
            Some(tool) => Err(ToolError::Missing(tool)),
            None => Ok(()),
        }
    }

    fn clone_source(&self, _url: &str, dest: &Path) -> Result<(), ToolError> {
        let name = dir_name(dest);
        self.record(format!("clone {name}"));
        if self.fail_clone.contains(&name) {
            return Err(failure("git clone"));
        }
        std::fs::create_dir_all(dest).map_err(|source| ToolError::Spawn {
            program: "git clone",
            source,
        })?;
        if !self.empty_clone.contains(&name) {
            std::fs::write(dest.join(BUILD_RECIPE), format!("pkgname={name}\n")).map_err(
                |source| ToolError::Spawn {
                    program: "git clone",
                    source,
                },
            )?;
        }
        Ok(())
    }

    fn update_source(&self, dir: &Path) -> Result<(), ToolError> {
        self.record(format!("pull {}", dir_name(dir)));
        Ok(())
    }

    fn print_srcinfo(&self, dir: &Path) -> Result<String, ToolError> {
        Ok(self.srcinfo.get(&dir_name(dir)).cloned().unwrap_or_default())
    }

    fn install_dependencies(&self, packages: &[String]) -> Result<(), ToolError> {
        self.record(format!("install {}", packages.join(" ")));
        if self.fail_install {
            return Err(failure("pacman"));
        }
        Ok(())
    }

    fn build_package(&self, dir: &Path) -> Result<(), ToolError> {
        let name = dir_name(dir);
        self.record(format!("build {name}"));
        if self.fail_build.contains(&name) {
            return Err(failure("makepkg"));
        }
        if self.no_output.contains(&name) {
            return Ok(());
        }
        let version = self.versions.get(&name).map_or("1.0-1", String::as_str);
        std::fs::write(dir.join(format!("{name}-{version}-x86_64.pkg.tar.zst")), b"pkg").map_err(
            |source| ToolError::Spawn {
                program: "makepkg",
                source,
            },
        )
    }

    fn index_database(
        &self,
        repo_dir: &Path,
        db_file: &str,
        packages: &[String],
    ) -> Result<(), ToolError> {
        self.record(format!("index {}", packages.join(" ")));
        if self.fail_index {
            return Err(failure("repo-add"));
        }
        let db = repo_dir.join(db_file);
        let mut index: HashMap<String, String> = indexed_packages(&db)
            .unwrap()
            .into_iter()
            .map(|p| (p.name.to_string(), format!("{}-{}", p.name, p.version)))
            .collect();
        for file in packages {
            assert!(repo_dir.join(file).is_file(), "indexing missing file {file}");
            let entry = db_entry(file).unwrap();
            let name = entry.rsplitn(3, '-').nth(2).unwrap().to_string();
            index.insert(name, entry);
        }
        if db.exists() {
            std::fs::rename(&db, repo_dir.join(format!("{db_file}.old"))).unwrap();
        }
        let mut entries: Vec<&str> = index.values().map(String::as_str).collect();
        entries.sort_unstable();
        write_gz_db(&db, &entries);
        Ok(())
    }
}

/// An upstream index with a fixed answer.
#[derive(Debug, Default)]
pub(crate) struct StaticUpstream {
    versions: Vec<(String, String)>,
    fail: bool,
    lookups: Mutex<Vec<Vec<String>>>,
}

impl StaticUpstream {
    pub(crate) fn new(versions: &[(&str, &str)]) -> Self {
        Self {
            versions: versions
                .iter()
                .map(|(n, v)| ((*n).to_string(), (*v).to_string()))
                .collect(),
            ..Self::default()
        }
    }

    pub(crate) fn unreachable() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Names requested by each lookup.
    pub(crate) fn lookups(&self) -> Vec<Vec<String>> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl UpstreamIndex for StaticUpstream {
    async fn latest_versions(
        &self,
        names: &[PackageName],
    ) -> Result<UpstreamVersions, UpstreamError> {
        self.lookups
            .lock()
            .unwrap()
            .push(names.iter().map(ToString::to_string).collect());
        if self.fail {
            return Err(UpstreamError::Rpc("simulated outage".to_string()));
        }
        Ok(self
            .versions
            .iter()
            .filter(|(n, _)| names.iter().any(|name| name == n.as_str()))
            .map(|(n, v)| (PackageName::new(n), v.clone()))
            .collect())
    }
}

/// A reporter that keeps every line for assertions.
#[derive(Debug, Default)]
pub(crate) struct RecordingReporter {
    lines: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub(crate) fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub(crate) fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.contains(needle))
    }

    fn push(&self, kind: &str, msg: &str) {
        self.lines.lock().unwrap().push(format!("{kind}: {msg}"));
    }
}

impl crate::reporter::Reporter for RecordingReporter {
    fn section(&self, title: &str) {
        self.push("section", title);
    }
    fn package(&self, name: &PackageName) {
        self.push("package", name);
    }
    fn detail(&self, msg: &str) {
        self.push("detail", msg);
    }
    fn info(&self, msg: &str) {
        self.push("info", msg);
    }
    fn success(&self, msg: &str) {
        self.push("success", msg);
    }
    fn warning(&self, msg: &str) {
        self.push("warning", msg);
    }
    fn error(&self, msg: &str) {
        self.push("error", msg);
    }
    fn summary(&self, summary: &crate::pipeline::RunSummary) {
        self.push(
            "summary",
            &format!(
                "built={} skipped={} failed={}",
                summary.built(),
                summary.skipped(),
                summary.failed()
            ),
        );
    }
}

/// Package files currently in `dir`.
pub(crate) fn package_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|e| e.path())
                .filter(|p| {
                    PackageFormat::from_file_name(&p.file_name().unwrap().to_string_lossy())
                        .is_some()
                })
                .collect()
        })
        .unwrap_or_default();
    files.sort();
    files
}
