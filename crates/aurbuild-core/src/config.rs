//! Package list loading and validation.
//!
//! The package list is YAML (`config.yml`) unless the file name ends in
//! `.toml`. Loading fails before any other I/O happens if the document is
//! missing, malformed, or lacks required repository metadata.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use aurbuild_schema::{PackageList, PackageName, PackageSpec, RepoMeta};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("package file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("meta.{0} is required")]
    MissingField(&'static str),

    #[error("package #{0} has an empty name")]
    EmptyPackageName(usize),

    #[error("package name '{0}' is not a valid directory name")]
    InvalidPackageName(PackageName),

    #[error("package '{0}' is declared more than once")]
    DuplicatePackage(PackageName),
}

/// A validated package list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    pub meta: RepoMeta,
    /// Declared packages in declaration order. Names are unique.
    pub packages: Vec<PackageSpec>,
}

impl RepositoryConfig {
    /// Load and validate a package list from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is missing or unreadable, cannot
    /// be parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        if path.extension().is_some_and(|ext| ext == "toml") {
            Self::from_toml_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    /// Parse and validate a YAML package list.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let list: PackageList = serde_yaml::from_str(content)?;
        Self::validate(list)
    }

    /// Parse and validate a TOML package list.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let list: PackageList = toml::from_str(content)?;
        Self::validate(list)
    }

    /// Check required metadata and package name rules.
    pub fn validate(list: PackageList) -> Result<Self, ConfigError> {
        let PackageList { meta, packages } = list;

        let required = [
            ("repo-name", &meta.repo_name),
            ("repo-url", &meta.repo_url),
            ("project-url", &meta.project_url),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField(field));
            }
        }

        // Names become clone directories, so they must stay inside the cache.
        let mut seen = HashSet::new();
        let mut specs = Vec::with_capacity(packages.aur.len());
        for (i, spec) in packages.aur.into_iter().enumerate() {
            let name = PackageName::new(spec.name.as_str());
            if name.is_empty() {
                return Err(ConfigError::EmptyPackageName(i + 1));
            }
            if name.contains('/') || name == "." || name == ".." {
                return Err(ConfigError::InvalidPackageName(name));
            }
            if !seen.insert(name.clone()) {
                return Err(ConfigError::DuplicatePackage(name));
            }
            specs.push(PackageSpec {
                name,
                force: spec.force,
            });
        }

        let meta = RepoMeta {
            repo_name: meta.repo_name.trim().to_string(),
            repo_url: meta.repo_url.trim().to_string(),
            project_url: meta.project_url.trim().to_string(),
        };

        Ok(Self {
            meta,
            packages: specs,
        })
    }

    /// Names of every declared package, in declaration order.
    pub fn package_names(&self) -> Vec<PackageName> {
        self.packages.iter().map(|p| p.name.clone()).collect()
    }
}
