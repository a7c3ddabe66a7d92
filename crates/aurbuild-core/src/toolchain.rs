//! External programs the pipeline drives.
//!
//! Every capability the run needs from the host system is a method on
//! [`Toolchain`]. [`SystemToolchain`] runs the real Arch Linux tools; tests
//! substitute fakes that write files instead of spawning processes.
//!
//! None of these calls has a timeout. A hung tool hangs the run.

use std::path::Path;
use std::process::{Command, Output, Stdio};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("required tool '{0}' is not installed")]
    Missing(&'static str),

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: &'static str,
        source: std::io::Error,
    },

    #[error("{program} exited with {}{}", exit_label(.code), output_suffix(.output))]
    Failed {
        program: &'static str,
        code: Option<i32>,
        output: String,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "a signal".to_string(), |c| format!("code {c}"))
}

fn output_suffix(output: &str) -> String {
    if output.is_empty() {
        String::new()
    } else {
        format!(": {output}")
    }
}

/// Host capabilities used by the fetch, build, and index steps.
pub trait Toolchain: Send + Sync {
    /// Check that every required program is available before anything is
    /// mutated.
    fn preflight(&self) -> Result<(), ToolError>;

    /// Fresh clone of `url` into `dest`.
    fn clone_source(&self, url: &str, dest: &Path) -> Result<(), ToolError>;

    /// Fast-forward an existing clone.
    fn update_source(&self, dir: &Path) -> Result<(), ToolError>;

    /// `.SRCINFO` text for the recipe in `dir`.
    fn print_srcinfo(&self, dir: &Path) -> Result<String, ToolError>;

    /// Install build-time dependencies in one non-interactive call.
    fn install_dependencies(&self, packages: &[String]) -> Result<(), ToolError>;

    /// Build the recipe in `dir`, leaving package files next to it.
    fn build_package(&self, dir: &Path) -> Result<(), ToolError>;

    /// Add `packages` (file names relative to `repo_dir`) to `db_file`.
    fn index_database(
        &self,
        repo_dir: &Path,
        db_file: &str,
        packages: &[String],
    ) -> Result<(), ToolError>;
}

/// The real thing: `git`, `makepkg`, `pacman`, and `repo-add`.
#[derive(Debug, Clone)]
pub struct SystemToolchain {
    use_sudo: bool,
}

impl Default for SystemToolchain {
    fn default() -> Self {
        Self { use_sudo: true }
    }
}

impl SystemToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `pacman` through `sudo` (the default) or directly, e.g. when the
    /// builder already runs as root inside a container.
    pub fn with_sudo(mut self, use_sudo: bool) -> Self {
        self.use_sudo = use_sudo;
        self
    }

    fn required_tools(&self) -> Vec<&'static str> {
        let mut tools = vec!["git", "makepkg", "pacman", "repo-add"];
        if self.use_sudo {
            tools.push("sudo");
        }
        tools
    }
}

/// Run a command with inherited stdio so build output streams to the log.
fn run_streamed(program: &'static str, cmd: &mut Command) -> Result<(), ToolError> {
    tracing::debug!("Running {cmd:?}");
    let status = cmd
        .status()
        .map_err(|source| ToolError::Spawn { program, source })?;
    if status.success() {
        Ok(())
    } else {
        Err(ToolError::Failed {
            program,
            code: status.code(),
            output: String::new(),
        })
    }
}

/// Run a command and capture its output, returning stdout on success.
fn run_captured(program: &'static str, cmd: &mut Command) -> Result<String, ToolError> {
    tracing::debug!("Running {cmd:?}");
    let Output {
        status,
        stdout,
        stderr,
    } = cmd
        .stdin(Stdio::null())
        .output()
        .map_err(|source| ToolError::Spawn { program, source })?;
    if status.success() {
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    } else {
        let mut output = String::from_utf8_lossy(&stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&stderr);
        if !stderr.trim().is_empty() {
            if !output.is_empty() {
                output.push('\n');
            }
            output.push_str(stderr.trim());
        }
        Err(ToolError::Failed {
            program,
            code: status.code(),
            output,
        })
    }
}

impl Toolchain for SystemToolchain {
    fn preflight(&self) -> Result<(), ToolError> {
        for tool in self.required_tools() {
            if which::which(tool).is_err() {
                return Err(ToolError::Missing(tool));
            }
        }
        Ok(())
    }

    fn clone_source(&self, url: &str, dest: &Path) -> Result<(), ToolError> {
        run_captured(
            "git clone",
            Command::new("git").args(["clone", "--quiet", url]).arg(dest),
        )
        .map(drop)
    }

    fn update_source(&self, dir: &Path) -> Result<(), ToolError> {
        run_captured(
            "git pull",
            Command::new("git")
                .arg("-C")
                .arg(dir)
                .args(["pull", "--quiet", "--ff-only"]),
        )
        .map(drop)
    }

    fn print_srcinfo(&self, dir: &Path) -> Result<String, ToolError> {
        run_captured(
            "makepkg --printsrcinfo",
            Command::new("makepkg").arg("--printsrcinfo").current_dir(dir),
        )
    }

    fn install_dependencies(&self, packages: &[String]) -> Result<(), ToolError> {
        let mut cmd = if self.use_sudo {
            let mut c = Command::new("sudo");
            c.arg("pacman");
            c
        } else {
            Command::new("pacman")
        };
        cmd.args(["-S", "--noconfirm", "--needed"]).args(packages);
        run_streamed("pacman", &mut cmd)
    }

    fn build_package(&self, dir: &Path) -> Result<(), ToolError> {
        // Runtime deps are not installed here (--nodeps); makedepends were
        // installed separately before this call.
        run_streamed(
            "makepkg",
            Command::new("makepkg")
                .args(["--noconfirm", "--nodeps", "--force", "--clean"])
                .current_dir(dir),
        )
    }

    fn index_database(
        &self,
        repo_dir: &Path,
        db_file: &str,
        packages: &[String],
    ) -> Result<(), ToolError> {
        run_streamed(
            "repo-add",
            Command::new("repo-add")
                .arg(db_file)
                .args(packages)
                .current_dir(repo_dir),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_tools_follow_sudo_setting() {
        assert_eq!(
            SystemToolchain::new().required_tools(),
            ["git", "makepkg", "pacman", "repo-add", "sudo"]
        );
        // Dependencies are unknown until a package is cloned.
        assert_eq!(
            SystemToolchain::new().with_sudo(false).required_tools(),
            ["git", "makepkg", "pacman", "repo-add"]
        );
    }

    #[test]
    fn test_run_captured_reports_output() {
        let err = run_captured("sh", Command::new("sh").args(["-c", "echo boom >&2; exit 3"]))
            .unwrap_err();
        assert!(matches!(err, ToolError::Failed { code: Some(3), .. }));
        assert_eq!(err.to_string(), "sh exited with code 3: boom");
    }

    #[test]
    fn test_run_captured_returns_stdout() {
        let out = run_captured("sh", Command::new("sh").args(["-c", "echo hello"])).unwrap();
        assert_eq!(out, "hello\n");
    }

    #[test]
    fn test_spawn_failure() {
        let err = run_streamed(
            "definitely-not-a-tool",
            &mut Command::new("definitely-not-a-tool-aurbuild"),
        )
        .unwrap_err();
        assert!(matches!(err, ToolError::Spawn { .. }));
    }
}
