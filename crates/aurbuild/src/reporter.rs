//! Terminal output for a run.
//!
//! Interactive terminals get coloured markers. When `CI` is set the same
//! lines are printed with plain text prefixes so build logs stay readable.

use aurbuild_core::{PackageOutcome, Reporter, RunSummary};
use aurbuild_schema::PackageName;
use crossterm::style::{Color, Stylize};

/// Colours for the run log.
#[derive(Debug, Clone)]
struct ColorScheme {
    section: Color,
    package_name: Color,
    secondary: Color,
    info: Color,
    success: Color,
    warning: Color,
    error: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            section: Color::Blue,
            package_name: Color::Cyan,
            secondary: Color::DarkGrey,
            info: Color::White,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
        }
    }
}

/// Reporter that prints to stdout (errors to stderr).
#[derive(Debug, Clone)]
pub(crate) struct TerminalReporter {
    ci: bool,
    colors: ColorScheme,
}

impl TerminalReporter {
    /// Plain output when running under CI.
    pub(crate) fn from_env() -> Self {
        Self {
            ci: std::env::var_os("CI").is_some_and(|v| !v.is_empty()),
            colors: ColorScheme::default(),
        }
    }

    fn line(&self, marker: &str, color: Color, msg: &str) {
        if self.ci {
            println!("{marker} {msg}");
        } else {
            println!("{} {msg}", marker.with(color).bold());
        }
    }
}

impl Reporter for TerminalReporter {
    fn section(&self, title: &str) {
        println!();
        if self.ci {
            println!("==> {title}");
        } else {
            println!("{}", format!("==> {title}").with(self.colors.section).bold());
        }
    }

    fn package(&self, name: &PackageName) {
        if self.ci {
            println!("-> {name}");
        } else {
            println!(
                "{} {}",
                "->".with(self.colors.secondary),
                name.as_str().with(self.colors.package_name).bold()
            );
        }
    }

    fn detail(&self, msg: &str) {
        if self.ci {
            println!("   {msg}");
        } else {
            println!("   {}", msg.with(self.colors.secondary));
        }
    }

    fn info(&self, msg: &str) {
        self.line("  [INFO]", self.colors.info, msg);
    }

    fn success(&self, msg: &str) {
        self.line("  [OK]", self.colors.success, msg);
    }

    fn warning(&self, msg: &str) {
        self.line("  [WARN]", self.colors.warning, msg);
    }

    fn error(&self, msg: &str) {
        if self.ci {
            eprintln!("  [ERROR] {msg}");
        } else {
            eprintln!("{} {msg}", "  [ERROR]".with(self.colors.error).bold());
        }
    }

    fn summary(&self, summary: &RunSummary) {
        self.section("Build Summary");
        self.success(&format!("Built:   {}", summary.built()));
        self.warning(&format!("Skipped: {}", summary.skipped()));
        if summary.would_build() > 0 {
            self.info(&format!("Would build: {}", summary.would_build()));
        }
        self.error(&format!("Failed:  {}", summary.failed()));

        for report in &summary.reports {
            if let PackageOutcome::Failed { reason } = &report.outcome {
                self.detail(&format!("{}: {reason}", report.name));
            }
        }
        if summary.database_failed {
            self.warning("Repository database was not updated; new packages are unindexed");
        }

        println!();
        match summary.failed() {
            0 => self.success("Build completed successfully"),
            n => self.error(&format!("Build failed for {n} packages")),
        }
    }
}
