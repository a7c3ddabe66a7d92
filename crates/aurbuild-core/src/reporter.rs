//! Reporter trait for dependency injection
//!
//! Core logic reports progress through this trait without knowing whether
//! it is talking to a terminal, a CI log, or nothing at all. Diagnostics
//! meant for debugging go through `tracing` instead.

use aurbuild_schema::PackageName;

use crate::pipeline::RunSummary;

pub trait Reporter: Send + Sync {
    /// A new phase of the run has started (e.g. "Updating repository database").
    fn section(&self, title: &str);

    /// Processing of a declared package has started.
    fn package(&self, name: &PackageName);

    /// An indented detail line under the current package or section.
    fn detail(&self, msg: &str);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a success message.
    fn success(&self, msg: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);

    /// Log an error message.
    fn error(&self, msg: &str);

    /// Display the final Built/Skipped/Failed counts.
    fn summary(&self, summary: &RunSummary);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn section(&self, title: &str) {
        (**self).section(title);
    }
    fn package(&self, name: &PackageName) {
        (**self).package(name);
    }
    fn detail(&self, msg: &str) {
        (**self).detail(msg);
    }
    fn info(&self, msg: &str) {
        (**self).info(msg);
    }
    fn success(&self, msg: &str) {
        (**self).success(msg);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
    fn error(&self, msg: &str) {
        (**self).error(msg);
    }
    fn summary(&self, summary: &RunSummary) {
        (**self).summary(summary);
    }
}

/// A no-op reporter for silent operations (e.g., testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn section(&self, _: &str) {}
    fn package(&self, _: &PackageName) {}
    fn detail(&self, _: &str) {}
    fn info(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warning(&self, _: &str) {}
    fn error(&self, _: &str) {}
    fn summary(&self, _: &RunSummary) {}
}
