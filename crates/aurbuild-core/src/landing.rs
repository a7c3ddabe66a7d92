//! Static landing page for the published repository.
//!
//! The template is plain HTML with `{{PLACEHOLDER}}` tokens. The page is
//! only rewritten when something other than the timestamp changed, so a
//! run that builds nothing leaves the published tree untouched.

use std::collections::HashMap;

use aurbuild_schema::PkgVersion;

use crate::context::RunContext;
use crate::repodb;
use crate::reporter::Reporter;

const LAST_UPDATED: &str = "{{LAST_UPDATED}}";

/// What happened to `index.html`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandingStatus {
    /// No template; nothing written.
    NoTemplate,
    Generated,
    Unchanged,
    Failed,
}

/// One published package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRow {
    pub name: String,
    pub version: String,
    pub url: String,
}

/// Data the template placeholders are filled with.
#[derive(Debug, Clone)]
pub struct LandingPage {
    pub repo_name: String,
    pub repo_url: String,
    pub project_url: String,
    pub arch: String,
    /// Number of declared packages, indexed or not.
    pub package_count: usize,
    pub rows: Vec<PackageRow>,
}

impl LandingPage {
    /// Collect page data for every declared package the database indexes.
    pub fn collect(ctx: &RunContext, reporter: &dyn Reporter) -> Self {
        let indexed: HashMap<String, PkgVersion> = match repodb::indexed_packages(&ctx.db_path())
        {
            Ok(list) => list
                .into_iter()
                .map(|p| (p.name.to_string(), p.version))
                .collect(),
            Err(e) => {
                reporter.warning(&format!("Cannot read repository database: {e}"));
                HashMap::new()
            }
        };

        let rows = ctx
            .config
            .packages
            .iter()
            .filter_map(|spec| {
                let version = indexed.get(spec.name.as_str())?;
                Some(PackageRow {
                    name: spec.name.to_string(),
                    version: version.to_string(),
                    url: ctx.package_url(&spec.name),
                })
            })
            .collect();

        Self {
            repo_name: ctx.repo_name().to_string(),
            repo_url: ctx.config.meta.repo_url.clone(),
            project_url: ctx.config.meta.project_url.clone(),
            arch: ctx.settings.arch.to_string(),
            package_count: ctx.config.packages.len(),
            rows,
        }
    }

    fn rows_html(&self) -> String {
        self.rows
            .iter()
            .map(|row| {
                format!(
                    "<tr><td class='ps-3'><a href='{}' target='_blank' class='package-name text-decoration-none'>{}</a></td>\
                 <td class='text-center'><span class='badge rounded-pill badge-version'>{}</span></td>\
                 <td class='text-end pe-3 text-secondary'>{}</td></tr>",
                    escape_html(&row.url),
                    escape_html(&row.name),
                    escape_html(&row.version),
                    escape_html(&self.arch),
                )
            })
            .collect()
    }

    /// Fill every placeholder except the timestamp, returning the pieces
    /// that surround each `{{LAST_UPDATED}}` occurrence.
    fn render_parts(&self, template: &str) -> Vec<String> {
        let rows = self.rows_html();
        let count = self.package_count.to_string();
        template
            .split(LAST_UPDATED)
            .map(|part| {
                part.replace("{{REPO_NAME}}", &self.repo_name)
                    .replace("{{REPO_URL}}", &self.repo_url)
                    .replace("{{PROJECT_URL}}", &self.project_url)
                    .replace("{{PACKAGE_COUNT}}", &count)
                    .replace("{{PACKAGE_ROWS}}", &rows)
            })
            .collect()
    }

    /// Render `template` with `timestamp` as the last-updated value.
    pub fn render(&self, template: &str, timestamp: &str) -> String {
        self.render_parts(template).join(timestamp)
    }
}

/// Minimal escaping for text and single-quoted attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Whether `existing` is `parts` joined by arbitrary timestamps.
fn same_except_timestamp(existing: &str, parts: &[String]) -> bool {
    let (Some(first), Some(last)) = (parts.first(), parts.last()) else {
        return existing.is_empty();
    };
    if parts.len() == 1 {
        return existing == first;
    }
    let Some(mut rest) = existing.strip_prefix(first.as_str()) else {
        return false;
    };
    let Some(without_last) = rest.strip_suffix(last.as_str()) else {
        return false;
    };
    rest = without_last;
    for middle in &parts[1..parts.len() - 1] {
        match rest.find(middle.as_str()) {
            Some(at) => rest = &rest[at + middle.len()..],
            None => return false,
        }
    }
    true
}

/// Current local time in the page's timestamp format.
pub fn timestamp_now() -> String {
    chrono::Local::now().format("%Y-%m-%dT%H:%M%:z").to_string()
}

/// Render `index.html` and copy the icon into the build root.
///
/// Failures are reported and never abort the run.
pub fn generate_landing_page(ctx: &RunContext, reporter: &dyn Reporter) -> LandingStatus {
    let template_path = &ctx.settings.index_template;
    let template = match std::fs::read_to_string(template_path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            reporter.warning(&format!(
                "Landing page template not found: {}. Skipping generation.",
                template_path.display()
            ));
            return LandingStatus::NoTemplate;
        }
        Err(e) => {
            reporter.error(&format!("Failed to read template: {e}"));
            return LandingStatus::Failed;
        }
    };

    reporter.section("Generating landing page");
    let page = LandingPage::collect(ctx, reporter);
    let parts = page.render_parts(&template);

    let output = ctx.index_html_path();
    let unchanged = std::fs::read_to_string(&output)
        .is_ok_and(|existing| same_except_timestamp(&existing, &parts));

    let status = if unchanged {
        reporter.detail("Unchanged: Landing page.");
        LandingStatus::Unchanged
    } else {
        match std::fs::write(&output, parts.join(&timestamp_now())) {
            Ok(()) => {
                reporter.success("Generated: Landing page.");
                LandingStatus::Generated
            }
            Err(e) => {
                reporter.error(&format!("Failed to write index.html: {e}"));
                LandingStatus::Failed
            }
        }
    };

    copy_icon(ctx, reporter);
    status
}

fn copy_icon(ctx: &RunContext, reporter: &dyn Reporter) {
    let src = &ctx.settings.icon;
    let Ok(icon) = std::fs::read(src) else {
        tracing::debug!("No icon at {}", src.display());
        return;
    };
    let dest = ctx.icon_path();
    if std::fs::read(&dest).is_ok_and(|current| current == icon) {
        return;
    }
    match std::fs::write(&dest, icon) {
        Ok(()) => reporter.detail("Copied: icon.png"),
        Err(e) => reporter.warning(&format!("Failed to copy icon: {e}")),
    }
}
