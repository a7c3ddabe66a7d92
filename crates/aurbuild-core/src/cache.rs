//! Clone cache housekeeping.

use std::collections::HashSet;
use std::path::Path;

use aurbuild_schema::PackageName;

use crate::reporter::Reporter;

/// Remove every subdirectory of `clone_dir` whose name is not a declared
/// package. Returns the names that were removed.
///
/// Nothing here is fatal: an unreadable cache or a failed removal is
/// reported and skipped. Plain files in the cache are left alone.
pub fn reconcile_cache(
    clone_dir: &Path,
    declared: &[PackageName],
    reporter: &dyn Reporter,
) -> Vec<String> {
    let keep: HashSet<&str> = declared.iter().map(PackageName::as_str).collect();

    let entries = match std::fs::read_dir(clone_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            reporter.warning(&format!(
                "Cannot read clone cache {}: {e}",
                clone_dir.display()
            ));
            return Vec::new();
        }
    };

    let mut stale: Vec<_> = entries
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
        .filter_map(|e| {
            let name = e.file_name().to_str()?.to_string();
            (!keep.contains(name.as_str())).then(|| (name, e.path()))
        })
        .collect();
    stale.sort();

    let mut removed = Vec::new();
    for (name, path) in stale {
        reporter.warning(&format!("Removing unused AUR clone: {name}"));
        match std::fs::remove_dir_all(&path) {
            Ok(()) => removed.push(name),
            Err(e) => reporter.error(&format!("Failed to remove {}: {e}", path.display())),
        }
    }
    removed
}
