//! Source file discovery with gitignore-aware filtering.
//!
//! Uses the `ignore` crate so `.gitignore`, `.ignore`, and
//! `.git/info/exclude` are respected when collecting build inputs.

use anyhow::Result;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Discover files under `root` matching any of the given `extensions`
/// (with leading dot). Returns absolute paths sorted alphabetically.
pub fn discover_source_files(root: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let root = root.canonicalize()?;

    let mut builder = WalkBuilder::new(&root);
    builder
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true);

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| extensions.contains(&format!(".{}", ext).as_str()))
            .unwrap_or(false);
        if matches {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}
