//! Directory-backed file index for the library folder.
//!
//! The index is rebuilt from scratch on every scan — there is no caching or
//! in-place mutation, so each request observes a fresh snapshot. Resolution
//! of individual files is confined to the library root.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;
use crate::models::FileEntry;

/// Extensions that appear in file listings and can be served for download.
const LISTED_EXTENSIONS: &[&str] = &[
    ".pdf", ".doc", ".docx", ".xlsx", ".xls", ".txt", ".jpg", ".jpeg", ".png",
];

/// Scan the library root and return a fresh, name-sorted file index.
///
/// A missing root is created rather than treated as an error, matching the
/// first-run experience: the listing is simply empty.
pub fn scan_library(config: &Config) -> Result<Vec<FileEntry>> {
    let root = &config.library.root;
    if !root.exists() {
        std::fs::create_dir_all(root)?;
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    for entry in WalkDir::new(root).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        let extension = extension_of(&name);
        if !LISTED_EXTENSIONS.contains(&extension.as_str()) {
            continue;
        }

        let metadata = entry.metadata()?;
        entries.push(FileEntry {
            name,
            size_bytes: metadata.len(),
            extension,
        });
    }

    // Sort for deterministic ordering
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(entries)
}

/// Resolve `name` to a path inside the library root.
///
/// Rejects any name whose canonical path escapes the root, so traversal
/// segments like `../../etc/passwd` can never be served.
pub fn resolve_file(config: &Config, name: &str) -> Result<PathBuf> {
    let root = config.library.root.canonicalize().with_context(|| {
        format!(
            "library root does not exist: {}",
            config.library.root.display()
        )
    })?;
    let candidate = root.join(name);

    let resolved = match candidate.canonicalize() {
        Ok(p) => p,
        Err(_) => bail!("file not found: {}", name),
    };

    if !resolved.starts_with(&root) {
        bail!("access denied: {}", name);
    }
    if !resolved.is_file() {
        bail!("file not found: {}", name);
    }

    Ok(resolved)
}

/// Lowercase extension including the dot, or empty when there is none.
fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}
