//! Collect input files from disk for the CLI.
//!
//! Directories are walked recursively; plain files are taken as given.
//! Every file keeps its path relative to the argument it was found under
//! (prefixed with that directory's own name), which becomes the display
//! path in results.

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::ingest::SourceFile;

const DEFAULT_EXCLUDES: &[&str] = &["**/.git/**", "**/target/**", "**/node_modules/**"];

pub async fn scan_paths(
    roots: &[PathBuf],
    exclude_globs: &[String],
    follow_symlinks: bool,
) -> Result<Vec<SourceFile>> {
    let mut patterns: Vec<String> = DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect();
    patterns.extend(exclude_globs.iter().cloned());
    let exclude_set = build_globset(&patterns)?;

    let mut found: Vec<(PathBuf, String)> = Vec::new();
    for root in roots {
        if !root.exists() {
            bail!("Path does not exist: {}", root.display());
        }
        if root.is_file() {
            let name = file_name(root);
            found.push((root.clone(), name));
            continue;
        }

        let prefix = file_name(root);
        let walker = WalkDir::new(root).follow_links(follow_symlinks);
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let relative = path.strip_prefix(root).unwrap_or(path);
            let rel_str = relative.to_string_lossy().replace('\\', "/");
            if exclude_set.is_match(&rel_str) {
                continue;
            }
            let display = if prefix.is_empty() {
                rel_str
            } else {
                format!("{}/{}", prefix, rel_str)
            };
            found.push((path.to_path_buf(), display));
        }
    }

    // Sort for deterministic ordering
    found.sort_by(|a, b| a.1.cmp(&b.1));

    let mut files = Vec::with_capacity(found.len());
    for (path, display) in found {
        files.push(SourceFile::from_path(&path, Some(display)).await?);
    }
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
