//! Snapshot files.
//!
//! A snapshot is the engine's [`IndexSnapshot`] serialized as pretty JSON.
//! `docseek index --export` writes one; `docseek query --snapshot` loads it
//! into a fresh engine.

use anyhow::{Context, Result};
use docseek_core::IndexSnapshot;
use std::path::Path;

use crate::engine::SearchEngine;

/// Write the engine's current contents to `output`, or to stdout for piping.
pub fn write_snapshot(engine: &SearchEngine, name: &str, output: Option<&Path>) -> Result<()> {
    let snapshot = engine.export_snapshot(name);
    let json = serde_json::to_string_pretty(&snapshot)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write snapshot: {}", path.display()))?;
            eprintln!(
                "Exported {} files, {} documents to {}",
                snapshot.file_count,
                snapshot.search_data.documents.len(),
                path.display()
            );
        }
        None => {
            println!("{}", json);
        }
    }
    Ok(())
}

/// Parse and validate a snapshot file.
pub fn read_snapshot(path: &Path) -> Result<IndexSnapshot> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
    let snapshot: IndexSnapshot =
        serde_json::from_str(&content).with_context(|| "Failed to parse snapshot")?;
    snapshot
        .validate()
        .with_context(|| format!("Invalid snapshot: {}", path.display()))?;
    Ok(snapshot)
}
