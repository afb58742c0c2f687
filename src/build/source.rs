//! Source tree snapshot.

use crate::error::{Result, VoxError};
use std::fs;
use std::path::Path;

/// A regular file of the source tree, held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path relative to the source root, `/`-separated.
    pub relative: String,
    pub contents: Vec<u8>,
}

/// Read every regular file under `root`, sorted by relative path.
///
/// Symlinks and special files are skipped so the snapshot depends only on
/// file contents inside the tree.
pub fn read_source_tree(root: &Path) -> Result<Vec<SourceFile>> {
    if !root.is_dir() {
        return Err(VoxError::Build(format!(
            "source tree '{}' does not exist or is not a directory",
            root.display()
        )));
    }

    let mut files = Vec::new();
    collect(root, "", &mut files)?;
    files.sort_by(|a, b| a.relative.cmp(&b.relative));
    Ok(files)
}

fn collect(dir: &Path, prefix: &str, out: &mut Vec<SourceFile>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| {
        VoxError::Build(format!("failed to read directory '{}': {}", dir.display(), e))
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| {
            VoxError::Build(format!("failed to read entry in '{}': {}", dir.display(), e))
        })?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let relative = if prefix.is_empty() {
            name
        } else {
            format!("{}/{}", prefix, name)
        };
        let file_type = entry.file_type().map_err(|e| {
            VoxError::Build(format!("failed to stat '{}': {}", entry.path().display(), e))
        })?;

        if file_type.is_dir() {
            collect(&entry.path(), &relative, out)?;
        } else if file_type.is_file() {
            let contents = fs::read(entry.path()).map_err(|e| {
                VoxError::Build(format!("failed to read '{}': {}", entry.path().display(), e))
            })?;
            out.push(SourceFile { relative, contents });
        } else {
            tracing::debug!(path = %entry.path().display(), "skipping non-regular source entry");
        }
    }

    Ok(())
}
