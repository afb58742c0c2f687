//! Atomic file writes.
//!
//! Content goes to a sibling temporary file (`.{name}.{pid}.tmp`), is synced
//! to disk, then renamed over the target. Readers see either the previous
//! file or the complete new one. Source and target share a directory, so the
//! rename never crosses filesystems.

use crate::error::{Result, VoxError};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Atomically write bytes to `path`, creating parent directories as needed.
///
/// ```no_run
/// use voxdeploy::fs::atomic_write;
/// use std::path::Path;
///
/// atomic_write(Path::new("units/orchestrator.service"), b"[Unit]\n")?;
/// # Ok::<(), voxdeploy::error::VoxError>(())
/// ```
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            VoxError::UserError(format!(
                "failed to create directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let temp_path = temp_path_for(path)?;
    if let Err(e) = write_synced(&temp_path, content) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        VoxError::UserError(format!("failed to replace '{}': {}", path.display(), e))
    })?;

    // Persist the directory entry as well.
    #[cfg(unix)]
    if let Some(parent) = path.parent()
        && let Ok(dir) = File::open(parent)
    {
        let _ = dir.sync_all();
    }

    Ok(())
}

/// Atomically write a string to `path`.
pub fn atomic_write_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    atomic_write(path, content.as_bytes())
}

fn temp_path_for(target: &Path) -> Result<PathBuf> {
    let file_name = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            VoxError::UserError(format!("invalid file path '{}'", target.display()))
        })?;

    let temp_name = format!(".{}.{}.tmp", file_name, std::process::id());
    Ok(match target.parent() {
        Some(parent) => parent.join(temp_name),
        None => PathBuf::from(temp_name),
    })
}

fn write_synced(path: &Path, content: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| {
        VoxError::UserError(format!(
            "failed to create temporary file '{}': {}",
            path.display(),
            e
        ))
    })?;
    file.write_all(content)
        .and_then(|()| file.sync_all())
        .map_err(|e| {
            VoxError::UserError(format!(
                "failed to write temporary file '{}': {}",
                path.display(),
                e
            ))
        })
}
