//! Reading and writing plan files.

use anyhow::{Context, Result};
use std::{fs, io::Write as _, path::Path};
use tracing::info;

pub fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Replace the file at `path` with `bytes`.
///
/// The bytes go to a temporary file next to `path` that is renamed over it
/// once complete, so a failed write leaves an existing file as it was. The
/// permissions of an existing file are carried over.
pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = tempfile::Builder::new()
        .prefix(".tfplan-edit-")
        .tempfile_in(dir)
        .with_context(|| format!("failed to create a temporary file in {}", dir.display()))?;
    file.write_all(bytes)
        .and_then(|_| file.as_file().sync_all())
        .with_context(|| format!("failed to write {}", file.path().display()))?;

    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(file.path(), metadata.permissions())
            .with_context(|| format!("failed to copy the permissions of {}", path.display()))?;
    }

    file.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    info!("write: {}", path.display());
    Ok(())
}
