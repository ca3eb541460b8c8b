//! Whole-file replacement helpers

use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomic write helper
///
/// Writes data to a temporary file next to the target, fsyncs it, then renames it
/// over the target path. Readers never observe a partially written file. The target's
/// permissions are carried over when it already exists.
pub fn atomic_write(target: &Path, data: &[u8]) -> std::io::Result<()> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;

    if let Ok(metadata) = std::fs::metadata(target) {
        tmp.as_file().set_permissions(metadata.permissions())?;
    }

    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}
