use crate::error::{IngestError, Result};
use log::{debug, warn};
use std::fs;
use std::io;
use std::path::Path;
use uuid::Uuid;

/// Writes `contents` to `path` through a sibling temp file and a rename, so
/// readers never observe a partially written file.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(parent).map_err(|e| IngestError::io(parent, e))?;

    let file_name = path
        .file_name()
        .map_or_else(|| "file".to_string(), |n| n.to_string_lossy().to_string());
    let temp_path = parent.join(format!(".{file_name}.{}.tmp", Uuid::new_v4()));

    if let Err(e) = fs::write(&temp_path, contents) {
        let _ = fs::remove_file(&temp_path);
        return Err(IngestError::io(&temp_path, e));
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(IngestError::io(path, e));
    }

    Ok(())
}

/// Removes a file, treating "already gone" as success.
pub fn remove_file_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Best-effort removal used on cleanup paths. Failures are logged, never returned.
pub fn discard_file(path: &Path) {
    match remove_file_if_exists(path) {
        Ok(true) => debug!("Removed {}", path.display()),
        Ok(false) => {}
        Err(e) => warn!("Failed to remove {}: {e}", path.display()),
    }
}

/// Best-effort recursive directory removal. Failures are logged, never returned.
pub fn discard_dir(path: &Path) {
    match fs::remove_dir_all(path) {
        Ok(()) => debug!("Removed directory {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove directory {}: {e}", path.display()),
    }
}
