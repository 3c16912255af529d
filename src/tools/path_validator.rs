use crate::error::{IngestError, Result};
use std::path::{Component, Path, PathBuf};

pub fn validate_directory_exists(path: &Path) -> Result<()> {
    if !path.is_dir() {
        return Err(IngestError::NotFound(format!(
            "directory does not exist: {}",
            path.display()
        )));
    }
    Ok(())
}

pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| IngestError::io(path, e))?;
    }
    Ok(())
}

/// Makes `path` absolute against the current directory and resolves `.` and
/// `..` lexically. Symlinks are left alone.
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        let cwd = std::env::current_dir().map_err(|e| IngestError::io(path, e))?;
        cwd.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    Ok(normalized)
}

/// Converts `path` into a slash-separated path relative to `root`.
///
/// Fails with [`IngestError::Path`] when `path` does not resolve to a location
/// under `root`.
pub fn make_relative(root: &Path, path: &Path) -> Result<String> {
    let root = absolutize(root)?;
    let absolute = absolutize(path)?;

    let outside = || IngestError::Path {
        path: absolute.clone(),
        root: root.clone(),
    };

    let relative = absolute.strip_prefix(&root).map_err(|_| outside())?;

    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    if parts.is_empty() {
        return Err(outside());
    }

    Ok(parts.join("/"))
}

/// Resolves a slash-separated relative path stored in a record back onto `root`.
///
/// `.` and `..` segments are dropped, so a hand-edited record can never point
/// outside `root`.
#[must_use]
pub fn resolve_relative(root: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|part| !matches!(*part, "" | "." | ".."))
        .fold(root.to_path_buf(), |acc, part| acc.join(part))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_relative_simple() {
        let rel = make_relative(Path::new("/repo"), Path::new("/repo/clip.mp4")).unwrap();
        assert_eq!(rel, "clip.mp4");
    }

    #[test]
    fn test_make_relative_nested_uses_slashes() {
        let rel =
            make_relative(Path::new("/repo"), Path::new("/repo/shows/s01/e01.mp4")).unwrap();
        assert_eq!(rel, "shows/s01/e01.mp4");
    }

    #[test]
    fn test_make_relative_resolves_dot_dot() {
        let rel = make_relative(Path::new("/repo"), Path::new("/repo/a/../b/clip.mp4")).unwrap();
        assert_eq!(rel, "b/clip.mp4");
    }

    #[test]
    fn test_make_relative_outside_root() {
        let err = make_relative(Path::new("/repo"), Path::new("/elsewhere/clip.mp4")).unwrap_err();
        assert!(matches!(err, IngestError::Path { .. }));

        let err = make_relative(Path::new("/repo"), Path::new("/repo/../clip.mp4")).unwrap_err();
        assert!(matches!(err, IngestError::Path { .. }));
    }

    #[test]
    fn test_make_relative_root_itself_is_rejected() {
        assert!(make_relative(Path::new("/repo"), Path::new("/repo")).is_err());
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(
            resolve_relative(Path::new("/repo"), "shows/e01.mp4"),
            PathBuf::from("/repo/shows/e01.mp4")
        );
    }

    #[test]
    fn test_resolve_relative_stays_under_root() {
        assert_eq!(
            resolve_relative(Path::new("/repo"), "../../outside.jpg"),
            PathBuf::from("/repo/outside.jpg")
        );
        assert_eq!(
            resolve_relative(Path::new("/repo"), "/etc/./thumbnails/../a.jpg"),
            PathBuf::from("/repo/etc/thumbnails/a.jpg")
        );
    }

    #[test]
    fn test_ensure_directory_exists_creates_nested() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_directory_exists(&nested).unwrap();
        assert!(nested.is_dir());
        validate_directory_exists(&nested).unwrap();
    }
}
