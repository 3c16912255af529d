use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Lists video files under `root`, skipping `skip_dir` (the repository
/// metadata directory) and hidden directories. Results are sorted by path.
#[must_use]
pub fn scan_video_files(root: &Path, skip_dir: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let extensions: HashSet<String> = extensions
        .iter()
        .map(|ext| ext.trim_start_matches('.').to_lowercase())
        .collect();

    let mut videos: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| !is_skipped_dir(entry, root, skip_dir))
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| has_video_extension(entry.path(), &extensions))
        .map(DirEntry::into_path)
        .collect();

    videos.sort();
    videos
}

fn is_skipped_dir(entry: &DirEntry, root: &Path, skip_dir: &Path) -> bool {
    if !entry.file_type().is_dir() || entry.path() == root {
        return false;
    }
    entry.path().starts_with(skip_dir) || entry.file_name().to_string_lossy().starts_with('.')
}

fn has_video_extension(path: &Path, extensions: &HashSet<String>) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.contains(&ext.to_lowercase()))
}
