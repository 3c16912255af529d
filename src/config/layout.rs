use crate::config::types::{Config, REPO_DIR_NAME};
use crate::cue::MANIFEST_FILE_NAME;
use std::path::{Path, PathBuf};

/// On-disk locations for one repository.
///
/// Asset paths stored in records are relative to [`RepoLayout::storage_root`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLayout {
    root: PathBuf,
    storage_root: PathBuf,
}

pub const THUMBNAILS_DIR: &str = "thumbnails";
pub const PREVIEWS_DIR: &str = "previews";
pub const STORYBOARDS_DIR: &str = "storyboards";
pub const MARKERS_DIR: &str = "video_markers";
pub const CHAPTERS_DIR: &str = "chapters_vtt";
const RECORDS_FILE: &str = "videos.json";

impl RepoLayout {
    #[must_use]
    pub fn new(root: &Path, config: &Config) -> Self {
        Self {
            root: root.to_path_buf(),
            storage_root: root.join(&config.storage_dir),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The `.ova-repo` metadata directory, skipped when scanning for videos.
    #[must_use]
    pub fn repo_dir(&self) -> PathBuf {
        self.root.join(REPO_DIR_NAME)
    }

    #[must_use]
    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    #[must_use]
    pub fn records_file(&self) -> PathBuf {
        self.storage_root.join(RECORDS_FILE)
    }

    #[must_use]
    pub fn thumbnail_relative(id: &str) -> String {
        format!("{THUMBNAILS_DIR}/{id}.jpg")
    }

    #[must_use]
    pub fn preview_relative(id: &str) -> String {
        format!("{PREVIEWS_DIR}/{id}.webm")
    }

    #[must_use]
    pub fn thumbnail_file(&self, id: &str) -> PathBuf {
        self.storage_root.join(THUMBNAILS_DIR).join(format!("{id}.jpg"))
    }

    #[must_use]
    pub fn preview_file(&self, id: &str) -> PathBuf {
        self.storage_root.join(PREVIEWS_DIR).join(format!("{id}.webm"))
    }

    #[must_use]
    pub fn storyboard_dir(&self, id: &str) -> PathBuf {
        self.storage_root.join(STORYBOARDS_DIR).join(id)
    }

    /// Sibling of [`RepoLayout::storyboard_dir`] that a rebuild is written to
    /// before it replaces the published storyboard.
    #[must_use]
    pub fn storyboard_staging_dir(&self, id: &str) -> PathBuf {
        self.storage_root
            .join(STORYBOARDS_DIR)
            .join(format!(".partial.{id}"))
    }

    #[must_use]
    pub fn storyboard_manifest(&self, id: &str) -> PathBuf {
        self.storyboard_dir(id).join(MANIFEST_FILE_NAME)
    }

    #[must_use]
    pub fn markers_file(&self, id: &str) -> PathBuf {
        self.storage_root.join(MARKERS_DIR).join(format!("{id}.vtt"))
    }

    #[must_use]
    pub fn chapters_file(&self, id: &str) -> PathBuf {
        self.storage_root.join(CHAPTERS_DIR).join(format!("{id}.vtt"))
    }
}
