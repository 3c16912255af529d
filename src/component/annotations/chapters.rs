use super::markers::check_id;
use crate::config::RepoLayout;
use crate::cue::{Cue, EndRule, read_cue_file, validate_label, write_cue_file};
use crate::error::{IngestError, Result};
use crate::tools::{IdLocks, remove_file_if_exists};
use log::info;
use std::sync::Arc;

/// Per-video chapter cue sheets under `chapters_vtt/<id>.vtt`.
///
/// Chapters are only ever replaced as a whole. Each chapter runs until the
/// next one starts.
pub struct ChapterStore {
    layout: RepoLayout,
    locks: Arc<IdLocks>,
}

impl ChapterStore {
    #[must_use]
    pub fn new(layout: RepoLayout) -> Self {
        Self {
            layout,
            locks: Arc::new(IdLocks::new()),
        }
    }

    #[must_use]
    pub fn with_locks(mut self, locks: Arc<IdLocks>) -> Self {
        self.locks = locks;
        self
    }

    pub fn get(&self, id: &str) -> Result<Vec<Cue>> {
        check_id(id)?;
        read_cue_file(&self.layout.chapters_file(id))
    }

    /// Overwrites the chapters of a video, returning them as stored.
    pub fn update(&self, id: &str, chapters: Vec<Cue>) -> Result<Vec<Cue>> {
        check_id(id)?;
        chapters.iter().try_for_each(validate_label)?;

        let _guard = self.locks.acquire(id);
        let stored = write_cue_file(&self.layout.chapters_file(id), chapters, EndRule::CHAPTERS)?;
        info!("Saved {} chapters for {id}", stored.len());
        Ok(stored)
    }

    /// Missing chapters are not an error.
    pub fn delete(&self, id: &str) -> Result<()> {
        check_id(id)?;

        let _guard = self.locks.acquire(id);
        let path = self.layout.chapters_file(id);
        remove_file_if_exists(&path).map_err(|e| IngestError::io(&path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::fs;

    const ID: &str = "fedcba9876543210fedcba9876543210";

    #[test]
    fn test_update_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let chapters = ChapterStore::new(RepoLayout::new(dir.path(), &Config::default()));

        assert!(chapters.get(ID).unwrap().is_empty());

        chapters
            .update(ID, vec![Cue::new(60.0, "Middle"), Cue::new(0.0, "Opening")])
            .unwrap();
        let text = fs::read_to_string(chapters.layout.chapters_file(ID)).unwrap();
        assert_eq!(
            text,
            "WEBVTT\n\n\
             00:00:00.000 --> 00:01:00.000\nOpening\n\n\
             00:01:00.000 --> 00:01:10.000\nMiddle\n\n"
        );

        let stored = chapters.update(ID, vec![Cue::new(5.0, "Only")]).unwrap();
        assert_eq!(chapters.get(ID).unwrap(), stored);

        chapters.delete(ID).unwrap();
        assert!(chapters.get(ID).unwrap().is_empty());
        chapters.delete(ID).unwrap();
    }

    #[test]
    fn test_malformed_sheet_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let layout = RepoLayout::new(dir.path(), &Config::default());
        let path = layout.chapters_file(ID);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not a cue sheet\n").unwrap();

        let chapters = ChapterStore::new(layout);
        assert!(matches!(chapters.get(ID), Err(IngestError::Format { .. })));
    }
}
