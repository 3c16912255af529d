use crate::config::RepoLayout;
use crate::cue::{Cue, EndRule, read_cue_file, validate_label, write_cue_file};
use crate::error::{IngestError, Result};
use crate::tools::{IdLocks, is_valid_id, remove_file_if_exists};
use log::{debug, info};
use std::sync::Arc;

/// Per-video marker cue sheets under `video_markers/<id>.vtt`.
///
/// Every change rewrites the whole sheet, sorted by start time. Writers of the
/// same video are serialized; different videos never contend.
pub struct MarkerStore {
    layout: RepoLayout,
    locks: Arc<IdLocks>,
}

impl MarkerStore {
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

    /// Markers of a video in start order. No sheet yet means no markers.
    pub fn list(&self, id: &str) -> Result<Vec<Cue>> {
        check_id(id)?;
        read_cue_file(&self.layout.markers_file(id))
    }

    /// Adds one marker. Returns false when the same `(start, label)` pair is
    /// already present, in which case nothing is written.
    pub fn add(&self, id: &str, marker: Cue) -> Result<bool> {
        check_id(id)?;
        validate_label(&marker)?;

        let _guard = self.locks.acquire(id);
        let path = self.layout.markers_file(id);
        let mut markers = read_cue_file(&path)?;
        if markers.iter().any(|m| m.same_as(&marker)) {
            debug!("Marker {marker:?} already on {id}");
            return Ok(false);
        }

        markers.push(marker);
        write_cue_file(&path, markers, EndRule::MARKERS)?;
        Ok(true)
    }

    /// Removes the marker matching `marker` at millisecond precision.
    pub fn delete(&self, id: &str, marker: &Cue) -> Result<()> {
        check_id(id)?;

        let _guard = self.locks.acquire(id);
        let path = self.layout.markers_file(id);
        let mut markers = read_cue_file(&path)?;
        let before = markers.len();
        markers.retain(|m| !m.same_as(marker));

        if markers.len() == before {
            return Err(IngestError::NotFound(format!(
                "marker {:?} at {:.3}s on video {id}",
                marker.label(),
                marker.start()
            )));
        }

        write_cue_file(&path, markers, EndRule::MARKERS)?;
        Ok(())
    }

    /// Overwrites the sheet with `markers`, returning them as stored.
    pub fn replace(&self, id: &str, markers: Vec<Cue>) -> Result<Vec<Cue>> {
        check_id(id)?;
        markers.iter().try_for_each(validate_label)?;

        let _guard = self.locks.acquire(id);
        write_cue_file(&self.layout.markers_file(id), markers, EndRule::MARKERS)
    }

    /// Drops the whole sheet. A video without markers is not an error.
    pub fn delete_all(&self, id: &str) -> Result<()> {
        check_id(id)?;

        let _guard = self.locks.acquire(id);
        let path = self.layout.markers_file(id);
        if remove_file_if_exists(&path).map_err(|e| IngestError::io(&path, e))? {
            info!("Deleted markers of {id}");
        }
        Ok(())
    }
}

/// Ids become file names, so anything that is not a content id is refused.
pub(super) fn check_id(id: &str) -> Result<()> {
    if is_valid_id(id) {
        Ok(())
    } else {
        Err(IngestError::NotFound(format!("video {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::fs;

    const ID: &str = "0123456789abcdef0123456789abcdef";

    fn store(root: &std::path::Path) -> MarkerStore {
        MarkerStore::new(RepoLayout::new(root, &Config::default()))
    }

    #[test]
    fn test_add_keeps_sheet_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let markers = store(dir.path());

        assert!(markers.add(ID, Cue::new(10.0, "Intro")).unwrap());
        assert!(markers.add(ID, Cue::new(5.0, "Start")).unwrap());

        let listed = markers.list(ID).unwrap();
        assert_eq!(listed, vec![Cue::new(5.0, "Start"), Cue::new(10.0, "Intro")]);

        let text = fs::read_to_string(markers.layout.markers_file(ID)).unwrap();
        assert_eq!(
            text,
            "WEBVTT\n\n\
             00:00:05.000 --> 00:00:25.000\nStart\n\n\
             00:00:10.000 --> 00:00:30.000\nIntro\n\n"
        );
    }

    #[test]
    fn test_duplicate_add_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let markers = store(dir.path());

        assert!(markers.add(ID, Cue::new(5.0, "Start")).unwrap());
        assert!(!markers.add(ID, Cue::new(5.0004, "Start")).unwrap());
        assert!(markers.add(ID, Cue::new(5.0, "Other")).unwrap());
        assert_eq!(markers.list(ID).unwrap().len(), 2);
    }

    #[test]
    fn test_delete_one() {
        let dir = tempfile::tempdir().unwrap();
        let markers = store(dir.path());
        markers.add(ID, Cue::new(5.0, "Start")).unwrap();
        markers.add(ID, Cue::new(10.0, "Intro")).unwrap();

        markers.delete(ID, &Cue::new(5.0, "Start")).unwrap();
        assert_eq!(markers.list(ID).unwrap(), vec![Cue::new(10.0, "Intro")]);

        assert!(matches!(
            markers.delete(ID, &Cue::new(5.0, "Start")),
            Err(IngestError::NotFound(_))
        ));
    }

    #[test]
    fn test_replace_and_delete_all() {
        let dir = tempfile::tempdir().unwrap();
        let markers = store(dir.path());

        let stored = markers
            .replace(ID, vec![Cue::new(3.0, "b"), Cue::new(1.0, "a"), Cue::new(3.0, "b")])
            .unwrap();
        assert_eq!(stored, vec![Cue::new(1.0, "a"), Cue::new(3.0, "b")]);

        markers.delete_all(ID).unwrap();
        assert!(markers.list(ID).unwrap().is_empty());
        markers.delete_all(ID).unwrap();
    }

    #[test]
    fn test_rejects_bad_labels_and_ids() {
        let dir = tempfile::tempdir().unwrap();
        let markers = store(dir.path());

        assert!(matches!(
            markers.add(ID, Cue::new(1.0, "a --> b")),
            Err(IngestError::Format { .. })
        ));
        assert!(markers.add("../escape", Cue::new(1.0, "x")).is_err());
        assert!(markers.list(ID).unwrap().is_empty());
    }
}
