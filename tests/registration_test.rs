//! Registration, move detection, cleanup and unregistration against a real
//! repository directory with fake media backends.

mod common;

use common::{FakeGenerator, FakeInspector, Fixture};
use media_ingest::component::RegistrationOutcome;
use media_ingest::component::registration::{AssetSettings, RegistrationPipeline};
use media_ingest::config::{Config, RepoLayout};
use media_ingest::cue::Cue;
use media_ingest::error::{IngestError, Result};
use media_ingest::storage::{JsonVideoStore, VideoRecord, VideoStore, VideoStoreExt};
use media_ingest::tools::compute_id;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// A new file gets a record, a thumbnail and a preview under the storage root.
#[test]
fn test_register_new_video() {
    let fx = Fixture::new(120.0, FakeGenerator::new());
    let path = fx.video("clip.mp4", "video-a");
    let id = compute_id(&path).unwrap();

    let outcome = fx.repo.pipeline().register(&path).unwrap();
    assert!(outcome.is_new());

    let record = outcome.record();
    assert_eq!(record.id, id);
    assert_eq!(record.title, "clip");
    assert_eq!(record.file_path, "clip.mp4");
    assert_eq!(record.duration_seconds, 120);
    assert_eq!(record.resolution.width, 1920);
    assert_eq!(record.codecs.video_codec, "avc1.64001f");
    assert_eq!(
        record.thumbnail_path.as_deref(),
        Some(RepoLayout::thumbnail_relative(&id).as_str())
    );
    assert_eq!(record.thumbnail_path.as_deref(), Some(format!("thumbnails/{id}.jpg").as_str()));
    assert_eq!(record.preview_path.as_deref(), Some(format!("previews/{id}.webm").as_str()));

    let layout = fx.repo.layout();
    assert!(layout.thumbnail_file(&id).is_file());
    assert!(layout.preview_file(&id).is_file());
    assert!(layout.records_file().is_file());
    assert_eq!(fx.repo.store().get(&id).unwrap().as_ref(), Some(record));

    assert_eq!(fx.generator.offset_of("thumbnail"), Some(60.0));
    assert_eq!(fx.generator.offset_of("preview"), Some(60.0));
}

/// The preview of a clip shorter than the preview length starts at zero.
#[test]
fn test_preview_offset_of_short_video() {
    let fx = Fixture::new(3.0, FakeGenerator::new());
    let path = fx.video("short.mp4", "short");
    fx.repo.pipeline().register(&path).unwrap();

    assert_eq!(fx.generator.offset_of("thumbnail"), Some(1.5));
    assert_eq!(fx.generator.offset_of("preview"), Some(0.0));
}

/// Registering the same file again generates nothing.
#[test]
fn test_register_is_idempotent() {
    let fx = Fixture::new(120.0, FakeGenerator::new());
    let path = fx.video("clip.mp4", "video-a");

    let first = fx.repo.pipeline().register(&path).unwrap();
    let second = fx.repo.pipeline().register(&path).unwrap();

    assert!(matches!(second, RegistrationOutcome::Unchanged(_)));
    assert_eq!(second.record(), first.record());
    assert_eq!(fx.generator.thumbnails.load(Ordering::SeqCst), 1);
    assert_eq!(fx.generator.previews.load(Ordering::SeqCst), 1);
    assert_eq!(fx.inspector.calls.load(Ordering::SeqCst), 1);
    assert_eq!(fx.repo.store().list_all().unwrap().len(), 1);
}

/// Moving a registered file only updates its stored path.
#[test]
fn test_moved_file_updates_path() {
    let fx = Fixture::new(120.0, FakeGenerator::new());
    let path = fx.video("clip.mp4", "video-a");
    let first = fx.repo.pipeline().register(&path).unwrap().into_record();

    let moved = fx.root().join("shows").join("clip.mp4");
    fs::create_dir_all(moved.parent().unwrap()).unwrap();
    fs::rename(&path, &moved).unwrap();

    let outcome = fx.repo.pipeline().register(&moved).unwrap();
    let RegistrationOutcome::Moved {
        record,
        previous_path,
    } = outcome
    else {
        panic!("expected a move, got {outcome:?}");
    };

    assert_eq!(previous_path, "clip.mp4");
    assert_eq!(record.file_path, "shows/clip.mp4");
    assert_eq!(record.id, first.id);
    assert_eq!(record.thumbnail_path, first.thumbnail_path);
    assert_eq!(fx.generator.thumbnails.load(Ordering::SeqCst), 1);
    assert_eq!(
        fx.repo.store().get(&first.id).unwrap().unwrap().file_path,
        "shows/clip.mp4"
    );
}

/// A failed preview removes the thumbnail and stores nothing.
#[test]
fn test_preview_failure_cleans_up() {
    let fx = Fixture::new(120.0, FakeGenerator::new());
    fx.generator.fail_preview.store(true, Ordering::SeqCst);
    let path = fx.video("clip.mp4", "video-a");
    let id = compute_id(&path).unwrap();

    let err = fx.repo.pipeline().register(&path).unwrap_err();
    assert!(matches!(err, IngestError::Media { .. }));
    assert!(!fx.repo.layout().thumbnail_file(&id).exists());
    assert!(!fx.repo.layout().preview_file(&id).exists());
    assert!(fx.repo.store().list_all().unwrap().is_empty());

    // Recovers once the encoder works again.
    fx.generator.fail_preview.store(false, Ordering::SeqCst);
    assert!(fx.repo.pipeline().register(&path).unwrap().is_new());
}

/// A file outside the repository root cannot be stored relative to it.
#[test]
fn test_file_outside_root_is_rejected() {
    let outside_dir = tempfile::tempdir().unwrap();
    let fx = Fixture::new(120.0, FakeGenerator::new());
    let path = outside_dir.path().join("elsewhere.mp4");
    fs::write(&path, "outside").unwrap();
    let id = compute_id(&path).unwrap();

    let err = fx.repo.pipeline().register(&path).unwrap_err();
    assert!(matches!(err, IngestError::Path { .. }));
    assert!(!fx.repo.layout().thumbnail_file(&id).exists());
    assert!(!fx.repo.layout().preview_file(&id).exists());
    assert!(fx.repo.store().list_all().unwrap().is_empty());
}

/// Unreadable media is reported without touching the store.
#[test]
fn test_broken_media_is_media_error() {
    let fx = Fixture::new(120.0, FakeGenerator::new());
    let path = fx.video("broken.mp4", "junk");

    let err = fx.repo.pipeline().register(&path).unwrap_err();
    assert!(matches!(err, IngestError::Media { .. }));
    assert_eq!(fx.generator.thumbnails.load(Ordering::SeqCst), 0);
    assert!(fx.repo.store().list_all().unwrap().is_empty());
}

/// Concurrent registrations of one file generate its assets exactly once.
#[test]
fn test_concurrent_registration_of_same_content() {
    let fx = Fixture::new(
        120.0,
        FakeGenerator::new().slow(Duration::from_millis(50)),
    );
    let path = fx.video("clip.mp4", "video-a");
    let copy = fx.video("copy/clip.mp4", "video-a");

    let pipeline = Arc::clone(fx.repo.pipeline());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let pipeline = Arc::clone(&pipeline);
            let path = if i % 2 == 0 { path.clone() } else { copy.clone() };
            thread::spawn(move || pipeline.register(&path).unwrap())
        })
        .collect();
    let outcomes: Vec<RegistrationOutcome> =
        handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(outcomes.iter().filter(|o| o.is_new()).count(), 1);
    assert_eq!(fx.generator.thumbnails.load(Ordering::SeqCst), 1);
    assert_eq!(fx.generator.previews.load(Ordering::SeqCst), 1);
    assert_eq!(fx.repo.store().list_all().unwrap().len(), 1);
}

/// Stores nothing: every insert fails.
struct FailingStore;

impl VideoStore for FailingStore {
    fn get(&self, _id: &str) -> Result<Option<VideoRecord>> {
        Ok(None)
    }

    fn put(&self, _record: VideoRecord) -> Result<()> {
        Err(IngestError::Storage("disk full".to_string()))
    }

    fn insert(&self, _record: VideoRecord) -> Result<()> {
        Err(IngestError::Storage("disk full".to_string()))
    }

    fn delete(&self, id: &str) -> Result<VideoRecord> {
        Err(IngestError::NotFound(id.to_string()))
    }

    fn list_all(&self) -> Result<Vec<VideoRecord>> {
        Ok(Vec::new())
    }

    fn update(
        &self,
        id: &str,
        _change: &mut dyn FnMut(&mut VideoRecord),
    ) -> Result<VideoRecord> {
        Err(IngestError::NotFound(id.to_string()))
    }
}

/// Behaves as if another process stored the same id between the pipeline's
/// lookup and its insert.
struct RacingStore {
    inner: JsonVideoStore,
}

impl VideoStore for RacingStore {
    fn get(&self, id: &str) -> Result<Option<VideoRecord>> {
        self.inner.get(id)
    }

    fn put(&self, record: VideoRecord) -> Result<()> {
        self.inner.put(record)
    }

    fn insert(&self, record: VideoRecord) -> Result<()> {
        let id = record.id.clone();
        self.inner.put(record)?;
        Err(IngestError::Conflict(format!("video {id} already exists")))
    }

    fn delete(&self, id: &str) -> Result<VideoRecord> {
        self.inner.delete(id)
    }

    fn list_all(&self) -> Result<Vec<VideoRecord>> {
        self.inner.list_all()
    }

    fn update(
        &self,
        id: &str,
        change: &mut dyn FnMut(&mut VideoRecord),
    ) -> Result<VideoRecord> {
        self.inner.update(id, change)
    }
}

fn pipeline_with_store(root: &Path, store: Arc<dyn VideoStore>) -> RegistrationPipeline {
    let config = Config::default();
    RegistrationPipeline::new(
        RepoLayout::new(root, &config),
        store,
        Arc::new(FakeInspector::new(120.0)),
        Arc::new(FakeGenerator::new()),
        AssetSettings::from(&config),
    )
}

/// A store failure after the assets were generated removes those assets.
#[test]
fn test_store_failure_discards_assets() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.mp4");
    fs::write(&path, "video-a").unwrap();
    let id = compute_id(&path).unwrap();
    let layout = RepoLayout::new(dir.path(), &Config::default());

    let pipeline = pipeline_with_store(dir.path(), Arc::new(FailingStore));
    let err = pipeline.register(&path).unwrap_err();

    assert!(matches!(err, IngestError::Storage(_)));
    assert!(!layout.thumbnail_file(&id).exists());
    assert!(!layout.preview_file(&id).exists());
}

/// Losing the insert race returns the winner's record and leaves the shared
/// asset files alone.
#[test]
fn test_lost_insert_race_keeps_stored_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.mp4");
    fs::write(&path, "video-a").unwrap();
    let id = compute_id(&path).unwrap();
    let layout = RepoLayout::new(dir.path(), &Config::default());
    let store = Arc::new(RacingStore {
        inner: JsonVideoStore::new(layout.records_file()),
    });

    let pipeline = pipeline_with_store(dir.path(), store.clone());
    let outcome = pipeline.register(&path).unwrap();

    let RegistrationOutcome::Unchanged(record) = &outcome else {
        panic!("expected the stored record, got {outcome:?}");
    };
    assert_eq!(record.id, id);
    assert_eq!(store.list_all().unwrap().len(), 1);
    assert!(layout.thumbnail_file(&id).is_file());
    assert!(layout.preview_file(&id).is_file());
}

/// A batch keeps going past a failing file and reports every item.
#[test]
fn test_batch_register_continues_past_failures() {
    let fx = Fixture::new(60.0, FakeGenerator::new());
    fx.video("a.mp4", "a");
    fx.video("broken.mp4", "b");
    fx.video("nested/c.mkv", "c");
    fx.video("notes.txt", "not a video");

    let videos = fx.repo.scan();
    assert_eq!(videos.len(), 3);

    let shutdown = Arc::new(AtomicBool::new(false));
    let run = fx
        .repo
        .batch(shutdown)
        .register_all(Arc::clone(fx.repo.pipeline()), videos)
        .unwrap();
    let items: Vec<_> = run.collect();

    assert_eq!(items.len(), 3);
    let failed: Vec<_> = items.iter().filter(|i| i.result.is_err()).collect();
    assert_eq!(failed.len(), 1);
    assert!(failed[0].path.ends_with("broken.mp4"));

    let mut paths: Vec<String> = fx
        .repo
        .store()
        .list_all()
        .unwrap()
        .into_iter()
        .map(|r| r.file_path)
        .collect();
    paths.sort();
    assert_eq!(paths, vec!["a.mp4", "nested/c.mkv"]);
}

/// Generated assets inside the metadata directory are never picked up as
/// source videos.
#[test]
fn test_scan_skips_repository_directory() {
    let fx = Fixture::new(60.0, FakeGenerator::new());
    let path = fx.video("a.webm", "a");
    fx.repo.pipeline().register(&path).unwrap();

    assert_eq!(fx.repo.scan(), vec![path]);
}

/// Unregistering removes the record and every derived file.
#[test]
fn test_unregister_removes_everything() {
    let fx = Fixture::new(120.0, FakeGenerator::new());
    let path = fx.video("clip.mp4", "video-a");
    let record = fx.repo.pipeline().register(&path).unwrap().into_record();
    let id = record.id.clone();

    fx.repo.markers().add(&id, Cue::new(5.0, "Start")).unwrap();
    fx.repo
        .chapters()
        .update(&id, vec![Cue::new(0.0, "Opening")])
        .unwrap();
    fx.repo.storyboards().build(&path, false).unwrap();

    let layout = fx.repo.layout();
    assert!(layout.markers_file(&id).is_file());
    assert!(layout.chapters_file(&id).is_file());
    assert!(layout.storyboard_manifest(&id).is_file());

    let removed = fx.repo.pipeline().unregister(&id).unwrap();
    assert_eq!(removed.id, id);
    assert!(!layout.thumbnail_file(&id).exists());
    assert!(!layout.preview_file(&id).exists());
    assert!(!layout.storyboard_dir(&id).exists());
    assert!(!layout.markers_file(&id).exists());
    assert!(!layout.chapters_file(&id).exists());
    assert!(fx.repo.store().get(&id).unwrap().is_none());

    assert!(matches!(
        fx.repo.pipeline().unregister(&id),
        Err(IngestError::NotFound(_))
    ));
    // The source file itself is left alone.
    assert!(path.is_file());
}

#[test]
fn test_unregister_by_path_and_bad_id() {
    let fx = Fixture::new(120.0, FakeGenerator::new());
    let path = fx.video("clip.mp4", "video-a");
    fx.repo.pipeline().register(&path).unwrap();

    let removed = fx.repo.pipeline().unregister_path(&path).unwrap();
    assert_eq!(removed.file_path, "clip.mp4");
    assert!(fx.repo.store().list_all().unwrap().is_empty());

    assert!(matches!(
        fx.repo.pipeline().unregister("../../etc"),
        Err(IngestError::NotFound(_))
    ));
}

/// A video whose source file is gone can still be unregistered by its id,
/// though no longer by its path.
#[test]
fn test_unregister_after_source_deleted() {
    let fx = Fixture::new(120.0, FakeGenerator::new());
    let path = fx.video("clip.mp4", "video-a");
    let id = compute_id(&path).unwrap();
    fx.repo.pipeline().register(&path).unwrap();
    fs::remove_file(&path).unwrap();

    assert!(matches!(
        fx.repo.pipeline().unregister_path(&path),
        Err(IngestError::Hash { .. })
    ));

    let listed = fx.repo.store().list_all().unwrap();
    assert_eq!(listed.len(), 1);
    let removed = fx.repo.pipeline().unregister(&listed[0].id).unwrap();
    assert_eq!(removed.id, id);
    assert!(!fx.repo.layout().thumbnail_file(&id).exists());
    assert!(fx.repo.store().list_all().unwrap().is_empty());
}

/// Record edits go through the store and survive re-registration.
#[test]
fn test_record_edits_persist() {
    let fx = Fixture::new(120.0, FakeGenerator::new());
    let path = fx.video("clip.mp4", "video-a");
    let id = fx.repo.pipeline().register(&path).unwrap().into_record().id;

    let store = fx.repo.store();
    assert!(store.add_tag(&id, "Holiday").unwrap());
    store.set_rating(&id, 4.0).unwrap();
    assert_eq!(store.increment_views(&id).unwrap(), 1);

    let again = fx.repo.pipeline().register(&path).unwrap().into_record();
    assert_eq!(again.tags, vec!["Holiday"]);
    assert_eq!(again.rating, 4.0);
    assert_eq!(again.views, 1);
}
