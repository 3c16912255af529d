//! Fake media backends shared by the integration tests.

#![allow(dead_code)]

use media_ingest::Repository;
use media_ingest::component::asset_generator::{
    AssetGenerator, AssetOutcome, PreviewParams, StoryboardParams, ThumbnailParams,
};
use media_ingest::config::Config;
use media_ingest::cue::sheet_file_name;
use media_ingest::error::{IngestError, Result};
use media_ingest::storage::{Codecs, Resolution};
use media_ingest::tools::{MediaInfo, MediaInspector};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Reports a fixed duration for every file. Files whose name contains
/// "broken" fail like an unreadable container.
pub struct FakeInspector {
    pub duration: f64,
    pub calls: AtomicUsize,
}

impl FakeInspector {
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            calls: AtomicUsize::new(0),
        }
    }
}

impl MediaInspector for FakeInspector {
    fn inspect(&self, path: &Path) -> Result<MediaInfo> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if path.to_string_lossy().contains("broken") {
            return Err(IngestError::media(path, "no video stream"));
        }
        Ok(MediaInfo {
            duration: self.duration,
            resolution: Resolution {
                width: 1920,
                height: 1080,
            },
            codecs: Codecs {
                container: "video/mp4".to_string(),
                video_codec: "avc1.64001f".to_string(),
                audio_codec: "mp4a.40.2".to_string(),
            },
        })
    }
}

/// Writes placeholder files where ffmpeg would write real ones and records
/// what it was asked to do.
pub struct FakeGenerator {
    pub thumbnails: AtomicUsize,
    pub previews: AtomicUsize,
    pub storyboards: AtomicUsize,
    pub fail_preview: AtomicBool,
    pub fail_storyboard: AtomicBool,
    pub keyframes: Mutex<Vec<f64>>,
    pub offsets: Mutex<Vec<(&'static str, f64)>>,
    pub delay: Duration,
    pub storyboard_delay: Duration,
}

impl FakeGenerator {
    pub fn new() -> Self {
        Self::with_keyframes(vec![0.0])
    }

    pub fn with_keyframes(keyframes: Vec<f64>) -> Self {
        Self {
            thumbnails: AtomicUsize::new(0),
            previews: AtomicUsize::new(0),
            storyboards: AtomicUsize::new(0),
            fail_preview: AtomicBool::new(false),
            fail_storyboard: AtomicBool::new(false),
            keyframes: Mutex::new(keyframes),
            offsets: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
            storyboard_delay: Duration::ZERO,
        }
    }

    /// Delays every thumbnail.
    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Delays every storyboard after its directory is created.
    pub fn slow_storyboard(mut self, delay: Duration) -> Self {
        self.storyboard_delay = delay;
        self
    }

    pub fn set_keyframes(&self, keyframes: Vec<f64>) {
        *self.keyframes.lock().unwrap() = keyframes;
    }

    pub fn offset_of(&self, kind: &str) -> Option<f64> {
        self.offsets
            .lock()
            .unwrap()
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, offset)| *offset)
    }

    fn write(path: &Path, content: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| IngestError::io(parent, e))?;
        }
        fs::write(path, content).map_err(|e| IngestError::io(path, e))
    }
}

impl AssetGenerator for FakeGenerator {
    fn generate_thumbnail(
        &self,
        _source: &Path,
        output: &Path,
        offset: f64,
        _params: &ThumbnailParams,
    ) -> Result<AssetOutcome> {
        thread::sleep(self.delay);
        self.thumbnails.fetch_add(1, Ordering::SeqCst);
        self.offsets.lock().unwrap().push(("thumbnail", offset));
        Self::write(output, b"jpeg")?;
        Ok(AssetOutcome::Created)
    }

    fn generate_preview(
        &self,
        source: &Path,
        output: &Path,
        offset: f64,
        _params: &PreviewParams,
    ) -> Result<AssetOutcome> {
        self.previews.fetch_add(1, Ordering::SeqCst);
        self.offsets.lock().unwrap().push(("preview", offset));
        if self.fail_preview.load(Ordering::SeqCst) {
            return Err(IngestError::media(source, "encoder failed"));
        }
        Self::write(output, b"webm")?;
        Ok(AssetOutcome::Created)
    }

    fn generate_storyboard(
        &self,
        source: &Path,
        output_dir: &Path,
        _offset: f64,
        params: &StoryboardParams,
    ) -> Result<Vec<f64>> {
        self.storyboards.fetch_add(1, Ordering::SeqCst);
        fs::create_dir_all(output_dir).map_err(|e| IngestError::io(output_dir, e))?;
        thread::sleep(self.storyboard_delay);
        if self.fail_storyboard.load(Ordering::SeqCst) {
            return Err(IngestError::media(source, "no keyframes found"));
        }
        let keyframes = self.keyframes.lock().unwrap().clone();
        let sheets = keyframes.len().div_ceil(params.grid.tiles_per_sheet());
        for sheet in 0..sheets {
            Self::write(&output_dir.join(sheet_file_name(sheet)), b"sheet")?;
        }
        Ok(keyframes)
    }
}

pub struct Fixture {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
    pub inspector: Arc<FakeInspector>,
    pub generator: Arc<FakeGenerator>,
}

impl Fixture {
    pub fn new(duration: f64, generator: FakeGenerator) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let inspector = Arc::new(FakeInspector::new(duration));
        let generator = Arc::new(generator);
        let repo = Repository::with_media(
            dir.path(),
            Config::default(),
            Arc::clone(&inspector) as Arc<dyn MediaInspector>,
            Arc::clone(&generator) as Arc<dyn AssetGenerator>,
        )
        .unwrap();
        Self {
            dir,
            repo,
            inspector,
            generator,
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Writes a fake video at `relative` under the root.
    pub fn video(&self, relative: &str, content: &str) -> std::path::PathBuf {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }
}
