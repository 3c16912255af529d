use super::outcome::RegistrationOutcome;
use crate::component::asset_generator::{AssetGenerator, PreviewParams, ThumbnailParams};
use crate::config::{Config, RepoLayout};
use crate::error::{IngestError, Result};
use crate::storage::{VideoRecord, VideoStore, VideoStoreExt};
use crate::tools::{
    IdLocks, MediaInfo, MediaInspector, absolutize, compute_id, discard_dir, discard_file,
    is_valid_id, make_relative, resolve_relative,
};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Behaviour switches of [`RegistrationPipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationOptions {
    /// Update the stored path when known content shows up somewhere else.
    /// When off, the existing record is returned untouched.
    pub detect_moves: bool,
    /// Title new records after the file stem. When off, the repository
    /// relative path is used.
    pub title_from_filename: bool,
}

impl Default for RegistrationOptions {
    fn default() -> Self {
        Self {
            detect_moves: true,
            title_from_filename: true,
        }
    }
}

/// Asset parameters used for new registrations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssetSettings {
    pub thumbnail_width: u32,
    pub preview_seconds: f64,
    pub preview_width: u32,
}

impl From<&Config> for AssetSettings {
    fn from(config: &Config) -> Self {
        Self {
            thumbnail_width: config.thumbnail_width,
            preview_seconds: config.preview_seconds,
            preview_width: config.preview_width,
        }
    }
}

/// Asset files created for one registration attempt.
struct GeneratedAssets {
    thumbnail: PathBuf,
    preview: PathBuf,
}

impl GeneratedAssets {
    fn discard(&self) {
        discard_file(&self.thumbnail);
        discard_file(&self.preview);
    }
}

/// Turns a video file into a stored [`VideoRecord`]:
/// hash, dedup check, inspect, generate assets, relativize, persist.
///
/// Registration is idempotent and, within one process, exactly-once per
/// content id: the whole sequence runs under a per-id lock.
pub struct RegistrationPipeline {
    layout: RepoLayout,
    store: Arc<dyn VideoStore>,
    inspector: Arc<dyn MediaInspector>,
    generator: Arc<dyn AssetGenerator>,
    assets: AssetSettings,
    options: RegistrationOptions,
    locks: Arc<IdLocks>,
}

impl RegistrationPipeline {
    pub fn new(
        layout: RepoLayout,
        store: Arc<dyn VideoStore>,
        inspector: Arc<dyn MediaInspector>,
        generator: Arc<dyn AssetGenerator>,
        assets: AssetSettings,
    ) -> Self {
        Self {
            layout,
            store,
            inspector,
            generator,
            assets,
            options: RegistrationOptions::default(),
            locks: Arc::new(IdLocks::new()),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: RegistrationOptions) -> Self {
        self.options = options;
        self
    }

    /// Shares per-id locks with the other components writing under the same
    /// storage root.
    #[must_use]
    pub fn with_locks(mut self, locks: Arc<IdLocks>) -> Self {
        self.locks = locks;
        self
    }

    #[must_use]
    pub const fn layout(&self) -> &RepoLayout {
        &self.layout
    }

    pub fn register(&self, path: &Path) -> Result<RegistrationOutcome> {
        let path = absolutize(path)?;
        let id = compute_id(&path)?;
        let relative = make_relative(self.layout.root(), &path);

        let _guard = self.locks.acquire(&id);

        if let Some(existing) = self.store.get(&id)? {
            return self.reconcile(existing, relative?);
        }

        let info = self.inspector.inspect(&path)?;
        let assets = self.generate_assets(&path, &id, &info)?;

        let record = match self.assemble(&path, &id, relative, &info, &assets) {
            Ok(record) => record,
            Err(e) => {
                assets.discard();
                return Err(e);
            }
        };

        self.persist(record, &assets)
    }

    fn reconcile(&self, existing: VideoRecord, relative: String) -> Result<RegistrationOutcome> {
        if existing.file_path == relative || !self.options.detect_moves {
            debug!("{} already registered as {}", relative, existing.id);
            return Ok(RegistrationOutcome::Unchanged(existing));
        }

        let record = self.store.update_file_path(&existing.id, &relative)?;
        info!(
            "Video {} moved: {} -> {}",
            record.id, existing.file_path, record.file_path
        );
        Ok(RegistrationOutcome::Moved {
            record,
            previous_path: existing.file_path,
        })
    }

    /// Thumbnail then preview, both from the middle of the video. A failed
    /// preview takes the thumbnail down with it.
    fn generate_assets(&self, path: &Path, id: &str, info: &MediaInfo) -> Result<GeneratedAssets> {
        let assets = GeneratedAssets {
            thumbnail: self.layout.thumbnail_file(id),
            preview: self.layout.preview_file(id),
        };

        let middle = info.duration / 2.0;
        self.generator.generate_thumbnail(
            path,
            &assets.thumbnail,
            middle,
            &ThumbnailParams {
                width: self.assets.thumbnail_width,
                overwrite: false,
            },
        )?;

        let preview_offset = middle
            .min(info.duration - self.assets.preview_seconds)
            .max(0.0);
        let preview = self.generator.generate_preview(
            path,
            &assets.preview,
            preview_offset,
            &PreviewParams {
                seconds: self.assets.preview_seconds,
                width: self.assets.preview_width,
                overwrite: false,
            },
        );

        if let Err(e) = preview {
            discard_file(&assets.thumbnail);
            return Err(e);
        }
        Ok(assets)
    }

    fn assemble(
        &self,
        path: &Path,
        id: &str,
        relative: Result<String>,
        info: &MediaInfo,
        assets: &GeneratedAssets,
    ) -> Result<VideoRecord> {
        let file_path = relative?;
        let storage_root = self.layout.storage_root();
        let thumbnail_path = make_relative(storage_root, &assets.thumbnail)?;
        let preview_path = make_relative(storage_root, &assets.preview)?;

        let title = if self.options.title_from_filename {
            path.file_stem()
                .map_or_else(|| file_path.clone(), |s| s.to_string_lossy().to_string())
        } else {
            file_path.clone()
        };

        let mut record = VideoRecord::new(id.to_string(), title, file_path);
        record.duration_seconds = info.duration_seconds();
        record.resolution = info.resolution;
        record.codecs = info.codecs.clone();
        record.thumbnail_path = Some(thumbnail_path);
        record.preview_path = Some(preview_path);
        Ok(record)
    }

    fn persist(&self, record: VideoRecord, assets: &GeneratedAssets) -> Result<RegistrationOutcome> {
        match self.store.insert(record.clone()) {
            Ok(()) => {
                info!("Registered {} as {}", record.file_path, record.id);
                Ok(RegistrationOutcome::Registered(record))
            }
            // Someone else stored this id first. The asset files are named by
            // id, so they belong to that record now.
            Err(IngestError::Conflict(message)) => {
                warn!("{message}; keeping the stored record");
                self.store
                    .get(&record.id)?
                    .map(RegistrationOutcome::Unchanged)
                    .ok_or(IngestError::Conflict(message))
            }
            Err(e) => {
                assets.discard();
                Err(e)
            }
        }
    }

    /// Removes a record and every file derived from it. Missing files are
    /// fine; an unknown id is [`IngestError::NotFound`].
    pub fn unregister(&self, id: &str) -> Result<VideoRecord> {
        if !is_valid_id(id) {
            return Err(IngestError::NotFound(format!("video {id}")));
        }

        let _guard = self.locks.acquire(id);
        let record = self
            .store
            .get(id)?
            .ok_or_else(|| IngestError::NotFound(format!("video {id}")))?;

        let storage_root = self.layout.storage_root();
        for asset in [&record.thumbnail_path, &record.preview_path]
            .into_iter()
            .flatten()
        {
            discard_file(&resolve_relative(storage_root, asset));
        }
        discard_dir(&self.layout.storyboard_dir(id));
        discard_dir(&self.layout.storyboard_staging_dir(id));
        discard_file(&self.layout.markers_file(id));
        discard_file(&self.layout.chapters_file(id));

        let removed = self.store.delete(id)?;
        info!("Unregistered {} ({})", removed.file_path, removed.id);
        Ok(removed)
    }

    /// Hashes `path` and unregisters the matching record.
    pub fn unregister_path(&self, path: &Path) -> Result<VideoRecord> {
        let id = compute_id(path)?;
        self.unregister(&id)
    }
}
