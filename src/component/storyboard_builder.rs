use crate::component::asset_generator::{AssetGenerator, StoryboardParams};
use crate::config::{KeyframeStrategy, RepoLayout, StoryboardSettings};
use crate::cue::{MANIFEST_FILE_NAME, StoryboardManifest, TileGrid};
use crate::error::{IngestError, Result};
use crate::tools::{
    IdLocks, MediaInspector, absolutize, compute_id, discard_dir, is_valid_id, write_atomic,
};
use log::{debug, info};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

/// Result of a storyboard request.
#[derive(Debug, Clone, PartialEq)]
pub enum StoryboardOutcome {
    Created(StoryboardManifest),
    /// A manifest was already on disk and regeneration was not forced.
    AlreadyExists,
}

/// Builds sprite sheets and the `thumbnails.vtt` manifest for a video under
/// `storyboards/<id>/`.
pub struct StoryboardBuilder {
    layout: RepoLayout,
    inspector: Arc<dyn MediaInspector>,
    generator: Arc<dyn AssetGenerator>,
    grid: TileGrid,
    strategy: KeyframeStrategy,
    max_tiles: usize,
    url_prefix: String,
    locks: Arc<IdLocks>,
}

impl StoryboardBuilder {
    pub fn new(
        layout: RepoLayout,
        inspector: Arc<dyn MediaInspector>,
        generator: Arc<dyn AssetGenerator>,
        settings: &StoryboardSettings,
    ) -> Result<Self> {
        let grid = TileGrid::new(
            settings.grid_columns,
            settings.grid_rows,
            settings.tile_width,
            settings.tile_height,
        )?;

        Ok(Self {
            layout,
            inspector,
            generator,
            grid,
            strategy: settings.strategy,
            max_tiles: settings.max_tiles.max(1),
            url_prefix: settings.url_prefix.clone(),
            locks: Arc::new(IdLocks::new()),
        })
    }

    #[must_use]
    pub fn with_locks(mut self, locks: Arc<IdLocks>) -> Self {
        self.locks = locks;
        self
    }

    /// Generates the storyboard of `path`, or does nothing when its manifest
    /// already exists and `force` is off.
    pub fn build(&self, path: &Path, force: bool) -> Result<StoryboardOutcome> {
        let path = absolutize(path)?;
        let id = compute_id(&path)?;

        let _guard = self.locks.acquire(&id);
        let manifest_path = self.layout.storyboard_manifest(&id);
        if manifest_path.exists() && !force {
            debug!("Storyboard for {id} already exists");
            return Ok(StoryboardOutcome::AlreadyExists);
        }

        let info = self.inspector.inspect(&path)?;
        let staging_dir = self.layout.storyboard_staging_dir(&id);
        let params = StoryboardParams {
            grid: self.grid,
            strategy: self.strategy,
            max_tiles: self.max_tiles,
            duration: info.duration,
        };

        // A failed rebuild leaves the published storyboard untouched; a
        // finished one replaces it whole.
        discard_dir(&staging_dir);
        let manifest = self
            .generator
            .generate_storyboard(&path, &staging_dir, 0.0, &params)
            .map(|times| {
                StoryboardManifest::new(&id, self.grid, &self.url_prefix, &times, info.duration)
            })
            .and_then(|manifest| {
                write_atomic(
                    &staging_dir.join(MANIFEST_FILE_NAME),
                    manifest.encode().as_bytes(),
                )?;
                publish(&staging_dir, &self.layout.storyboard_dir(&id))?;
                Ok(manifest)
            });

        match manifest {
            Ok(manifest) => {
                info!(
                    "Storyboard for {}: {} tiles on {} sheets",
                    path.display(),
                    manifest.tiles().len(),
                    manifest.sheet_count()
                );
                Ok(StoryboardOutcome::Created(manifest))
            }
            Err(e) => {
                discard_dir(&staging_dir);
                Err(e)
            }
        }
    }

    /// Loads the stored manifest of a video, if any.
    pub fn read_manifest(&self, id: &str, duration: f64) -> Result<Option<StoryboardManifest>> {
        if !is_valid_id(id) {
            return Err(IngestError::NotFound(format!("video {id}")));
        }

        let path = self.layout.storyboard_manifest(id);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(IngestError::io(&path, e)),
        };

        StoryboardManifest::decode(&text, id, self.grid, &self.url_prefix, duration).map(Some)
    }
}

/// Replaces `target` with the finished `staging` directory.
fn publish(staging: &Path, target: &Path) -> Result<()> {
    discard_dir(target);
    fs::rename(staging, target).map_err(|e| IngestError::io(target, e))
}
