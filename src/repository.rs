use crate::component::annotations::{ChapterStore, MarkerStore};
use crate::component::asset_generator::{AssetGenerator, FfmpegAssetGenerator};
use crate::component::batch::BatchOrchestrator;
use crate::component::registration::{AssetSettings, RegistrationPipeline};
use crate::component::storyboard_builder::StoryboardBuilder;
use crate::config::{Config, RepoLayout};
use crate::error::Result;
use crate::storage::{JsonVideoStore, VideoStore};
use crate::tools::{
    FfprobeInspector, IdLocks, MediaInspector, ToolPaths, absolutize, scan_video_files,
    validate_directory_exists,
};
use log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Everything needed to ingest into one repository root, wired together.
pub struct Repository {
    config: Config,
    layout: RepoLayout,
    store: Arc<JsonVideoStore>,
    pipeline: Arc<RegistrationPipeline>,
    storyboards: Arc<StoryboardBuilder>,
    markers: MarkerStore,
    chapters: ChapterStore,
}

impl Repository {
    /// Opens `root` with its stored settings and the ffmpeg/ffprobe binaries
    /// they point at (or the ones on `PATH`).
    pub fn open(root: &Path) -> Result<Self> {
        let root = absolutize(root)?;
        validate_directory_exists(&root)?;
        let config = Config::load(&root)?;

        let tools = ToolPaths::locate(config.ffmpeg_path.as_deref(), config.ffprobe_path.as_deref())?;
        let inspector = Arc::new(FfprobeInspector::new(&tools.ffprobe));
        let generator = Arc::new(FfmpegAssetGenerator::new(tools));

        Self::with_media(&root, config, inspector, generator)
    }

    /// Opens `root` with the given media backends.
    pub fn with_media(
        root: &Path,
        config: Config,
        inspector: Arc<dyn MediaInspector>,
        generator: Arc<dyn AssetGenerator>,
    ) -> Result<Self> {
        let root = absolutize(root)?;
        let layout = RepoLayout::new(&root, &config);
        let store = Arc::new(JsonVideoStore::new(layout.records_file()));
        let dyn_store: Arc<dyn VideoStore> = store.clone();
        // One lock set for every component that writes files named by id.
        let locks = Arc::new(IdLocks::new());

        let pipeline = RegistrationPipeline::new(
            layout.clone(),
            dyn_store,
            Arc::clone(&inspector),
            Arc::clone(&generator),
            AssetSettings::from(&config),
        )
        .with_locks(Arc::clone(&locks));
        let storyboards =
            StoryboardBuilder::new(layout.clone(), inspector, generator, &config.storyboard)?
                .with_locks(Arc::clone(&locks));

        info!("Repository at {}", root.display());
        Ok(Self {
            markers: MarkerStore::new(layout.clone()).with_locks(Arc::clone(&locks)),
            chapters: ChapterStore::new(layout.clone()).with_locks(locks),
            config,
            layout,
            store,
            pipeline: Arc::new(pipeline),
            storyboards: Arc::new(storyboards),
        })
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub const fn layout(&self) -> &RepoLayout {
        &self.layout
    }

    #[must_use]
    pub const fn store(&self) -> &Arc<JsonVideoStore> {
        &self.store
    }

    #[must_use]
    pub const fn pipeline(&self) -> &Arc<RegistrationPipeline> {
        &self.pipeline
    }

    #[must_use]
    pub const fn storyboards(&self) -> &Arc<StoryboardBuilder> {
        &self.storyboards
    }

    #[must_use]
    pub const fn markers(&self) -> &MarkerStore {
        &self.markers
    }

    #[must_use]
    pub const fn chapters(&self) -> &ChapterStore {
        &self.chapters
    }

    /// Video files under the root, sorted, excluding the metadata directory.
    #[must_use]
    pub fn scan(&self) -> Vec<PathBuf> {
        scan_video_files(
            self.layout.root(),
            &self.layout.repo_dir(),
            &self.config.video_extensions,
        )
    }

    /// A batch runner sized by the configured worker count.
    #[must_use]
    pub fn batch(&self, shutdown: Arc<AtomicBool>) -> BatchOrchestrator {
        BatchOrchestrator::new(self.config.worker_count(), shutdown)
    }
}
