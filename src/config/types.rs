use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Name of the per-repository metadata directory.
pub const REPO_DIR_NAME: &str = ".ova-repo";
pub const CONFIG_FILE_NAME: &str = "configs.json";

/// How storyboard keyframes are chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyframeStrategy {
    /// Timestamps of the encoded keyframes themselves.
    #[default]
    Keyframes,
    /// Evenly spaced samples.
    Uniform,
    /// Scene changes, topped up with evenly spaced samples.
    Scene,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoryboardSettings {
    pub grid_columns: u32,
    pub grid_rows: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub strategy: KeyframeStrategy,
    pub max_tiles: usize,
    /// URL prefix written into manifest cues, followed by `/<id>/<sheet>`.
    pub url_prefix: String,
}

impl Default for StoryboardSettings {
    fn default() -> Self {
        Self {
            grid_columns: 5,
            grid_rows: 5,
            tile_width: 160,
            tile_height: 90,
            strategy: KeyframeStrategy::default(),
            max_tiles: 250,
            url_prefix: "/api/v1/storyboards".to_string(),
        }
    }
}

/// Repository settings, stored as `<root>/.ova-repo/configs.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage root, relative to the repository root unless absolute.
    pub storage_dir: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ffmpeg_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ffprobe_path: Option<PathBuf>,
    pub video_extensions: Vec<String>,
    pub thumbnail_width: u32,
    pub preview_seconds: f64,
    pub preview_width: u32,
    /// Worker count; the host CPU count when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,
    pub storyboard: StoryboardSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(REPO_DIR_NAME).join("storage"),
            ffmpeg_path: None,
            ffprobe_path: None,
            video_extensions: ["mp4", "mkv", "webm", "mov", "avi", "m4v"]
                .into_iter()
                .map(String::from)
                .collect(),
            thumbnail_width: 320,
            preview_seconds: 4.0,
            preview_width: 320,
            concurrency: None,
            storyboard: StoryboardSettings::default(),
        }
    }
}
