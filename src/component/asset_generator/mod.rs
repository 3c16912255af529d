//! Thumbnail, preview clip and storyboard sprite-sheet generation.

mod ffmpeg_command;
mod frame_extractor;
mod generator;
mod keyframe_probe;
mod scene_detector;
mod sprite_merger;
mod timestamp_selector;

pub use generator::{
    AssetGenerator, AssetOutcome, FfmpegAssetGenerator, PreviewParams, StoryboardParams,
    ThumbnailParams,
};
