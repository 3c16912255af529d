use super::frame_extractor::{
    create_frame_tasks, extract_frame, extract_frames_parallel, scale_filter, tile_filter,
};
use super::keyframe_probe::probe_keyframe_times;
use super::scene_detector::detect_scene_changes;
use super::sprite_merger::merge_sheet;
use super::timestamp_selector::{
    finalize_timestamps, sample_count, select_scene_timestamps, select_uniform_timestamps,
};
use super::ffmpeg_command::FfmpegCommand;
use crate::config::KeyframeStrategy;
use crate::cue::{TileGrid, sheet_file_name};
use crate::error::{IngestError, Result};
use crate::tools::{ToolPaths, discard_dir, discard_file, ensure_directory_exists};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// Whether a generate call produced new output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetOutcome {
    Created,
    /// Output was already on disk and regeneration was not requested.
    AlreadyPresent,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThumbnailParams {
    pub width: u32,
    pub overwrite: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewParams {
    pub seconds: f64,
    pub width: u32,
    pub overwrite: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoryboardParams {
    pub grid: TileGrid,
    pub strategy: KeyframeStrategy,
    pub max_tiles: usize,
    /// Duration of the source, used by the sampling strategies.
    pub duration: f64,
}

/// Produces the derived visual assets of a video.
///
/// Output directories are created on demand. Nothing is retried; a failure is
/// returned as is and cleanup is the caller's business.
pub trait AssetGenerator: Send + Sync {
    /// A single still frame at `offset` seconds.
    fn generate_thumbnail(
        &self,
        source: &Path,
        output: &Path,
        offset: f64,
        params: &ThumbnailParams,
    ) -> Result<AssetOutcome>;

    /// A short silent clip starting at `offset` seconds.
    fn generate_preview(
        &self,
        source: &Path,
        output: &Path,
        offset: f64,
        params: &PreviewParams,
    ) -> Result<AssetOutcome>;

    /// Samples keyframes at or after `offset`, packs them into sprite sheets
    /// named `thumb_L0_%03d.jpg` inside `output_dir`, and returns the
    /// keyframe timestamps used, in order.
    fn generate_storyboard(
        &self,
        source: &Path,
        output_dir: &Path,
        offset: f64,
        params: &StoryboardParams,
    ) -> Result<Vec<f64>>;
}

/// [`AssetGenerator`] running ffmpeg and ffprobe subprocesses.
#[derive(Debug, Clone)]
pub struct FfmpegAssetGenerator {
    tools: ToolPaths,
}

impl FfmpegAssetGenerator {
    #[must_use]
    pub const fn new(tools: ToolPaths) -> Self {
        Self { tools }
    }

    fn select_timestamps(
        &self,
        source: &Path,
        offset: f64,
        params: &StoryboardParams,
    ) -> Result<Vec<f64>> {
        let count = sample_count(params.duration, params.max_tiles);
        let candidates = match params.strategy {
            KeyframeStrategy::Keyframes => probe_keyframe_times(&self.tools.ffprobe, source)?,
            KeyframeStrategy::Uniform => select_uniform_timestamps(params.duration, count),
            KeyframeStrategy::Scene => {
                let scenes = detect_scene_changes(&self.tools.ffmpeg, source, params.duration)?;
                select_scene_timestamps(params.duration, &scenes, count)
            }
        };
        Ok(finalize_timestamps(candidates, offset, params.max_tiles))
    }

    fn build_sheets(
        &self,
        source: &Path,
        output_dir: &Path,
        timestamps: &[f64],
        grid: TileGrid,
    ) -> Result<()> {
        let frames_dir = output_dir.join("keyframes");
        ensure_directory_exists(&frames_dir)?;

        let tasks = create_frame_tasks(timestamps, &frames_dir);
        let filter = tile_filter(grid.tile_width(), grid.tile_height());
        extract_frames_parallel(&self.tools.ffmpeg, source, &tasks, &filter)?;

        let frames: Vec<PathBuf> = tasks.into_iter().map(|t| t.output_path).collect();
        for (sheet_index, chunk) in frames.chunks(grid.tiles_per_sheet()).enumerate() {
            let sheet = output_dir.join(sheet_file_name(sheet_index));
            merge_sheet(&self.tools.ffmpeg, chunk, &sheet, grid)?;
        }
        Ok(())
    }
}

/// Sibling path ffmpeg writes to before the result is moved into place, so
/// an interrupted run never leaves something that looks finished.
fn partial_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map_or_else(|| "asset".to_string(), |n| n.to_string_lossy().to_string());
    output.with_file_name(format!(".partial.{name}"))
}

fn finish_partial(partial: &Path, output: &Path, result: Result<()>) -> Result<AssetOutcome> {
    if let Err(e) = result {
        discard_file(partial);
        return Err(e);
    }
    fs::rename(partial, output).map_err(|e| {
        discard_file(partial);
        IngestError::io(output, e)
    })?;
    Ok(AssetOutcome::Created)
}

fn prepare_output(output: &Path, overwrite: bool) -> Result<Option<AssetOutcome>> {
    if output.exists() && !overwrite {
        debug!("Keeping existing {}", output.display());
        return Ok(Some(AssetOutcome::AlreadyPresent));
    }
    if let Some(parent) = output.parent() {
        ensure_directory_exists(parent)?;
    }
    Ok(None)
}

impl AssetGenerator for FfmpegAssetGenerator {
    fn generate_thumbnail(
        &self,
        source: &Path,
        output: &Path,
        offset: f64,
        params: &ThumbnailParams,
    ) -> Result<AssetOutcome> {
        if let Some(outcome) = prepare_output(output, params.overwrite)? {
            return Ok(outcome);
        }

        let partial = partial_path(output);
        let result = extract_frame(
            &self.tools.ffmpeg,
            source,
            offset,
            &partial,
            &scale_filter(params.width),
        );
        finish_partial(&partial, output, result)
    }

    fn generate_preview(
        &self,
        source: &Path,
        output: &Path,
        offset: f64,
        params: &PreviewParams,
    ) -> Result<AssetOutcome> {
        if let Some(outcome) = prepare_output(output, params.overwrite)? {
            return Ok(outcome);
        }

        let partial = partial_path(output);
        let result = FfmpegCommand::ffmpeg(&self.tools.ffmpeg, source)
            .input_at(offset)
            .arg("-t")
            .arg(format!("{:.3}", params.seconds.max(0.1)))
            .args([
                "-map", "0:v:0", "-an", "-sn", "-dn", "-vf",
                scale_filter(params.width).as_str(),
                "-c:v", "libvpx-vp9", "-deadline", "realtime", "-cpu-used", "8",
                "-b:v", "0", "-crf", "40", "-f", "webm", "-y",
            ])
            .arg(&partial)
            .run_producing(&partial);
        finish_partial(&partial, output, result)
    }

    fn generate_storyboard(
        &self,
        source: &Path,
        output_dir: &Path,
        offset: f64,
        params: &StoryboardParams,
    ) -> Result<Vec<f64>> {
        let timestamps = self.select_timestamps(source, offset, params)?;
        if timestamps.is_empty() {
            return Err(IngestError::media(source, "no keyframes found"));
        }

        ensure_directory_exists(output_dir)?;
        let result = self.build_sheets(source, output_dir, &timestamps, params.grid);
        discard_dir(&output_dir.join("keyframes"));
        result?;

        info!(
            "Storyboard for {}: {} tiles",
            source.display(),
            timestamps.len()
        );
        Ok(timestamps)
    }
}
