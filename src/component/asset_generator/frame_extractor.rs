use super::ffmpeg_command::FfmpegCommand;
use crate::error::Result;
use log::error;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// One frame to grab.
#[derive(Debug, Clone)]
pub struct FrameTask {
    pub timestamp: f64,
    pub output_path: PathBuf,
    pub index: usize,
}

/// Scale to `width`, keeping the aspect ratio with an even height.
#[must_use]
pub fn scale_filter(width: u32) -> String {
    format!("scale={width}:-2")
}

/// Fit inside `width`x`height`, padding the rest with black.
#[must_use]
pub fn tile_filter(width: u32, height: u32) -> String {
    format!(
        "scale={width}:{height}:force_original_aspect_ratio=decrease,pad={width}:{height}:(ow-iw)/2:(oh-ih)/2:black"
    )
}

/// Grabs a single frame at `timestamp` into `output_path` as a JPEG.
pub fn extract_frame(
    ffmpeg: &Path,
    source: &Path,
    timestamp: f64,
    output_path: &Path,
    filter: &str,
) -> Result<()> {
    FfmpegCommand::ffmpeg(ffmpeg, source)
        .input_at(timestamp)
        .args([
            "-frames:v", "1", "-an", "-sn", "-dn", "-threads", "1", "-vf", filter, "-q:v", "2",
            "-f", "image2", "-y",
        ])
        .arg(output_path)
        .run_producing(output_path)
}

/// Extracts every task in parallel, one single-threaded ffmpeg per task.
/// Fails with the first error encountered.
pub fn extract_frames_parallel(
    ffmpeg: &Path,
    source: &Path,
    tasks: &[FrameTask],
    filter: &str,
) -> Result<()> {
    tasks.par_iter().try_for_each(|task| {
        extract_frame(ffmpeg, source, task.timestamp, &task.output_path, filter).inspect_err(|e| {
            error!("Frame {} at {:.3}s failed: {e}", task.index, task.timestamp);
        })
    })
}

#[must_use]
pub fn create_frame_tasks(timestamps: &[f64], output_dir: &Path) -> Vec<FrameTask> {
    timestamps
        .iter()
        .enumerate()
        .map(|(i, &timestamp)| FrameTask {
            timestamp,
            output_path: output_dir.join(format!("frame_{i:04}.jpg")),
            index: i,
        })
        .collect()
}
