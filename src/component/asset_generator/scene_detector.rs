use super::ffmpeg_command::FfmpegCommand;
use crate::error::{IngestError, Result};
use log::debug;
use regex::Regex;
use std::path::Path;

/// Scene detection parameters.
#[derive(Debug, Clone)]
pub struct SceneDetectorConfig {
    /// scdet threshold (0-100); lower is more sensitive.
    pub threshold: f64,
    /// Frames per second actually analysed.
    pub analyze_fps: f64,
    pub scale_width: u32,
}

impl SceneDetectorConfig {
    /// Lowers the analysis rate for long videos.
    #[must_use]
    pub fn for_duration(duration: f64) -> Self {
        let analyze_fps = if duration > 7200.0 {
            0.5
        } else if duration > 3600.0 {
            1.0
        } else {
            2.0
        };

        Self {
            threshold: 12.0,
            analyze_fps,
            scale_width: 320,
        }
    }
}

/// Scene-change timestamps found by ffmpeg's `scdet` filter.
pub fn detect_scene_changes(ffmpeg: &Path, source: &Path, duration: f64) -> Result<Vec<f64>> {
    let config = SceneDetectorConfig::for_duration(duration);
    debug!("Scene detection for {}: {config:?}", source.display());

    let filter = format!(
        "scale={}:-1,fps={},scdet=s=1:t={}",
        config.scale_width, config.analyze_fps, config.threshold
    );

    // scdet reports on stderr, so the log level has to stay at info.
    let output = FfmpegCommand::bare(ffmpeg, source)
        .args(["-hide_banner", "-nostdin"])
        .input()
        .args(["-an", "-sn", "-dn", "-threads", "1", "-vf", filter.as_str(), "-f", "null", "-"])
        .output()?;

    parse_scdet_output(&String::from_utf8_lossy(&output.stderr), duration)
        .map_err(|e| IngestError::media(source, e.to_string()))
}

fn parse_scdet_output(output: &str, duration: f64) -> std::result::Result<Vec<f64>, regex::Error> {
    let scd_time = Regex::new(r"lavfi\.scd\.time[=:]\s*([0-9.]+)")?;
    let short_time = Regex::new(r"\bt:([0-9.]+)")?;

    let mut scenes: Vec<f64> = output
        .lines()
        .filter_map(|line| {
            scd_time
                .captures(line)
                .or_else(|| short_time.captures(line))
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<f64>().ok())
                .filter(|&t| t > 0.0 && t < duration)
        })
        .collect();

    scenes.sort_by(f64::total_cmp);
    scenes.dedup_by(|a, b| (*a - *b).abs() < 0.1);
    Ok(scenes)
}
