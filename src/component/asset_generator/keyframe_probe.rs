use super::ffmpeg_command::FfmpegCommand;
use crate::error::Result;
use log::debug;
use std::path::Path;

/// Presentation times of the keyframe packets in the first video stream.
pub fn probe_keyframe_times(ffprobe: &Path, source: &Path) -> Result<Vec<f64>> {
    let output = FfmpegCommand::bare(ffprobe, source)
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "packet=pts_time,flags",
            "-of",
            "csv=p=0",
        ])
        .arg(source)
        .output()?;

    let times = parse_packet_csv(&String::from_utf8_lossy(&output.stdout));
    debug!("{} keyframes in {}", times.len(), source.display());
    Ok(times)
}

/// Parses `pts_time,flags` lines, keeping packets whose flags carry `K`.
fn parse_packet_csv(csv: &str) -> Vec<f64> {
    let mut times: Vec<f64> = csv
        .lines()
        .filter_map(|line| {
            let mut fields = line.trim().split(',');
            let pts_time = fields.next()?.trim();
            let flags = fields.next()?.trim();
            if !flags.contains('K') {
                return None;
            }
            pts_time.parse::<f64>().ok().filter(|t| t.is_finite())
        })
        .collect();

    // Packets come in decode order.
    times.sort_by(f64::total_cmp);
    times
}
