use crate::error::{IngestError, Result};
use crate::storage::{Codecs, Resolution};
use log::debug;
use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Technical metadata of one video file.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    /// Exact duration in seconds as reported by the probe.
    pub duration: f64,
    pub resolution: Resolution,
    pub codecs: Codecs,
}

impl MediaInfo {
    /// Whole seconds, truncated.
    #[must_use]
    pub fn duration_seconds(&self) -> u64 {
        self.duration.max(0.0) as u64
    }
}

/// Obtains duration, resolution and codec strings for a file.
pub trait MediaInspector: Send + Sync {
    fn inspect(&self, path: &Path) -> Result<MediaInfo>;
}

/// [`MediaInspector`] backed by an `ffprobe` subprocess.
#[derive(Debug, Clone)]
pub struct FfprobeInspector {
    ffprobe: PathBuf,
}

#[derive(Deserialize)]
struct FfprobeOutput {
    format: Option<FormatInfo>,
    streams: Option<Vec<StreamInfo>>,
}

#[derive(Deserialize)]
struct FormatInfo {
    format_name: Option<String>,
    duration: Option<String>,
}

#[derive(Deserialize)]
struct StreamInfo {
    codec_type: Option<String>,
    codec_name: Option<String>,
    codec_tag_string: Option<String>,
    profile: Option<String>,
    level: Option<i32>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

impl FfprobeInspector {
    #[must_use]
    pub fn new(ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe: ffprobe.into(),
        }
    }
}

impl MediaInspector for FfprobeInspector {
    fn inspect(&self, path: &Path) -> Result<MediaInfo> {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .map_err(|e| spawn_error(&self.ffprobe, path, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(IngestError::media(
                path,
                format!("ffprobe exited with {}: {}", output.status, stderr.trim()),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_ffprobe_output(path, &stdout)
    }
}

/// Maps a failure to start a tool: a missing binary is fatal to the run,
/// anything else belongs to the file being processed.
pub(crate) fn spawn_error(tool: &Path, path: &Path, error: io::Error) -> IngestError {
    if error.kind() == io::ErrorKind::NotFound {
        IngestError::Config(format!("cannot execute {}: {error}", tool.display()))
    } else {
        IngestError::media(path, format!("failed to run {}: {error}", tool.display()))
    }
}

fn parse_ffprobe_output(path: &Path, json: &str) -> Result<MediaInfo> {
    let probe: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| IngestError::media(path, format!("unparseable ffprobe output: {e}")))?;

    let streams = probe.streams.unwrap_or_default();
    let video_stream = streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| IngestError::media(path, "no video stream"))?;
    let audio_stream = streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"));

    let (Some(width), Some(height)) = (video_stream.width, video_stream.height) else {
        return Err(IngestError::media(path, "video stream has no dimensions"));
    };

    // Prefer the container duration, fall back to the stream's.
    let duration = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .or(video_stream.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| IngestError::media(path, "duration unavailable"))?;

    let video_codec = video_codec_string(video_stream).unwrap_or_default();
    let audio_codec = audio_stream.and_then(audio_codec_string).unwrap_or_default();

    if video_codec.is_empty() && audio_codec.is_empty() {
        return Err(IngestError::media(path, "no recognizable video or audio codec"));
    }

    let format_name = probe
        .format
        .as_ref()
        .and_then(|f| f.format_name.as_deref())
        .unwrap_or_default();

    let info = MediaInfo {
        duration,
        resolution: Resolution { width, height },
        codecs: Codecs {
            container: container_mime(format_name, path),
            video_codec,
            audio_codec,
        },
    };
    debug!("Probed {}: {info:?}", path.display());
    Ok(info)
}

fn container_mime(format_name: &str, path: &Path) -> String {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let names: Vec<&str> = format_name.split(',').collect();
    if names.iter().any(|n| matches!(*n, "mp4" | "mov" | "m4a")) {
        "video/mp4".to_string()
    } else if names.contains(&"webm") && extension == "webm" {
        "video/webm".to_string()
    } else if names.contains(&"matroska") {
        "video/x-matroska".to_string()
    } else if names.contains(&"avi") {
        "video/x-msvideo".to_string()
    } else if names.contains(&"mpegts") {
        "video/mp2t".to_string()
    } else if let Some(first) = names.first().filter(|n| !n.is_empty()) {
        format!("video/{first}")
    } else {
        "application/octet-stream".to_string()
    }
}

fn video_codec_string(stream: &StreamInfo) -> Option<String> {
    let codec_name = stream.codec_name.as_deref()?;
    let codec = match codec_name {
        "h264" => {
            let profile_byte = match stream.profile.as_deref() {
                Some("Baseline" | "Constrained Baseline") => 0x42,
                Some("Main") => 0x4D,
                Some("Extended") => 0x58,
                Some("High 10" | "High 10 Intra") => 0x6E,
                Some("High 4:2:2" | "High 4:2:2 Intra") => 0x7A,
                Some("High 4:4:4 Predictive" | "High 4:4:4 Intra") => 0xF4,
                _ => 0x64,
            };
            let constraint_byte = match stream.profile.as_deref() {
                Some("Constrained Baseline") => 0xC0,
                _ => 0x00,
            };
            let level_byte = stream.level.filter(|l| (1..=255).contains(l)).unwrap_or(40);
            format!("avc1.{profile_byte:02X}{constraint_byte:02X}{level_byte:02X}")
        }
        "hevc" => match stream.codec_tag_string.as_deref() {
            Some("hev1") => "hev1.1.6.L93.B0".to_string(),
            _ => "hvc1.1.6.L93.B0".to_string(),
        },
        "vp9" => "vp09.00.10.08".to_string(),
        "av1" => "av01.0.04M.08".to_string(),
        other => other.to_string(),
    };
    Some(codec)
}

fn audio_codec_string(stream: &StreamInfo) -> Option<String> {
    let codec = match stream.codec_name.as_deref()? {
        "aac" => match stream.profile.as_deref() {
            Some("HE-AAC") => "mp4a.40.5",
            Some("HE-AACv2") => "mp4a.40.29",
            _ => "mp4a.40.2",
        }
        .to_string(),
        "mp3" => "mp4a.40.34".to_string(),
        "ac3" => "ac-3".to_string(),
        "eac3" => "ec-3".to_string(),
        "opus" => "opus".to_string(),
        other => other.to_string(),
    };
    Some(codec)
}
