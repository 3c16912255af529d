use crate::error::{IngestError, Result};
use log::debug;
use std::path::{Path, PathBuf};

/// Resolved locations of the external media tools.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl ToolPaths {
    /// Resolves both tools, preferring explicitly configured paths and falling
    /// back to a `PATH` search. A missing tool is a configuration error.
    pub fn locate(ffmpeg: Option<&Path>, ffprobe: Option<&Path>) -> Result<Self> {
        Ok(Self {
            ffmpeg: locate_tool("ffmpeg", ffmpeg)?,
            ffprobe: locate_tool("ffprobe", ffprobe)?,
        })
    }
}

fn locate_tool(name: &str, configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        if path.is_file() {
            debug!("Using configured {name}: {}", path.display());
            return Ok(path.to_path_buf());
        }
        return Err(IngestError::Config(format!(
            "{name} not found at configured path {}",
            path.display()
        )));
    }

    which::which(name)
        .inspect(|path| debug!("Found {name} on PATH: {}", path.display()))
        .map_err(|e| IngestError::Config(format!("{name} not found on PATH: {e}")))
}
