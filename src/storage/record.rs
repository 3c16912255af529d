use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

/// Container MIME type plus RFC 6381 style codec strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Codecs {
    #[serde(rename = "format")]
    pub container: String,
    #[serde(rename = "video")]
    pub video_codec: String,
    #[serde(rename = "audio")]
    pub audio_codec: String,
}

/// One registered video.
///
/// `id` is the content hash and never changes. `file_path` is relative to the
/// repository root; `thumbnail_path` and `preview_path` are relative to the
/// storage root. All stored paths use `/` separators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    #[serde(rename = "videoId")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub file_path: String,
    #[serde(default)]
    pub rating: f64,
    pub duration_seconds: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_path: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub views: u64,
    pub resolution: Resolution,
    pub uploaded_at: DateTime<Utc>,
    pub codecs: Codecs,
}

impl VideoRecord {
    #[must_use]
    pub fn new(id: String, title: String, file_path: String) -> Self {
        Self {
            id,
            title,
            description: String::new(),
            file_path,
            rating: 0.0,
            duration_seconds: 0,
            thumbnail_path: None,
            preview_path: None,
            tags: Vec::new(),
            views: 0,
            resolution: Resolution::default(),
            uploaded_at: Utc::now(),
            codecs: Codecs::default(),
        }
    }

    /// Case-insensitive tag membership.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        let wanted = tag.trim().to_lowercase();
        self.tags.iter().any(|t| t.to_lowercase() == wanted)
    }

    /// Adds a tag keeping the caller's casing. Returns false when an equal tag
    /// (ignoring case) is already present or the tag is blank.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.has_tag(tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    /// Removes every tag equal to `tag` ignoring case. Returns true if any was removed.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let wanted = tag.trim().to_lowercase();
        let before = self.tags.len();
        self.tags.retain(|t| t.to_lowercase() != wanted);
        self.tags.len() != before
    }
}
