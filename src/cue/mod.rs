//! The WebVTT-style cue-sheet format used for markers, chapters and
//! storyboard manifests.

pub mod codec;
pub mod storyboard;
pub mod timestamp;

pub use codec::{
    CHAPTER_TAIL, Cue, EndRule, MARKER_DURATION, decode, encode, normalize, read_cue_file,
    validate_label, write_cue_file,
};
pub use storyboard::{
    MANIFEST_FILE_NAME, StoryboardManifest, TileEntry, TileGrid,
    sheet_file_name,
};
pub use timestamp::{format_timestamp, parse_timestamp};
