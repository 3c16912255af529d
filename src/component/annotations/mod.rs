//! Markers and chapters stored as cue sheets next to the video records.

mod chapters;
mod markers;

pub use chapters::ChapterStore;
pub use markers::MarkerStore;
