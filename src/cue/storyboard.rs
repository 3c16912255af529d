//! Storyboard tile manifests.
//!
//! Keyframe `n` (0-based, in time order) lands on sheet `n / (columns * rows)`
//! at tile `n % (columns * rows)`, filled row by row. Each manifest cue points
//! at its tile with a `#xywh=` media fragment.

use super::codec::{Cue, EndRule, decode, encode};
use super::timestamp::{from_millis, to_millis};
use crate::error::{IngestError, Result};
use std::collections::HashSet;

pub const MANIFEST_FILE_NAME: &str = "thumbnails.vtt";

/// Minimum display length of the last tile.
const MIN_LAST_TILE_SECONDS: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    columns: u32,
    rows: u32,
    tile_width: u32,
    tile_height: u32,
}

impl TileGrid {
    pub fn new(columns: u32, rows: u32, tile_width: u32, tile_height: u32) -> Result<Self> {
        if columns == 0 || rows == 0 || tile_width == 0 || tile_height == 0 {
            return Err(IngestError::Config(format!(
                "invalid storyboard grid {columns}x{rows} of {tile_width}x{tile_height} tiles"
            )));
        }
        Ok(Self {
            columns,
            rows,
            tile_width,
            tile_height,
        })
    }

    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    #[must_use]
    pub const fn tile_width(&self) -> u32 {
        self.tile_width
    }

    #[must_use]
    pub const fn tile_height(&self) -> u32 {
        self.tile_height
    }

    #[must_use]
    pub const fn tiles_per_sheet(&self) -> usize {
        (self.columns * self.rows) as usize
    }

    /// `(sheet_index, tile_index)` of the keyframe with sequence number `seq`.
    #[must_use]
    pub const fn position(&self, seq: usize) -> (usize, usize) {
        let per_sheet = self.tiles_per_sheet();
        (seq / per_sheet, seq % per_sheet)
    }

    /// Pixel offset of a tile's top-left corner within its sheet.
    #[must_use]
    pub const fn tile_origin(&self, tile_index: usize) -> (u32, u32) {
        let column = tile_index as u32 % self.columns;
        let row = tile_index as u32 / self.columns;
        (column * self.tile_width, row * self.tile_height)
    }
}

/// One tile in the manifest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileEntry {
    pub time: f64,
    pub sheet_index: usize,
    pub tile_index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoryboardManifest {
    video_id: String,
    grid: TileGrid,
    url_prefix: String,
    duration: f64,
    tiles: Vec<TileEntry>,
}

#[must_use]
pub fn sheet_file_name(sheet_index: usize) -> String {
    format!("thumb_L0_{:03}.jpg", sheet_index + 1)
}

impl StoryboardManifest {
    /// Lays out `keyframe_times` on the grid. Times are sorted and repeated
    /// timestamps (at millisecond precision) collapse into one tile.
    #[must_use]
    pub fn new(
        video_id: &str,
        grid: TileGrid,
        url_prefix: &str,
        keyframe_times: &[f64],
        duration: f64,
    ) -> Self {
        let mut times: Vec<f64> = keyframe_times
            .iter()
            .copied()
            .filter(|t| t.is_finite())
            .map(|t| t.max(0.0))
            .collect();
        times.sort_by(f64::total_cmp);
        let mut seen = HashSet::new();
        times.retain(|t| seen.insert(to_millis(*t)));

        let tiles = times
            .into_iter()
            .enumerate()
            .map(|(seq, time)| {
                let (sheet_index, tile_index) = grid.position(seq);
                TileEntry {
                    time: from_millis(to_millis(time)),
                    sheet_index,
                    tile_index,
                }
            })
            .collect();

        Self {
            video_id: video_id.to_string(),
            grid,
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
            duration,
            tiles,
        }
    }

    #[must_use]
    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    #[must_use]
    pub const fn grid(&self) -> TileGrid {
        self.grid
    }

    #[must_use]
    pub fn tiles(&self) -> &[TileEntry] {
        &self.tiles
    }

    #[must_use]
    pub fn keyframe_times(&self) -> Vec<f64> {
        self.tiles.iter().map(|t| t.time).collect()
    }

    #[must_use]
    pub fn sheet_count(&self) -> usize {
        self.tiles.last().map_or(0, |t| t.sheet_index + 1)
    }

    #[must_use]
    pub fn tiles_on_sheet(&self, sheet_index: usize) -> usize {
        self.tiles
            .iter()
            .filter(|t| t.sheet_index == sheet_index)
            .count()
    }

    fn tile_url(&self, tile: &TileEntry) -> String {
        let (x, y) = self.grid.tile_origin(tile.tile_index);
        format!(
            "{}/{}/{}#xywh={x},{y},{},{}",
            self.url_prefix,
            self.video_id,
            sheet_file_name(tile.sheet_index),
            self.grid.tile_width,
            self.grid.tile_height
        )
    }

    /// One cue per tile, in keyframe order.
    #[must_use]
    pub fn to_cues(&self) -> Vec<Cue> {
        self.tiles
            .iter()
            .map(|tile| Cue::new(tile.time, self.tile_url(tile)))
            .collect()
    }

    /// Each tile shows until the next keyframe; the last one until the end of
    /// the video, but never less than a second.
    #[must_use]
    pub fn encode(&self) -> String {
        let tail = self
            .tiles
            .last()
            .map_or(MIN_LAST_TILE_SECONDS, |last| {
                (self.duration - last.time).max(MIN_LAST_TILE_SECONDS)
            });
        encode(&self.to_cues(), EndRule::UntilNext { tail })
    }

    /// Rebuilds a manifest from decoded cues, checking that every tile sits
    /// where its sequence number says it should.
    pub fn from_cues(
        video_id: &str,
        grid: TileGrid,
        url_prefix: &str,
        duration: f64,
        cues: &[Cue],
    ) -> Result<Self> {
        let url_prefix = url_prefix.trim_end_matches('/');
        let base = format!("{url_prefix}/{video_id}/");

        let tiles = cues
            .iter()
            .enumerate()
            .map(|(seq, cue)| {
                let line = 3 * seq + 3;
                let entry = parse_tile_url(cue.label(), &base, grid)
                    .ok_or_else(|| IngestError::format(line + 1, "unrecognized tile reference"))?;
                let entry = TileEntry {
                    time: cue.start(),
                    ..entry
                };
                if grid.position(seq) != (entry.sheet_index, entry.tile_index) {
                    return Err(IngestError::format(
                        line,
                        format!(
                            "tile {seq} is at sheet {} tile {}",
                            entry.sheet_index, entry.tile_index
                        ),
                    ));
                }
                Ok(entry)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            video_id: video_id.to_string(),
            grid,
            url_prefix: url_prefix.to_string(),
            duration,
            tiles,
        })
    }

    pub fn decode(
        text: &str,
        video_id: &str,
        grid: TileGrid,
        url_prefix: &str,
        duration: f64,
    ) -> Result<Self> {
        Self::from_cues(video_id, grid, url_prefix, duration, &decode(text)?)
    }
}

fn parse_tile_url(label: &str, base: &str, grid: TileGrid) -> Option<TileEntry> {
    let (file, fragment) = label.strip_prefix(base)?.split_once("#xywh=")?;

    let number: usize = file
        .strip_prefix("thumb_L0_")?
        .strip_suffix(".jpg")?
        .parse()
        .ok()?;
    let sheet_index = number.checked_sub(1)?;

    let values: Vec<u32> = fragment
        .split(',')
        .map(|v| v.trim().parse().ok())
        .collect::<Option<_>>()?;
    let [x, y, w, h] = values[..] else {
        return None;
    };
    if w != grid.tile_width || h != grid.tile_height || x % w != 0 || y % h != 0 {
        return None;
    }

    let (column, row) = (x / w, y / h);
    if column >= grid.columns || row >= grid.rows {
        return None;
    }

    Some(TileEntry {
        time: 0.0,
        sheet_index,
        tile_index: (row * grid.columns + column) as usize,
    })
}
