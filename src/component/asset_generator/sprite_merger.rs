use super::ffmpeg_command::FfmpegCommand;
use crate::cue::TileGrid;
use crate::error::{IngestError, Result};
use log::debug;
use std::fs;
use std::path::Path;

/// Packs up to one sheet's worth of tiles into `output_path` with the xstack
/// filter, row by row. A partial sheet leaves the unused area black.
pub fn merge_sheet(
    ffmpeg: &Path,
    tiles: &[impl AsRef<Path>],
    output_path: &Path,
    grid: TileGrid,
) -> Result<()> {
    if tiles.is_empty() || tiles.len() > grid.tiles_per_sheet() {
        return Err(IngestError::media(
            output_path,
            format!(
                "cannot place {} tiles on a {}x{} sheet",
                tiles.len(),
                grid.columns(),
                grid.rows()
            ),
        ));
    }

    debug!("Merging {} tiles into {}", tiles.len(), output_path.display());

    // xstack needs at least two inputs.
    if let [only] = tiles {
        fs::copy(only.as_ref(), output_path).map_err(|e| IngestError::io(output_path, e))?;
        return Ok(());
    }

    let first = tiles[0].as_ref();
    let mut command = FfmpegCommand::ffmpeg(ffmpeg, first);
    for tile in tiles {
        command = command.arg("-i").arg(tile.as_ref());
    }

    let filter = format!(
        "xstack=inputs={}:layout={}:fill=black",
        tiles.len(),
        xstack_layout(grid, tiles.len())
    );

    command
        .args(["-filter_complex", filter.as_str(), "-frames:v", "1", "-q:v", "2", "-y"])
        .arg(output_path)
        .run_producing(output_path)
}

/// `x_y` pixel positions joined with `|`, e.g. `0_0|160_0|320_0|...`.
fn xstack_layout(grid: TileGrid, count: usize) -> String {
    (0..count)
        .map(|i| {
            let (x, y) = grid.tile_origin(i);
            format!("{x}_{y}")
        })
        .collect::<Vec<_>>()
        .join("|")
}
