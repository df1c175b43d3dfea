//! Tile Compositor: feeds a 2-D image through a [`Restorer`] either whole
//! or as overlapping tiles blended back into one seamless canvas.

use anyhow::{bail, Context, Result};
use ndarray::{s, Array3};
use tracing::debug;

use crate::canvas::AccumCanvas;
use crate::restore::Restorer;

/// How a 2-D image is fed through the model.
///
/// Two explicit variants rather than an inline `Option` branch, so the
/// covering-set and accumulation logic stay independently testable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeMode {
    /// One restore call over the full image — the common case for inputs
    /// that fit the model directly.
    Whole,
    /// Overlapping tiles, blended by overlap-add with uniform weight.
    Tiled { tile_size: usize, overlap: usize },
}

impl CompositeMode {
    /// CLI-facing constructor: an absent tile size means whole-image mode.
    pub fn from_tile_args(tile_size: Option<usize>, overlap: usize) -> Self {
        match tile_size {
            Some(tile_size) => Self::Tiled { tile_size, overlap },
            None => Self::Whole,
        }
    }
}

/// Covering start offsets along one axis: `0, stride, 2*stride, …` while
/// `start < len - tile`, then the final start `len - tile` appended
/// unconditionally so the last tile always flushes to the boundary.
///
/// When `len - tile` is not a stride multiple, the final tile overlaps its
/// neighbor by more than the nominal overlap. Intended: full coverage wins
/// over uniform overlap.
pub(crate) fn coverage_starts(len: usize, tile: usize, stride: usize) -> Vec<usize> {
    let mut starts: Vec<usize> = (0..len - tile).step_by(stride).collect();
    starts.push(len - tile);
    starts
}

/// Apply `restorer` to `source` (`[C, H, W]`) and return the blended
/// `[C, H*scale, W*scale]` output.
///
/// In tiled mode all configuration is validated eagerly — a bad tile/window
/// pairing or a non-positive stride fails before the first restore call.
pub fn composite<R: Restorer + ?Sized>(
    source: &Array3<f32>,
    restorer: &mut R,
    mode: CompositeMode,
) -> Result<Array3<f32>> {
    let contract = restorer.contract();
    contract.check_input(&source.view())?;

    let (tile_size, overlap) = match mode {
        CompositeMode::Whole => return restorer.restore(source.view()),
        CompositeMode::Tiled { tile_size, overlap } => (tile_size, overlap),
    };

    let (channels, height, width) = source.dim();
    let tile = tile_size.min(height).min(width);
    let window = contract.window_size;
    let scale = contract.scale;

    if window == 0 || tile % window != 0 {
        bail!("tile size {tile} is not a multiple of the model window size {window}");
    }
    if tile <= overlap {
        bail!("tile size {tile} with overlap {overlap} gives a non-positive stride");
    }
    let stride = tile - overlap;

    let row_starts = coverage_starts(height, tile, stride);
    let col_starts = coverage_starts(width, tile, stride);
    debug!(
        tile,
        overlap,
        stride,
        rows = row_starts.len(),
        cols = col_starts.len(),
        "starting tiled composite"
    );

    let mut canvas = AccumCanvas::new(channels, height * scale, width * scale);
    for &row in &row_starts {
        for &col in &col_starts {
            let tile_view = source.slice(s![.., row..row + tile, col..col + tile]);
            let out = restorer
                .restore(tile_view)
                .with_context(|| format!("restoring tile at ({row}, {col})"))?;

            let (out_c, out_h, out_w) = out.dim();
            if out_c != channels || out_h != tile * scale || out_w != tile * scale {
                bail!(
                    "restorer returned {out_c}x{out_h}x{out_w} for a \
                     {channels}x{tile}x{tile} tile at scale {scale}"
                );
            }
            canvas.add(row * scale, col * scale, &out.view())?;
        }
    }

    canvas.into_output()
}
