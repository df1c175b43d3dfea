//! Volumetric Slice Windower: drives a 3-channel 2-D restoration model
//! across an `[H, D, W]` volume one depth slice at a time.
//!
//! Each slice is presented to the model as a pseudo-color window of its
//! neighborhood (previous/current/next slice), giving a model trained on
//! 3-channel 2-D inputs usable local-depth context.

use anyhow::{bail, Context, Result};
use ndarray::{s, Array3, Axis};
use tracing::debug;

use crate::restore::Restorer;

/// Build the 3-channel window for depth `d`: channel 0 is the slice at
/// `d-1`, channel 1 the slice at `d`, channel 2 the slice at `d+1`, with
/// the boundary slice reused past either end of the volume.
///
/// Edge clamping (not zero padding, not wraparound) is required policy —
/// it keeps artificial dark context out of the first and last window.
/// The window radius is fixed at 1.
pub fn slice_window(volume: &Array3<f32>, depth: usize) -> Result<Array3<f32>> {
    let (height, depth_len, width) = volume.dim();
    if depth >= depth_len {
        bail!("depth {depth} out of range for volume depth {depth_len}");
    }

    let before = depth.saturating_sub(1);
    let after = (depth + 1).min(depth_len - 1);

    let mut window = Array3::zeros((3, height, width));
    window
        .slice_mut(s![0, .., ..])
        .assign(&volume.slice(s![.., before, ..]));
    window
        .slice_mut(s![1, .., ..])
        .assign(&volume.slice(s![.., depth, ..]));
    window
        .slice_mut(s![2, .., ..])
        .assign(&volume.slice(s![.., after, ..]));
    Ok(window)
}

/// Run `restorer` over every depth slice of `volume` and assemble the
/// single-channel results into an output volume of identical shape.
///
/// A failure on any slice aborts the whole pass — there are no partial
/// volumes.
pub fn process_volume<R: Restorer + ?Sized>(
    volume: &Array3<f32>,
    restorer: &mut R,
) -> Result<Array3<f32>> {
    let contract = restorer.contract();
    if contract.channels != 3 {
        bail!(
            "volumetric driver needs a 3-channel model, contract declares {}",
            contract.channels
        );
    }
    if contract.scale != 1 {
        bail!(
            "volumetric driver needs a scale-1 model, contract declares scale {}",
            contract.scale
        );
    }

    let (height, depth_len, width) = volume.dim();
    if height == 0 || depth_len == 0 || width == 0 {
        bail!("volume has empty extent ({height}x{depth_len}x{width})");
    }

    debug!(height, depth = depth_len, width, "starting volumetric pass");

    let mut output = Array3::zeros((height, depth_len, width));
    for depth in 0..depth_len {
        let window = slice_window(volume, depth)?;
        let restored = restorer
            .restore(window.view())
            .with_context(|| format!("restoring slice {depth} of {depth_len}"))?;

        let (c, h, w) = restored.dim();
        if c != 1 || h != height || w != width {
            bail!(
                "restorer returned {c}x{h}x{w} for slice {depth}, \
                 expected 1x{height}x{width}"
            );
        }
        output
            .slice_mut(s![.., depth, ..])
            .assign(&restored.index_axis(Axis(0), 0));
    }

    Ok(output)
}

/// Like [`process_volume`], but first checks that `companion` (the paired
/// reference volume of the surrounding workflow) has the same shape as the
/// input. Mismatch fails before any restore call — no partial output.
pub fn process_volume_checked<R: Restorer + ?Sized>(
    volume: &Array3<f32>,
    companion: &Array3<f32>,
    restorer: &mut R,
) -> Result<Array3<f32>> {
    if volume.dim() != companion.dim() {
        bail!(
            "paired volume shapes differ: input {:?} vs companion {:?}",
            volume.dim(),
            companion.dim()
        );
    }
    process_volume(volume, restorer)
}
