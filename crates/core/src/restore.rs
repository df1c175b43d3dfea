//! The [`Restorer`] capability: the seam between the deterministic
//! tiling/windowing math and whatever model actually restores pixels.

use anyhow::{bail, Result};
use ndarray::{Array3, ArrayView3};

/// Input contract a restoration model declares.
///
/// The drivers only ever rely on these three numbers; the model's
/// architecture, precision and device placement stay behind the trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreContract {
    /// Channel count the model expects.
    pub channels: usize,
    /// Spatial dimensions fed to the model must be multiples of this.
    pub window_size: usize,
    /// Output resolution multiplier (1 for denoising-style tasks).
    pub scale: usize,
}

impl RestoreContract {
    pub fn new(channels: usize, window_size: usize, scale: usize) -> Self {
        Self {
            channels,
            window_size,
            scale,
        }
    }

    /// Validate an input view against the declared channel count.
    pub fn check_input(&self, input: &ArrayView3<'_, f32>) -> Result<()> {
        let (c, h, w) = input.dim();
        if c != self.channels {
            bail!(
                "input has {c} channels, model contract declares {}",
                self.channels
            );
        }
        if h == 0 || w == 0 {
            bail!("input has empty spatial extent ({h}x{w})");
        }
        Ok(())
    }
}

/// A restoration model as seen by the drivers: a deterministic,
/// side-effect-free map from `[C, H, W]` to `[C_out, H*scale, W*scale]`.
///
/// Failures propagate verbatim to the caller. The drivers never retry and
/// never salvage a partial result — one failed tile or slice invalidates
/// the whole image or volume.
pub trait Restorer {
    fn contract(&self) -> RestoreContract;

    fn restore(&mut self, input: ArrayView3<'_, f32>) -> Result<Array3<f32>>;
}
