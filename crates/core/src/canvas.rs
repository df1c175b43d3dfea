//! Overlap-add accumulation canvas shared by the tiled drivers.
//!
//! Blending is plain overlap-add with a uniform per-tile weight: pixels
//! covered by several tiles receive the arithmetic mean of every tile's
//! prediction, pixels covered once pass through unchanged.

use anyhow::{bail, Result};
use ndarray::{s, Array3, ArrayView3};

/// A pair of same-shape canvases: accumulated output and accumulated
/// per-pixel weight. Final output is `sum / weight` element-wise.
pub struct AccumCanvas {
    sum: Array3<f32>,
    weight: Array3<f32>,
}

impl AccumCanvas {
    /// Zero-initialized canvas at the full-resolution output shape.
    pub fn new(channels: usize, height: usize, width: usize) -> Self {
        Self {
            sum: Array3::zeros((channels, height, width)),
            weight: Array3::zeros((channels, height, width)),
        }
    }

    /// `(channels, height, width)` of the canvas.
    pub fn dim(&self) -> (usize, usize, usize) {
        self.sum.dim()
    }

    /// Add a patch into `sum` at `(row, col)` and an all-ones mask of the
    /// same footprint into `weight`.
    pub fn add(&mut self, row: usize, col: usize, patch: &ArrayView3<'_, f32>) -> Result<()> {
        let (pc, ph, pw) = patch.dim();
        let (c, h, w) = self.sum.dim();
        if pc != c || row + ph > h || col + pw > w {
            bail!(
                "patch {pc}x{ph}x{pw} at ({row}, {col}) does not fit canvas {c}x{h}x{w}"
            );
        }

        let mut sum = self.sum.slice_mut(s![.., row..row + ph, col..col + pw]);
        sum.zip_mut_with(patch, |acc, &v| *acc += v);

        let mut weight = self.weight.slice_mut(s![.., row..row + ph, col..col + pw]);
        weight += 1.0;

        Ok(())
    }

    /// Normalize `sum` by `weight` and hand back the blended output.
    ///
    /// A zero-weight pixel means the covering set left a hole. That is an
    /// internal defect of the tile generation, so it aborts loudly here
    /// instead of leaking NaN/Inf into the output.
    pub fn into_output(self) -> Result<Array3<f32>> {
        if let Some(((c, y, x), _)) = self
            .weight
            .indexed_iter()
            .find(|(_, &weight)| weight <= 0.0)
        {
            bail!(
                "zero accumulated weight at channel {c}, pixel ({y}, {x}): \
                 covering set left this output pixel unwritten"
            );
        }

        let mut out = self.sum;
        out.zip_mut_with(&self.weight, |acc, &weight| *acc /= weight);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn test_single_patch_passes_through() {
        let mut canvas = AccumCanvas::new(1, 4, 4);
        assert_eq!(canvas.dim(), (1, 4, 4));
        let patch = Array3::from_elem((1, 4, 4), 2.5);
        canvas.add(0, 0, &patch.view()).unwrap();
        let out = canvas.into_output().unwrap();
        assert!(out.iter().all(|&v| (v - 2.5).abs() < 1e-6));
    }

    #[test]
    fn test_overlap_averages() {
        let mut canvas = AccumCanvas::new(1, 4, 6);
        let left = Array3::from_elem((1, 4, 4), 1.0);
        let right = Array3::from_elem((1, 4, 4), 3.0);
        canvas.add(0, 0, &left.view()).unwrap();
        canvas.add(0, 2, &right.view()).unwrap();
        let out = canvas.into_output().unwrap();

        // Columns 0-1 only left, 2-3 both, 4-5 only right.
        assert_eq!(out[[0, 0, 0]], 1.0);
        assert_eq!(out[[0, 0, 2]], 2.0);
        assert_eq!(out[[0, 0, 5]], 3.0);
    }

    #[test]
    fn test_coverage_hole_is_fatal() {
        let mut canvas = AccumCanvas::new(1, 4, 4);
        let patch = Array3::from_elem((1, 2, 4), 1.0);
        canvas.add(0, 0, &patch.view()).unwrap();
        let err = canvas.into_output().unwrap_err();
        assert!(err.to_string().contains("zero accumulated weight"));
    }

    #[test]
    fn test_patch_out_of_bounds() {
        let mut canvas = AccumCanvas::new(1, 4, 4);
        let patch = Array3::from_elem((1, 4, 4), 1.0);
        let err = canvas.add(2, 0, &patch.view()).unwrap_err();
        assert!(err.to_string().contains("does not fit"));
    }
}
