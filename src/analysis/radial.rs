//! Radial binned statistic over 2D images.
//!
//! Construction precomputes, for every pixel, which radial bin its Euclidean
//! distance from the origin falls into. Evaluating an image then reduces to a
//! single pass accumulating per-bin sums and counts, returning the per-bin
//! mean. Empty bins yield NaN rather than zero so that downstream plots show
//! gaps instead of fabricated intensity.

use crate::analysis::image::Image;
use crate::error::{AppResult, DaqError};

/// Bins pixels of a fixed-shape image by distance from an origin and computes
/// the mean intensity per bin.
///
/// The bin grid spans `[0, r_max]` where `r_max` is the distance from the
/// origin to the farthest image corner, so every pixel lands in a bin.
pub struct RadialBinnedStatistic {
    rows: usize,
    cols: usize,
    bins: usize,
    bin_index: Vec<usize>,
    centers: Vec<f64>,
}

impl RadialBinnedStatistic {
    /// Construct an accumulator for images of `shape` = `(rows, cols)`,
    /// binning around `origin` = `(row, col)` in pixel coordinates.
    ///
    /// Fails when the shape is degenerate, `bins` is zero, or the origin lies
    /// outside the image. Not locally recovered by callers; a bad calibration
    /// fails the run.
    pub fn new(shape: (usize, usize), bins: usize, origin: (f64, f64)) -> AppResult<Self> {
        let (rows, cols) = shape;
        if rows == 0 || cols == 0 {
            return Err(DaqError::Calibration(format!(
                "degenerate image shape {rows}x{cols}"
            )));
        }
        if bins == 0 {
            return Err(DaqError::Calibration("bin count must be positive".to_string()));
        }
        let (oy, ox) = origin;
        if oy < 0.0 || ox < 0.0 || oy > (rows - 1) as f64 || ox > (cols - 1) as f64 {
            return Err(DaqError::Calibration(format!(
                "origin ({oy}, {ox}) outside {rows}x{cols} image"
            )));
        }

        // Farthest corner sets the radial extent.
        let r_max = [
            (0.0, 0.0),
            (0.0, (cols - 1) as f64),
            ((rows - 1) as f64, 0.0),
            ((rows - 1) as f64, (cols - 1) as f64),
        ]
        .iter()
        .map(|&(y, x)| f64::hypot(y - oy, x - ox))
        .fold(0.0_f64, f64::max);

        let width = r_max / bins as f64;
        let mut bin_index = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                let dist = f64::hypot(r as f64 - oy, c as f64 - ox);
                let idx = if width > 0.0 {
                    ((dist / width) as usize).min(bins - 1)
                } else {
                    0
                };
                bin_index.push(idx);
            }
        }

        let centers = (0..bins).map(|i| (i as f64 + 0.5) * width).collect();

        Ok(Self {
            rows,
            cols,
            bins,
            bin_index,
            centers,
        })
    }

    /// Midpoint radius of each bin, length == configured bin count.
    pub fn bin_centers(&self) -> &[f64] {
        &self.centers
    }

    /// Expected image shape.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Mean pixel intensity per radial bin. Empty bins are NaN.
    pub fn evaluate(&self, image: &Image) -> AppResult<Vec<f64>> {
        if image.shape() != (self.rows, self.cols) {
            return Err(DaqError::ShapeMismatch(format!(
                "expected {}x{} image, got {}x{}",
                self.rows,
                self.cols,
                image.rows(),
                image.cols()
            )));
        }

        let mut sums = vec![0.0_f64; self.bins];
        let mut counts = vec![0_usize; self.bins];
        for (pixel, &idx) in image.data().iter().zip(&self.bin_index) {
            sums[idx] += pixel;
            counts[idx] += 1;
        }

        Ok(sums
            .iter()
            .zip(&counts)
            .map(|(&s, &n)| if n > 0 { s / n as f64 } else { f64::NAN })
            .collect())
    }
}
