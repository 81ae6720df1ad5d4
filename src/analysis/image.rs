//! A dense row-major 2D image of `f64` pixels.

use crate::error::{AppResult, DaqError};
use serde::{Deserialize, Serialize};

/// Detector frame stored row-major.
///
/// Frames are small enough here that `f64` pixels keep the arithmetic simple;
/// the store serializes them with `bincode` when they leave the process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Image {
    /// Wrap existing pixel data. Fails if `data.len() != rows * cols`.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> AppResult<Self> {
        if data.len() != rows * cols {
            return Err(DaqError::ShapeMismatch(format!(
                "{} pixels for a {}x{} image",
                data.len(),
                rows,
                cols
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Build an image by evaluating `f(row, col)` at every pixel.
    pub fn from_fn(rows: usize, cols: usize, f: impl Fn(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                data.push(f(r, c));
            }
        }
        Self { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Pixel value at `(row, col)`. Callers index within bounds.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    /// Row-major pixel slice.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// A copy with every pixel multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|v| v * factor).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_checks_len() {
        assert!(Image::new(2, 3, vec![0.0; 6]).is_ok());
        assert!(Image::new(2, 3, vec![0.0; 5]).is_err());
    }

    #[test]
    fn test_from_fn_indexing() {
        let img = Image::from_fn(2, 3, |r, c| (r * 10 + c) as f64);
        assert_eq!(img.shape(), (2, 3));
        assert_eq!(img.get(0, 0), 0.0);
        assert_eq!(img.get(1, 2), 12.0);
    }

    #[test]
    fn test_scaled() {
        let img = Image::from_fn(2, 2, |_, _| 2.0);
        let doubled = img.scaled(3.0);
        assert!(doubled.data().iter().all(|&v| v == 6.0));
    }
}
