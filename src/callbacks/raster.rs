//! Live raster image built from scalar readings of a 2D grid scan.

use crate::callback::DocumentCallback;
use crate::error::{AppResult, DaqError};
use crate::callbacks::plot::PlotSink;
use crate::experiment::document::{EventDoc, StartDoc};

/// Fills a `(rows, cols)` grid from events in acquisition order and re-emits
/// the partial image after every event. Unvisited cells stay NaN so renderers
/// can show them as blank.
///
/// With `snake`, odd rows fill right-to-left, matching a snaked
/// outer-product scan.
pub struct LiveRaster<S: PlotSink> {
    field: String,
    rows: usize,
    cols: usize,
    snake: bool,
    sink: S,
    grid: Vec<f64>,
    cursor: usize,
}

impl<S: PlotSink> LiveRaster<S> {
    pub fn new(field: &str, shape: (usize, usize), snake: bool, sink: S) -> Self {
        let (rows, cols) = shape;
        Self {
            field: field.to_string(),
            rows,
            cols,
            snake,
            sink,
            grid: vec![f64::NAN; rows * cols],
            cursor: 0,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn slot(&self, index: usize) -> usize {
        let row = index / self.cols;
        let col = index % self.cols;
        let col = if self.snake && row % 2 == 1 {
            self.cols - 1 - col
        } else {
            col
        };
        row * self.cols + col
    }
}

impl<S: PlotSink> DocumentCallback for LiveRaster<S> {
    fn start(&mut self, doc: &StartDoc) -> AppResult<()> {
        // A new start resets the grid; no state survives across runs.
        self.grid = vec![f64::NAN; self.rows * self.cols];
        self.cursor = 0;
        let short_uid: String = doc.uid.chars().take(6).collect();
        self.sink.set_title(&format!("[{short_uid}]: {}", doc.plan_name));
        Ok(())
    }

    fn event(&mut self, doc: &EventDoc) -> AppResult<()> {
        if self.cursor >= self.grid.len() {
            return Err(DaqError::ShapeMismatch(format!(
                "more events than the {}x{} raster holds",
                self.rows, self.cols
            )));
        }
        let value = doc
            .data
            .get(&self.field)
            .and_then(|v| v.as_f64())
            .ok_or_else(|| DaqError::MissingField(self.field.clone()))?;
        let slot = self.slot(self.cursor);
        self.grid[slot] = value;
        self.cursor += 1;
        self.sink.image(self.rows, self.cols, &self.grid);
        self.sink.request_redraw();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::plot::RecordingSink;
    use crate::experiment::document::FieldValue;

    fn feed(raster: &mut LiveRaster<RecordingSink>, values: &[f64]) {
        let start = StartDoc::new("outer_product_scan", "raster", 1);
        raster.start(&start).expect("start");
        for (i, &v) in values.iter().enumerate() {
            let event = EventDoc::new(&start.uid, "desc", i as u32 + 1)
                .with_datum("det", FieldValue::Number(v));
            raster.event(&event).expect("event");
        }
    }

    #[test]
    fn test_row_major_fill() {
        let mut raster = LiveRaster::new("det", (2, 3), false, RecordingSink::new());
        feed(&mut raster, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let (rows, cols, grid) = raster.sink().images.last().expect("image").clone();
        assert_eq!((rows, cols), (2, 3));
        assert_eq!(grid, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_snake_fill_reverses_odd_rows() {
        let mut raster = LiveRaster::new("det", (2, 3), true, RecordingSink::new());
        feed(&mut raster, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let (_, _, grid) = raster.sink().images.last().expect("image").clone();
        assert_eq!(grid, vec![1.0, 2.0, 3.0, 6.0, 5.0, 4.0]);
    }

    #[test]
    fn test_partial_grid_keeps_nan() {
        let mut raster = LiveRaster::new("det", (2, 2), false, RecordingSink::new());
        feed(&mut raster, &[9.0]);

        let (_, _, grid) = raster.sink().images.last().expect("image").clone();
        assert_eq!(grid[0], 9.0);
        assert!(grid[1].is_nan() && grid[2].is_nan() && grid[3].is_nan());
    }

    #[test]
    fn test_overflow_is_error() {
        let mut raster = LiveRaster::new("det", (1, 1), false, RecordingSink::new());
        feed(&mut raster, &[1.0]);
        let event =
            EventDoc::new("run", "desc", 2).with_datum("det", FieldValue::Number(2.0));
        assert!(raster.event(&event).is_err());
    }
}
