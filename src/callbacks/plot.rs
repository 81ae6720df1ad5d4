//! Plot target abstraction and the scalar live plot.
//!
//! The library draws nothing itself. Callbacks push titles, curves, points,
//! and raster images into a [`PlotSink`], and a GUI adapter (or the
//! [`RecordingSink`] in tests) decides what to do with them. Redraws are
//! always *requested*, never forced: `request_redraw` marks the sink dirty
//! and the rendering loop picks it up at its next idle tick.

use crate::callback::DocumentCallback;
use crate::error::{AppResult, DaqError};
use crate::experiment::document::{EventDoc, StartDoc};

/// Where live callbacks send their drawing commands.
pub trait PlotSink {
    fn set_title(&mut self, title: &str);

    fn set_axis_labels(&mut self, xlabel: &str, ylabel: &str);

    /// Replace or append a full curve under `label`.
    fn curve(&mut self, label: &str, xs: &[f64], ys: &[f64]);

    /// Append one point to the series named `series`.
    fn point(&mut self, series: &str, x: f64, y: f64);

    /// Replace the raster image (row-major `values`, `rows` x `cols`).
    fn image(&mut self, rows: usize, cols: usize, values: &[f64]);

    /// Refresh the legend from the current set of curves/series.
    fn legend(&mut self);

    /// Ask for a redraw at the next idle tick of the rendering loop.
    fn request_redraw(&mut self);
}

/// Sink that records every command for assertions.
#[derive(Default)]
pub struct RecordingSink {
    pub title: String,
    pub xlabel: String,
    pub ylabel: String,
    /// `(label, xs, ys)` per `curve` call, in call order.
    pub curves: Vec<(String, Vec<f64>, Vec<f64>)>,
    /// `(series, x, y)` per `point` call, in call order.
    pub points: Vec<(String, f64, f64)>,
    /// `(rows, cols, values)` per `image` call, in call order.
    pub images: Vec<(usize, usize, Vec<f64>)>,
    pub legend_refreshes: usize,
    pub redraws_requested: usize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlotSink for RecordingSink {
    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    fn set_axis_labels(&mut self, xlabel: &str, ylabel: &str) {
        self.xlabel = xlabel.to_string();
        self.ylabel = ylabel.to_string();
    }

    fn curve(&mut self, label: &str, xs: &[f64], ys: &[f64]) {
        self.curves
            .push((label.to_string(), xs.to_vec(), ys.to_vec()));
    }

    fn point(&mut self, series: &str, x: f64, y: f64) {
        self.points.push((series.to_string(), x, y));
    }

    fn image(&mut self, rows: usize, cols: usize, values: &[f64]) {
        self.images.push((rows, cols, values.to_vec()));
    }

    fn legend(&mut self) {
        self.legend_refreshes += 1;
    }

    fn request_redraw(&mut self) {
        self.redraws_requested += 1;
    }
}

/// Sink that discards everything.
pub struct NullSink;

impl PlotSink for NullSink {
    fn set_title(&mut self, _title: &str) {}
    fn set_axis_labels(&mut self, _xlabel: &str, _ylabel: &str) {}
    fn curve(&mut self, _label: &str, _xs: &[f64], _ys: &[f64]) {}
    fn point(&mut self, _series: &str, _x: f64, _y: f64) {}
    fn image(&mut self, _rows: usize, _cols: usize, _values: &[f64]) {}
    fn legend(&mut self) {}
    fn request_redraw(&mut self) {}
}

/// Plots one detector field against one motor field, one point per event.
pub struct LivePlot<S: PlotSink> {
    y_field: String,
    x_field: String,
    sink: S,
}

impl<S: PlotSink> LivePlot<S> {
    pub fn new(y_field: &str, x_field: &str, sink: S) -> Self {
        Self {
            y_field: y_field.to_string(),
            x_field: x_field.to_string(),
            sink,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

impl<S: PlotSink> DocumentCallback for LivePlot<S> {
    fn start(&mut self, doc: &StartDoc) -> AppResult<()> {
        let short_uid: String = doc.uid.chars().take(6).collect();
        self.sink.set_title(&format!("[{short_uid}]: {}", doc.plan_name));
        self.sink.set_axis_labels(&self.x_field, &self.y_field);
        Ok(())
    }

    fn event(&mut self, doc: &EventDoc) -> AppResult<()> {
        let x = doc
            .data
            .get(&self.x_field)
            .and_then(|v| v.as_f64())
            .ok_or_else(|| DaqError::MissingField(self.x_field.clone()))?;
        let y = doc
            .data
            .get(&self.y_field)
            .and_then(|v| v.as_f64())
            .ok_or_else(|| DaqError::MissingField(self.y_field.clone()))?;
        self.sink.point(&self.y_field, x, y);
        self.sink.request_redraw();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::document::FieldValue;

    #[test]
    fn test_live_plot_collects_points() {
        let mut plot = LivePlot::new("det", "motor", RecordingSink::new());

        let start = StartDoc::new("scan", "scan motor", 1);
        plot.start(&start).expect("start");
        assert!(plot.sink().title.contains("scan motor"));
        assert_eq!(plot.sink().xlabel, "motor");

        for i in 0..3 {
            let event = EventDoc::new(&start.uid, "desc", i + 1)
                .with_datum("motor", FieldValue::Number(i as f64))
                .with_datum("det", FieldValue::Number(2.0 * i as f64));
            plot.event(&event).expect("event");
        }

        let sink = plot.sink();
        assert_eq!(sink.points.len(), 3);
        assert_eq!(sink.points[2], ("det".to_string(), 2.0, 4.0));
        assert_eq!(sink.redraws_requested, 3);
    }

    #[test]
    fn test_missing_field_fails_loudly() {
        let mut plot = LivePlot::new("det", "motor", RecordingSink::new());
        let event = EventDoc::new("run", "desc", 1).with_datum("motor", FieldValue::Number(0.0));
        assert!(matches!(
            plot.event(&event),
            Err(DaqError::MissingField(f)) if f == "det"
        ));
    }
}
