//! Live visualization and export callbacks.
//!
//! Every type here implements [`DocumentCallback`](crate::callback::DocumentCallback)
//! and performs one side effect per document: render a table row, update a
//! plot, write a CSV row, or accumulate a radial profile. Rendering targets
//! are injected as [`PlotSink`](plot::PlotSink) implementations so the
//! callbacks stay headless and testable.

pub mod csv;
pub mod fit;
pub mod integrate;
pub mod plot;
pub mod raster;
pub mod table;

pub use csv::CsvExporter;
pub use fit::{GaussianFit, LiveFit, LiveFitPlot};
pub use integrate::LiveIntegrate;
pub use plot::{LivePlot, NullSink, PlotSink, RecordingSink};
pub use raster::LiveRaster;
pub use table::LiveTable;
