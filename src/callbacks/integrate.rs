//! Live radial integration of area-detector frames.
//!
//! Calibration comes from run metadata: an optional `wavelength` and an
//! optional beam `center`, both read at start (falling back to the previous
//! values when absent). The binning accumulator itself is built at descriptor
//! time from the declared image shape, so a missing shape or an out-of-range
//! center fails the run before any event arrives.

use crate::analysis::RadialBinnedStatistic;
use crate::callback::DocumentCallback;
use crate::callbacks::plot::PlotSink;
use crate::error::{AppResult, DaqError};
use crate::experiment::document::{DescriptorDoc, EventDoc, StartDoc, StopDoc};
use crate::store::FileStore;
use log::debug;

/// Converts each event's image reference into a radial intensity profile and
/// plots it, one curve per event, labeled by an auxiliary scalar field.
pub struct LiveIntegrate<S: PlotSink> {
    field: String,
    label_field: String,
    bins: usize,
    store: FileStore,
    sink: S,
    wavelength: f64,
    center: Option<[f64; 2]>,
    binner: Option<RadialBinnedStatistic>,
}

impl<S: PlotSink> LiveIntegrate<S> {
    /// `field` holds the image datum reference in events; `label_field` holds
    /// the scalar used to label each curve (e.g. a temperature).
    pub fn new(field: &str, label_field: &str, bins: usize, store: FileStore, sink: S) -> Self {
        Self {
            field: field.to_string(),
            label_field: label_field.to_string(),
            bins,
            store,
            sink,
            wavelength: 1.0,
            center: None,
            binner: None,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Current wavelength calibration (metadata-supplied or carried over).
    pub fn wavelength(&self) -> f64 {
        self.wavelength
    }
}

impl<S: PlotSink> DocumentCallback for LiveIntegrate<S> {
    fn start(&mut self, doc: &StartDoc) -> AppResult<()> {
        // Calibration carries over from the previous run when absent here.
        if let Some(wavelength) = doc.meta_f64("wavelength") {
            self.wavelength = wavelength;
        }
        if let Some(center) = doc.meta_pair("center") {
            self.center = Some(center);
        }
        self.binner = None;

        let short_uid: String = doc.uid.chars().take(6).collect();
        let sample = doc.meta_str("sample").unwrap_or("?");
        self.sink.set_title(&format!("[{short_uid}]: {sample}"));
        self.sink.set_axis_labels("q", "S(q)");
        Ok(())
    }

    fn descriptor(&mut self, doc: &DescriptorDoc) -> AppResult<()> {
        let data_key = doc
            .data_keys
            .get(&self.field)
            .ok_or_else(|| DaqError::MissingDataKey(self.field.clone()))?;
        let &[rows, cols] = data_key.shape.as_slice() else {
            return Err(DaqError::Calibration(format!(
                "field '{}' declares shape {:?}, expected 2D",
                self.field, data_key.shape
            )));
        };
        // An absent center defaults to the frame center.
        let [cy, cx] = self
            .center
            .unwrap_or([(rows as f64 - 1.0) / 2.0, (cols as f64 - 1.0) / 2.0]);
        self.binner = Some(RadialBinnedStatistic::new((rows, cols), self.bins, (cy, cx))?);
        debug!("radial binner ready: {rows}x{cols}, {} bins", self.bins);
        Ok(())
    }

    fn event(&mut self, doc: &EventDoc) -> AppResult<()> {
        let binner = self
            .binner
            .as_ref()
            .ok_or_else(|| DaqError::Lifecycle("event before descriptor".to_string()))?;

        let datum_id = doc
            .data
            .get(&self.field)
            .and_then(|v| v.as_str())
            .ok_or_else(|| DaqError::MissingField(self.field.clone()))?;
        let image = self.store.retrieve(datum_id)?;
        let profile = binner.evaluate(&image)?;
        // Pixel radii become scattering coordinates via the wavelength.
        let centers: Vec<f64> = binner
            .bin_centers()
            .iter()
            .map(|&c| c / self.wavelength)
            .collect();

        let label = doc
            .data
            .get(&self.label_field)
            .ok_or_else(|| DaqError::MissingField(self.label_field.clone()))?;
        self.sink.curve(&format!("{label} K"), &centers, &profile);
        self.sink.legend();
        self.sink.request_redraw();
        Ok(())
    }

    fn stop(&mut self, _doc: &StopDoc) -> AppResult<()> {
        self.binner = None;
        Ok(())
    }
}
