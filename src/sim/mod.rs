//! Simulated instruments for demos and tests.
//!
//! These stand in for beamline hardware: a settable [`Mover`], a Gaussian
//! detector ([`SynGauss`]) whose reading depends on a mover's position, and an
//! [`ImageDetector`] that synthesizes a diffraction-like frame, saves it to a
//! [`FileStore`](crate::store::FileStore), and reports only the datum
//! reference in its reading.

use crate::error::AppResult;
use crate::experiment::device::{Device, Reading};
use crate::experiment::document::{DataKey, FieldValue};
use crate::analysis::Image;
use crate::store::FileStore;
use rand::Rng;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A settable scalar axis (motor, temperature controller).
///
/// Reading it reports the current position under its own name.
pub struct Mover {
    name: String,
    position: f64,
}

impl Mover {
    pub fn new(name: &str, position: f64) -> Self {
        Self {
            name: name.to_string(),
            position,
        }
    }

    pub fn position(&self) -> f64 {
        self.position
    }
}

impl Device for Mover {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> HashMap<String, DataKey> {
        let mut keys = HashMap::new();
        keys.insert(self.name.clone(), DataKey::scalar(&self.name));
        keys
    }

    fn set(&mut self, position: f64) -> AppResult<()> {
        self.position = position;
        Ok(())
    }

    fn trigger_read(&mut self) -> AppResult<HashMap<String, Reading>> {
        let mut readings = HashMap::new();
        readings.insert(
            self.name.clone(),
            Reading::now(FieldValue::Number(self.position)),
        );
        Ok(readings)
    }
}

/// Gaussian detector: `imax * exp(-(x - center)^2 / (2 sigma^2))` where `x`
/// is the observed mover's position, plus optional uniform noise.
pub struct SynGauss {
    name: String,
    motor: Rc<RefCell<Mover>>,
    center: f64,
    imax: f64,
    sigma: f64,
    /// Uniform noise amplitude; 0.0 disables noise.
    noise: f64,
}

impl SynGauss {
    pub fn new(
        name: &str,
        motor: Rc<RefCell<Mover>>,
        center: f64,
        imax: f64,
        sigma: f64,
        noise: f64,
    ) -> Self {
        Self {
            name: name.to_string(),
            motor,
            center,
            imax,
            sigma,
            noise,
        }
    }
}

impl Device for SynGauss {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> HashMap<String, DataKey> {
        let mut keys = HashMap::new();
        keys.insert(self.name.clone(), DataKey::scalar(&self.name));
        keys
    }

    fn trigger_read(&mut self) -> AppResult<HashMap<String, Reading>> {
        let x = self.motor.borrow().position();
        let dx = x - self.center;
        let mut value = self.imax * (-dx * dx / (2.0 * self.sigma * self.sigma)).exp();
        if self.noise > 0.0 {
            value += rand::thread_rng().gen_range(-self.noise..=self.noise);
        }
        let mut readings = HashMap::new();
        readings.insert(self.name.clone(), Reading::now(FieldValue::Number(value)));
        Ok(readings)
    }
}

/// Area detector producing `T * base` where `T` is the observed temperature
/// mover's position and `base` is a fixed ring pattern,
/// `exp(-R^2 / 70) * |sin(R)|` with `R` the scaled distance from the frame
/// center.
///
/// Frames go straight into the file store; the reading carries the datum id.
pub struct ImageDetector {
    name: String,
    field: String,
    temperature: Rc<RefCell<Mover>>,
    store: FileStore,
    base: Image,
}

impl ImageDetector {
    /// `field` is the event data key the datum reference is reported under.
    pub fn new(
        name: &str,
        field: &str,
        temperature: Rc<RefCell<Mover>>,
        store: FileStore,
        rows: usize,
        cols: usize,
    ) -> Self {
        let cy = (rows as f64 - 1.0) / 2.0;
        let cx = (cols as f64 - 1.0) / 2.0;
        let base = Image::from_fn(rows, cols, |r, c| {
            let radius = f64::hypot(r as f64 - cy, c as f64 - cx) / 5.0;
            (-radius * radius / 70.0).exp() * radius.sin().abs()
        });
        Self {
            name: name.to_string(),
            field: field.to_string(),
            temperature,
            store,
            base,
        }
    }
}

impl Device for ImageDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> HashMap<String, DataKey> {
        let (rows, cols) = self.base.shape();
        let mut keys = HashMap::new();
        keys.insert(
            self.field.clone(),
            DataKey::external_array(&self.name, vec![rows, cols]),
        );
        keys
    }

    fn trigger_read(&mut self) -> AppResult<HashMap<String, Reading>> {
        let temperature = self.temperature.borrow().position();
        let frame = self.base.scaled(temperature);
        let datum_id = self.store.save(&frame)?;
        let mut readings = HashMap::new();
        readings.insert(self.field.clone(), Reading::now(FieldValue::Text(datum_id)));
        Ok(readings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_mover_set_and_read() {
        let mut motor = Mover::new("motor", 0.0);
        motor.set(2.5).expect("set");
        let readings = motor.trigger_read().expect("read");
        assert_eq!(readings["motor"].value, FieldValue::Number(2.5));
    }

    #[test]
    fn test_syn_gauss_peaks_at_center() {
        let motor = Rc::new(RefCell::new(Mover::new("motor", 0.0)));
        let mut det = SynGauss::new("det", motor.clone(), 1.0, 100.0, 2.0, 0.0);

        motor.borrow_mut().set(1.0).expect("set");
        let at_center = det.trigger_read().expect("read")["det"]
            .value
            .as_f64()
            .expect("number");
        assert!((at_center - 100.0).abs() < 1e-9);

        motor.borrow_mut().set(5.0).expect("set");
        let off_center = det.trigger_read().expect("read")["det"]
            .value
            .as_f64()
            .expect("number");
        assert!(off_center < at_center);
    }

    #[test]
    fn test_image_detector_saves_frames() {
        let dir = tempdir().expect("tempdir");
        let store = FileStore::new(dir.path()).expect("store");
        let temp = Rc::new(RefCell::new(Mover::new("T", 2.0)));
        let mut det = ImageDetector::new("camera", "image", temp.clone(), store.clone(), 21, 19);

        assert_eq!(det.describe()["image"].shape, vec![21, 19]);

        let readings = det.trigger_read().expect("read");
        let datum_id = readings["image"].value.as_str().expect("datum id");
        let frame = store.retrieve(datum_id).expect("retrieve");
        assert_eq!(frame.shape(), (21, 19));

        // Doubling the temperature doubles every pixel.
        temp.borrow_mut().set(4.0).expect("set");
        let readings = det.trigger_read().expect("read");
        let hot = store
            .retrieve(readings["image"].value.as_str().expect("datum id"))
            .expect("retrieve");
        for (a, b) in frame.data().iter().zip(hot.data()) {
            assert!((b - 2.0 * a).abs() < 1e-12);
        }
    }
}
