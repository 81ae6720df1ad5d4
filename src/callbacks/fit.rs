//! Incremental Gaussian fitting of scalar scan data.
//!
//! [`LiveFit`] re-estimates a Gaussian from all points seen so far after each
//! event, using intensity-weighted moments: the weighted mean gives the
//! center, the weighted variance gives sigma, and the peak value gives the
//! amplitude. The estimate is cheap, deterministic, and good enough to drive
//! an adaptive acquisition loop; the `sigma_stderr` field shrinks roughly as
//! `1/sqrt(n)` and serves as the loop's stopping criterion.

use crate::callback::DocumentCallback;
use crate::callbacks::plot::PlotSink;
use crate::error::{AppResult, DaqError};
use crate::experiment::document::{DescriptorDoc, EventDoc, StartDoc, StopDoc};
use std::cell::RefCell;
use std::rc::Rc;

/// Parameter estimates for `A * exp(-(x - x0)^2 / (2 sigma^2))`.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianFit {
    pub amplitude: f64,
    pub center: f64,
    pub sigma: f64,
    /// Standard-error proxy for sigma; shrinks as points accumulate.
    pub sigma_stderr: f64,
    pub n_points: usize,
}

impl GaussianFit {
    /// Evaluate the fitted model at `x`.
    pub fn eval(&self, x: f64) -> f64 {
        let dx = x - self.center;
        self.amplitude * (-dx * dx / (2.0 * self.sigma * self.sigma)).exp()
    }
}

/// Accumulates `(x, y)` points per run and keeps the current fit.
pub struct LiveFit {
    y_field: String,
    x_field: String,
    xs: Vec<f64>,
    ys: Vec<f64>,
    result: Option<GaussianFit>,
}

impl LiveFit {
    pub fn new(y_field: &str, x_field: &str) -> Self {
        Self {
            y_field: y_field.to_string(),
            x_field: x_field.to_string(),
            xs: Vec::new(),
            ys: Vec::new(),
            result: None,
        }
    }

    pub fn result(&self) -> Option<&GaussianFit> {
        self.result.as_ref()
    }

    /// Observed x range so far, if any points have arrived.
    pub fn x_range(&self) -> Option<(f64, f64)> {
        if self.xs.is_empty() {
            return None;
        }
        let min = self.xs.iter().copied().fold(f64::INFINITY, f64::min);
        let max = self.xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some((min, max))
    }

    fn refit(&mut self) {
        let n = self.xs.len();
        if n < 3 {
            return;
        }
        // Negative readings carry no weight; noise can dip below zero.
        let weights: Vec<f64> = self.ys.iter().map(|&y| y.max(0.0)).collect();
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return;
        }
        let center: f64 = self
            .xs
            .iter()
            .zip(&weights)
            .map(|(&x, &w)| x * w)
            .sum::<f64>()
            / total;
        let variance: f64 = self
            .xs
            .iter()
            .zip(&weights)
            .map(|(&x, &w)| w * (x - center) * (x - center))
            .sum::<f64>()
            / total;
        let sigma = variance.sqrt();
        if sigma <= 0.0 {
            return;
        }
        let amplitude = self.ys.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let sigma_stderr = sigma / (2.0 * (n as f64 - 1.0)).sqrt();
        self.result = Some(GaussianFit {
            amplitude,
            center,
            sigma,
            sigma_stderr,
            n_points: n,
        });
    }
}

impl DocumentCallback for LiveFit {
    fn start(&mut self, _doc: &StartDoc) -> AppResult<()> {
        self.xs.clear();
        self.ys.clear();
        self.result = None;
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
        self.xs.push(x);
        self.ys.push(y);
        self.refit();
        Ok(())
    }
}

/// Re-plots the fitted curve after every event.
///
/// Wraps a shared [`LiveFit`] and forwards every document to it before
/// drawing, so subscribing the plot alone keeps the fit current; the caller
/// keeps its own handle to read the result after the run.
pub struct LiveFitPlot<S: PlotSink> {
    fit: Rc<RefCell<LiveFit>>,
    sink: S,
    curve_points: usize,
}

impl<S: PlotSink> LiveFitPlot<S> {
    pub fn new(fit: Rc<RefCell<LiveFit>>, sink: S) -> Self {
        Self {
            fit,
            sink,
            curve_points: 100,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

impl<S: PlotSink> DocumentCallback for LiveFitPlot<S> {
    fn start(&mut self, doc: &StartDoc) -> AppResult<()> {
        self.fit.borrow_mut().start(doc)?;
        let (x_field, y_field) = {
            let fit = self.fit.borrow();
            (fit.x_field.clone(), fit.y_field.clone())
        };
        self.sink.set_axis_labels(&x_field, &y_field);
        Ok(())
    }

    fn descriptor(&mut self, doc: &DescriptorDoc) -> AppResult<()> {
        self.fit.borrow_mut().descriptor(doc)
    }

    fn event(&mut self, doc: &EventDoc) -> AppResult<()> {
        self.fit.borrow_mut().event(doc)?;
        let fit = self.fit.borrow();
        if let (Some(result), Some((lo, hi))) = (fit.result(), fit.x_range()) {
            let span = hi - lo;
            let xs: Vec<f64> = (0..self.curve_points)
                .map(|i| lo + span * i as f64 / (self.curve_points - 1) as f64)
                .collect();
            let ys: Vec<f64> = xs.iter().map(|&x| result.eval(x)).collect();
            drop(fit);
            self.sink.curve("fit", &xs, &ys);
            self.sink.legend();
            self.sink.request_redraw();
        }
        Ok(())
    }

    fn stop(&mut self, doc: &StopDoc) -> AppResult<()> {
        self.fit.borrow_mut().stop(doc)
    }
}
