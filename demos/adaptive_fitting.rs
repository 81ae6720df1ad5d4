//! Adaptive acquisition: re-sweep a noisy Gaussian peak until the live fit's
//! sigma uncertainty falls below a threshold.

use daq_live::callbacks::{LiveFit, LiveFitPlot, LivePlot, RecordingSink};
use daq_live::experiment::{plans, DeviceRegistry, RunEngine};
use daq_live::sim::{Mover, SynGauss};
use daq_live::{CallbackRegistry, SubscriptionFilter};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

const ERR_THRESH: f64 = 0.03;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let motor = Rc::new(RefCell::new(Mover::new("motor", 0.0)));
    let noisy_det = SynGauss::new("noisy_det", motor.clone(), 0.0, 100.0, 1.0, 5.0);
    let mut devices = DeviceRegistry::new();
    devices.register_shared("motor", motor);
    devices.register(Box::new(noisy_det));

    let fit = Rc::new(RefCell::new(LiveFit::new("noisy_det", "motor")));
    let mut subs = CallbackRegistry::new();
    subs.subscribe(
        SubscriptionFilter::All,
        Box::new(LiveFitPlot::new(fit.clone(), RecordingSink::new())),
    );
    subs.subscribe(
        SubscriptionFilter::All,
        Box::new(LivePlot::new("noisy_det", "motor", RecordingSink::new())),
    );

    let mut engine = RunEngine::new();
    let sweep = plans::scan(&["noisy_det"], "motor", -5.0, 5.0, 31);
    engine.run_until(
        &mut devices,
        &sweep,
        &mut subs,
        HashMap::new(),
        20,
        || {
            fit.borrow()
                .result()
                .is_some_and(|r| r.sigma_stderr < ERR_THRESH)
        },
    )?;

    let fit = fit.borrow();
    if let Some(result) = fit.result() {
        println!(
            "fit after {} points: center {:.3}, sigma {:.3} (stderr {:.4})",
            result.n_points, result.center, result.sigma, result.sigma_stderr
        );
    }
    Ok(())
}
