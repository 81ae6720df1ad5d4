//! 1D scan with a live table and a live detector-vs-motor plot.

use daq_live::callbacks::{LivePlot, LiveTable, RecordingSink};
use daq_live::experiment::{plans, DeviceRegistry, RunEngine};
use daq_live::sim::{Mover, SynGauss};
use daq_live::{CallbackRegistry, SubscriptionFilter};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let motor = Rc::new(RefCell::new(Mover::new("motor", 0.0)));
    let det = SynGauss::new("det", motor.clone(), 0.0, 1.0, 1.0, 0.0);
    let mut devices = DeviceRegistry::new();
    devices.register_shared("motor", motor);
    devices.register(Box::new(det));

    // The recording sink stands in for a GUI plot axis; keep a handle so the
    // collected points can be inspected after the run.
    let plot = Rc::new(RefCell::new(LivePlot::new(
        "det",
        "motor",
        RecordingSink::new(),
    )));
    let mut subs = CallbackRegistry::new();
    subs.subscribe(
        SubscriptionFilter::All,
        Box::new(LiveTable::new(&["motor", "det"], std::io::stdout())),
    );
    subs.subscribe(SubscriptionFilter::All, Box::new(plot.clone()));

    let mut engine = RunEngine::new();
    let plan = plans::scan(&["det"], "motor", -5.0, 5.0, 111);
    engine.run(&mut devices, &plan, &mut subs, HashMap::new())?;

    let plot = plot.borrow();
    println!(
        "plotted {} points under '{}'",
        plot.sink().points.len(),
        plot.sink().title
    );
    Ok(())
}
