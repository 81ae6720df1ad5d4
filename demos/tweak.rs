//! Nudge a motor toward a detector peak with a scripted step sequence.
//!
//! The interactive original prompts for each step; here the steps are listed
//! up front and the tweak plan replays them, so the table shows the reading
//! rise as the motor closes in on the peak.

use daq_live::callbacks::LiveTable;
use daq_live::experiment::{plans, DeviceRegistry, RunEngine};
use daq_live::sim::{Mover, SynGauss};
use daq_live::{CallbackRegistry, SubscriptionFilter};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let motor = Rc::new(RefCell::new(Mover::new("motor", 0.0)));
    let det = SynGauss::new("det", motor.clone(), 0.0, 100.0, 1.0, 0.0);
    let mut devices = DeviceRegistry::new();
    devices.register_shared("motor", motor.clone());
    devices.register(Box::new(det));

    let mut subs = CallbackRegistry::new();
    subs.subscribe(
        SubscriptionFilter::All,
        Box::new(LiveTable::new(&["motor", "det"], std::io::stdout())),
    );

    // Walk in from -3, overshoot once, then settle near the peak at 0.
    let steps = [1.0, 1.0, 0.5, 0.5, 0.25, -0.125, -0.0625];
    let plan = plans::tweak("det", "motor", -3.0, &steps);

    let mut engine = RunEngine::new();
    engine.run(&mut devices, &plan, &mut subs, HashMap::new())?;

    println!("final motor position: {}", motor.borrow().position());
    Ok(())
}
