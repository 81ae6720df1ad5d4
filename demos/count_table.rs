//! Repeated readings of a single axis, rendered as a live table.

use daq_live::callbacks::LiveTable;
use daq_live::experiment::{plans, DeviceRegistry, RunEngine};
use daq_live::sim::Mover;
use daq_live::{CallbackRegistry, SubscriptionFilter};
use std::collections::HashMap;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut devices = DeviceRegistry::new();
    devices.register(Box::new(Mover::new("motor", 0.0)));

    let mut subs = CallbackRegistry::new();
    subs.subscribe(
        SubscriptionFilter::All,
        Box::new(LiveTable::new(&["motor"], std::io::stdout())),
    );

    let mut engine = RunEngine::new();
    let plan = plans::count(&["motor"], 5);
    engine.run(&mut devices, &plan, &mut subs, HashMap::new())?;
    Ok(())
}
