//! Snaked 2D grid scan feeding a live raster image.

use daq_live::callbacks::{LiveRaster, LiveTable, RecordingSink};
use daq_live::experiment::{plans, DeviceRegistry, RunEngine};
use daq_live::sim::{Mover, SynGauss};
use daq_live::{CallbackRegistry, SubscriptionFilter};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let motor1 = Rc::new(RefCell::new(Mover::new("motor1", 0.0)));
    let motor2 = Rc::new(RefCell::new(Mover::new("motor2", 0.0)));
    let det4 = SynGauss::new("det4", motor1.clone(), 0.0, 1.0, 2.0, 0.05);

    let mut devices = DeviceRegistry::new();
    devices.register_shared("motor1", motor1);
    devices.register_shared("motor2", motor2);
    devices.register(Box::new(det4));

    let raster = Rc::new(RefCell::new(LiveRaster::new(
        "det4",
        (5, 7),
        true,
        RecordingSink::new(),
    )));
    let mut subs = CallbackRegistry::new();
    subs.subscribe(
        SubscriptionFilter::All,
        Box::new(LiveTable::new(
            &["motor1", "motor2", "det4"],
            std::io::stdout(),
        )),
    );
    subs.subscribe(SubscriptionFilter::All, Box::new(raster.clone()));

    let mut engine = RunEngine::new();
    let plan = plans::outer_product_scan(
        &["det4"],
        "motor1",
        -3.0,
        3.0,
        5,
        "motor2",
        -5.0,
        5.0,
        7,
        true,
    );
    engine.run(&mut devices, &plan, &mut subs, HashMap::new())?;

    let raster = raster.borrow();
    println!("raster frames emitted: {}", raster.sink().images.len());
    Ok(())
}
