//! Live radial integration: as 2D frames are collected, reduce each one to an
//! integrated S(q) curve labeled by temperature.
//!
//! The area detector writes frames to the file store and reports only datum
//! references; the integration callback resolves them back, bins by radius
//! around the calibrated center, and rescales by the wavelength from the
//! engine's persistent metadata.

use daq_live::callbacks::{LiveIntegrate, RecordingSink};
use daq_live::config::Settings;
use daq_live::experiment::{plans, DeviceRegistry, RunEngine};
use daq_live::sim::{ImageDetector, Mover};
use daq_live::store::FileStore;
use daq_live::{CallbackRegistry, SubscriptionFilter};
use serde_json::json;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let settings = Settings::load()?;

    let store = FileStore::new(&settings.frame_dir)?;
    let temp = Rc::new(RefCell::new(Mover::new("T", 0.0)));
    let camera = ImageDetector::new("camera", "image", temp.clone(), store.clone(), 107, 101);

    let mut devices = DeviceRegistry::new();
    devices.register_shared("T", temp);
    devices.register(Box::new(camera));

    let integrate = Rc::new(RefCell::new(LiveIntegrate::new(
        "image",
        "T",
        100,
        store,
        RecordingSink::new(),
    )));
    let mut subs = CallbackRegistry::new();
    subs.subscribe(SubscriptionFilter::All, Box::new(integrate.clone()));

    let mut engine = RunEngine::new();
    engine.md.insert("wavelength".to_string(), json!(15.0));
    engine
        .md
        .insert("center".to_string(), json!([107.0 / 2.0, 101.0 / 2.0]));

    let mut md = HashMap::new();
    md.insert("sample".to_string(), json!("FooBar"));

    let plan = plans::scan(&["camera"], "T", 200.0, 270.0, 5);
    engine.run(&mut devices, &plan, &mut subs, md)?;

    let integrate = integrate.borrow();
    println!(
        "integrated {} frames under '{}'",
        integrate.sink().curves.len(),
        integrate.sink().title
    );
    Ok(())
}
