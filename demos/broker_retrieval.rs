//! Record a run into the broker, then retrieve it for offline use.
//!
//! The document stream goes both to an in-memory store and to a JSON-lines
//! store on disk; afterwards the table of selected fields is fetched back and
//! re-exported as CSV without touching the engine.

use daq_live::experiment::{plans, DeviceRegistry, RunEngine};
use daq_live::config::Settings;
use daq_live::sim::{Mover, SynGauss};
use daq_live::store::{JsonlStore, MemoryStore};
use daq_live::{CallbackRegistry, SubscriptionFilter};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let settings = Settings::load()?;

    let motor = Rc::new(RefCell::new(Mover::new("motor", 0.0)));
    let det = SynGauss::new("det", motor.clone(), 0.5, 1.0, 1.0, 0.0);
    let mut devices = DeviceRegistry::new();
    devices.register_shared("motor", motor);
    devices.register(Box::new(det));

    let store = Rc::new(RefCell::new(MemoryStore::new()));
    let jsonl = JsonlStore::new(&settings.store_dir)?;
    let mut subs = CallbackRegistry::new();
    subs.subscribe(SubscriptionFilter::All, Box::new(store.clone()));
    subs.subscribe(SubscriptionFilter::All, Box::new(jsonl));

    let mut engine = RunEngine::new();
    let plan = plans::scan(&["det"], "motor", -2.0, 2.0, 21);
    let run_uid = engine.run(&mut devices, &plan, &mut subs, HashMap::new())?;

    // Offline: pull the table back out and plot/export as needed.
    let store = store.borrow();
    let table = store.get_table(&run_uid, &["motor", "det"])?;
    println!("retrieved {} rows for run {run_uid}", table.len());
    for row in table.iter().take(3) {
        println!("  motor={} det={}", row[0], row[1]);
    }

    let mut csv_out = Vec::new();
    store.export_csv(&run_uid, &["motor", "det"], &mut csv_out)?;
    println!("csv export: {} bytes", csv_out.len());

    // The same stream is replayable from disk.
    let replayed = JsonlStore::new(&settings.store_dir)?.load_run(&run_uid)?;
    println!("replayed {} documents from {}", replayed.len(), settings.store_dir.display());
    Ok(())
}
