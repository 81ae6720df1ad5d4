//! Scan with live rendering plus per-run CSV export.
//!
//! The export filename is templated from start-document metadata. The uid
//! placeholder keeps filenames unique per run; if a template without it
//! produces a name that already exists, the export fails rather than
//! overwriting the old file.

use daq_live::callbacks::{CsvExporter, LivePlot, LiveTable, RecordingSink};
use daq_live::config::Settings;
use daq_live::experiment::{plans, DeviceRegistry, RunEngine};
use daq_live::sim::{Mover, SynGauss};
use daq_live::{CallbackRegistry, SubscriptionFilter};
use serde_json::json;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let settings = Settings::load()?;

    let motor = Rc::new(RefCell::new(Mover::new("motor", 0.0)));
    let det = SynGauss::new("det", motor.clone(), 0.0, 1.0, 1.0, 0.0);
    let mut devices = DeviceRegistry::new();
    devices.register_shared("motor", motor);
    devices.register(Box::new(det));

    let csv_writer = CsvExporter::new(
        &["motor", "det"],
        "{uid:.6s}_{scan_id:04d}_{user}.csv",
        &settings.export_dir,
    )?;

    let mut subs = CallbackRegistry::new();
    subs.subscribe(SubscriptionFilter::All, Box::new(csv_writer));
    subs.subscribe(
        SubscriptionFilter::All,
        Box::new(LiveTable::new(&["motor", "det"], std::io::stdout())),
    );
    subs.subscribe(
        SubscriptionFilter::All,
        Box::new(LivePlot::new("det", "motor", RecordingSink::new())),
    );

    let mut md = HashMap::new();
    md.insert("user".to_string(), json!("tcaswell"));

    let mut engine = RunEngine::new();
    let plan = plans::scan(&["det"], "motor", -5.0, 5.0, 111);
    let run_uid = engine.run(&mut devices, &plan, &mut subs, md)?;

    println!(
        "run {} exported to {}",
        run_uid,
        settings.export_dir.display()
    );
    Ok(())
}
