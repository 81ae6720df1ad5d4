//! End-to-end tests for run execution with CSV export and broker recording.

use daq_live::callbacks::{CsvExporter, LiveTable};
use daq_live::experiment::{plans, DeviceRegistry, Document, RunEngine};
use daq_live::sim::{Mover, SynGauss};
use daq_live::store::MemoryStore;
use daq_live::{CallbackRegistry, SubscriptionFilter};
use serde_json::json;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::rc::Rc;
use tempfile::tempdir;

fn sim_devices() -> DeviceRegistry {
    let motor = Rc::new(RefCell::new(Mover::new("motor", 0.0)));
    let det = SynGauss::new("det", motor.clone(), 0.0, 100.0, 1.0, 0.0);
    let mut devices = DeviceRegistry::new();
    devices.register_shared("motor", motor);
    devices.register(Box::new(det));
    devices
}

#[test]
fn test_export_row_count_equals_event_count() {
    let dir = tempdir().expect("tempdir");
    let mut devices = sim_devices();

    let exporter = CsvExporter::new(
        &["motor", "det"],
        "{uid:.6s}_{scan_id:04d}_{user}.csv",
        dir.path(),
    )
    .expect("exporter");
    let store = Rc::new(RefCell::new(MemoryStore::new()));

    let mut subs = CallbackRegistry::new();
    subs.subscribe(SubscriptionFilter::All, Box::new(exporter));
    subs.subscribe(SubscriptionFilter::All, Box::new(store.clone()));

    let mut md = HashMap::new();
    md.insert("user".to_string(), json!("tcaswell"));

    let mut engine = RunEngine::new();
    let plan = plans::scan(&["det"], "motor", -5.0, 5.0, 111);
    let run_uid = engine
        .run(&mut devices, &plan, &mut subs, md)
        .expect("run");

    // Exactly one file, named from start metadata.
    let entries: Vec<_> = fs::read_dir(dir.path())
        .expect("dir")
        .map(|e| e.expect("entry").file_name().into_string().expect("name"))
        .collect();
    assert_eq!(entries.len(), 1);
    let short_uid: String = run_uid.chars().take(6).collect();
    assert_eq!(entries[0], format!("{short_uid}_0001_tcaswell.csv"));

    // Header plus one row per event.
    let text = fs::read_to_string(dir.path().join(&entries[0])).expect("read");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 112);
    assert_eq!(lines[0], "motor,det");

    // Rows agree with the broker's view of the same stream.
    let store = store.borrow();
    let events = store
        .get_run(&run_uid)
        .expect("run docs")
        .iter()
        .filter(|d| matches!(d, Document::Event(_)))
        .count();
    assert_eq!(events, 111);

    // Field order is motor then det; motor sweeps -5 to 5.
    let first_row: Vec<&str> = lines[1].split(',').collect();
    assert_eq!(first_row[0], "-5");
    let last_row: Vec<&str> = lines[111].split(',').collect();
    let last_motor: f64 = last_row[0].parse().expect("motor value");
    assert!((last_motor - 5.0).abs() < 1e-9);
}

#[test]
fn test_second_run_gets_its_own_file() {
    let dir = tempdir().expect("tempdir");
    let mut devices = sim_devices();

    let exporter =
        CsvExporter::new(&["motor", "det"], "{uid:.6s}_{scan_id:04d}.csv", dir.path())
            .expect("exporter");
    let mut subs = CallbackRegistry::new();
    subs.subscribe(SubscriptionFilter::All, Box::new(exporter));

    let mut engine = RunEngine::new();
    let plan = plans::scan(&["det"], "motor", -1.0, 1.0, 3);
    engine
        .run(&mut devices, &plan, &mut subs, HashMap::new())
        .expect("first run");
    engine
        .run(&mut devices, &plan, &mut subs, HashMap::new())
        .expect("second run");

    let names: Vec<String> = fs::read_dir(dir.path())
        .expect("dir")
        .map(|e| e.expect("entry").file_name().into_string().expect("name"))
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names.iter().any(|n| n.ends_with("_0001.csv")));
    assert!(names.iter().any(|n| n.ends_with("_0002.csv")));
}

#[test]
fn test_table_renders_alongside_export() {
    #[derive(Clone, Default)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);
    impl std::io::Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let mut devices = sim_devices();
    let buf = SharedBuf::default();
    let mut subs = CallbackRegistry::new();
    subs.subscribe(
        SubscriptionFilter::All,
        Box::new(LiveTable::new(&["motor", "det"], buf.clone())),
    );

    let mut engine = RunEngine::new();
    let plan = plans::count(&["motor", "det"], 4);
    engine
        .run(&mut devices, &plan, &mut subs, HashMap::new())
        .expect("run");

    let text = String::from_utf8(buf.0.borrow().clone()).expect("utf8");
    assert!(text.contains("exit_status: success (4 events)"));
}
