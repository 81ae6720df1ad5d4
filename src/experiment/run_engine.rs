//! Synchronous plan execution and document emission.
//!
//! The engine consumes a plan command by command, performs the simulated
//! actions against the device registry, and notifies subscribed callbacks of
//! each lifecycle document immediately. Callbacks run re-entrantly on the
//! engine's thread between commands; they never overlap with each other or
//! with device I/O.

use crate::callback::CallbackRegistry;
use crate::error::AppResult;
use crate::experiment::device::DeviceRegistry;
use crate::experiment::document::{
    DescriptorDoc, Document, EventDoc, StartDoc, StopDoc,
};
use crate::experiment::plans::{Plan, PlanCommand};
use log::{debug, info};
use serde_json::Value;
use std::collections::HashMap;

/// Executes plans and emits the start/descriptor/event/stop document stream.
///
/// Holds persistent metadata (`md`) merged into every start document, and the
/// sequential scan counter. All collaborators (devices, subscribers) are
/// passed in explicitly; the engine keeps no global state.
#[derive(Default)]
pub struct RunEngine {
    /// Persistent metadata merged into every run's start document.
    pub md: HashMap<String, Value>,
    scan_id: u64,
}

/// Per-run bookkeeping, created at start and discarded at stop.
struct RunBundle {
    run_uid: String,
    /// Descriptor uid per distinct (sorted) device set.
    descriptors: HashMap<Vec<String>, String>,
    seq_num: u32,
}

impl RunEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute `plan` once, publishing documents to `subs`.
    ///
    /// `md` entries override engine-level `self.md` entries of the same name
    /// for this run only. Returns the run uid. Any device or callback error
    /// propagates after a `fail` stop document has been emitted.
    pub fn run(
        &mut self,
        devices: &mut DeviceRegistry,
        plan: &Plan,
        subs: &mut CallbackRegistry,
        md: HashMap<String, Value>,
    ) -> AppResult<String> {
        let mut bundle = self.open_run(plan, subs, md)?;
        let run_uid = bundle.run_uid.clone();

        match Self::execute(devices, &plan.commands, subs, &mut bundle) {
            Ok(()) => {
                let stop = StopDoc::success(&run_uid, bundle.seq_num);
                subs.publish(&Document::Stop(stop))?;
                info!("run {run_uid} finished with {} events", bundle.seq_num);
                Ok(run_uid)
            }
            Err(err) => {
                let stop = StopDoc::fail(&run_uid, &err.to_string(), bundle.seq_num);
                subs.publish(&Document::Stop(stop))?;
                Err(err)
            }
        }
    }

    /// Execute `plan` repeatedly within a single run until `done()` reports
    /// completion after a pass, or `max_passes` passes have run.
    ///
    /// This is the adaptive-acquisition driver: pair it with a live fit whose
    /// uncertainty estimate feeds the predicate.
    pub fn run_until(
        &mut self,
        devices: &mut DeviceRegistry,
        plan: &Plan,
        subs: &mut CallbackRegistry,
        md: HashMap<String, Value>,
        max_passes: usize,
        mut done: impl FnMut() -> bool,
    ) -> AppResult<String> {
        let mut bundle = self.open_run(plan, subs, md)?;
        let run_uid = bundle.run_uid.clone();

        let mut outcome = Ok(());
        for pass in 0..max_passes {
            outcome = Self::execute(devices, &plan.commands, subs, &mut bundle);
            if outcome.is_err() {
                break;
            }
            debug!("pass {} complete after {} events", pass + 1, bundle.seq_num);
            if done() {
                break;
            }
        }

        match outcome {
            Ok(()) => {
                let stop = StopDoc::success(&run_uid, bundle.seq_num);
                subs.publish(&Document::Stop(stop))?;
                info!("run {run_uid} finished with {} events", bundle.seq_num);
                Ok(run_uid)
            }
            Err(err) => {
                let stop = StopDoc::fail(&run_uid, &err.to_string(), bundle.seq_num);
                subs.publish(&Document::Stop(stop))?;
                Err(err)
            }
        }
    }

    fn open_run(
        &mut self,
        plan: &Plan,
        subs: &mut CallbackRegistry,
        md: HashMap<String, Value>,
    ) -> AppResult<RunBundle> {
        self.scan_id += 1;
        let mut start = StartDoc::new(&plan.plan_type, &plan.plan_name, self.scan_id);
        for (key, value) in &self.md {
            start.metadata.insert(key.clone(), value.clone());
        }
        // Per-run metadata wins over engine-level metadata.
        for (key, value) in md {
            start.metadata.insert(key, value);
        }
        let run_uid = start.uid.clone();
        info!("run {run_uid} (scan_id {}) starting: {}", self.scan_id, plan.plan_name);
        subs.publish(&Document::Start(start))?;
        Ok(RunBundle {
            run_uid,
            descriptors: HashMap::new(),
            seq_num: 0,
        })
    }

    fn execute(
        devices: &mut DeviceRegistry,
        commands: &[PlanCommand],
        subs: &mut CallbackRegistry,
        bundle: &mut RunBundle,
    ) -> AppResult<()> {
        for command in commands {
            match command {
                PlanCommand::Set { device, position } => {
                    debug!("set {device} -> {position}");
                    devices.get_mut(device)?.set(*position)?;
                }
                PlanCommand::Checkpoint => {
                    // Suspension point in a real engine; nothing to do here.
                    debug!("checkpoint");
                }
                PlanCommand::TriggerRead { devices: names } => {
                    Self::trigger_read(devices, names, subs, bundle)?;
                }
            }
        }
        Ok(())
    }

    fn trigger_read(
        devices: &mut DeviceRegistry,
        names: &[String],
        subs: &mut CallbackRegistry,
        bundle: &mut RunBundle,
    ) -> AppResult<()> {
        // One descriptor per distinct device set, emitted before the first
        // matching event.
        let mut key: Vec<String> = names.to_vec();
        key.sort();
        if !bundle.descriptors.contains_key(&key) {
            let mut descriptor = DescriptorDoc::new(&bundle.run_uid, "primary");
            for name in names {
                for (field, data_key) in devices.get_mut(name)?.describe() {
                    descriptor.data_keys.insert(field, data_key);
                }
            }
            bundle
                .descriptors
                .insert(key.clone(), descriptor.uid.clone());
            subs.publish(&Document::Descriptor(descriptor))?;
        }
        let descriptor_uid = bundle.descriptors[&key].clone();

        bundle.seq_num += 1;
        let mut event = EventDoc::new(&bundle.run_uid, &descriptor_uid, bundle.seq_num);
        for name in names {
            for (field, reading) in devices.get_mut(name)?.trigger_read()? {
                event.timestamps.insert(field.clone(), reading.timestamp_ns);
                event.data.insert(field, reading.value);
            }
        }
        subs.publish(&Document::Event(event))
    }
}
