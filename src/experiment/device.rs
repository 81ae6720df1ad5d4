//! Device abstraction consumed by the run engine.

use crate::error::{AppResult, DaqError};
use crate::experiment::document::{now_ns, DataKey, FieldValue};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One field's worth of data produced by a read.
#[derive(Debug, Clone)]
pub struct Reading {
    pub value: FieldValue,
    pub timestamp_ns: u64,
}

impl Reading {
    pub fn now(value: FieldValue) -> Self {
        Self {
            value,
            timestamp_ns: now_ns(),
        }
    }
}

/// A settable and/or readable instrument.
///
/// `describe` declares the fields a read will produce, matching the data keys
/// that end up in descriptor documents. `set` defaults to an error for
/// read-only devices.
pub trait Device {
    fn name(&self) -> &str;

    /// Field schemas this device contributes to a descriptor.
    fn describe(&self) -> HashMap<String, DataKey>;

    /// Move to `position`. Read-only devices reject this.
    fn set(&mut self, _position: f64) -> AppResult<()> {
        Err(DaqError::NotMovable(self.name().to_string()))
    }

    /// Trigger an acquisition and return one reading per declared field.
    fn trigger_read(&mut self) -> AppResult<HashMap<String, Reading>>;
}

/// Name-keyed collection of devices the engine executes plans against.
#[derive(Default)]
pub struct DeviceRegistry {
    devices: HashMap<String, Box<dyn Device>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device under its own name.
    pub fn register(&mut self, device: Box<dyn Device>) {
        self.devices.insert(device.name().to_string(), device);
    }

    /// Register a shared device handle under an explicit name.
    ///
    /// Needed because a shared handle cannot borrow its inner name for the
    /// lifetime of the registry entry.
    pub fn register_shared<D: Device + 'static>(&mut self, name: &str, device: Rc<RefCell<D>>) {
        self.devices
            .insert(name.to_string(), Box::new(NamedShared::new(name, device)));
    }

    pub fn get_mut(&mut self, name: &str) -> AppResult<&mut Box<dyn Device>> {
        self.devices
            .get_mut(name)
            .ok_or_else(|| DaqError::UnknownDevice(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.devices.contains_key(name)
    }
}

/// Shared device handle carrying its registry name by value.
struct NamedShared<D: Device> {
    name: String,
    inner: Rc<RefCell<D>>,
}

impl<D: Device> NamedShared<D> {
    fn new(name: &str, inner: Rc<RefCell<D>>) -> Self {
        Self {
            name: name.to_string(),
            inner,
        }
    }
}

impl<D: Device> Device for NamedShared<D> {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> HashMap<String, DataKey> {
        self.inner.borrow().describe()
    }

    fn set(&mut self, position: f64) -> AppResult<()> {
        self.inner.borrow_mut().set(position)
    }

    fn trigger_read(&mut self) -> AppResult<HashMap<String, Reading>> {
        self.inner.borrow_mut().trigger_read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        name: String,
        value: f64,
    }

    impl Device for Probe {
        fn name(&self) -> &str {
            &self.name
        }

        fn describe(&self) -> HashMap<String, DataKey> {
            let mut keys = HashMap::new();
            keys.insert(self.name.clone(), DataKey::scalar(&self.name));
            keys
        }

        fn trigger_read(&mut self) -> AppResult<HashMap<String, Reading>> {
            let mut readings = HashMap::new();
            readings.insert(
                self.name.clone(),
                Reading::now(FieldValue::Number(self.value)),
            );
            Ok(readings)
        }
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = DeviceRegistry::new();
        registry.register(Box::new(Probe {
            name: "probe".to_string(),
            value: 2.0,
        }));

        assert!(registry.contains("probe"));
        assert!(registry.get_mut("missing").is_err());
        let readings = registry
            .get_mut("probe")
            .and_then(|d| d.trigger_read())
            .expect("read");
        assert_eq!(readings["probe"].value, FieldValue::Number(2.0));
    }

    #[test]
    fn test_read_only_device_rejects_set() {
        let mut probe = Probe {
            name: "probe".to_string(),
            value: 0.0,
        };
        assert!(probe.set(1.0).is_err());
    }

    #[test]
    fn test_shared_registration() {
        let probe = Rc::new(RefCell::new(Probe {
            name: "probe".to_string(),
            value: 7.0,
        }));
        let mut registry = DeviceRegistry::new();
        registry.register_shared("probe", probe.clone());

        probe.borrow_mut().value = 8.0;
        let readings = registry
            .get_mut("probe")
            .and_then(|d| d.trigger_read())
            .expect("read");
        assert_eq!(readings["probe"].value, FieldValue::Number(8.0));
    }
}
