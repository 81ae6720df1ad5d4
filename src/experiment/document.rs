//! Document model for structured run data.
//!
//! Documents decouple data acquisition from visualization and storage:
//!
//! - **StartDoc**: run identity and user metadata
//! - **DescriptorDoc**: schema for a stream of events
//! - **EventDoc**: one data sample
//! - **StopDoc**: completion marker and exit status
//!
//! # Document flow
//!
//! ```text
//! StartDoc (1)
//!    │
//!    ├── DescriptorDoc (1+, one per distinct data shape)
//!    │       │
//!    │       └── EventDoc (N, measurements)
//!    │
//! StopDoc (1)
//! ```
//!
//! Documents for a given run are emitted in the order start, descriptor(s),
//! event(s), stop, with every event preceded by a matching descriptor.
//! Callbacks own no state beyond what they accumulate between start and stop.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Generate a new unique document ID.
pub fn new_uid() -> String {
    Uuid::new_v4().to_string()
}

/// Current timestamp in nanoseconds since Unix epoch.
pub fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// The four document kinds emitted over the lifetime of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Document {
    Start(StartDoc),
    Descriptor(DescriptorDoc),
    Event(EventDoc),
    Stop(StopDoc),
}

impl Document {
    /// Get the document UID.
    pub fn uid(&self) -> &str {
        match self {
            Document::Start(d) => &d.uid,
            Document::Descriptor(d) => &d.uid,
            Document::Event(d) => &d.uid,
            Document::Stop(d) => &d.uid,
        }
    }

    /// Get the run UID this document belongs to.
    pub fn run_uid(&self) -> &str {
        match self {
            // The start doc UID is the run UID.
            Document::Start(d) => &d.uid,
            Document::Descriptor(d) => &d.run_uid,
            Document::Event(d) => &d.run_uid,
            Document::Stop(d) => &d.run_uid,
        }
    }

    /// Get the timestamp in nanoseconds.
    pub fn timestamp_ns(&self) -> u64 {
        match self {
            Document::Start(d) => d.time_ns,
            Document::Descriptor(d) => d.time_ns,
            Document::Event(d) => d.time_ns,
            Document::Stop(d) => d.time_ns,
        }
    }
}

/// A single value within an event's data mapping.
///
/// Scalar readings travel inline as numbers; bulk data (camera frames) travels
/// as a text datum reference resolved later through a
/// [`FileStore`](crate::store::FileStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Numeric value, if this field holds one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(v) => Some(*v),
            FieldValue::Text(_) => None,
        }
    }

    /// Text value (e.g. a datum reference), if this field holds one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Number(_) => None,
            FieldValue::Text(s) => Some(s),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(v) => write!(f, "{v}"),
            FieldValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Number(v)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

/// Start document - emitted exactly once, first.
///
/// Carries run identity plus arbitrary user metadata (sample name, wavelength,
/// calibration center, operator). Metadata values are free-form JSON so that
/// callbacks can pull out what they understand and ignore the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartDoc {
    /// Unique run identifier (this IS the run_uid).
    pub uid: String,
    /// Sequential scan number assigned by the engine.
    pub scan_id: u64,
    /// Plan type that generated this run (e.g. "scan", "count").
    pub plan_type: String,
    /// User-friendly plan name.
    pub plan_name: String,
    /// User-provided metadata.
    pub metadata: HashMap<String, Value>,
    /// Timestamp when the run started.
    pub time_ns: u64,
}

impl StartDoc {
    pub fn new(plan_type: &str, plan_name: &str, scan_id: u64) -> Self {
        Self {
            uid: new_uid(),
            scan_id,
            plan_type: plan_type.to_string(),
            plan_name: plan_name.to_string(),
            metadata: HashMap::new(),
            time_ns: now_ns(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// Numeric metadata entry, if present and a number.
    pub fn meta_f64(&self, key: &str) -> Option<f64> {
        self.metadata.get(key).and_then(Value::as_f64)
    }

    /// String metadata entry, if present and a string.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    /// Two-element numeric metadata entry (e.g. a beam center `[cy, cx]`).
    pub fn meta_pair(&self, key: &str) -> Option<[f64; 2]> {
        let arr = self.metadata.get(key)?.as_array()?;
        match arr.as_slice() {
            [a, b] => Some([a.as_f64()?, b.as_f64()?]),
            _ => None,
        }
    }
}

/// Descriptor document - schema declaration for a stream of events.
///
/// Emitted once per distinct data shape before any matching events. A run can
/// have multiple descriptors (e.g. a "primary" stream and a "baseline" stream).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescriptorDoc {
    /// Unique descriptor ID.
    pub uid: String,
    /// Links to the StartDoc.
    pub run_uid: String,
    /// Stream name (e.g. "primary").
    pub name: String,
    /// Schema for data fields.
    pub data_keys: HashMap<String, DataKey>,
    /// Timestamp.
    pub time_ns: u64,
}

impl DescriptorDoc {
    pub fn new(run_uid: &str, name: &str) -> Self {
        Self {
            uid: new_uid(),
            run_uid: run_uid.to_string(),
            name: name.to_string(),
            data_keys: HashMap::new(),
            time_ns: now_ns(),
        }
    }

    pub fn with_data_key(mut self, name: &str, key: DataKey) -> Self {
        self.data_keys.insert(name.to_string(), key);
        self
    }
}

/// Schema for one data field within events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataKey {
    /// Data type: "number", "string", "array".
    pub dtype: String,
    /// Shape for arrays (empty for scalars).
    pub shape: Vec<usize>,
    /// Source device ID.
    pub source: String,
    /// True when event values for this field are datum references into an
    /// external store rather than inline data.
    pub external: bool,
}

impl DataKey {
    /// A scalar number field.
    pub fn scalar(source: &str) -> Self {
        Self {
            dtype: "number".to_string(),
            shape: vec![],
            source: source.to_string(),
            external: false,
        }
    }

    /// An array field whose event values are external datum references.
    pub fn external_array(source: &str, shape: Vec<usize>) -> Self {
        Self {
            dtype: "array".to_string(),
            shape,
            source: source.to_string(),
            external: true,
        }
    }
}

/// Event document - one data sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDoc {
    /// Unique event ID.
    pub uid: String,
    /// Links to the StartDoc.
    pub run_uid: String,
    /// Links to the DescriptorDoc that defines the schema.
    pub descriptor_uid: String,
    /// Event sequence number within this run (1-based).
    pub seq_num: u32,
    /// Timestamp.
    pub time_ns: u64,
    /// Data values (field name -> value).
    pub data: HashMap<String, FieldValue>,
    /// Per-field timestamps (field name -> timestamp_ns).
    pub timestamps: HashMap<String, u64>,
}

impl EventDoc {
    pub fn new(run_uid: &str, descriptor_uid: &str, seq_num: u32) -> Self {
        Self {
            uid: new_uid(),
            run_uid: run_uid.to_string(),
            descriptor_uid: descriptor_uid.to_string(),
            seq_num,
            time_ns: now_ns(),
            data: HashMap::new(),
            timestamps: HashMap::new(),
        }
    }

    pub fn with_datum(mut self, field: &str, value: FieldValue) -> Self {
        self.timestamps.insert(field.to_string(), now_ns());
        self.data.insert(field.to_string(), value);
        self
    }
}

/// Stop document - emitted exactly once, last.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopDoc {
    /// Unique stop doc ID.
    pub uid: String,
    /// Links to the StartDoc.
    pub run_uid: String,
    /// Exit status: "success", "abort", "fail".
    pub exit_status: String,
    /// Reason for abort/failure.
    pub reason: String,
    /// Timestamp when the run ended.
    pub time_ns: u64,
    /// Total events emitted.
    pub num_events: u32,
}

impl StopDoc {
    pub fn success(run_uid: &str, num_events: u32) -> Self {
        Self {
            uid: new_uid(),
            run_uid: run_uid.to_string(),
            exit_status: "success".to_string(),
            reason: String::new(),
            time_ns: now_ns(),
            num_events,
        }
    }

    pub fn fail(run_uid: &str, reason: &str, num_events: u32) -> Self {
        Self {
            uid: new_uid(),
            run_uid: run_uid.to_string(),
            exit_status: "fail".to_string(),
            reason: reason.to_string(),
            time_ns: now_ns(),
            num_events,
        }
    }
}
