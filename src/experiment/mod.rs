//! Experiment orchestration: documents, plans, devices, run engine.
//!
//! - **Plans**: declarative command sequences (move, trigger-and-read,
//!   checkpoint) built by the helpers in [`plans`]
//! - **RunEngine**: executes a plan against a device registry and emits the
//!   document stream to subscribed callbacks, synchronously, in order
//! - **Documents**: structured data streams (Start, Descriptor, Event, Stop)
//!
//! The engine here is a deliberately small simulation driver: it exists to
//! produce well-formed document streams for the callbacks and demos, not to
//! orchestrate real hardware.

pub mod device;
pub mod document;
pub mod plans;
pub mod run_engine;

pub use device::{Device, DeviceRegistry, Reading};
pub use document::{
    DataKey, DescriptorDoc, Document, EventDoc, FieldValue, StartDoc, StopDoc,
};
pub use plans::{Plan, PlanCommand};
pub use run_engine::RunEngine;
