//! Live-visualization and export callbacks for a document-based run engine.
//!
//! A run emits a fixed-order stream of documents (start, descriptor, event,
//! stop); subscribed callbacks render tables and plots, fit curves, integrate
//! detector frames, or export rows to CSV, all synchronously on the engine's
//! thread. Stores record the same stream for offline retrieval.

pub mod analysis;
pub mod callback;
pub mod callbacks;
pub mod config;
pub mod error;
pub mod experiment;
pub mod sim;
pub mod store;

pub use callback::{CallbackRegistry, DocumentCallback, SubscriptionFilter};
pub use error::{AppResult, DaqError};
pub use experiment::{Document, RunEngine};
