//! Custom error types for the library.
//!
//! This module defines the primary error type, `DaqError`, shared by the
//! document model, callbacks, stores, and the simulated run engine. Using the
//! `thiserror` crate, it provides a centralized and consistent way to handle
//! the failure modes of a run: filesystem problems during export, malformed
//! or missing document fields, bad calibration metadata, and unknown datum
//! references.
//!
//! Nothing in this library logs-and-continues: every error propagates to the
//! caller of the run via the `?` operator. File-exists-on-create and
//! missing-field-on-row-write are fatal to the current run's export;
//! missing calibration or shape metadata at descriptor time fails accumulator
//! construction for that run with no fallback.

use thiserror::Error;

/// Convenience alias for results using the library error type.
pub type AppResult<T> = std::result::Result<T, DaqError>;

/// Unified error type for document handling, callbacks, and stores.
#[derive(Error, Debug)]
pub enum DaqError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Filename template error: {0}")]
    Template(#[from] strfmt::FmtError),

    #[error("Blob encoding error: {0}")]
    Blob(#[from] bincode::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("Field '{0}' not present in event data")]
    MissingField(String),

    #[error("Descriptor declares no data key for field '{0}'")]
    MissingDataKey(String),

    #[error("Calibration error: {0}")]
    Calibration(String),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Unknown datum reference '{0}'")]
    UnknownDatum(String),

    #[error("Unknown run '{0}'")]
    UnknownRun(String),

    #[error("Unknown device '{0}'")]
    UnknownDevice(String),

    #[error("Device '{0}' is not movable")]
    NotMovable(String),

    #[error("Document lifecycle violation: {0}")]
    Lifecycle(String),
}
