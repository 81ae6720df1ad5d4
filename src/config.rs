//! Demo configuration (Figment-based).
//!
//! Layered settings for the demo binaries: compiled defaults, then an
//! optional `DaqLive.toml`, then `DAQ_LIVE_*` environment variables. The
//! library itself takes all paths as explicit constructor arguments; this
//! exists so the demos agree on where exports, recorded runs, and frame blobs
//! land.

use crate::error::AppResult;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output locations for the demo scripts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Where `CsvExporter` writes per-run CSV files.
    pub export_dir: PathBuf,
    /// Where `JsonlStore` records document streams.
    pub store_dir: PathBuf,
    /// Where `FileStore` keeps detector frame blobs.
    pub frame_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            export_dir: PathBuf::from("/tmp/daq_live/export"),
            store_dir: PathBuf::from("/tmp/daq_live/runs"),
            frame_dir: PathBuf::from("/tmp/daq_live/frames"),
        }
    }
}

impl Settings {
    /// Defaults, overlaid by `DaqLive.toml` (if present), overlaid by
    /// `DAQ_LIVE_*` environment variables.
    pub fn load() -> AppResult<Self> {
        let settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("DaqLive.toml"))
            .merge(Env::prefixed("DAQ_LIVE_"))
            .extract()?;
        Ok(settings)
    }
}
