//! Bulk-array storage resolving opaque datum references.
//!
//! Detector frames never travel inline through the document stream. A
//! detector saves its frame here and puts the returned datum id into the
//! event; any consumer holding a `FileStore` handle resolves the id back to
//! the raw array. Blobs are `bincode`-encoded, one file per datum.

use crate::analysis::Image;
use crate::error::{AppResult, DaqError};
use crate::experiment::document::new_uid;
use log::debug;
use std::fs;
use std::path::PathBuf;

/// Directory-backed array store. Cheap to clone; clones share the directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> AppResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn datum_path(&self, datum_id: &str) -> PathBuf {
        self.dir.join(format!("{datum_id}.bin"))
    }

    /// Persist an image and return the datum id that resolves back to it.
    pub fn save(&self, image: &Image) -> AppResult<String> {
        let datum_id = new_uid();
        let blob = bincode::serialize(image)?;
        fs::write(self.datum_path(&datum_id), blob)?;
        debug!("saved {}x{} frame as datum {datum_id}", image.rows(), image.cols());
        Ok(datum_id)
    }

    /// Resolve a datum id to the stored image. Unknown ids are an error.
    pub fn retrieve(&self, datum_id: &str) -> AppResult<Image> {
        let path = self.datum_path(datum_id);
        if !path.exists() {
            return Err(DaqError::UnknownDatum(datum_id.to_string()));
        }
        let blob = fs::read(path)?;
        Ok(bincode::deserialize(&blob)?)
    }
}
