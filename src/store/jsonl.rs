//! Flat-file document broker: one JSON-lines file per run.

use crate::callback::DocumentCallback;
use crate::error::{AppResult, DaqError};
use crate::experiment::document::{DescriptorDoc, Document, EventDoc, StartDoc, StopDoc};
use crate::store::DocumentStore;
use log::info;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

/// Appends each document as one JSON line to `<dir>/<run_uid>.jsonl` and
/// replays them later for offline use.
pub struct JsonlStore {
    dir: PathBuf,
}

impl JsonlStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> AppResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn run_path(&self, run_uid: &str) -> PathBuf {
        self.dir.join(format!("{run_uid}.jsonl"))
    }

    /// Replay the full document stream of one run, in recorded order.
    pub fn load_run(&self, run_uid: &str) -> AppResult<Vec<Document>> {
        let path = self.run_path(run_uid);
        if !path.exists() {
            return Err(DaqError::UnknownRun(run_uid.to_string()));
        }
        let reader = BufReader::new(fs::File::open(path)?);
        let mut docs = Vec::new();
        for line in reader.lines() {
            docs.push(serde_json::from_str(&line?)?);
        }
        Ok(docs)
    }

    /// Run uids present on disk, in directory order.
    pub fn runs(&self) -> AppResult<Vec<String>> {
        let mut uids = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "jsonl") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    uids.push(stem.to_string());
                }
            }
        }
        Ok(uids)
    }
}

impl DocumentStore for JsonlStore {
    fn insert(&mut self, doc: &Document) -> AppResult<()> {
        let path = self.run_path(doc.run_uid());
        if matches!(doc, Document::Start(_)) {
            info!("recording run {} to {}", doc.run_uid(), path.display());
        }
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        serde_json::to_writer(&mut file, doc)?;
        file.write_all(b"\n")?;
        Ok(())
    }
}

impl DocumentCallback for JsonlStore {
    fn start(&mut self, doc: &StartDoc) -> AppResult<()> {
        self.insert(&Document::Start(doc.clone()))
    }

    fn descriptor(&mut self, doc: &DescriptorDoc) -> AppResult<()> {
        self.insert(&Document::Descriptor(doc.clone()))
    }

    fn event(&mut self, doc: &EventDoc) -> AppResult<()> {
        self.insert(&Document::Event(doc.clone()))
    }

    fn stop(&mut self, doc: &StopDoc) -> AppResult<()> {
        self.insert(&Document::Stop(doc.clone()))
    }
}
