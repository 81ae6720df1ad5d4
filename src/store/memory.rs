//! In-memory metadata/document broker.

use crate::callback::DocumentCallback;
use crate::error::{AppResult, DaqError};
use crate::experiment::document::{
    DescriptorDoc, Document, EventDoc, FieldValue, StartDoc, StopDoc,
};
use crate::store::DocumentStore;
use std::collections::HashMap;
use std::io::Write;

/// Keeps every document of every run in insertion order, keyed by run uid.
///
/// This is the offline-analysis side of the demos: subscribe the store during
/// acquisition, then pull a table of selected fields back out afterwards.
#[derive(Default)]
pub struct MemoryStore {
    runs: Vec<String>,
    documents: HashMap<String, Vec<Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run uids in the order their start documents arrived.
    pub fn runs(&self) -> &[String] {
        &self.runs
    }

    /// Full document stream for one run.
    pub fn get_run(&self, run_uid: &str) -> AppResult<&[Document]> {
        self.documents
            .get(run_uid)
            .map(Vec::as_slice)
            .ok_or_else(|| DaqError::UnknownRun(run_uid.to_string()))
    }

    /// Event values for `fields`, one row per event, in event order.
    ///
    /// A field missing from any event is a hard error, matching the export
    /// callback's no-silent-blanks policy.
    pub fn get_table(&self, run_uid: &str, fields: &[&str]) -> AppResult<Vec<Vec<FieldValue>>> {
        let docs = self.get_run(run_uid)?;
        let mut rows = Vec::new();
        for doc in docs {
            if let Document::Event(event) = doc {
                let mut row = Vec::with_capacity(fields.len());
                for &field in fields {
                    let value = event
                        .data
                        .get(field)
                        .ok_or_else(|| DaqError::MissingField(field.to_string()))?;
                    row.push(value.clone());
                }
                rows.push(row);
            }
        }
        Ok(rows)
    }

    /// Write a header plus one row per event to `out` as CSV.
    pub fn export_csv<W: Write>(
        &self,
        run_uid: &str,
        fields: &[&str],
        out: W,
    ) -> AppResult<()> {
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(fields)?;
        for row in self.get_table(run_uid, fields)? {
            writer.write_record(row.iter().map(FieldValue::to_string))?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl DocumentStore for MemoryStore {
    fn insert(&mut self, doc: &Document) -> AppResult<()> {
        let run_uid = doc.run_uid().to_string();
        if matches!(doc, Document::Start(_)) {
            self.runs.push(run_uid.clone());
        }
        self.documents.entry(run_uid).or_default().push(doc.clone());
        Ok(())
    }
}

impl DocumentCallback for MemoryStore {
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
