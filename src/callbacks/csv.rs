//! Per-run CSV export of selected event fields.
//!
//! Filenames are rendered from start-document metadata with python-style
//! format specs via the `strfmt` crate, e.g.
//! `"{uid:.6s}_{scan_id:04d}_{user}.csv"`. Files are opened for exclusive
//! creation: an existing file of the same name fails the run's export rather
//! than being silently overwritten.

use crate::callback::DocumentCallback;
use crate::error::{AppResult, DaqError};
use crate::experiment::document::{DescriptorDoc, EventDoc, StartDoc, StopDoc};
use log::info;
use serde_json::Value;
use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;
use strfmt::{strfmt_map, FmtError, Formatter};

/// Drop python type characters (`s`, `d`, `f`) from the format specs of a
/// template's replacement fields.
///
/// `strfmt` understands fill, width, and precision but rejects the trailing
/// type character, so `{scan_id:04d}` must become `{scan_id:04}` before it
/// reaches the formatter.
fn strip_type_chars(template: &str) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(ch) = chars.next() {
        out.push(ch);
        if ch != '{' {
            continue;
        }
        if chars.peek() == Some(&'{') {
            // Escaped literal brace.
            out.push('{');
            chars.next();
            continue;
        }
        let mut field = String::new();
        let mut closed = false;
        for c in chars.by_ref() {
            if c == '}' {
                closed = true;
                break;
            }
            field.push(c);
        }
        match field.split_once(':') {
            Some((name, spec)) => {
                let spec = spec.strip_suffix(['s', 'd', 'f']).unwrap_or(spec);
                out.push_str(name);
                if !spec.is_empty() {
                    out.push(':');
                    out.push_str(spec);
                }
            }
            None => out.push_str(&field),
        }
        if closed {
            out.push('}');
        }
    }
    out
}

/// Render a filename template against a start document.
///
/// `uid` and `scan_id` come from the document itself; every other placeholder
/// is looked up in the start metadata. Strings format with `s` specs, numbers
/// with `d`/`f` specs. Unknown placeholders are a hard error.
pub fn render_filename(template: &str, doc: &StartDoc) -> AppResult<String> {
    let template = strip_type_chars(template);
    let rendered = strfmt_map(&template, |mut fmt: Formatter| {
        let key = fmt.key.to_string();
        if key == "uid" {
            return fmt.str(&doc.uid);
        }
        if key == "scan_id" {
            return fmt.i64(doc.scan_id as i64);
        }
        match doc.metadata.get(&key) {
            Some(Value::String(s)) => fmt.str(s),
            Some(Value::Number(n)) if n.is_i64() => fmt.i64(n.as_i64().unwrap_or(0)),
            Some(Value::Number(n)) => fmt.f64(n.as_f64().unwrap_or(0.0)),
            Some(other) => fmt.str(&other.to_string()),
            None => Err(FmtError::KeyError(key)),
        }
    })?;
    Ok(rendered)
}

/// Serializes selected event fields to one CSV file per run.
///
/// Lifecycle:
/// - `start`: close any open writer, render the filename, create the file
///   (exclusive), attach a row writer
/// - `descriptor`: write a header row of field names (every descriptor - a
///   run with several descriptors repeats the header)
/// - `event`: write one row, values in configured field order; a missing
///   field is an error, never a blank
/// - `stop`: flush and close
pub struct CsvExporter {
    fields: Vec<String>,
    template: String,
    dir: PathBuf,
    writer: Option<csv::Writer<File>>,
}

impl CsvExporter {
    /// Creates the output directory if it does not exist yet.
    pub fn new(fields: &[&str], template: &str, dir: impl Into<PathBuf>) -> AppResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            fields: fields.iter().map(|s| s.to_string()).collect(),
            template: template.to_string(),
            dir,
            writer: None,
        })
    }

    fn close(&mut self) -> AppResult<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}

impl DocumentCallback for CsvExporter {
    fn start(&mut self, doc: &StartDoc) -> AppResult<()> {
        // A start before the previous stop must not leave the old file open.
        self.close()?;

        let path = self.dir.join(render_filename(&self.template, doc)?);
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)?;
        info!("exporting run {} to {}", doc.uid, path.display());
        self.writer = Some(csv::Writer::from_writer(file));
        Ok(())
    }

    fn descriptor(&mut self, _doc: &DescriptorDoc) -> AppResult<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.write_record(&self.fields)?;
        }
        Ok(())
    }

    fn event(&mut self, doc: &EventDoc) -> AppResult<()> {
        if let Some(writer) = self.writer.as_mut() {
            let mut record = Vec::with_capacity(self.fields.len());
            for field in &self.fields {
                let value = doc
                    .data
                    .get(field)
                    .ok_or_else(|| DaqError::MissingField(field.clone()))?;
                record.push(value.to_string());
            }
            writer.write_record(&record)?;
        }
        Ok(())
    }

    fn stop(&mut self, _doc: &StopDoc) -> AppResult<()> {
        self.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::document::FieldValue;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    fn start_doc() -> StartDoc {
        let mut doc = StartDoc::new("scan", "scan", 7).with_metadata("user", json!("tcaswell"));
        doc.uid = "abcdef123456".to_string();
        doc
    }

    #[test]
    fn test_render_filename_full_template() {
        let name = render_filename("{uid:.6s}_{scan_id:04d}_{user}.csv", &start_doc())
            .expect("render");
        assert_eq!(name, "abcdef_0007_tcaswell.csv");
    }

    #[test]
    fn test_render_filename_unknown_key_fails() {
        assert!(render_filename("{nope}.csv", &start_doc()).is_err());
    }

    #[test]
    fn test_type_chars_stripped_from_specs() {
        assert_eq!(
            strip_type_chars("{uid:.6s}_{scan_id:04d}_{user}.csv"),
            "{uid:.6}_{scan_id:04}_{user}.csv"
        );
        // Bare type char leaves an empty spec; literal braces pass through.
        assert_eq!(strip_type_chars("{scan_id:d}{{x}}"), "{scan_id}{{x}}");
    }

    #[test]
    fn test_render_filename_bare_type_chars() {
        let name = render_filename("{scan_id:d}_{uid:s}.csv", &start_doc()).expect("render");
        assert_eq!(name, "7_abcdef123456.csv");
    }

    fn run_once(exporter: &mut CsvExporter, doc: &StartDoc, events: u32) {
        exporter.start(doc).expect("start");
        let desc = DescriptorDoc::new(&doc.uid, "primary");
        exporter.descriptor(&desc).expect("descriptor");
        for i in 0..events {
            let event = EventDoc::new(&doc.uid, &desc.uid, i + 1)
                .with_datum("motor", FieldValue::Number(i as f64))
                .with_datum("det", FieldValue::Number(100.0 - i as f64));
            exporter.event(&event).expect("event");
        }
        exporter
            .stop(&StopDoc::success(&doc.uid, events))
            .expect("stop");
    }

    #[test]
    fn test_one_file_row_count_and_order() {
        let dir = tempdir().expect("tempdir");
        let mut exporter =
            CsvExporter::new(&["motor", "det"], "{uid:.6s}_{scan_id:04d}_{user}.csv", dir.path())
                .expect("exporter");

        run_once(&mut exporter, &start_doc(), 3);

        let path = dir.path().join("abcdef_0007_tcaswell.csv");
        let text = fs::read_to_string(&path).expect("read");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "motor,det");
        assert_eq!(lines[1], "0,100");
        assert_eq!(lines[3], "2,98");

        let files = fs::read_dir(dir.path()).expect("dir").count();
        assert_eq!(files, 1);
    }

    #[test]
    fn test_existing_file_is_fatal() {
        let dir = tempdir().expect("tempdir");
        let mut exporter = CsvExporter::new(&["motor"], "{uid:.6s}.csv", dir.path())
            .expect("exporter");
        fs::write(dir.path().join("abcdef.csv"), "old data").expect("write");

        assert!(exporter.start(&start_doc()).is_err());
        // The clobber-protected file is untouched.
        assert_eq!(
            fs::read_to_string(dir.path().join("abcdef.csv")).expect("read"),
            "old data"
        );
    }

    #[test]
    fn test_duplicate_header_per_descriptor() {
        let dir = tempdir().expect("tempdir");
        let mut exporter = CsvExporter::new(&["motor", "det"], "{uid:.6s}.csv", dir.path())
            .expect("exporter");

        let doc = start_doc();
        exporter.start(&doc).expect("start");
        exporter
            .descriptor(&DescriptorDoc::new(&doc.uid, "primary"))
            .expect("descriptor");
        exporter
            .descriptor(&DescriptorDoc::new(&doc.uid, "baseline"))
            .expect("descriptor");
        exporter.stop(&StopDoc::success(&doc.uid, 0)).expect("stop");

        let text = fs::read_to_string(dir.path().join("abcdef.csv")).expect("read");
        assert_eq!(text.lines().filter(|l| *l == "motor,det").count(), 2);
    }

    #[test]
    fn test_restart_before_stop_closes_previous_file() {
        let dir = tempdir().expect("tempdir");
        let mut exporter = CsvExporter::new(&["motor"], "{uid:.6s}.csv", dir.path())
            .expect("exporter");

        let first = start_doc();
        exporter.start(&first).expect("start");
        let desc = DescriptorDoc::new(&first.uid, "primary");
        exporter.descriptor(&desc).expect("descriptor");
        exporter
            .event(
                &EventDoc::new(&first.uid, &desc.uid, 1)
                    .with_datum("motor", FieldValue::Number(1.0)),
            )
            .expect("event");

        // No stop for the first run; the new start must flush and close it.
        let mut second = start_doc();
        second.uid = "fedcba654321".to_string();
        run_once(&mut exporter, &second, 1);

        let first_text = fs::read_to_string(dir.path().join("abcdef.csv")).expect("read");
        assert_eq!(first_text.lines().count(), 2);
        let second_text = fs::read_to_string(dir.path().join("fedcba.csv")).expect("read");
        assert_eq!(second_text.lines().count(), 2);
    }

    #[test]
    fn test_missing_field_fails_loudly() {
        let dir = tempdir().expect("tempdir");
        let mut exporter = CsvExporter::new(&["ghost"], "{uid:.6s}.csv", dir.path())
            .expect("exporter");

        let doc = start_doc();
        exporter.start(&doc).expect("start");
        let desc = DescriptorDoc::new(&doc.uid, "primary");
        exporter.descriptor(&desc).expect("descriptor");
        let event = EventDoc::new(&doc.uid, &desc.uid, 1)
            .with_datum("motor", FieldValue::Number(1.0));
        assert!(matches!(
            exporter.event(&event),
            Err(DaqError::MissingField(f)) if f == "ghost"
        ));
    }

    #[test]
    fn test_events_without_start_are_ignored() {
        let dir = tempdir().expect("tempdir");
        let mut exporter = CsvExporter::new(&["motor"], "{uid:.6s}.csv", dir.path())
            .expect("exporter");
        // No writer open: descriptor and event are no-ops, not errors.
        let desc = DescriptorDoc::new("run", "primary");
        exporter.descriptor(&desc).expect("descriptor");
        let event =
            EventDoc::new("run", &desc.uid, 1).with_datum("motor", FieldValue::Number(1.0));
        exporter.event(&event).expect("event");
        assert_eq!(fs::read_dir(dir.path()).expect("dir").count(), 0);
    }
}
