//! Live tabular rendering of event data.

use crate::callback::DocumentCallback;
use crate::error::{AppResult, DaqError};
use crate::experiment::document::{DescriptorDoc, EventDoc, FieldValue, StartDoc, StopDoc};
use chrono::DateTime;
use std::io::Write;

const COL_WIDTH: usize = 12;

/// Prints one aligned row per event to any writer.
///
/// Header and rule are emitted at descriptor time (so a run with multiple
/// descriptors repeats them, mirroring the export callback's behavior); the
/// closing rule and exit status are emitted at stop.
pub struct LiveTable<W: Write> {
    fields: Vec<String>,
    out: W,
}

impl<W: Write> LiveTable<W> {
    pub fn new(fields: &[&str], out: W) -> Self {
        Self {
            fields: fields.iter().map(|s| s.to_string()).collect(),
            out,
        }
    }

    fn rule(&mut self) -> AppResult<()> {
        let width = 8 + 2 + 14 + (COL_WIDTH + 2) * self.fields.len() + self.fields.len() + 3;
        writeln!(self.out, "{}", "-".repeat(width))?;
        Ok(())
    }
}

impl<W: Write> DocumentCallback for LiveTable<W> {
    fn start(&mut self, doc: &StartDoc) -> AppResult<()> {
        writeln!(self.out, "run [{:.6}] scan_id {}", doc.uid, doc.scan_id)?;
        Ok(())
    }

    fn descriptor(&mut self, _doc: &DescriptorDoc) -> AppResult<()> {
        self.rule()?;
        write!(self.out, "| {:>8} | {:>14} ", "seq_num", "time")?;
        for field in &self.fields {
            write!(self.out, "| {:>COL_WIDTH$} ", field)?;
        }
        writeln!(self.out, "|")?;
        self.rule()
    }

    fn event(&mut self, doc: &EventDoc) -> AppResult<()> {
        let time = DateTime::from_timestamp_nanos(doc.time_ns as i64)
            .format("%H:%M:%S%.3f")
            .to_string();
        write!(self.out, "| {:>8} | {:>14} ", doc.seq_num, time)?;
        for field in &self.fields {
            let value = doc
                .data
                .get(field)
                .ok_or_else(|| DaqError::MissingField(field.clone()))?;
            match value {
                FieldValue::Number(v) => write!(self.out, "| {:>COL_WIDTH$.5} ", v)?,
                FieldValue::Text(s) => write!(self.out, "| {:>COL_WIDTH$.COL_WIDTH$} ", s)?,
            }
        }
        writeln!(self.out, "|")?;
        self.out.flush()?;
        Ok(())
    }

    fn stop(&mut self, doc: &StopDoc) -> AppResult<()> {
        self.rule()?;
        writeln!(
            self.out,
            "exit_status: {} ({} events)",
            doc.exit_status, doc.num_events
        )?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// io::Write into a shared buffer so the test can inspect output while the
    /// table owns the writer.
    #[derive(Clone, Default)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn render_run(num_events: u32) -> String {
        let buf = SharedBuf::default();
        let mut table = LiveTable::new(&["motor", "det"], buf.clone());

        let start = StartDoc::new("scan", "scan", 3);
        let run_uid = start.uid.clone();
        table.start(&start).expect("start");
        let desc = DescriptorDoc::new(&run_uid, "primary");
        table.descriptor(&desc).expect("descriptor");
        for i in 0..num_events {
            let event = EventDoc::new(&run_uid, &desc.uid, i + 1)
                .with_datum("motor", FieldValue::Number(i as f64))
                .with_datum("det", FieldValue::Number(1.5));
            table.event(&event).expect("event");
        }
        table
            .stop(&StopDoc::success(&run_uid, num_events))
            .expect("stop");

        // Clone out of the RefCell first so no Ref outlives `buf`.
        let bytes = buf.0.borrow().clone();
        String::from_utf8(bytes).expect("utf8")
    }

    #[test]
    fn test_row_per_event() {
        let text = render_run(4);
        let data_rows = text
            .lines()
            .filter(|l| l.starts_with("| ") && !l.contains("seq_num"))
            .count();
        assert_eq!(data_rows, 4);
        assert!(text.contains("exit_status: success (4 events)"));
    }

    #[test]
    fn test_header_names_fields() {
        let text = render_run(1);
        let header = text
            .lines()
            .find(|l| l.contains("seq_num"))
            .expect("header line");
        assert!(header.contains("motor"));
        assert!(header.contains("det"));
    }

    #[test]
    fn test_missing_field_fails() {
        let buf = SharedBuf::default();
        let mut table = LiveTable::new(&["ghost"], buf);
        let event = EventDoc::new("run", "desc", 1).with_datum("det", FieldValue::Number(1.0));
        assert!(table.event(&event).is_err());
    }
}
