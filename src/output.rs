//! Row output.
//!
//! Two formats: colon-separated text with a header line (the layout the
//! lab's downstream tooling reads from stdout) and JSON Lines.

use std::io::Write;

use crate::aggregate::{columns, Row};
use crate::error::Result;
use crate::model::MetricMode;

/// Column separator of the text format.
pub const SEPARATOR: &str = ":";

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RowFormat {
    #[default]
    Delimited,
    JsonLines,
}

/// Writes rows to any byte sink.
pub struct RowWriter<W: Write> {
    out: W,
    format: RowFormat,
    mode: MetricMode,
    task_count: usize,
    header_written: bool,
    rows: usize,
}

impl<W: Write> RowWriter<W> {
    /// Create a writer; `task_count` sets the width of detail columns.
    pub fn new(out: W, format: RowFormat, mode: MetricMode, task_count: usize) -> Self {
        Self {
            out,
            format,
            mode,
            task_count,
            header_written: false,
            rows: 0,
        }
    }

    /// Write one row.
    pub fn write_row(&mut self, row: &Row) -> Result<()> {
        match self.format {
            RowFormat::Delimited => {
                self.write_header()?;
                let line = row.cells(self.task_count).join(SEPARATOR);
                self.out.write_all(line.as_bytes())?;
                self.out.write_all(b"\n")?;
            }
            RowFormat::JsonLines => {
                serde_json::to_writer(&mut self.out, row)?;
                self.out.write_all(b"\n")?;
            }
        }
        self.rows += 1;
        Ok(())
    }

    /// Rows written so far.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Write the header if still pending, flush, and return the sink.
    pub fn finish(mut self) -> Result<W> {
        if self.format == RowFormat::Delimited {
            self.write_header()?;
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn write_header(&mut self) -> Result<()> {
        if !self.header_written {
            let header = columns(self.mode, self.task_count).join(SEPARATOR);
            self.out.write_all(header.as_bytes())?;
            self.out.write_all(b"\n")?;
            self.header_written = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Metrics, ResultRecord, TaskSetContext};

    fn row(method_id: i32) -> Row {
        Row::new(
            ResultRecord {
                method_id,
                schedulable: 0,
                elapsed: 5,
                cycles: 50,
                metrics: Metrics::Total {
                    ceil_floor: 1,
                    loops: 2,
                },
            },
            TaskSetContext::new(0.5, 3, 12),
        )
    }

    #[test]
    fn test_delimited_output() {
        let mut writer = RowWriter::new(Vec::new(), RowFormat::Delimited, MetricMode::Total, 3);
        writer.write_row(&row(2)).unwrap();
        writer.write_row(&row(3)).unwrap();
        assert_eq!(writer.rows(), 2);

        let text = String::from_utf8(writer.finish().unwrap()).unwrap();

        assert_eq!(
            text,
            "method_id:sched:usecs:cycles:cc:loops:uf:rts_size:rts_id\n\
             2:0:5:50:1:2:0.5:3:12\n\
             3:0:5:50:1:2:0.5:3:12\n"
        );
    }

    #[test]
    fn test_delimited_header_without_rows() {
        let writer = RowWriter::new(Vec::new(), RowFormat::Delimited, MetricMode::None, 0);
        let text = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert_eq!(text, "method_id:sched:usecs:cycles:uf:rts_size:rts_id\n");
    }

    #[test]
    fn test_json_lines_output() {
        let mut writer = RowWriter::new(Vec::new(), RowFormat::JsonLines, MetricMode::Total, 3);
        writer.write_row(&row(4)).unwrap();

        let text = String::from_utf8(writer.finish().unwrap()).unwrap();
        let value: serde_json::Value = serde_json::from_str(text.trim_end()).unwrap();

        assert_eq!(value["method_id"], 4);
        assert_eq!(value["metrics"]["loops"], 2);
        assert_eq!(text.lines().count(), 1);
    }
}
