//! Response decoding.
//!
//! The decoder reads a length computed from the session parameters alone
//! (metric mode, method count, task count). It never looks at field values
//! to decide how much to read, so a device that sends too few fields times
//! out as a short read and one that sends too many leaves the marker
//! misaligned for the validator to catch.

use std::io::{ErrorKind, Read};

use bytes::{Buf, BytesMut};

use super::wire_format::{response_len, FIELD_SIZE};
use crate::error::{BenchError, Result};
use crate::model::{
    DecodedResponse, MethodCatalog, MetricMode, Metrics, ResultRecord, TaskMetrics,
};

/// Decoder for one response shape.
#[derive(Debug, Clone, Copy)]
pub struct ResponseDecoder {
    mode: MetricMode,
    method_count: usize,
    task_count: usize,
}

impl ResponseDecoder {
    /// Create a decoder for a task set of `task_count` tasks.
    pub fn new(mode: MetricMode, catalog: &MethodCatalog, task_count: usize) -> Self {
        Self {
            mode,
            method_count: catalog.len(),
            task_count,
        }
    }

    /// Exact number of bytes this response occupies on the wire.
    #[inline]
    pub fn expected_len(&self) -> usize {
        response_len(self.mode, self.method_count, self.task_count)
    }

    /// Read and decode a full response from a byte source.
    ///
    /// # Errors
    ///
    /// - `ShortRead` if the source times out or ends early
    /// - `MalformedField` if the source reports undecodable data
    /// - `Io` for any other channel failure
    pub fn decode<R: Read + ?Sized>(&self, reader: &mut R) -> Result<DecodedResponse> {
        let data = read_exact_counted(reader, self.expected_len())?;
        tracing::trace!("Received {} response bytes", data.len());
        self.decode_bytes(&data)
    }

    /// Decode a response already held in memory.
    ///
    /// Bytes past `expected_len()` are ignored.
    pub fn decode_bytes(&self, data: &[u8]) -> Result<DecodedResponse> {
        let expected = self.expected_len();
        if data.len() < expected {
            return Err(BenchError::ShortRead {
                expected,
                received: data.len(),
            });
        }

        let mut fields = FieldCursor::new(&data[..expected]);
        let mut records = Vec::with_capacity(self.method_count);

        for _ in 0..self.method_count {
            let method_id = fields.next("method_id")?;
            let schedulable = fields.next("schedulable")?;
            let elapsed = fields.next("elapsed")?;
            let cycles = fields.next("cycles")?;
            let metrics = self.read_metrics(&mut fields)?;

            records.push(ResultRecord {
                method_id,
                schedulable,
                elapsed,
                cycles,
                metrics,
            });
        }

        let magic = fields.next("magic")?;

        Ok(DecodedResponse { records, magic })
    }

    fn read_metrics(&self, fields: &mut FieldCursor<'_>) -> Result<Metrics> {
        match self.mode {
            MetricMode::None => Ok(Metrics::Aggregate),
            MetricMode::Detail => {
                let mut tasks = Vec::with_capacity(self.task_count);
                for _ in 0..self.task_count {
                    tasks.push(TaskMetrics {
                        wcrt: fields.next("wcrt")?,
                        ceil_floor: fields.next("ceil_floor")?,
                        loops: fields.next("loops")?,
                    });
                }
                Ok(Metrics::Detail { tasks })
            }
            MetricMode::Total => Ok(Metrics::Total {
                ceil_floor: fields.next("ceil_floor")?,
                loops: fields.next("loops")?,
            }),
        }
    }
}

/// Sequential reader of 4-byte big-endian fields.
struct FieldCursor<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> FieldCursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    fn next(&mut self, field: &'static str) -> Result<i32> {
        if self.buf.remaining() < FIELD_SIZE {
            return Err(BenchError::MalformedField {
                field,
                offset: self.offset,
            });
        }
        self.offset += FIELD_SIZE;
        Ok(self.buf.get_i32())
    }
}

/// Read exactly `expected` bytes, reporting how many arrived on failure.
fn read_exact_counted<R: Read + ?Sized>(reader: &mut R, expected: usize) -> Result<BytesMut> {
    let mut buf = BytesMut::zeroed(expected);
    let mut received = 0;

    while received < expected {
        match reader.read(&mut buf[received..]) {
            Ok(0) => return Err(BenchError::ShortRead { expected, received }),
            Ok(n) => received += n,
            Err(e) => match e.kind() {
                ErrorKind::Interrupted => continue,
                ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::UnexpectedEof => {
                    return Err(BenchError::ShortRead { expected, received })
                }
                ErrorKind::InvalidData => {
                    return Err(BenchError::MalformedField {
                        field: "stream",
                        offset: received,
                    })
                }
                _ => return Err(BenchError::Io(e)),
            },
        }
    }

    Ok(buf)
}
