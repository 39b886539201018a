//! Request encoding.
//!
//! # Example
//!
//! ```
//! use wcrt_bench::model::{Task, TaskSet};
//! use wcrt_bench::protocol::encode_task_set;
//!
//! let rts = TaskSet::new(vec![Task::new(10, 100, 100)]);
//! let bytes = encode_task_set(&rts).unwrap();
//! assert_eq!(&bytes[..4], &[0, 0, 0, 1]);
//! assert_eq!(bytes.len(), 16);
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use super::wire_format::request_len;
use crate::error::{BenchError, Result};
use crate::model::TaskSet;

/// Encode a task set into the request frame.
///
/// Fails with `EncodingRange` if the count or any task field does not fit
/// in an `i32`; nothing is produced in that case.
pub fn encode_task_set(rts: &TaskSet) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(request_len(rts.len()));

    let count = i32::try_from(rts.len()).map_err(|_| BenchError::EncodingRange {
        task: rts.len(),
        field: "count",
        value: rts.len() as u64,
    })?;
    buf.put_i32(count);

    for (index, task) in rts.iter().enumerate() {
        for (field, value) in [("C", task.c()), ("T", task.t()), ("D", task.d())] {
            buf.put_i32(to_wire(index, field, value)?);
        }
    }

    Ok(buf.freeze())
}

fn to_wire(task: usize, field: &'static str, value: u64) -> Result<i32> {
    i32::try_from(value).map_err(|_| BenchError::EncodingRange { task, field, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Task;

    #[test]
    fn test_encode_two_task_set() {
        let rts = TaskSet::new(vec![Task::new(10, 100, 100), Task::new(20, 200, 200)]);
        let bytes = encode_task_set(&rts).unwrap();

        let expected: [u8; 28] = [
            0x00, 0x00, 0x00, 0x02, //
            0x00, 0x00, 0x00, 0x0A, 0x00, 0x00, 0x00, 0x64, 0x00, 0x00, 0x00, 0x64, //
            0x00, 0x00, 0x00, 0x14, 0x00, 0x00, 0x00, 0xC8, 0x00, 0x00, 0x00, 0xC8,
        ];
        assert_eq!(&bytes[..], &expected[..]);
    }

    #[test]
    fn test_encode_empty_task_set() {
        let bytes = encode_task_set(&TaskSet::default()).unwrap();
        assert_eq!(&bytes[..], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_encode_max_representable_value() {
        let max = i32::MAX as u64;
        let rts = TaskSet::new(vec![Task::new(max, max, max)]);
        let bytes = encode_task_set(&rts).unwrap();
        assert_eq!(&bytes[4..8], &[0x7F, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_encode_out_of_range_field() {
        let rts = TaskSet::new(vec![
            Task::new(1, 10, 10),
            Task::new(1, i32::MAX as u64 + 1, 10),
        ]);
        let err = encode_task_set(&rts).unwrap_err();

        match err {
            BenchError::EncodingRange { task, field, value } => {
                assert_eq!(task, 1);
                assert_eq!(field, "T");
                assert_eq!(value, 1 << 31);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
