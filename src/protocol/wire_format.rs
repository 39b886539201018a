//! Wire format constants and length arithmetic.
//!
//! Every field on the link is a 4-byte big-endian signed integer, with no
//! alignment or padding.
//!
//! Request:
//! ```text
//! ┌────────────┬──────┬──────┬──────┬─────┐
//! │ task_count │ C_1  │ T_1  │ D_1  │ ... │
//! │ int32 BE   │ int32│ int32│ int32│     │
//! └────────────┴──────┴──────┴──────┴─────┘
//! ```
//!
//! Response, once per catalog method in catalog order, then the marker:
//! ```text
//! ┌───────────┬───────┬─────────┬────────┬──────────────────┐
//! │ method_id │ sched │ elapsed │ cycles │ mode extras ...  │
//! └───────────┴───────┴─────────┴────────┴──────────────────┘
//! ┌──────────────┐
//! │ magic 0xABBA │
//! └──────────────┘
//! ```
//! Mode extras: detail = (wcrt, ceil/floor, loops) per task; total =
//! (ceil/floor, loops); none = nothing.

use crate::model::MetricMode;

/// Size of every wire field in bytes.
pub const FIELD_SIZE: usize = 4;

/// Trailing response marker.
pub const MAGIC: i32 = 0xABBA;

/// Fields sent per task (C, T, D).
pub const TASK_FIELDS: usize = 3;

/// Fields every method answer starts with (id, sched, elapsed, cycles).
pub const BASE_FIELDS: usize = 4;

/// Request length in bytes for a task set of `task_count` tasks.
#[inline]
pub fn request_len(task_count: usize) -> usize {
    FIELD_SIZE + task_count * TASK_FIELDS * FIELD_SIZE
}

/// Length in bytes of one method's answer.
#[inline]
pub fn method_len(mode: MetricMode, task_count: usize) -> usize {
    (BASE_FIELDS + mode.extra_fields(task_count)) * FIELD_SIZE
}

/// Full response length in bytes, trailing marker included.
#[inline]
pub fn response_len(mode: MetricMode, method_count: usize, task_count: usize) -> usize {
    method_count * method_len(mode, task_count) + FIELD_SIZE
}
