//! Metric mode and decoded result records.

use serde::{Deserialize, Serialize};

/// How much per-task detail the device reports alongside each verdict.
///
/// Fixed for a whole session and applied to every method's answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricMode {
    /// Verdict, elapsed time and cycle count only.
    #[default]
    None,
    /// Per-task wcrt, ceil/floor count and loop count.
    Detail,
    /// Method-wide ceil/floor count and loop count.
    Total,
}

impl MetricMode {
    /// Number of extra 4-byte fields per method for a task set of `task_count`.
    pub fn extra_fields(&self, task_count: usize) -> usize {
        match self {
            MetricMode::None => 0,
            MetricMode::Detail => 3 * task_count,
            MetricMode::Total => 2,
        }
    }
}

/// Per-task metrics reported in detail mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMetrics {
    /// Worst-case response time.
    pub wcrt: i32,
    /// Ceil/floor operations performed for this task.
    pub ceil_floor: i32,
    /// Loop iterations performed for this task.
    pub loops: i32,
}

/// The mode-dependent part of a result record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Metrics {
    Aggregate,
    Detail { tasks: Vec<TaskMetrics> },
    Total { ceil_floor: i32, loops: i32 },
}

/// One method's answer for one task set.
///
/// Fields hold the raw wire values; range checks belong to the validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub method_id: i32,
    pub schedulable: i32,
    /// Elapsed time in device clock units.
    pub elapsed: i32,
    pub cycles: i32,
    pub metrics: Metrics,
}

impl ResultRecord {
    /// Check if the method judged the task set schedulable.
    #[inline]
    pub fn is_schedulable(&self) -> bool {
        self.schedulable == 1
    }
}

/// All records of one response plus its trailing marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedResponse {
    pub records: Vec<ResultRecord>,
    pub magic: i32,
}
