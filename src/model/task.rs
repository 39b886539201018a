//! Tasks and task sets.

use serde::{Deserialize, Serialize};

/// One periodic task: computation time, period and relative deadline.
///
/// Values are in device-native units and never change after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(alias = "C")]
    c: u64,
    #[serde(alias = "T")]
    t: u64,
    #[serde(alias = "D")]
    d: u64,
}

impl Task {
    /// Create a new task.
    pub fn new(c: u64, t: u64, d: u64) -> Self {
        Self { c, t, d }
    }

    /// Worst-case computation time.
    #[inline]
    pub fn c(&self) -> u64 {
        self.c
    }

    /// Period.
    #[inline]
    pub fn t(&self) -> u64 {
        self.t
    }

    /// Relative deadline.
    #[inline]
    pub fn d(&self) -> u64 {
        self.d
    }
}

/// An ordered real-time task set.
///
/// Order is the transmission order and the index basis of per-task results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskSet {
    tasks: Vec<Task>,
}

impl TaskSet {
    /// Create a task set from tasks in transmission order.
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    /// Number of tasks.
    #[inline]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Check if the task set has no tasks.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Iterate tasks in transmission order.
    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    /// Get the tasks as a slice.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }
}

impl FromIterator<Task> for TaskSet {
    fn from_iter<I: IntoIterator<Item = Task>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a TaskSet {
    type Item = &'a Task;
    type IntoIter = std::slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}

/// External identity of a task set, used only to tag result rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaskSetContext {
    /// Utilization factor.
    pub uf: f64,
    /// Number of tasks.
    pub rts_size: usize,
    /// Task-set identifier.
    pub rts_id: u64,
}

impl TaskSetContext {
    /// Create a context for a task set.
    pub fn new(uf: f64, rts_size: usize, rts_id: u64) -> Self {
        Self {
            uf,
            rts_size,
            rts_id,
        }
    }
}
