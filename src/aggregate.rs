//! Result aggregation - flattens per-method records into tagged rows.
//!
//! Rows come out in task-set arrival order, then catalog order within a
//! task set. The adapter is lazy and single-pass: it pulls the next
//! evaluation only when the previous one's rows are exhausted.
//!
//! # Example
//!
//! ```
//! use wcrt_bench::aggregate::{aggregate, Evaluation};
//! use wcrt_bench::model::{Metrics, ResultRecord, TaskSetContext};
//!
//! let record = ResultRecord {
//!     method_id: 2,
//!     schedulable: 1,
//!     elapsed: 15,
//!     cycles: 1200,
//!     metrics: Metrics::Aggregate,
//! };
//! let evaluation = Evaluation::new(TaskSetContext::new(0.5, 1, 7), vec![record]);
//!
//! let rows: Vec<_> = aggregate(vec![evaluation]).collect();
//! assert_eq!(rows[0].cells(0), vec!["2", "1", "15", "1200", "0.5", "1", "7"]);
//! ```

use serde::Serialize;

use crate::model::{MetricMode, Metrics, ResultRecord, TaskSetContext};

/// Validated records of one task set with its tagging context.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub context: TaskSetContext,
    pub records: Vec<ResultRecord>,
}

impl Evaluation {
    pub fn new(context: TaskSetContext, records: Vec<ResultRecord>) -> Self {
        Self { context, records }
    }
}

/// One output row: a method's result tagged with its task-set context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub method_id: i32,
    pub sched: i32,
    pub usecs: i32,
    pub cycles: i32,
    pub metrics: Metrics,
    #[serde(flatten)]
    pub context: TaskSetContext,
}

impl Row {
    /// Tag a record with its context.
    pub fn new(record: ResultRecord, context: TaskSetContext) -> Self {
        Self {
            method_id: record.method_id,
            sched: record.schedulable,
            usecs: record.elapsed,
            cycles: record.cycles,
            metrics: record.metrics,
            context,
        }
    }

    /// Flatten into cells matching [`columns`].
    ///
    /// Detail rows of task sets smaller than `task_count` leave the missing
    /// per-task cells empty.
    pub fn cells(&self, task_count: usize) -> Vec<String> {
        let mut cells = vec![
            self.method_id.to_string(),
            self.sched.to_string(),
            self.usecs.to_string(),
            self.cycles.to_string(),
        ];

        match &self.metrics {
            Metrics::Aggregate => {}
            Metrics::Detail { tasks } => {
                for task in tasks {
                    cells.push(task.wcrt.to_string());
                    cells.push(task.ceil_floor.to_string());
                    cells.push(task.loops.to_string());
                }
                for _ in tasks.len()..task_count {
                    cells.extend([String::new(), String::new(), String::new()]);
                }
            }
            Metrics::Total { ceil_floor, loops } => {
                cells.push(ceil_floor.to_string());
                cells.push(loops.to_string());
            }
        }

        cells.push(self.context.uf.to_string());
        cells.push(self.context.rts_size.to_string());
        cells.push(self.context.rts_id.to_string());
        cells
    }
}

/// Column names for a session's rows.
pub fn columns(mode: MetricMode, task_count: usize) -> Vec<String> {
    let mut names: Vec<String> = ["method_id", "sched", "usecs", "cycles"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    match mode {
        MetricMode::None => {}
        MetricMode::Detail => {
            for n in 1..=task_count {
                names.push(format!("wcrt_{}", n));
                names.push(format!("cc_{}", n));
                names.push(format!("loops_{}", n));
            }
        }
        MetricMode::Total => {
            names.push("cc".to_string());
            names.push("loops".to_string());
        }
    }

    names.extend(["uf", "rts_size", "rts_id"].iter().map(|s| s.to_string()));
    names
}

/// Lazy row stream over a stream of evaluations.
pub struct Aggregator<I> {
    evaluations: I,
    current: Option<(TaskSetContext, std::vec::IntoIter<ResultRecord>)>,
}

impl<I> Aggregator<I> {
    pub fn new(evaluations: I) -> Self {
        Self {
            evaluations,
            current: None,
        }
    }
}

impl<I: Iterator<Item = Evaluation>> Iterator for Aggregator<I> {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        loop {
            if let Some((context, records)) = &mut self.current {
                if let Some(record) = records.next() {
                    return Some(Row::new(record, *context));
                }
            }
            let evaluation = self.evaluations.next()?;
            self.current = Some((evaluation.context, evaluation.records.into_iter()));
        }
    }
}

/// Flatten evaluations into rows.
pub fn aggregate<I: IntoIterator<Item = Evaluation>>(evaluations: I) -> Aggregator<I::IntoIter> {
    Aggregator::new(evaluations.into_iter())
}
