//! Task-set input in JSON Lines form.
//!
//! One task set per line:
//!
//! ```text
//! {"uf": 0.5, "rts_id": 3, "tasks": [{"C": 10, "T": 100, "D": 100}, {"C": 20, "T": 200, "D": 200}]}
//! ```
//!
//! Blank lines are skipped. The task-set size is derived from `tasks`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};
use crate::model::{TaskSet, TaskSetContext};

/// A task set with the identity used to tag its rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSetEntry {
    /// Utilization factor.
    pub uf: f64,
    pub rts_id: u64,
    pub tasks: TaskSet,
}

impl TaskSetEntry {
    pub fn new(uf: f64, rts_id: u64, tasks: TaskSet) -> Self {
        Self { uf, rts_id, tasks }
    }

    /// Tagging context for this task set.
    pub fn context(&self) -> TaskSetContext {
        TaskSetContext::new(self.uf, self.tasks.len(), self.rts_id)
    }
}

/// Iterator over task sets read line by line.
pub struct TaskSetReader<R> {
    lines: std::io::Lines<R>,
    line: usize,
}

impl<R: BufRead> TaskSetReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }
}

impl TaskSetReader<BufReader<File>> {
    /// Open a JSON Lines file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> Iterator for TaskSetReader<R> {
    type Item = Result<TaskSetEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let text = match self.lines.next()? {
                Ok(text) => text,
                Err(e) => return Some(Err(BenchError::Io(e))),
            };
            self.line += 1;

            if text.trim().is_empty() {
                continue;
            }

            return Some(
                serde_json::from_str(&text).map_err(|e| BenchError::Input {
                    line: self.line,
                    message: e.to_string(),
                }),
            );
        }
    }
}
