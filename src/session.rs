//! Session builder and task-set evaluation.
//!
//! The [`SessionBuilder`] fixes everything that must not change between
//! exchanges: method catalog, metric mode, validation rules and recovery
//! behaviour. The [`Session`] then owns the channel and evaluates task sets
//! strictly one after another.
//!
//! # Example
//!
//! ```ignore
//! use wcrt_bench::model::{MethodCatalog, MetricMode};
//! use wcrt_bench::transport::{SerialChannel, SerialSettings};
//! use wcrt_bench::SessionBuilder;
//!
//! let channel = SerialChannel::open(&settings)?;
//! let mut session = SessionBuilder::new()
//!     .catalog(MethodCatalog::select(&["het2", "rta", "rta4"])?)
//!     .metric_mode(MetricMode::Total)
//!     .build(channel)?;
//!
//! let records = session.evaluate(&rts)?;
//! ```

use crate::aggregate::{columns, Evaluation};
use crate::error::{BenchError, Result};
use crate::input::TaskSetEntry;
use crate::model::{MethodCatalog, MetricMode, ResultRecord, TaskSet};
use crate::protocol::ValidationRules;
use crate::recovery::{RecoveryConfig, RecoveryController, RetryPolicy};
use crate::transport::Channel;

/// Builder for configuring and creating a session.
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    catalog: MethodCatalog,
    mode: MetricMode,
    rules: ValidationRules,
    recovery: RecoveryConfig,
    max_tasks: Option<usize>,
}

impl SessionBuilder {
    /// Create a builder with the standard catalog and default settings.
    pub fn new() -> Self {
        Self {
            catalog: MethodCatalog::standard(),
            mode: MetricMode::None,
            rules: ValidationRules::default(),
            recovery: RecoveryConfig::default(),
            max_tasks: None,
        }
    }

    /// Set the methods expected in every response.
    pub fn catalog(mut self, catalog: MethodCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Set the metric mode the firmware was built with.
    pub fn metric_mode(mut self, mode: MetricMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the validation rules.
    pub fn validation_rules(mut self, rules: ValidationRules) -> Self {
        self.rules = rules;
        self
    }

    /// Set reset timing and retry policy.
    pub fn recovery(mut self, recovery: RecoveryConfig) -> Self {
        self.recovery = recovery;
        self
    }

    /// Replace only the retry policy.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.recovery.retry = policy;
        self
    }

    /// Reject task sets with more than `max` tasks before sending them.
    ///
    /// Also sets the width of detail-mode columns.
    pub fn max_tasks(mut self, max: usize) -> Self {
        self.max_tasks = Some(max);
        self
    }

    /// Build a session that owns `channel`.
    ///
    /// Detail mode needs `max_tasks`: it fixes the number of per-task
    /// columns every row is laid out against.
    pub fn build<C: Channel>(self, channel: C) -> Result<Session<C>> {
        if self.mode == MetricMode::Detail && self.max_tasks.unwrap_or(0) == 0 {
            return Err(BenchError::Config(
                "Detail metric mode requires max_tasks".to_string(),
            ));
        }

        if !self.recovery.retry.is_bounded() {
            tracing::debug!("Retry policy is unbounded");
        }

        Ok(Session {
            channel,
            controller: RecoveryController::new(self.catalog, self.mode, self.rules, self.recovery),
            max_tasks: self.max_tasks,
            evaluated: 0,
        })
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A configured link to the board.
pub struct Session<C: Channel> {
    channel: C,
    controller: RecoveryController,
    max_tasks: Option<usize>,
    evaluated: usize,
}

impl<C: Channel> Session<C> {
    /// Evaluate one task set, retrying until a batch validates.
    ///
    /// # Errors
    ///
    /// - `TaskSetTooLarge` if the task set exceeds `max_tasks`
    /// - `EncodingRange` if a field does not fit the wire format
    /// - `RetriesExhausted` if a bounded retry policy gives up
    /// - `Io`/`Serial` if the channel cannot be reset
    pub fn evaluate(&mut self, rts: &TaskSet) -> Result<Vec<ResultRecord>> {
        if let Some(max) = self.max_tasks {
            if rts.len() > max {
                return Err(BenchError::TaskSetTooLarge {
                    size: rts.len(),
                    max,
                });
            }
        }

        let records = self.controller.run(&mut self.channel, rts)?;
        for record in &records {
            tracing::debug!(
                "{} (id {}): sched={} usecs={} cycles={}",
                self.controller.catalog().name_of(record.method_id).unwrap_or("?"),
                record.method_id,
                record.schedulable,
                record.elapsed,
                record.cycles
            );
        }
        self.evaluated += 1;
        Ok(records)
    }

    /// Evaluate an input entry and tag the result with its context.
    pub fn evaluate_entry(&mut self, entry: &TaskSetEntry) -> Result<Evaluation> {
        tracing::info!(
            "Evaluating task set {} (uf {}, {} tasks)",
            entry.rts_id,
            entry.uf,
            entry.tasks.len()
        );
        let records = self.evaluate(&entry.tasks)?;
        Ok(Evaluation::new(entry.context(), records))
    }

    /// Lazily evaluate a stream of entries, one exchange per pulled item.
    pub fn evaluations<I>(&mut self, entries: I) -> Evaluations<'_, C, I::IntoIter>
    where
        I: IntoIterator<Item = Result<TaskSetEntry>>,
    {
        Evaluations {
            session: self,
            entries: entries.into_iter(),
        }
    }

    /// Column names of this session's rows.
    pub fn columns(&self) -> Vec<String> {
        columns(self.controller.mode(), self.task_columns())
    }

    /// Number of per-task column groups in detail mode.
    pub fn task_columns(&self) -> usize {
        self.max_tasks.unwrap_or(0)
    }

    pub fn catalog(&self) -> &MethodCatalog {
        self.controller.catalog()
    }

    pub fn metric_mode(&self) -> MetricMode {
        self.controller.mode()
    }

    /// Task sets evaluated successfully so far.
    pub fn evaluated(&self) -> usize {
        self.evaluated
    }

    /// Get a mutable reference to the channel.
    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Give the channel back.
    pub fn into_channel(self) -> C {
        self.channel
    }
}

/// Iterator returned by [`Session::evaluations`].
pub struct Evaluations<'s, C: Channel, I> {
    session: &'s mut Session<C>,
    entries: I,
}

impl<C: Channel, I: Iterator<Item = Result<TaskSetEntry>>> Iterator for Evaluations<'_, C, I> {
    type Item = Result<Evaluation>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = match self.entries.next()? {
            Ok(entry) => entry,
            Err(e) => return Some(Err(e)),
        };
        Some(self.session.evaluate_entry(&entry))
    }
}
