//! Recovery controller and the per-task-set exchange state machine.
//!
//! The device has no request tagging, so one exchange owns the channel
//! until it reaches `Done`. Every transient failure discards the whole
//! batch, resets the link and starts over from `Sending`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::policy::RetryPolicy;
use super::state::ExchangeState;
use crate::error::{BenchError, Result};
use crate::model::{MethodCatalog, MetricMode, ResultRecord, TaskSet};
use crate::protocol::{encode_task_set, validate, ResponseDecoder, ValidationRules};
use crate::transport::Channel;

/// Default break length and settle pause after a reset.
pub const DEFAULT_SETTLE_MS: u64 = 500;

/// Reset timing and retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Pause after the break before sending again.
    pub settle_ms: u64,
    /// Length of the break signal.
    pub break_ms: u64,
    pub retry: RetryPolicy,
}

impl RecoveryConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn break_duration(&self) -> Duration {
        Duration::from_millis(self.break_ms)
    }

    /// Config with no pauses, for tests and simulated channels.
    pub fn immediate() -> Self {
        Self {
            settle_ms: 0,
            break_ms: 0,
            retry: RetryPolicy::Unbounded,
        }
    }
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            settle_ms: DEFAULT_SETTLE_MS,
            break_ms: DEFAULT_SETTLE_MS,
            retry: RetryPolicy::default(),
        }
    }
}

/// Session-wide parameters shared by every exchange.
#[derive(Debug, Clone)]
pub struct RecoveryController {
    catalog: MethodCatalog,
    mode: MetricMode,
    rules: ValidationRules,
    config: RecoveryConfig,
}

impl RecoveryController {
    /// Create a controller.
    pub fn new(
        catalog: MethodCatalog,
        mode: MetricMode,
        rules: ValidationRules,
        config: RecoveryConfig,
    ) -> Self {
        Self {
            catalog,
            mode,
            rules,
            config,
        }
    }

    pub fn catalog(&self) -> &MethodCatalog {
        &self.catalog
    }

    pub fn mode(&self) -> MetricMode {
        self.mode
    }

    pub fn config(&self) -> &RecoveryConfig {
        &self.config
    }

    /// Start an exchange for one task set.
    pub fn exchange<'a, C: Channel + ?Sized>(
        &'a self,
        channel: &'a mut C,
        rts: &'a TaskSet,
    ) -> Exchange<'a, C> {
        Exchange {
            controller: self,
            decoder: ResponseDecoder::new(self.mode, &self.catalog, rts.len()),
            channel,
            rts,
            state: ExchangeState::Sending,
            attempts: 0,
            failures: 0,
        }
    }

    /// Run an exchange to completion.
    ///
    /// # Errors
    ///
    /// - `EncodingRange` if the task set cannot be encoded (never retried)
    /// - `RetriesExhausted` if the retry policy gives up
    /// - `Io`/`Serial` if the channel fails while being reset
    pub fn run<C: Channel + ?Sized>(
        &self,
        channel: &mut C,
        rts: &TaskSet,
    ) -> Result<Vec<ResultRecord>> {
        self.exchange(channel, rts).run()
    }
}

/// One task set's exchange, advanced one transition at a time.
pub struct Exchange<'a, C: Channel + ?Sized> {
    controller: &'a RecoveryController,
    decoder: ResponseDecoder,
    channel: &'a mut C,
    rts: &'a TaskSet,
    state: ExchangeState,
    attempts: u32,
    failures: u32,
}

impl<'a, C: Channel + ?Sized> Exchange<'a, C> {
    /// Current state.
    pub fn state(&self) -> &ExchangeState {
        &self.state
    }

    /// Requests written so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Failed attempts so far; each one led to a reset.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Perform one state transition.
    ///
    /// Transient failures never surface here; they move the exchange to
    /// `Resetting`. Returned errors are fatal for this task set and leave
    /// the exchange `Failed`, so later steps keep failing without touching
    /// the channel.
    pub fn step(&mut self) -> Result<()> {
        let from = self.state.name();

        let next = match std::mem::replace(&mut self.state, ExchangeState::Sending) {
            ExchangeState::Sending => match encode_task_set(self.rts) {
                Ok(request) => {
                    self.attempts += 1;
                    route(self.write_request(&request), |()| {
                        ExchangeState::AwaitingResponse
                    })
                }
                Err(e) => Err(e),
            },
            ExchangeState::AwaitingResponse => {
                let decoded = self.decoder.decode(&mut *self.channel);
                route(decoded, ExchangeState::Validating)
            }
            ExchangeState::Validating(response) => {
                let checked =
                    validate(&response, &self.controller.catalog, &self.controller.rules);
                route(checked, |()| ExchangeState::Done(response.records))
            }
            ExchangeState::Resetting(cause) => self.reset(cause).map(|()| ExchangeState::Sending),
            done @ ExchangeState::Done(_) => Ok(done),
            ExchangeState::Failed(reason) => {
                self.state = ExchangeState::Failed(reason.clone());
                return Err(BenchError::ExchangeFailed(reason));
            }
        };

        match next {
            Ok(next) => {
                tracing::debug!("Exchange {} -> {}", from, next.name());
                self.state = next;
                Ok(())
            }
            Err(e) => {
                tracing::debug!("Exchange {} -> Failed: {}", from, e);
                self.state = ExchangeState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Step until the exchange is done and return the validated records.
    pub fn run(mut self) -> Result<Vec<ResultRecord>> {
        loop {
            if let ExchangeState::Done(records) = self.state {
                return Ok(records);
            }
            self.step()?;
        }
    }

    fn write_request(&mut self, request: &[u8]) -> Result<()> {
        self.channel.write_all(request)?;
        self.channel.flush()?;
        tracing::trace!("Sent {} request bytes", request.len());
        Ok(())
    }

    fn reset(&mut self, cause: BenchError) -> Result<()> {
        self.failures += 1;
        let config = &self.controller.config;

        let Some(backoff) = config.retry.next_retry(self.failures) else {
            tracing::error!(
                "Giving up on task set after {} failed attempts: {}",
                self.failures,
                cause
            );
            return Err(BenchError::RetriesExhausted {
                attempts: self.failures,
                last: Box::new(cause),
            });
        };

        tracing::warn!("Reset (attempt {}): {}", self.failures, cause);

        self.channel.clear_buffers()?;
        self.channel.send_break(config.break_duration())?;

        let pause = config.settle() + backoff;
        if !pause.is_zero() {
            std::thread::sleep(pause);
        }
        Ok(())
    }
}

/// Route a send, decode or validate outcome: success continues, transient
/// failures reset, anything else is fatal.
fn route<T>(outcome: Result<T>, next: impl FnOnce(T) -> ExchangeState) -> Result<ExchangeState> {
    match outcome {
        Ok(value) => Ok(next(value)),
        Err(e) if e.is_transient() => Ok(ExchangeState::Resetting(e)),
        Err(e) => Err(e),
    }
}
