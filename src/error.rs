//! Error types for wcrt-bench.

use thiserror::Error;

/// Main error type for all wcrt-bench operations.
#[derive(Debug, Error)]
pub enum BenchError {
    /// A task field does not fit in the 32-bit signed wire integer.
    #[error("Task {task} field {field} = {value} exceeds the encodable range")]
    EncodingRange {
        task: usize,
        field: &'static str,
        value: u64,
    },

    /// The device stopped sending before the full response arrived.
    #[error("Short read: expected {expected} bytes, received {received}")]
    ShortRead { expected: usize, received: usize },

    /// A field could not be taken from the response at its expected offset.
    #[error("Malformed field {field} at offset {offset}")]
    MalformedField { field: &'static str, offset: usize },

    /// The trailing marker did not match the protocol magic.
    #[error("Bad trailing marker: 0x{found:04X}")]
    BadMagic { found: i32 },

    /// A method id outside the session catalog.
    #[error("Invalid method id {id}")]
    InvalidMethodId { id: i32 },

    /// A schedulable flag other than 0 or 1.
    #[error("Invalid schedulability flag {flag} for method {method_id}")]
    InvalidFlag { method_id: i32, flag: i32 },

    /// Methods disagree on the schedulability verdict of the same task set.
    #[error("Inconsistent schedulability verdicts: {}", format_verdicts(.verdicts))]
    InconsistentSchedulability { verdicts: Vec<(i32, i32)> },

    /// I/O error on the channel or a local file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port error (open, configure, break, clear).
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid session configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A task set has more tasks than the session's detail columns allow.
    #[error("Task set has {size} tasks, session is configured for at most {max}")]
    TaskSetTooLarge { size: usize, max: usize },

    /// Invalid task-set input line.
    #[error("Input error at line {line}: {message}")]
    Input { line: usize, message: String },

    /// `step()` was called on an exchange that already failed.
    #[error("Exchange already failed: {0}")]
    ExchangeFailed(String),

    /// The retry policy gave up before an exchange validated.
    #[error("Exchange abandoned after {attempts} attempts, last error: {last}")]
    RetriesExhausted { attempts: u32, last: Box<BenchError> },
}

impl BenchError {
    /// Whether the error, raised during an exchange, is cured by reset-and-retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BenchError::ShortRead { .. }
                | BenchError::MalformedField { .. }
                | BenchError::BadMagic { .. }
                | BenchError::InvalidMethodId { .. }
                | BenchError::InvalidFlag { .. }
                | BenchError::InconsistentSchedulability { .. }
                | BenchError::Io(_)
                | BenchError::Serial(_)
        )
    }

    /// Whether the error concerns one task set only, so a run can log it and
    /// move on to the next.
    pub fn skips_task_set(&self) -> bool {
        matches!(
            self,
            BenchError::EncodingRange { .. }
                | BenchError::TaskSetTooLarge { .. }
                | BenchError::Input { .. }
        )
    }
}

fn format_verdicts(verdicts: &[(i32, i32)]) -> String {
    verdicts
        .iter()
        .map(|(id, flag)| format!("{}:{}", id, flag))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias using BenchError.
pub type Result<T> = std::result::Result<T, BenchError>;
