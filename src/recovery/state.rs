//! Exchange states.

use crate::error::BenchError;
use crate::model::{DecodedResponse, ResultRecord};

/// State of one send/receive/validate exchange.
///
/// ```text
///            ┌──────────────────────────────────────────┐
///            ▼                                          │
/// Sending ─► AwaitingResponse ─► Validating ─► Done     │
///    │              │                 │                 │
///    └──────────────┴─────────────────┴─► Resetting ────┘
///                                              │
///                                              ▼
///                                            Failed
/// ```
#[derive(Debug)]
pub enum ExchangeState {
    /// Encode the task set and write it to the channel.
    Sending,
    /// Read and decode the response.
    AwaitingResponse,
    /// Check the decoded response.
    Validating(DecodedResponse),
    /// Clear the channel, break, settle, then send again.
    Resetting(BenchError),
    /// A validated batch.
    Done(Vec<ResultRecord>),
    /// A fatal error ended the exchange; holds its message.
    Failed(String),
}

impl ExchangeState {
    /// State name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            ExchangeState::Sending => "Sending",
            ExchangeState::AwaitingResponse => "AwaitingResponse",
            ExchangeState::Validating(_) => "Validating",
            ExchangeState::Resetting(_) => "Resetting",
            ExchangeState::Done(_) => "Done",
            ExchangeState::Failed(_) => "Failed",
        }
    }

    /// Check if the exchange has finished.
    #[inline]
    pub fn is_done(&self) -> bool {
        matches!(self, ExchangeState::Done(_))
    }
}
