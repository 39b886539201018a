//! # wcrt-bench
//!
//! Host-side driver for benchmarking worst-case response time (WCRT)
//! schedulability tests on an embedded board.
//!
//! The host sends each task set over a serial line, the board runs every
//! compiled-in method on it and answers with one fixed-layout record per
//! method. The host validates the batch, resets the board and retries on
//! anything suspicious, then tags the records with their task-set context
//! and emits them as rows.
//!
//! ## Layers
//!
//! - **Protocol**: big-endian 32-bit request encoding, fixed-length
//!   response decoding and batch validation
//! - **Recovery**: the send / await / validate / reset state machine
//! - **Session**: owns the channel and evaluates task sets one at a time
//!
//! ## Example
//!
//! ```ignore
//! use wcrt_bench::config::SessionConfig;
//! use wcrt_bench::transport::SerialChannel;
//!
//! let config = SessionConfig::from_file("bench.json")?;
//! let channel = SerialChannel::open(&config.target)?;
//! let mut session = config.session_builder()?.build(channel)?;
//!
//! let records = session.evaluate(&rts)?;
//! ```

pub mod aggregate;
pub mod config;
pub mod error;
pub mod input;
pub mod model;
pub mod output;
pub mod protocol;
pub mod recovery;
pub mod session;
pub mod transport;

pub use config::SessionConfig;
pub use error::{BenchError, Result};
pub use session::{Session, SessionBuilder};
