//! Scripted in-memory channel.
//!
//! Plays the device side of the link from a script: each flushed request
//! consumes the next scripted step. A reply step makes its bytes readable;
//! a write-timeout step fails the next write instead. Reading past the
//! available bytes times out, just like a silent board.
//!
//! # Example
//!
//! ```
//! use std::io::{Read, Write};
//! use wcrt_bench::transport::MemoryChannel;
//!
//! let mut channel = MemoryChannel::new();
//! channel.push_reply(vec![1, 2, 3, 4]);
//!
//! channel.write_all(&[0, 0, 0, 0]).unwrap();
//! channel.flush().unwrap();
//!
//! let mut buf = [0u8; 4];
//! channel.read_exact(&mut buf).unwrap();
//! assert_eq!(buf, [1, 2, 3, 4]);
//! assert_eq!(channel.requests().len(), 1);
//! ```

use std::collections::VecDeque;
use std::io::{self, ErrorKind, Read, Write};
use std::time::Duration;

use bytes::{Buf, Bytes, BytesMut};

use super::Channel;
use crate::error::Result;

#[derive(Debug)]
enum Step {
    Reply(Bytes),
    WriteTimeout,
}

/// In-memory stand-in for the board.
#[derive(Debug, Default)]
pub struct MemoryChannel {
    script: VecDeque<Step>,
    tx: BytesMut,
    rx: Bytes,
    requests: Vec<Bytes>,
    clears: usize,
    breaks: Vec<Duration>,
    closed: bool,
}

impl MemoryChannel {
    /// Create a channel with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for the next request.
    pub fn push_reply(&mut self, reply: impl Into<Bytes>) -> &mut Self {
        self.script.push_back(Step::Reply(reply.into()));
        self
    }

    /// Queue a write timeout for the next request.
    pub fn push_write_timeout(&mut self) -> &mut Self {
        self.script.push_back(Step::WriteTimeout);
        self
    }

    /// Close the channel; every further operation fails.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Requests received so far, one per flush.
    pub fn requests(&self) -> &[Bytes] {
        &self.requests
    }

    /// Number of buffer clears.
    pub fn clears(&self) -> usize {
        self.clears
    }

    /// Durations of every break sent.
    pub fn breaks(&self) -> &[Duration] {
        &self.breaks
    }

    /// Scripted steps not yet consumed.
    pub fn remaining_script(&self) -> usize {
        self.script.len()
    }

    /// Bytes readable right now.
    pub fn pending_rx(&self) -> usize {
        self.rx.len()
    }

    fn check_open(&self) -> io::Result<()> {
        if self.closed {
            return Err(io::Error::new(ErrorKind::BrokenPipe, "channel closed"));
        }
        Ok(())
    }
}

impl Read for MemoryChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.check_open()?;
        if self.rx.is_empty() {
            return Err(io::Error::new(ErrorKind::TimedOut, "read timed out"));
        }
        let n = buf.len().min(self.rx.len());
        self.rx.copy_to_slice(&mut buf[..n]);
        Ok(n)
    }
}

impl Write for MemoryChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.check_open()?;
        if matches!(self.script.front(), Some(Step::WriteTimeout)) {
            self.script.pop_front();
            return Err(io::Error::new(ErrorKind::TimedOut, "write timed out"));
        }
        self.tx.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.check_open()?;
        self.requests.push(self.tx.split().freeze());
        if let Some(Step::Reply(reply)) = self.script.front() {
            self.rx = reply.clone();
            self.script.pop_front();
        }
        Ok(())
    }
}

impl Channel for MemoryChannel {
    fn clear_buffers(&mut self) -> Result<()> {
        self.check_open()?;
        self.tx.clear();
        self.rx = Bytes::new();
        self.clears += 1;
        Ok(())
    }

    fn send_break(&mut self, duration: Duration) -> Result<()> {
        self.check_open()?;
        self.breaks.push(duration);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_without_reply_times_out() {
        let mut channel = MemoryChannel::new();
        let mut buf = [0u8; 4];
        let err = channel.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TimedOut);
    }

    #[test]
    fn test_replies_follow_requests() {
        let mut channel = MemoryChannel::new();
        channel.push_reply(vec![1u8]).push_reply(vec![2u8]);

        channel.write_all(b"a").unwrap();
        channel.flush().unwrap();
        let mut buf = [0u8; 1];
        channel.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [1]);

        channel.write_all(b"b").unwrap();
        channel.flush().unwrap();
        channel.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [2]);

        assert_eq!(channel.requests().len(), 2);
        assert_eq!(&channel.requests()[1][..], b"b");
    }

    #[test]
    fn test_write_timeout_step() {
        let mut channel = MemoryChannel::new();
        channel.push_write_timeout().push_reply(vec![9u8]);

        let err = channel.write_all(b"x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TimedOut);
        assert_eq!(channel.remaining_script(), 1);
    }

    #[test]
    fn test_clear_discards_pending_bytes() {
        let mut channel = MemoryChannel::new();
        channel.push_reply(vec![1u8, 2, 3]);
        channel.write_all(b"x").unwrap();
        channel.flush().unwrap();
        assert_eq!(channel.pending_rx(), 3);

        channel.clear_buffers().unwrap();

        assert_eq!(channel.pending_rx(), 0);
        assert_eq!(channel.clears(), 1);
    }

    #[test]
    fn test_closed_channel_fails_everything() {
        let mut channel = MemoryChannel::new();
        channel.close();
        assert!(channel.write(b"x").is_err());
        assert!(channel.clear_buffers().is_err());
        assert!(channel.send_break(Duration::ZERO).is_err());
    }
}
