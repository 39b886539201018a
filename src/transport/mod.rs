//! Transport module - the duplex byte channel to the target board.
//!
//! Provides:
//! - [`Channel`] - timeout-bounded `Read + Write` plus buffer clearing and a
//!   break signal
//! - [`SerialChannel`] - a serial port opened through `serialport`
//! - [`MemoryChannel`] - a scripted in-memory device for tests and dry runs

mod memory;
mod serial;

use std::io::{Read, Write};
use std::time::Duration;

use crate::error::Result;

pub use memory::MemoryChannel;
pub use serial::{FlowControl, SerialChannel, SerialSettings};

/// Duplex byte channel to the device.
///
/// Reads and writes must be bounded by a timeout and report it as
/// `io::ErrorKind::TimedOut` rather than blocking forever.
pub trait Channel: Read + Write {
    /// Discard everything buffered in both directions.
    fn clear_buffers(&mut self) -> Result<()>;

    /// Hold the line in break state for `duration`, resetting the device.
    fn send_break(&mut self, duration: Duration) -> Result<()>;
}

impl<C: Channel + ?Sized> Channel for &mut C {
    fn clear_buffers(&mut self) -> Result<()> {
        (**self).clear_buffers()
    }

    fn send_break(&mut self, duration: Duration) -> Result<()> {
        (**self).send_break(duration)
    }
}
