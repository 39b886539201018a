//! Serial port channel.
//!
//! # Example
//!
//! ```ignore
//! use wcrt_bench::transport::{SerialChannel, SerialSettings};
//!
//! let settings = SerialSettings {
//!     port: "/dev/ttyACM0".to_string(),
//!     ..SerialSettings::default()
//! };
//! let channel = SerialChannel::open(&settings)?;
//! ```

use std::io::{self, Read, Write};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serialport::{ClearBuffer, SerialPort};

use super::Channel;
use crate::error::{BenchError, Result};

/// Default baud rate of the board's USB serial bridge.
pub const DEFAULT_BAUDRATE: u32 = 9600;

/// Default read and write timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 500;

/// Flow control on the serial line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowControl {
    None,
    /// XON/XOFF.
    #[default]
    Software,
    /// RTS/CTS.
    Hardware,
}

impl From<FlowControl> for serialport::FlowControl {
    fn from(flow: FlowControl) -> Self {
        match flow {
            FlowControl::None => serialport::FlowControl::None,
            FlowControl::Software => serialport::FlowControl::Software,
            FlowControl::Hardware => serialport::FlowControl::Hardware,
        }
    }
}

/// Settings used to open the serial port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    /// Port name, e.g. `/dev/ttyACM0` or `COM3`.
    pub port: String,
    pub baudrate: u32,
    pub read_timeout_ms: u64,
    pub write_timeout_ms: u64,
    pub flow_control: FlowControl,
}

impl SerialSettings {
    /// Read timeout as a duration.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Write timeout as a duration.
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: String::new(),
            baudrate: DEFAULT_BAUDRATE,
            read_timeout_ms: DEFAULT_TIMEOUT_MS,
            write_timeout_ms: DEFAULT_TIMEOUT_MS,
            flow_control: FlowControl::default(),
        }
    }
}

/// Serial port wrapped as a [`Channel`].
///
/// `serialport` keeps a single timeout per port, so the channel switches it
/// to the read or write timeout before each direction is used.
pub struct SerialChannel {
    port: Box<dyn SerialPort>,
    read_timeout: Duration,
    write_timeout: Duration,
    current_timeout: Duration,
}

impl SerialChannel {
    /// Open and configure the port.
    pub fn open(settings: &SerialSettings) -> Result<Self> {
        if settings.port.is_empty() {
            return Err(BenchError::Config("Serial port name is empty".to_string()));
        }

        let mut port = serialport::new(&settings.port, settings.baudrate)
            .timeout(settings.read_timeout())
            .flow_control(settings.flow_control.into())
            .open()?;
        port.write_data_terminal_ready(true)?;

        tracing::info!(
            "Opened serial port {} at {} baud",
            settings.port,
            settings.baudrate
        );

        Ok(Self {
            port,
            read_timeout: settings.read_timeout(),
            write_timeout: settings.write_timeout(),
            current_timeout: settings.read_timeout(),
        })
    }

    /// Get the port name, if the platform reports one.
    pub fn name(&self) -> Option<String> {
        self.port.name()
    }

    fn use_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        if self.current_timeout != timeout {
            self.port.set_timeout(timeout).map_err(io::Error::from)?;
            self.current_timeout = timeout;
        }
        Ok(())
    }
}

impl Read for SerialChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.use_timeout(self.read_timeout)?;
        self.port.read(buf)
    }
}

impl Write for SerialChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.use_timeout(self.write_timeout)?;
        self.port.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.use_timeout(self.write_timeout)?;
        self.port.flush()
    }
}

impl Channel for SerialChannel {
    fn clear_buffers(&mut self) -> Result<()> {
        self.port.clear(ClearBuffer::All)?;
        Ok(())
    }

    fn send_break(&mut self, duration: Duration) -> Result<()> {
        self.port.set_break()?;
        std::thread::sleep(duration);
        self.port.clear_break()?;
        Ok(())
    }
}
